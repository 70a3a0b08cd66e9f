//! API definitions registered at startup when `tools.builtinApis` is on.

use super::config::ApiConfig;

const BUILTIN_APIS: &str = r#"[
  {
    "name": "get_weather",
    "description": "Get the current weather for a city",
    "url": "https://wttr.in/{city}",
    "method": "GET",
    "params": {"format": "j1"},
    "input_schema": {
      "city": {"type": "string", "description": "City name, e.g. \"Paris\""}
    },
    "output_mapping": {
      "location": "nearest_area.0.areaName.0.value",
      "country": "nearest_area.0.country.0.value",
      "temp_C": "current_condition.0.temp_C",
      "temp_F": "current_condition.0.temp_F",
      "feels_like_C": "current_condition.0.FeelsLikeC",
      "condition": "current_condition.0.weatherDesc.0.value",
      "humidity": "current_condition.0.humidity"
    },
    "timeout": 10,
    "error_message": "Sorry, I couldn't retrieve the weather at the moment."
  },
  {
    "name": "get_joke",
    "description": "Get a random joke",
    "url": "https://official-joke-api.appspot.com/random_joke",
    "method": "GET",
    "output_mapping": {
      "setup": "setup",
      "punchline": "punchline"
    },
    "timeout": 5,
    "error_message": "Sorry, I couldn't find a joke right now."
  },
  {
    "name": "get_bitcoin_price",
    "description": "Get the current Bitcoin price in USD",
    "url": "https://api.coingecko.com/api/v3/simple/price",
    "method": "GET",
    "params": {"ids": "bitcoin", "vs_currencies": "usd"},
    "output_mapping": {
      "usd": "bitcoin.usd"
    },
    "timeout": 5,
    "error_message": "Sorry, I couldn't fetch the Bitcoin price."
  }
]"#;

/// The built-in definitions: weather, jokes, and Bitcoin price.
pub fn builtin_apis() -> Result<Vec<ApiConfig>, serde_json::Error> {
    serde_json::from_str(BUILTIN_APIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse_and_validate() {
        let apis = builtin_apis().unwrap();
        let names: Vec<&str> = apis.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["get_weather", "get_joke", "get_bitcoin_price"]);
        for api in &apis {
            api.validate().unwrap();
        }
    }

    #[test]
    fn test_weather_requires_city() {
        let apis = builtin_apis().unwrap();
        let weather = &apis[0];
        assert!(weather.input_schema.contains_key("city"));
        assert_eq!(weather.params["format"], "j1");
    }
}
