//! Native `get_time` tool.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::base::{optional_string, Tool};

/// Reports the current date and time, optionally shifted to a UTC offset.
pub struct TimeTool;

#[async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        "get_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. Optionally pass a UTC offset such as \"+02:00\" or \"UTC-5\"."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "UTC offset, e.g. \"+02:00\", \"-05:30\", \"UTC+1\""
                }
            },
            "required": []
        })
    }

    async fn execute(&self, params: HashMap<String, Value>) -> anyhow::Result<String> {
        let now = Utc::now();
        let requested = optional_string(&params, "timezone").filter(|t| !t.trim().is_empty());

        let Some(tz) = requested else {
            return Ok(format!("Current time (UTC): {}", now.format("%Y-%m-%d %H:%M:%S")));
        };

        match parse_offset(&tz) {
            Some(offset) => {
                let local = now.with_timezone(&offset);
                Ok(format!(
                    "Current time ({tz}): {}",
                    local.format("%Y-%m-%d %H:%M:%S %:z")
                ))
            }
            None => Ok(format!(
                "Unknown timezone '{tz}'. Current time (UTC): {}",
                now.format("%Y-%m-%d %H:%M:%S")
            )),
        }
    }
}

/// Parse `"+HH:MM"`, `"-HH"`, `"UTC+H"`, `"GMT-HH:MM"`, `"UTC"`, or `"Z"`.
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let s = raw.trim();
    let upper = s.to_ascii_uppercase();
    let rest = upper
        .strip_prefix("UTC")
        .or_else(|| upper.strip_prefix("GMT"))
        .unwrap_or(&upper);

    if rest.is_empty() || rest == "Z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (digits.parse::<i32>().ok()?, 0),
    };
    if hours > 14 || minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset_forms() {
        assert_eq!(parse_offset("+02:00"), FixedOffset::east_opt(7200));
        assert_eq!(parse_offset("UTC-5"), FixedOffset::east_opt(-5 * 3600));
        assert_eq!(parse_offset("gmt+05:30"), FixedOffset::east_opt(5 * 3600 + 1800));
        assert_eq!(parse_offset("UTC"), FixedOffset::east_opt(0));
        assert_eq!(parse_offset("Z"), FixedOffset::east_opt(0));
    }

    #[test]
    fn test_parse_offset_rejects_garbage() {
        assert!(parse_offset("Europe/Paris").is_none());
        assert!(parse_offset("+25").is_none());
        assert!(parse_offset("+02:75").is_none());
    }

    #[tokio::test]
    async fn test_execute_default_utc() {
        let out = TimeTool.execute(HashMap::new()).await.unwrap();
        assert!(out.starts_with("Current time (UTC): "));
    }

    #[tokio::test]
    async fn test_execute_with_offset() {
        let mut params = HashMap::new();
        params.insert("timezone".into(), json!("+02:00"));
        let out = TimeTool.execute(params).await.unwrap();
        assert!(out.starts_with("Current time (+02:00): "));
        assert!(out.ends_with("+02:00"));
    }

    #[tokio::test]
    async fn test_execute_unknown_timezone() {
        let mut params = HashMap::new();
        params.insert("timezone".into(), json!("Mars/Olympus"));
        let out = TimeTool.execute(params).await.unwrap();
        assert!(out.starts_with("Unknown timezone 'Mars/Olympus'"));
    }
}
