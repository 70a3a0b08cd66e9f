//! Chat sessions: command interception, routing, and delegation for one user.
//!
//! `ChatRuntime` is built once and shared: it owns the toolbox, the agent
//! roster, the router, and the API definitions store. Each `ChatSession`
//! owns its own `ChatContext`, so concurrent sessions never share history.

use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use apibot_core::chat::{ChatContext, Role};
use apibot_core::config::Config;
use apibot_core::utils::expand_home;
use apibot_providers::traits::{LlmProvider, LlmRequestConfig};

use crate::agent_loop::{AgentRunner, FALLBACK_REPLY};
use crate::agents::AgentRoster;
use crate::router::{RouteDecision, TriageRouter};
use crate::toolbox::Toolbox;
use crate::tools::api::{builtin_apis, ApiStore, Registered};

/// Inputs that end an interactive session.
pub const EXIT_COMMANDS: &[&str] = &["exit", "quit", "bye", "/exit", "/quit", ":q"];

const ADD_API_USAGE: &str = "Usage: !add_api {\"name\": ..., \"url\": ..., \"method\": \"GET\", ...}";

/// Whether `input` asks to leave the session.
pub fn is_exit_command(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

/// A chat command handled before routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `!add_api <json>`
    AddApi(&'a str),
    /// `!apis`
    ListApis,
}

/// Recognize a chat command. Plain messages return `None`.
pub fn parse_command(input: &str) -> Option<Command<'_>> {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix("!add_api") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Some(Command::AddApi(rest.trim()));
        }
    }
    if input.trim_end() == "!apis" {
        return Some(Command::ListApis);
    }
    None
}

// ─────────────────────────────────────────────
// ChatRuntime
// ─────────────────────────────────────────────

/// Shared state behind every session.
pub struct ChatRuntime {
    toolbox: Arc<Toolbox>,
    roster: AgentRoster,
    router: TriageRouter,
    runner: AgentRunner,
    store: Option<ApiStore>,
    /// Held across register + persist so the registry and the store agree
    /// on the last writer.
    add_lock: Mutex<()>,
}

impl ChatRuntime {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: &str,
        request_config: LlmRequestConfig,
        history_window: usize,
        roster: AgentRoster,
        toolbox: Arc<Toolbox>,
        store: Option<ApiStore>,
    ) -> Self {
        let router = TriageRouter::new(
            provider.clone(),
            model,
            request_config.clone(),
            history_window,
        );
        let runner = AgentRunner::new(
            provider,
            model,
            request_config,
            toolbox.clone(),
            history_window,
        );
        Self {
            toolbox,
            roster,
            router,
            runner,
            store,
            add_lock: Mutex::new(()),
        }
    }

    /// Build a runtime from config: native tools, built-in APIs (if enabled),
    /// then every stored definition. Definitions that fail validation are
    /// logged and skipped.
    pub fn from_config(config: &Config, provider: Arc<dyn LlmProvider>) -> Self {
        let toolbox = Arc::new(Toolbox::with_natives());
        let store = ApiStore::new(expand_home(&config.tools.apis_file));

        if config.tools.builtin_apis {
            match builtin_apis() {
                Ok(apis) => {
                    for api in apis {
                        let name = api.name.clone();
                        if let Err(e) = toolbox.apis().register(api) {
                            warn!(api = %name, error = %e, "skipping built-in API");
                        }
                    }
                }
                Err(e) => error!(error = %e, "built-in API definitions are malformed"),
            }
        }

        match store.load() {
            Ok(apis) => {
                for api in apis {
                    let name = api.name.clone();
                    if let Err(e) = toolbox.apis().register(api) {
                        warn!(api = %name, error = %e, "skipping stored API");
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not load stored API definitions"),
        }

        info!(
            natives = toolbox.natives().len(),
            apis = toolbox.apis().len(),
            "tools ready"
        );

        let defaults = &config.agents.defaults;
        Self::new(
            provider,
            &defaults.model,
            LlmRequestConfig {
                max_tokens: defaults.max_tokens,
                temperature: defaults.temperature,
            },
            config.chat.history_window,
            AgentRoster::new(&config.agents.roster),
            toolbox,
            Some(store),
        )
    }

    pub fn toolbox(&self) -> &Arc<Toolbox> {
        &self.toolbox
    }

    /// Register a definition from JSON and persist it. Returns the reply text.
    pub fn add_api(&self, raw: &str) -> String {
        if raw.is_empty() {
            return ADD_API_USAGE.to_string();
        }

        let _guard = self.add_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (outcome, config) = match self.toolbox.apis().register_json(raw) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "rejected API definition");
                return format!("Couldn't register that API: {e}");
            }
        };

        let mut reply = match outcome {
            Registered::Added => format!(
                "Registered API tool '{}'. You can ask me to use it right away.",
                config.name
            ),
            Registered::Replaced => format!("Updated API tool '{}'.", config.name),
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.upsert(&config) {
                error!(api = %config.name, error = %e, "failed to persist API definition");
                reply.push_str(&format!(
                    "\nWarning: it won't survive a restart ({e})."
                ));
            }
        }
        reply
    }

    /// Human-readable list of the dynamic API tools.
    pub fn list_apis(&self) -> String {
        let sigs = self.toolbox.apis().list();
        if sigs.is_empty() {
            return "No API tools registered. Add one with !add_api.".to_string();
        }

        let mut out = format!("API tools ({}):", sigs.len());
        for sig in sigs {
            out.push_str(&format!("\n- {}", sig.name));
            if !sig.description.is_empty() {
                out.push_str(&format!(": {}", sig.description));
            }
            if !sig.input_schema.is_empty() {
                let params: Vec<&str> = sig.input_schema.keys().map(String::as_str).collect();
                out.push_str(&format!(" ({})", params.join(", ")));
            }
        }
        out
    }

    /// Route the latest user message and produce the assistant's reply.
    pub async fn respond(&self, ctx: &ChatContext, user_text: &str) -> String {
        let agents = self.roster.snapshot(self.toolbox.apis());
        match self.router.route(ctx, user_text, &agents).await {
            Ok(RouteDecision::Delegate(agent)) => self.runner.run(&agent, ctx).await,
            Ok(RouteDecision::Answer(text)) => text,
            Err(e) => {
                error!(error = %e, "routing failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

// ─────────────────────────────────────────────
// ChatSession
// ─────────────────────────────────────────────

/// One user's conversation.
pub struct ChatSession {
    runtime: Arc<ChatRuntime>,
    context: ChatContext,
}

impl ChatSession {
    pub fn new(
        runtime: Arc<ChatRuntime>,
        user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            context: ChatContext::new(user_id, username),
        }
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn runtime(&self) -> &Arc<ChatRuntime> {
        &self.runtime
    }

    /// Handle one line of input. Commands are answered directly and kept
    /// out of the history; everything else is a routed turn.
    pub async fn handle(&mut self, input: &str) -> String {
        match parse_command(input) {
            Some(Command::AddApi(raw)) => return self.runtime.add_api(raw),
            Some(Command::ListApis) => return self.runtime.list_apis(),
            None => {}
        }

        let text = input.trim();
        self.context.append(Role::User, text);
        let reply = self.runtime.respond(&self.context, text).await;
        self.context.append(Role::Assistant, reply.clone());
        reply
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use apibot_core::config::AgentSpec;
    use apibot_core::types::{LlmResponse, ToolCall};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handoff(name: &str) -> LlmResponse {
        LlmResponse {
            tool_calls: vec![ToolCall::new("h1", name, "{}")],
            ..Default::default()
        }
    }

    fn runtime(provider: Arc<MockProvider>, store: Option<ApiStore>) -> Arc<ChatRuntime> {
        let roster = AgentRoster::new(&[AgentSpec::new(
            "Time Agent",
            "Use for questions about the current time.",
            "Provide current time information.",
            &["get_time"],
        )]);
        Arc::new(ChatRuntime::new(
            provider,
            "mock-model",
            LlmRequestConfig::default(),
            5,
            roster,
            Arc::new(Toolbox::with_natives()),
            store,
        ))
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("!add_api {\"a\":1}"),
            Some(Command::AddApi("{\"a\":1}"))
        );
        assert_eq!(parse_command("!add_api"), Some(Command::AddApi("")));
        assert_eq!(parse_command("  !apis "), Some(Command::ListApis));
        assert_eq!(parse_command("!add_apix {}"), None);
        assert_eq!(parse_command("what's the weather?"), None);
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT "));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("exit please"));
    }

    #[tokio::test]
    async fn test_turn_delegates_and_records_history() {
        let provider = Arc::new(MockProvider::new(vec![
            handoff("transfer_to_time_agent"),
            LlmResponse::text("It's noon."),
        ]));
        let mut session = ChatSession::new(runtime(provider.clone(), None), "u1", "Ada");

        let reply = session.handle("what time is it?").await;
        assert_eq!(reply, "It's noon.");
        assert_eq!(provider.offered_tools(1), vec!["get_time"]);

        let turns = session.context().history();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].text, "It's noon.");
    }

    #[tokio::test]
    async fn test_unknown_agent_gives_fallback() {
        let provider = Arc::new(MockProvider::new(vec![handoff("transfer_to_nobody")]));
        let mut session = ChatSession::new(runtime(provider, None), "u1", "Ada");
        assert_eq!(session.handle("hello").await, FALLBACK_REPLY);
        assert_eq!(session.context().len(), 2);
    }

    #[tokio::test]
    async fn test_commands_skip_history_and_router() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let mut session = ChatSession::new(runtime(provider.clone(), None), "u1", "Ada");

        let reply = session.handle("!apis").await;
        assert!(reply.starts_with("No API tools registered"));

        let reply = session.handle("!add_api {\"name\": \"broken\"}").await;
        assert!(reply.starts_with("Couldn't register that API"));

        assert!(session.context().is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_api_persists_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("apis.json");
        let provider = Arc::new(MockProvider::new(vec![]));
        let mut session = ChatSession::new(
            runtime(provider, Some(ApiStore::new(&store_path))),
            "u1",
            "Ada",
        );

        let reply = session
            .handle(r#"!add_api {"name":"cat_fact","description":"A cat fact","url":"https://catfact.ninja/fact","method":"GET","output_mapping":{"fact":"fact"}}"#)
            .await;
        assert!(reply.starts_with("Registered API tool 'cat_fact'"));

        let listing = session.handle("!apis").await;
        assert!(listing.contains("- cat_fact: A cat fact"));

        let stored = ApiStore::new(&store_path).load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].output_mapping["fact"], "fact");
    }

    #[test]
    fn test_concurrent_adds_leave_registry_and_store_in_agreement() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("apis.json");
        let rt = runtime(
            Arc::new(MockProvider::new(vec![])),
            Some(ApiStore::new(&store_path)),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let rt = rt.clone();
                std::thread::spawn(move || {
                    for round in 0..10 {
                        let raw = format!(
                            r#"{{"name":"shared","description":"writer {i} round {round}","url":"https://e.com","method":"GET"}}"#
                        );
                        rt.add_api(&raw);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let live = rt.toolbox().apis().get("shared").unwrap();
        let stored = ApiStore::new(&store_path).load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, live.config().description);
    }

    #[test]
    fn test_store_failure_keeps_registration() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let blocked = dir.path().join("apis.json");
        std::fs::create_dir_all(blocked.join("x")).unwrap();

        let provider = Arc::new(MockProvider::new(vec![]));
        let rt = runtime(provider, Some(ApiStore::new(&blocked)));
        let reply = rt.add_api(r#"{"name":"ping","url":"https://e.com/ping","method":"GET"}"#);

        assert!(reply.contains("Warning: it won't survive a restart"));
        assert!(rt.toolbox().apis().contains("ping"));
    }

    #[tokio::test]
    async fn test_added_api_is_routable_next_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(body_json(json!({"msg": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"echo": {"msg": "hi"}})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Arc::new(MockProvider::new(vec![
            handoff("transfer_to_echo_agent"),
            LlmResponse {
                tool_calls: vec![ToolCall::new("c1", "echo", r#"{"text":"hi"}"#)],
                ..Default::default()
            },
            LlmResponse::text("The echo service says: hi"),
        ]));
        let mut session = ChatSession::new(runtime(provider.clone(), None), "u1", "Ada");

        let definition = json!({
            "name": "echo",
            "description": "Echo a message",
            "url": format!("{}/echo", server.uri()),
            "method": "POST",
            "body": {"msg": "{text}"},
            "input_schema": {"text": {"type": "string", "description": "Text"}},
            "output_mapping": {"out": "echo.msg"}
        });
        let reply = session.handle(&format!("!add_api {definition}")).await;
        assert!(reply.starts_with("Registered"));

        let reply = session.handle("echo hi please").await;
        assert_eq!(reply, "The echo service says: hi");
        assert!(provider
            .offered_tools(0)
            .contains(&"transfer_to_echo_agent".to_string()));

        let report = provider.call(2).messages;
        assert!(matches!(
            report.last(),
            Some(apibot_core::types::Message::Tool { content, .. }) if content.contains("\"out\": \"hi\"")
        ));
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history() {
        let provider = Arc::new(MockProvider::new(vec![
            LlmResponse::text("hi Ada"),
            LlmResponse::text("hi Bo"),
        ]));
        let rt = runtime(provider, None);
        let mut a = ChatSession::new(rt.clone(), "u1", "Ada");
        let mut b = ChatSession::new(rt, "u2", "Bo");

        a.handle("hello").await;
        b.handle("hey").await;

        assert_eq!(a.context().history()[0].text, "hello");
        assert_eq!(b.context().history()[0].text, "hey");
        assert_eq!(a.context().len(), 2);
    }

    #[test]
    fn test_from_config_loads_builtins_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let apis_file = dir.path().join("apis.json");
        std::fs::write(
            &apis_file,
            r#"[{"name":"ping","url":"https://e.com/ping","method":"GET"},
                {"name":"get_time","url":"https://e.com/t","method":"GET"}]"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.tools.apis_file = apis_file.to_string_lossy().into_owned();

        let rt = ChatRuntime::from_config(&config, Arc::new(MockProvider::new(vec![])));
        let names: Vec<String> = rt.toolbox().apis().list().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["get_bitcoin_price", "get_joke", "get_weather", "ping"]
        );
    }
}
