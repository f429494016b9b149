//! End-to-end context selection through the public API with a scripted provider.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use ctxbuf::chat::ChatMessage;
use ctxbuf::{
    Config, ContextSelector, Credentials, LlmBackend, LlmError, Provider, ProviderRegistry,
    SelectError, SelectionOutcome, SelectionRequest,
};
use ctxbuf_llm::{LlmInvocation, LlmResult, ModelInfo, Role};
use ctxbuf_utils::test_support::{assistant_with_context, buffer_update, file_map, file_map_of};

/// Provider that answers every call with the next scripted response.
struct ScriptedProvider {
    name: &'static str,
    responses: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<LlmInvocation>>>,
}

impl ScriptedProvider {
    fn new(name: &'static str, responses: &[&str]) -> Self {
        Self {
            name,
            responses: Arc::new(Mutex::new(
                responses.iter().rev().map(ToString::to_string).collect(),
            )),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

struct ScriptedBackend {
    provider: &'static str,
    responses: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<LlmInvocation>>>,
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = inv.model.clone();
        self.seen.lock().unwrap().push(inv);
        let text = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::Transport("script exhausted".to_string()))?;
        Ok(LlmResult::new(text, self.provider, model).with_tokens(100, 20))
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn static_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo::new("small", "Small", self.name, 8_000),
            ModelInfo::new("large", "Large", self.name, 200_000),
        ]
    }

    async fn dynamic_models(&self, _creds: &Credentials) -> Result<Vec<ModelInfo>, LlmError> {
        Ok(Vec::new())
    }

    fn backend(&self, _model: &str, _creds: &Credentials) -> Result<Box<dyn LlmBackend>, LlmError> {
        Ok(Box::new(ScriptedBackend {
            provider: self.name,
            responses: Arc::clone(&self.responses),
            seen: Arc::clone(&self.seen),
        }))
    }
}

struct Harness {
    selector: ContextSelector,
    seen: Arc<Mutex<Vec<LlmInvocation>>>,
}

fn harness(config: &Config, provider: ScriptedProvider) -> Harness {
    let seen = Arc::clone(&provider.seen);
    let registry = ProviderRegistry::new(Arc::new(provider));
    let selector = ContextSelector::from_config(config, Arc::new(registry)).unwrap();
    Harness { selector, seen }
}

fn default_config() -> Config {
    Config::builder().default_provider("Scripted").build().unwrap()
}

#[tokio::test]
async fn test_two_turn_conversation_updates_buffer() {
    let h = harness(
        &default_config(),
        ScriptedProvider::new(
            "Scripted",
            &[
                &buffer_update(r#"<includeFile path="src/auth.ts"/><includeFile path="src/db.ts"/>"#),
                &buffer_update(
                    r#"<excludeFile path="src/db.ts"/><includeFile path="src/routes.ts"/>"#,
                ),
            ],
        ),
    );
    let files = file_map(vec![
        ("src/auth.ts", "export const login = () => {};"),
        ("src/db.ts", "export const db = {};"),
        ("src/routes.ts", "export const routes = [];"),
        ("README.md", "# app"),
    ]);

    let first = h
        .selector
        .select(SelectionRequest::new(
            vec![ChatMessage::user("[Model: large]\n\n[Provider: Scripted]\n\nAdd login")],
            files.clone(),
        ))
        .await
        .unwrap();
    let first_paths: Vec<&str> = first.files.keys().map(String::as_str).collect();
    assert_eq!(first_paths, vec!["src/auth.ts", "src/db.ts"]);
    assert_eq!(first.files["src/auth.ts"].content, "export const login = () => {};");

    let history = vec![
        ChatMessage::user("[Model: large]\n\n[Provider: Scripted]\n\nAdd login"),
        assistant_with_context("Done <think>internal</think>", &first_paths),
        ChatMessage::user("[Model: large]\n\n[Provider: Scripted]\n\nNow add routes"),
    ];
    let second = h
        .selector
        .select(SelectionRequest::new(history, files).with_summary("auth work"))
        .await
        .unwrap();

    assert_eq!(
        second.files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["src/routes.ts"]
    );

    let seen = h.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].model, "large");
    let system = seen[1].content_of(Role::System).unwrap();
    assert!(system.contains(r#"filePath="src/auth.ts""#));
    assert!(system.contains("- /home/project/src/routes.ts"));
    let user = seen[1].content_of(Role::User).unwrap();
    assert!(user.contains("auth work"));
    assert!(user.contains("Users Question: Now add routes"));
}

#[tokio::test]
async fn test_chat_history_from_json_transport() {
    let h = harness(
        &default_config(),
        ScriptedProvider::new("Scripted", &[&buffer_update(r#"<includeFile path="b.ts"/>"#)]),
    );
    let history: Vec<ChatMessage> = serde_json::from_str(
        r#"[
            {"role":"user","content":[{"type":"text","text":"[Model: small]\n\n[Provider: Scripted]\n\nstart"}]},
            {"role":"assistant","content":"ok","annotations":[
                {"type":"chatSummary","summary":"set up a.ts","chatId":"c1"},
                {"type":"codeContext","files":["a.ts"]}
            ]},
            {"role":"user","content":[{"type":"image","image":"data:image/png;base64,AA=="},{"type":"text","text":"also b"}]}
        ]"#,
    )
    .unwrap();

    let selection = h
        .selector
        .select(SelectionRequest::new(history, file_map_of(&["a.ts", "b.ts"])))
        .await
        .unwrap();

    assert_eq!(selection.files.keys().collect::<Vec<_>>(), vec!["b.ts"]);
    let seen = h.seen.lock().unwrap();
    let user = seen[0].content_of(Role::User).unwrap();
    assert!(user.contains("summary of the chat till now: set up a.ts"));
    assert!(user.contains("Users Question: also b"));
    // The last user turn carries no markers; the unknown default model falls back to the first listed.
    assert_eq!(seen[0].model, "small");
}

#[tokio::test]
async fn test_configured_cap_limits_staged_files() {
    let config = Config::builder()
        .default_provider("Scripted")
        .max_context_files(2)
        .build()
        .unwrap();
    let h = harness(
        &config,
        ScriptedProvider::new(
            "Scripted",
            &[&buffer_update(
                r#"<includeFile path="a.ts"/><includeFile path="b.ts"/><includeFile path="c.ts"/>"#,
            )],
        ),
    );

    let selection = h
        .selector
        .select(SelectionRequest::new(
            vec![ChatMessage::user("q")],
            file_map_of(&["a.ts", "b.ts", "c.ts"]),
        ))
        .await
        .unwrap();

    assert_eq!(selection.files.len(), 2);
    let user = h.seen.lock().unwrap()[0]
        .content_of(Role::User)
        .unwrap()
        .to_string();
    assert!(user.contains("Only 2 files can be placed"));
}

#[tokio::test]
async fn test_static_site_short_circuits() {
    let h = harness(&default_config(), ScriptedProvider::new("Scripted", &[]));

    let selection = h
        .selector
        .select(SelectionRequest::new(
            vec![ChatMessage::user("make the hero bigger")],
            file_map_of(&[
                "index.html",
                "css/main.css",
                "js/main.js",
                "assets/libraries/bootstrap.min.js",
                "assets/fonts/font.css",
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(selection.outcome, SelectionOutcome::StaticHtml);
    assert_eq!(
        selection.files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["css/main.css", "index.html", "js/main.js"]
    );
    assert!(h.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_taxonomy_surfaces_to_caller() {
    let h = harness(
        &default_config(),
        ScriptedProvider::new(
            "Scripted",
            &[
                "I think you should look at a.ts",
                &buffer_update(r#"<includeFile path="nope.ts"/>"#),
            ],
        ),
    );
    let request = || SelectionRequest::new(vec![ChatMessage::user("q")], file_map_of(&["a.ts"]));

    let err = h.selector.select(request()).await.unwrap_err();
    assert!(matches!(err, SelectError::MalformedResponse));

    let err = h.selector.select(request()).await.unwrap_err();
    assert!(matches!(err, SelectError::NoFilesSelected));

    let err = h.selector.select(request()).await.unwrap_err();
    assert!(matches!(err, SelectError::Llm(LlmError::Transport(_))));
}

#[tokio::test]
async fn test_unknown_provider_uses_default_registry_entry() {
    let h = harness(
        &default_config(),
        ScriptedProvider::new("Scripted", &[&buffer_update(r#"<includeFile path="a.ts"/>"#)]),
    );

    let selection = h
        .selector
        .select(SelectionRequest::new(
            vec![ChatMessage::user("[Model: gpt-x]\n\n[Provider: Missing]\n\nq")],
            file_map_of(&["a.ts"]),
        ))
        .await
        .unwrap();

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Updated {
            model: "small".to_string(),
            fallback: true,
            rejected: Vec::new(),
        }
    );
}
