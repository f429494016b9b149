//! Chat transcript model shared by the selector and the folder importer.
//!
//! The JSON shape follows the chat transport used by the web client:
//! `content` is either a plain string or an ordered list of typed parts, and
//! structured directives such as the current context buffer travel in
//! `annotations`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

/// One typed part of a multi-part message.
///
/// Only `text` parts are interpreted. Every other field is kept verbatim in
/// `rest` so image and tool parts survive a round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ContentPart {
    /// Create a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            rest: Map::new(),
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

/// Message body: a plain string or an ordered sequence of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The string content, or the first text part. Empty when there is none.
    #[must_use]
    pub fn first_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts
                .iter()
                .find(|p| p.is_text())
                .and_then(|p| p.text.as_deref())
                .unwrap_or(""),
        }
    }

    /// Apply `f` to the string content or to every text part.
    #[must_use]
    pub fn map_text(self, mut f: impl FnMut(&str) -> String) -> Self {
        match self {
            Self::Text(text) => Self::Text(f(&text)),
            Self::Parts(parts) => Self::Parts(
                parts
                    .into_iter()
                    .map(|mut part| {
                        if part.is_text() {
                            if let Some(text) = part.text.as_deref() {
                                part.text = Some(f(text));
                            }
                        }
                        part
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The model's previously declared context buffer: relative file paths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeContext {
    pub files: Vec<String>,
}

/// Running chat summary attached by the summarisation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub summary: String,
    #[serde(rename = "chatId", default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// Annotations this crate understands, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KnownAnnotation {
    #[serde(rename = "codeContext")]
    CodeContext(CodeContext),
    #[serde(rename = "chatSummary")]
    ChatSummary(ChatSummary),
}

/// A message annotation. Unknown annotations are preserved as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Annotation {
    Known(KnownAnnotation),
    Other(Value),
}

impl Annotation {
    #[must_use]
    pub fn code_context(files: Vec<String>) -> Self {
        Self::Known(KnownAnnotation::CodeContext(CodeContext { files }))
    }

    #[must_use]
    pub fn as_code_context(&self) -> Option<&CodeContext> {
        match self {
            Self::Known(KnownAnnotation::CodeContext(ctx)) => Some(ctx),
            _ => None,
        }
    }
}

/// One turn of the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: ChatRole,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<MessageContent>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            annotations: Vec::new(),
            created_at: None,
        }
    }

    #[must_use]
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    #[must_use]
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(ChatRole::System, content)
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Extracted plain text of the message (see [`MessageContent::first_text`]).
    #[must_use]
    pub fn text(&self) -> &str {
        self.content.first_text()
    }

    /// The last `codeContext` annotation on this message, if any.
    #[must_use]
    pub fn code_context(&self) -> Option<&CodeContext> {
        self.annotations
            .iter()
            .rev()
            .find_map(Annotation::as_code_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_and_parts_content() {
        let json = r#"[
            {"role":"user","content":"hello"},
            {"role":"user","content":[{"type":"image","image":"data:..."},{"type":"text","text":"hi"}]}
        ]"#;
        let messages: Vec<ChatMessage> = serde_json::from_str(json).unwrap();

        assert_eq!(messages[0].text(), "hello");
        assert_eq!(messages[1].text(), "hi");

        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("expected parts content");
        };
        assert_eq!(parts[0].kind, "image");
        assert_eq!(parts[0].rest.get("image").and_then(Value::as_str), Some("data:..."));
    }

    #[test]
    fn test_annotations_known_and_unknown() {
        let json = r#"{
            "role":"assistant",
            "content":"ok",
            "annotations":[
                {"type":"chatSummary","summary":"s","chatId":"c1"},
                {"type":"usage","tokens":12},
                {"type":"codeContext","files":["a.ts","b.ts"]}
            ]
        }"#;
        let message: ChatMessage = serde_json::from_str(json).unwrap();

        assert_eq!(message.annotations.len(), 3);
        assert!(matches!(message.annotations[1], Annotation::Other(_)));
        assert_eq!(
            message.code_context().unwrap().files,
            vec!["a.ts".to_string(), "b.ts".to_string()]
        );
    }

    #[test]
    fn test_map_text_leaves_non_text_parts() {
        let content = MessageContent::Parts(vec![
            ContentPart {
                kind: "image".to_string(),
                text: None,
                rest: Map::new(),
            },
            ContentPart::text("abc"),
        ]);

        let mapped = content.map_text(str::to_uppercase);
        let MessageContent::Parts(parts) = mapped else {
            panic!("expected parts content");
        };
        assert_eq!(parts[0].text, None);
        assert_eq!(parts[1].text.as_deref(), Some("ABC"));
    }

    #[test]
    fn test_first_text_empty_when_no_text_part() {
        let content = MessageContent::Parts(vec![]);
        assert_eq!(content.first_text(), "");
    }
}
