use ctxbuf_utils::chat::{ChatMessage, ChatRole};

use crate::markup::{extract_message_metadata, simplify_bolt_actions, strip_thoughts};

/// Preprocessed history plus the last model/provider named by a user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMessages {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub provider: String,
}

/// Normalize the chat history before context extraction.
///
/// User turns lose their model/provider markers; every user turn updates the
/// current model and provider, falling back to the defaults when a marker is
/// missing. Assistant turns have file actions collapsed and thought blocks
/// stripped. System turns pass through.
#[must_use]
pub fn preprocess_messages(
    messages: &[ChatMessage],
    default_model: &str,
    default_provider: &str,
) -> ProcessedMessages {
    let mut model = default_model.to_string();
    let mut provider = default_provider.to_string();

    let messages = messages
        .iter()
        .map(|message| match message.role {
            ChatRole::User => {
                let meta = extract_message_metadata(&message.content);
                model = meta.model.unwrap_or_else(|| default_model.to_string());
                provider = meta.provider.unwrap_or_else(|| default_provider.to_string());
                ChatMessage {
                    content: meta.content,
                    ..message.clone()
                }
            }
            ChatRole::Assistant => ChatMessage {
                content: message
                    .content
                    .clone()
                    .map_text(|text| strip_thoughts(&simplify_bolt_actions(text))),
                ..message.clone()
            },
            ChatRole::System => message.clone(),
        })
        .collect();

    ProcessedMessages {
        messages,
        model,
        provider,
    }
}
