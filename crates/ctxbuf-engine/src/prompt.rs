//! Prompt construction for the context-buffer update call.

use ctxbuf_utils::chat::{ChatMessage, ChatRole};
use ctxbuf_utils::error::SelectError;

use crate::filter::FilteredPaths;

/// System and user prompt for one selection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// The last user turn of the processed history.
///
/// # Errors
///
/// Returns `SelectError::MissingUserMessage` when the history has no user turn.
pub fn last_user_message(messages: &[ChatMessage]) -> Result<&ChatMessage, SelectError> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::User)
        .ok_or(SelectError::MissingUserMessage)
}

/// Build the prompts from the candidate paths, rendered buffer, summary, and
/// the last user question.
///
/// # Errors
///
/// Returns `SelectError::MissingUserMessage` when the history has no user turn.
pub fn build_prompt(
    messages: &[ChatMessage],
    paths: &FilteredPaths,
    rendered_context: &str,
    summary: &str,
    max_context_files: usize,
) -> Result<Prompt, SelectError> {
    let question = last_user_message(messages)?.text();

    let listing = paths
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    let system = format!(
        r#"You are a software engineer. You are working on a project. You have access to the following files:

AVAILABLE FILES PATHS
---
{listing}
---

You have following code loaded in the context buffer that you can refer to:

CURRENT CONTEXT BUFFER
---
{rendered_context}
---

Now, you are given a task. You need to select the files that are relevant to the task from the list of files above.

RESPONSE FORMAT:
your response should be in following format:
---
<updateContextBuffer>
    <includeFile path="path/to/file"/>
    <excludeFile path="path/to/file"/>
</updateContextBuffer>
---
* Your should start with <updateContextBuffer> and end with </updateContextBuffer>.
* You can include multiple <includeFile> and <excludeFile> tags in the response.
* You should not include any other text in the response.
* You should not include any file that is not in the list of files above.
* You should not include any file that is already in the context buffer.
* If no changes are needed, you can leave the response empty updateContextBuffer tag.
"#
    );

    let user = format!(
        r#"Here is the summary of the chat till now: {summary}

Users Question: {question}

update the context buffer with the files that are relevant to the task from the list of files above.

CRITICAL RULES:
* Only include relevant files in the context buffer.
* context buffer should not include any file that is not in the list of files above.
* context buffer is extremlly expensive, so only include files that are absolutely necessary.
* If no changes are needed, you can leave the response empty updateContextBuffer tag.
* Only {max_context_files} files can be placed in the context buffer at a time.
* if the buffer is full, you need to exclude files that is not needed and include files that is relevent.
"#
    );

    Ok(Prompt { system, user })
}
