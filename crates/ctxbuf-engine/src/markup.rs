//! Chat markup helpers: metadata markers, bolt actions, thought blocks, and
//! the file-context artifact shown to the model.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use ctxbuf_utils::chat::MessageContent;
use ctxbuf_utils::types::ContextFiles;

static MODEL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Model: (.*?)\]\n\n").unwrap());
static PROVIDER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Provider: (.*?)\]\n\n").unwrap());
static FILE_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(<boltAction[^>]*type="file"[^>]*>)([\s\S]*?)(</boltAction>)"#).unwrap()
});
static THOUGHT_DIV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<div class=\\?"__boltThought__\\?">.*?</div>"#).unwrap());
static THINK_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());
static RENDERED_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<boltAction type="file" filePath="(.*?)">"#).unwrap());

/// Model and provider markers found in a user message, plus the cleaned body.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageMetadata {
    pub model: Option<String>,
    pub provider: Option<String>,
    pub content: MessageContent,
}

/// Read the `[Model: ..]` and `[Provider: ..]` markers from a user message.
///
/// Markers are looked up in the extracted text (the string content or the
/// first text part) and removed from every text part.
#[must_use]
pub fn extract_message_metadata(content: &MessageContent) -> MessageMetadata {
    let text = content.first_text();
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };
    let model = capture(&MODEL_MARKER);
    let provider = capture(&PROVIDER_MARKER);

    let content = content.clone().map_text(|text| {
        let text = MODEL_MARKER.replace(text, "");
        PROVIDER_MARKER.replace(&text, "").into_owned()
    });

    MessageMetadata {
        model,
        provider,
        content,
    }
}

/// Collapse the body of every file-writing bolt action to an ellipsis.
#[must_use]
pub fn simplify_bolt_actions(text: &str) -> String {
    FILE_ACTION
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}\n          ...\n        {}", &caps[1], &caps[3])
        })
        .into_owned()
}

/// Remove the first thought `<div>` and the first `<think>` block.
///
/// Later occurrences are left in place.
#[must_use]
pub fn strip_thoughts(text: &str) -> String {
    let text = THOUGHT_DIV.replacen(text, 1, "");
    THINK_BLOCK.replacen(&text, 1, "").into_owned()
}

/// Render context files as the `code-content` artifact, one action per file.
///
/// Binary records are skipped; order follows the map's sorted keys.
#[must_use]
pub fn render_files_context(files: &ContextFiles) -> String {
    let actions: Vec<String> = files
        .iter()
        .filter(|(_, record)| !record.is_binary)
        .map(|(path, record)| {
            format!(
                r#"<boltAction type="file" filePath="{path}">{}</boltAction>"#,
                record.content
            )
        })
        .collect();

    format!(
        "<boltArtifact id=\"code-content\" title=\"Code Content\" >\n{}\n</boltArtifact>",
        actions.join("\n")
    )
}

/// File paths declared by a rendered file-context artifact, in order.
#[must_use]
pub fn rendered_paths(text: &str) -> Vec<String> {
    RENDERED_PATH
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxbuf_utils::chat::ContentPart;
    use ctxbuf_utils::types::FileRecord;
    use serde_json::Map;

    #[test]
    fn test_metadata_markers_are_extracted_and_removed() {
        let content =
            MessageContent::from("[Model: llama3]\n\n[Provider: AnythingLLM]\n\nFix the header");
        let meta = extract_message_metadata(&content);

        assert_eq!(meta.model.as_deref(), Some("llama3"));
        assert_eq!(meta.provider.as_deref(), Some("AnythingLLM"));
        assert_eq!(meta.content.first_text(), "Fix the header");
    }

    #[test]
    fn test_metadata_absent_leaves_content() {
        let meta = extract_message_metadata(&MessageContent::from("plain question"));
        assert_eq!(meta.model, None);
        assert_eq!(meta.provider, None);
        assert_eq!(meta.content.first_text(), "plain question");
    }

    #[test]
    fn test_metadata_model_marker_must_lead() {
        let meta = extract_message_metadata(&MessageContent::from("hi [Model: x]\n\nthere"));
        assert_eq!(meta.model, None);
    }

    #[test]
    fn test_metadata_cleans_every_text_part() {
        let content = MessageContent::Parts(vec![
            ContentPart {
                kind: "image".to_string(),
                text: None,
                rest: Map::new(),
            },
            ContentPart::text("[Model: m1]\n\n[Provider: P]\n\nfirst"),
            ContentPart::text("[Provider: P]\n\nsecond"),
        ]);
        let meta = extract_message_metadata(&content);

        assert_eq!(meta.model.as_deref(), Some("m1"));
        let MessageContent::Parts(parts) = meta.content else {
            panic!("expected parts content");
        };
        assert_eq!(parts[0].kind, "image");
        assert_eq!(parts[1].text.as_deref(), Some("first"));
        assert_eq!(parts[2].text.as_deref(), Some("second"));
    }

    #[test]
    fn test_simplify_bolt_actions_collapses_file_bodies_only() {
        let text = concat!(
            r#"<boltAction type="file" filePath="a.ts">const a = 1;
const b = 2;</boltAction>"#,
            "\n",
            r#"<boltAction type="shell">npm install</boltAction>"#
        );
        let simplified = simplify_bolt_actions(text);

        assert!(simplified.contains(
            "<boltAction type=\"file\" filePath=\"a.ts\">\n          ...\n        </boltAction>"
        ));
        assert!(!simplified.contains("const a"));
        assert!(simplified.contains("npm install"));
    }

    #[test]
    fn test_strip_thoughts_removes_first_occurrence_legacy_behavior() {
        let text = "<think>one</think>keep<think>two</think>";
        assert_eq!(strip_thoughts(text), "keep<think>two</think>");

        let text = "a<div class=\"__boltThought__\">x\ny</div>b<div class=\"__boltThought__\">z</div>";
        assert_eq!(
            strip_thoughts(text),
            "ab<div class=\"__boltThought__\">z</div>"
        );
    }

    #[test]
    fn test_strip_thoughts_accepts_escaped_quotes() {
        let text = r#"pre<div class=\"__boltThought__\">hidden</div>post"#;
        assert_eq!(strip_thoughts(text), "prepost");
    }

    #[test]
    fn test_render_files_context_layout() {
        let mut files = ContextFiles::new();
        files.insert("b.ts".to_string(), FileRecord::text("B"));
        files.insert("a.ts".to_string(), FileRecord::text("A"));
        files.insert("logo.png".to_string(), FileRecord::binary());

        let rendered = render_files_context(&files);
        assert_eq!(
            rendered,
            "<boltArtifact id=\"code-content\" title=\"Code Content\" >\n\
             <boltAction type=\"file\" filePath=\"a.ts\">A</boltAction>\n\
             <boltAction type=\"file\" filePath=\"b.ts\">B</boltAction>\n\
             </boltArtifact>"
        );
        assert_eq!(rendered_paths(&rendered), vec!["a.ts", "b.ts"]);
    }

    proptest::proptest! {
        #[test]
        fn prop_render_then_extract_recovers_keys(
            paths in proptest::collection::btree_set("[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.(ts|css|md)", 0..8),
        ) {
            let files: ContextFiles = paths
                .iter()
                .map(|p| (p.clone(), FileRecord::text(format!("// {p}"))))
                .collect();

            let recovered = rendered_paths(&render_files_context(&files));
            let expected: Vec<String> = paths.into_iter().collect();
            proptest::prop_assert_eq!(recovered, expected);
        }
    }
}
