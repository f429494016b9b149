//! Setup and start command detection for imported projects.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use ctxbuf_utils::chat::ChatMessage;

use crate::assemble::message_id;
use crate::source::FileArtifact;

const PREFERRED_SCRIPTS: &[&str] = &["dev", "start", "preview"];

/// Commands that bring an imported project up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCommands {
    /// Project kind, e.g. `Node.js` or `Static`. Empty when unknown.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_message: Option<String>,
}

impl ProjectCommands {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.setup_command.is_none() && self.start_command.is_none()
    }
}

/// Detects how to set up and run an imported project.
pub trait CommandDetector {
    fn detect(&self, files: &[FileArtifact]) -> ProjectCommands;
}

/// `package.json` scripts, else a static server for `index.html`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCommandDetector;

impl CommandDetector for DefaultCommandDetector {
    fn detect(&self, files: &[FileArtifact]) -> ProjectCommands {
        let file_name = |f: &FileArtifact| f.path.rsplit('/').next().unwrap_or_default().to_string();

        if let Some(package_json) = files.iter().find(|f| file_name(f) == "package.json") {
            return detect_node(&package_json.content);
        }

        if files.iter().any(|f| file_name(f) == "index.html") {
            return ProjectCommands {
                kind: "Static".to_string(),
                start_command: Some("npx --yes serve".to_string()),
                ..ProjectCommands::default()
            };
        }

        ProjectCommands::default()
    }
}

fn detect_node(package_json: &str) -> ProjectCommands {
    let parsed: Value = match serde_json::from_str(package_json) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Unparsable package.json, no commands detected");
            return ProjectCommands::default();
        }
    };

    let has_script = |name: &str| {
        parsed
            .get("scripts")
            .and_then(|s| s.get(name))
            .is_some_and(|v| !v.is_null())
    };

    match PREFERRED_SCRIPTS.iter().find(|s| has_script(s)) {
        Some(script) => ProjectCommands {
            kind: "Node.js".to_string(),
            setup_command: Some("npm install".to_string()),
            start_command: Some(format!("npm run {script}")),
            followup_message: Some(format!(
                "Found \"{script}\" script in package.json. Running \"npm run {script}\" after installation."
            )),
        },
        None => ProjectCommands {
            kind: "Node.js".to_string(),
            setup_command: Some("npm install".to_string()),
            start_command: None,
            followup_message: Some(
                "Would you like me to inspect package.json to determine the available scripts for running this project?"
                    .to_string(),
            ),
        },
    }
}

/// Assistant message running the detected commands, or `None` when there are none.
#[must_use]
pub fn create_commands_message(commands: &ProjectCommands) -> Option<ChatMessage> {
    if commands.is_empty() {
        return None;
    }

    let mut actions = Vec::new();
    if let Some(setup) = &commands.setup_command {
        actions.push(format!(r#"<boltAction type="shell">{setup}</boltAction>"#));
    }
    if let Some(start) = &commands.start_command {
        actions.push(format!(r#"<boltAction type="start">{start}</boltAction>"#));
    }

    let followup = commands
        .followup_message
        .as_deref()
        .map(|m| format!("{m}\n\n"))
        .unwrap_or_default();

    Some(
        ChatMessage::assistant(format!(
            "{followup}<boltArtifact id=\"project-setup\" title=\"Project Setup\">\n{}\n</boltArtifact>",
            actions.join("\n")
        ))
        .with_id(message_id("project-setup"))
        .with_created_at(chrono::Utc::now()),
    )
}
