//! Command implementations

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use ctxbuf_config::Config;
use ctxbuf_engine::{
    ContextSelector, SelectionOutcome, SelectionRequest, is_static_html_project, parse_response,
    static_html_context,
};
use ctxbuf_import::{
    DefaultCommandDetector, NoopAutoFixer, create_chat_from_folder, load_file_map, scan_folder,
};
use ctxbuf_llm::{Credentials, ProviderRegistry};
use ctxbuf_utils::chat::ChatMessage;
use ctxbuf_utils::error::{CtxbufError, ImportError, LlmError, SelectError};

fn utf8_dir(dir: &Path) -> Result<Utf8PathBuf> {
    let dir = Utf8PathBuf::try_from(dir.to_path_buf())
        .map_err(|e| anyhow::anyhow!("Path is not valid UTF-8: {}", e.into_path_buf().display()))?;
    if !dir.is_dir() {
        return Err(CtxbufError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{dir} is not a directory"),
        ))
        .into());
    }
    Ok(dir)
}

fn selector(config: &Config) -> Result<ContextSelector> {
    let registry = ProviderRegistry::from_config(config).map_err(CtxbufError::Llm)?;
    let selector =
        ContextSelector::from_config(config, Arc::new(registry)).map_err(CtxbufError::Config)?;
    Ok(selector)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_project(dir: &Utf8Path, config: &Config) -> Result<ctxbuf_utils::types::FileMap> {
    load_file_map(dir, config.project_root())
        .map_err(|e| CtxbufError::Import(e).into())
}

/// `ctxbuf filter <dir>`
pub fn execute_filter_command(dir: &Path, config: &Config) -> Result<()> {
    let dir = utf8_dir(dir)?;
    let files = load_project(&dir, config)?;
    let selector = selector(config)?;

    for path in selector.filter().filter(&files).relative() {
        println!("{path}");
    }
    Ok(())
}

#[derive(Serialize)]
struct ClassifyOutput {
    static_html: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
}

/// `ctxbuf classify <dir>`
pub fn execute_classify_command(dir: &Path, config: &Config) -> Result<()> {
    let dir = utf8_dir(dir)?;
    let files = load_project(&dir, config)?;
    let selector = selector(config)?;

    let static_html = is_static_html_project(&files);
    let files = if static_html {
        static_html_context(&files, selector.filter())
            .into_keys()
            .collect()
    } else {
        Vec::new()
    };

    print_json(&ClassifyOutput { static_html, files })
}

/// `ctxbuf parse-response [<file>|-]`
pub fn execute_parse_response_command(input: &str) -> Result<()> {
    let response = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read response from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .map_err(CtxbufError::Io)
            .with_context(|| format!("Failed to read response file: {input}"))?
    };

    let update = parse_response(&response).map_err(CtxbufError::Select)?;
    print_json(&update)
}

#[derive(Serialize)]
struct SelectOutput {
    files: Vec<String>,
    outcome: SelectionOutcome,
}

/// `ctxbuf select <dir> --history <chat.json>`
pub async fn execute_select_command(
    dir: &Path,
    history: &Path,
    summary: Option<&str>,
    config: &Config,
) -> Result<()> {
    let dir = utf8_dir(dir)?;
    let files = load_project(&dir, config)?;

    let history_text = std::fs::read_to_string(history)
        .map_err(CtxbufError::Io)
        .with_context(|| format!("Failed to read chat history: {}", history.display()))?;
    let messages: Vec<ChatMessage> = serde_json::from_str(&history_text)
        .with_context(|| format!("Invalid chat history JSON: {}", history.display()))?;

    let selector = selector(config)?;
    let request = SelectionRequest::new(messages, files)
        .with_summary(summary.unwrap_or_default())
        .with_credentials(Credentials::default());

    let selection = selector
        .select(request)
        .await
        .map_err(CtxbufError::Select)?;

    print_json(&SelectOutput {
        files: selection.files.into_keys().collect(),
        outcome: selection.outcome,
    })
}

/// `ctxbuf import <dir>`
pub fn execute_import_command(dir: &Path, config: &Config) -> Result<()> {
    let dir = utf8_dir(dir)?;
    let selector = selector(config)?;

    let scan = scan_folder(&dir, |path| selector.filter().is_ignored(path))
        .map_err(CtxbufError::Import)?;
    let messages = create_chat_from_folder(
        &scan.files,
        &scan.binary_files,
        &scan.folder_name,
        &NoopAutoFixer,
        &DefaultCommandDetector,
    )
    .map_err(CtxbufError::Import)?;

    print_json(&messages)
}

/// Recover the typed error behind an `anyhow` chain, if there is one.
pub(crate) fn typed_error(error: anyhow::Error) -> std::result::Result<CtxbufError, anyhow::Error> {
    let error = match error.downcast::<CtxbufError>() {
        Ok(e) => return Ok(e),
        Err(e) => e,
    };
    let error = match error.downcast::<ctxbuf_utils::error::ConfigError>() {
        Ok(e) => return Ok(CtxbufError::Config(e)),
        Err(e) => e,
    };
    let error = match error.downcast::<SelectError>() {
        Ok(e) => return Ok(CtxbufError::Select(e)),
        Err(e) => e,
    };
    let error = match error.downcast::<LlmError>() {
        Ok(e) => return Ok(CtxbufError::Llm(e)),
        Err(e) => e,
    };
    match error.downcast::<ImportError>() {
        Ok(e) => Ok(CtxbufError::Import(e)),
        Err(e) => Err(e),
    }
}
