//! ctxbuf - bounded context-buffer selection for LLM chat assistants
//!
//! Two pipelines share this crate:
//!
//! - **Context selection**: [`ContextSelector`] picks the files the model
//!   should see on the next turn, using one `<updateContextBuffer>` round trip
//!   (or no call at all for static HTML sites).
//! - **Folder import**: [`create_chat_from_folder`] turns an uploaded folder
//!   into the chat messages that bring it into a session.
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use std::sync::Arc;
//! use ctxbuf::{Config, ContextSelector, ProviderRegistry, SelectionRequest};
//! use ctxbuf::chat::ChatMessage;
//! use ctxbuf::types::FileMap;
//!
//! # async fn demo(files: FileMap) -> anyhow::Result<()> {
//! let config = Config::builder().max_context_files(5).build()?;
//! let registry = Arc::new(ProviderRegistry::from_config(&config)?);
//! let selector = ContextSelector::from_config(&config, registry)?;
//!
//! let request = SelectionRequest::new(vec![ChatMessage::user("Add a footer")], files);
//! let selection = selector.select(request).await?;
//! for path in selection.files.keys() {
//!     println!("{path}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # CLI
//!
//! The `ctxbuf` binary exposes `filter`, `classify`, `parse-response`,
//! `select`, and `import`; see `ctxbuf --help`.

pub use ctxbuf_config::{CliArgs, Config, ConfigBuilder};
pub use ctxbuf_engine::{
    BufferUpdate, ContextSelector, FileFilter, Selection, SelectionOutcome, SelectionRequest,
    SelectorOptions, parse_response,
};
pub use ctxbuf_import::{
    AutoFixer, CommandDetector, DefaultCommandDetector, LocalFile, NoopAutoFixer,
    ProjectCommands, UploadedFile, create_chat_from_folder,
};
pub use ctxbuf_llm::{AnythingLlmProvider, Credentials, LlmBackend, Provider, ProviderRegistry};
pub use ctxbuf_selectors::{IGNORE_PATTERNS, IgnoreMatcher};
pub use ctxbuf_utils::error::{CtxbufError, ImportError, LlmError, SelectError};
pub use ctxbuf_utils::exit_codes::ExitCode;
pub use ctxbuf_utils::{chat, types};

#[doc(hidden)]
pub mod cli;
