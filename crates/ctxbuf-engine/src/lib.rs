//! Context-buffer selection pipeline
//!
//! Given a project [`FileMap`](ctxbuf_utils::types::FileMap) and a chat
//! history, [`ContextSelector`] decides which files the model should see on
//! the next turn. Static HTML sites short-circuit without a model call;
//! everything else goes through one `<updateContextBuffer>` round trip:
//!
//! filter → classify → preprocess → extract context → prompt → invoke →
//! parse → reconcile.

pub mod classify;
pub mod context;
pub mod filter;
pub mod markup;
pub mod preprocess;
pub mod prompt;
pub mod reconcile;
pub mod response;
mod selector;

pub use classify::{is_static_html_project, static_html_context};
pub use context::{CurrentContext, extract_current_context};
pub use filter::{FileFilter, FilteredPaths};
pub use preprocess::{ProcessedMessages, preprocess_messages};
pub use prompt::{Prompt, build_prompt, last_user_message};
pub use reconcile::{Reconciler, Reconciliation};
pub use response::{BufferUpdate, parse_response};
pub use selector::{
    ContextSelector, OnFinish, Selection, SelectionOutcome, SelectionRequest, SelectorOptions,
};
