//! Logging and observability helpers for ctxbuf
//!
//! Structured logging goes through `tracing`. The CLI installs a subscriber
//! with [`init_tracing`]; library code only emits events and spans.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Colored output only when stdout is a TTY and `NO_COLOR` is unset.
fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs ctxbuf crates at
/// debug and emits span close events with timings; the default is a compact
/// info-level format without targets.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("ctxbuf=debug,info")
            } else {
                EnvFilter::try_new("ctxbuf=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one context-selection call.
pub fn selection_span(provider: &str, model: &str, candidate_files: usize) -> tracing::Span {
    span!(
        Level::INFO,
        "context_selection",
        provider = %provider,
        model = %model,
        candidate_files = candidate_files,
    )
}

/// Span wrapping one folder import.
pub fn import_span(folder: &str, file_count: usize) -> tracing::Span {
    span!(
        Level::INFO,
        "folder_import",
        folder = %folder,
        file_count = file_count,
    )
}

pub fn log_selection_complete(selected: usize, outcome: &str, duration_ms: u128) {
    info!(
        selected = selected,
        outcome = %outcome,
        duration_ms = %duration_ms,
        "Context selection completed"
    );
}

/// Log a failed selection. The error text is redacted first.
pub fn log_selection_error(error: &str, duration_ms: u128) {
    let sanitized = redact_error_message(error);
    error!(
        duration_ms = %duration_ms,
        error = %sanitized,
        "Context selection failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_can_be_entered_without_subscriber() {
        let span = selection_span("AnythingLLM", "default", 3);
        let _guard = span.enter();
        log_selection_complete(2, "updated", 15);
        log_selection_error("https://u:p@host failed", 3);
    }

    #[test]
    fn test_init_tracing_twice_reports_error() {
        // The global subscriber can only be set once per process.
        let first = init_tracing(false);
        let second = init_tracing(true);
        assert!(first.is_ok() || second.is_err());
        assert!(second.is_err());
    }
}
