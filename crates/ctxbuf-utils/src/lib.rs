//! Foundation crate for ctxbuf: shared file and chat types, the error
//! taxonomy, exit codes, log redaction and tracing setup.

pub mod chat;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
