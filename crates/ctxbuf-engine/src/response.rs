use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use ctxbuf_utils::error::SelectError;

static WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<updateContextBuffer>([\s\S]*?)</updateContextBuffer>").unwrap());
static INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<includeFile path="(.*?)""#).unwrap());
static EXCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<excludeFile path="(.*?)""#).unwrap());

/// Include and exclude directives from one model response, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BufferUpdate {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl BufferUpdate {
    /// True when the wrapper carried no directives at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

/// Parse the first `<updateContextBuffer>` span of `response`.
///
/// Directives with malformed attributes do not match and are skipped.
///
/// # Errors
///
/// Returns `SelectError::MalformedResponse` when the wrapper is absent.
pub fn parse_response(response: &str) -> Result<BufferUpdate, SelectError> {
    let body = WRAPPER
        .captures(response)
        .and_then(|c| c.get(1))
        .ok_or(SelectError::MalformedResponse)?
        .as_str();

    let collect = |re: &Regex| -> Vec<String> {
        re.captures_iter(body)
            .map(|caps| caps[1].to_string())
            .collect()
    };

    Ok(BufferUpdate {
        includes: collect(&INCLUDE),
        excludes: collect(&EXCLUDE),
    })
}
