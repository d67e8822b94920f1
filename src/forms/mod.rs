//! Submitted forms and their validated payloads.

pub mod categories;
pub mod forums;
pub mod moves;
pub mod posts;
pub mod search;
pub mod threads;
pub mod votes;

/// Cleans submitted post markup down to the allowed tag set. Script and
/// style elements are dropped with their contents.
pub(crate) fn sanitize_content(raw: &str) -> String {
    ammonia::clean(raw.trim())
}

/// Thread titles are plain text: markup characters are escaped.
pub(crate) fn escape_title(raw: &str) -> String {
    html_escape::encode_safe(raw.trim()).into_owned()
}

/// Trim surrounding whitespace, mapping blank input to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
