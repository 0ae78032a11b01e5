//! Content rules applied to posts, comments and profiles before they reach the store.

use crate::domain::error::DomainError;

/// Maximum number of characters kept when an excerpt is derived from the body.
pub const EXCERPT_MAX_CHARS: usize = 200;

const EXCERPT_ELLIPSIS: &str = "...";

/// Reject values that are empty once surrounding whitespace is removed.
pub fn ensure_non_blank(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::blank(field));
    }
    Ok(())
}

/// Use the supplied excerpt when it carries text, otherwise derive one from the content.
pub fn resolve_excerpt(excerpt: Option<&str>, content: &str) -> String {
    match excerpt.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => derive_excerpt(content),
    }
}

/// First paragraph of `content`, cut to [`EXCERPT_MAX_CHARS`] characters.
pub fn derive_excerpt(content: &str) -> String {
    let first_paragraph = content.split("\n\n").next().unwrap_or_default();
    let mut chars = first_paragraph.chars();
    let mut excerpt: String = chars.by_ref().take(EXCERPT_MAX_CHARS).collect();
    if chars.next().is_some() {
        excerpt.push_str(EXCERPT_ELLIPSIS);
    }
    excerpt
}

/// Trim tags, drop blanks, and keep the first occurrence of each distinct tag.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() || normalized.iter().any(|existing| existing == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

/// Minimal shape check; the identity provider owns real address verification.
pub fn ensure_email(value: &str) -> Result<(), DomainError> {
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::invalid("email", "must look like name@domain")),
    }
}
