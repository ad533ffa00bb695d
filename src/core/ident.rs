//! Handle normalization and content id extraction

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::VerifyError;
use crate::CACHE_KEY_PREFIX;

lazy_static! {
    /// `.../status/<digits>` in a post URL
    static ref RE_STATUS_ID: Regex = Regex::new(r"status/(\d+)").unwrap();
}

/// Lowercase a handle and strip one leading `@`
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    trimmed
        .strip_prefix('@')
        .unwrap_or(trimmed)
        .to_lowercase()
}

/// Case-insensitive, `@`-insensitive handle comparison
pub fn same_handle(a: &str, b: &str) -> bool {
    normalize_handle(a) == normalize_handle(b)
}

/// Extract the numeric post id from a post URL
pub fn extract_content_id(url: &str) -> Result<String, VerifyError> {
    RE_STATUS_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| VerifyError::Input(format!("content URL has no status id: {}", url)))
}

/// Cache key for a target account's follower list
pub fn cache_key(target_account: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, normalize_handle(target_account))
}
