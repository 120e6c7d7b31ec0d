//! Repository contents and autolink domain types.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "contents_tests.rs"]
mod tests;

/// Payload for `PUT /repos/{owner}/{repo}/contents/{path}` when creating a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileWritePayload {
    /// Commit message
    pub message: String,
    /// Base64 encoded file content
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl FileWritePayload {
    /// Creates a payload for the given plain text content, base64 encoding it.
    pub fn new(message: &str, content: &str) -> Self {
        Self {
            message: message.to_string(),
            content: STANDARD.encode(content.as_bytes()),
            branch: None,
        }
    }
}

/// Payload for `POST /repos/{owner}/{repo}/autolinks`.
///
/// An autolink turns references such as `ABC-123` in issues, pull requests and
/// commits into links to an external issue tracker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AutolinkPayload {
    /// Prefix that triggers the link, e.g. `ABC-`
    pub key_prefix: String,
    /// Target URL containing `<num>` where the reference number is substituted
    pub url_template: String,
    pub is_alphanumeric: bool,
}

/// An autolink as returned by GitHub.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Autolink {
    #[serde(default)]
    pub id: u64,
    pub key_prefix: String,
    pub url_template: String,
}
