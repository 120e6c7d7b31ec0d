//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when interacting with the GitHub API
//! through the github_client crate. Every failed remote call is mapped onto one of these
//! variants so callers can tell an authorization problem from a missing resource or a
//! rate limit without inspecting HTTP details.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// This enum represents all possible error conditions when working with the GitHub API,
/// including authentication failures, missing resources, rate limiting, payload
/// validation failures and data processing issues.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.get_repository("my-org", "my-repo").await {
///     Ok(repo) => println!("Repository found: {}", repo.name()),
///     Err(Error::NotFound) => eprintln!("Repository does not exist"),
///     Err(Error::RateLimitExceeded) => eprintln!("Rate limit exceeded, retry later"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A generic API request failure.
    ///
    /// This error occurs when a GitHub API request fails for reasons that do not
    /// fit any of the more specific variants, e.g. a server error.
    #[error("API request failed")]
    ApiError(),

    /// Authentication, authorization or GitHub client initialization failure.
    ///
    /// This error occurs when:
    /// - The token or GitHub App credentials are invalid or expired
    /// - The credentials lack the permissions required by the request
    /// - The client could not be built from the supplied credentials
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The GitHub API returned a response in an unexpected format.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The requested resource was not found.
    ///
    /// This error occurs when a GitHub API request returns a 404 status code,
    /// indicating that the requested resource (repository, branch, protection rule,
    /// file) does not exist or is not visible with the current authentication.
    #[error("Resource not found")]
    NotFound,

    /// GitHub API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// GitHub rejected the request payload.
    ///
    /// Returned for 422 responses, e.g. when creating a repository whose name is
    /// already taken or a ref that already exists.
    #[error("Request validation failed: {0}")]
    Validation(String),
}
