use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while provisioning, diagnosing or healing repositories.
///
/// Failed policy checks are reported as [`crate::Assertion`] values and only become an
/// error when a run has to signal failure to its caller.
#[derive(Error, Debug)]
pub enum WardenError {
    /// A remote call failed. The run for the affected repository was aborted.
    #[error("GitHub operation failed: {0}")]
    GitHub(#[from] github_client::Error),

    #[error("Repository {repository} is not compliant after provisioning: {}", .failures.join("; "))]
    ComplianceFailed {
        repository: String,
        failures: Vec<String>,
    },

    #[error("Found {count} repositories with issues")]
    FleetNonCompliant { count: usize },

    /// The repository had no branches after waiting for GitHub to finish creating it.
    #[error("Repository {repository} was not ready after {attempts} attempts")]
    NotReady { repository: String, attempts: u32 },

    #[error("Failed to send notification: {0}")]
    Notification(String),
}

/// Convenience alias for results produced by this crate.
pub type WardenResult<T> = Result<T, WardenError>;
