use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the Repo Warden CLI application.
///
/// Configuration errors are raised before any remote call is made. The remaining
/// variants wrap failures of the command that was run.
#[derive(Error, Debug)]
pub enum Error {
    /// Creating an authenticated GitHub client failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A required environment variable is missing or has an invalid value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The command failed or found a non-compliant repository.
    #[error(transparent)]
    Warden(#[from] repo_warden_core::WardenError),

    /// The doctor could not repair every issue of the repository.
    #[error("Repository {repository} still has {issues} issues after repair")]
    StillSick { repository: String, issues: usize },
}

impl Error {
    /// Process exit code for this error: `2` for setup problems, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) | Error::Config(_) => 2,
            Error::Warden(_) | Error::StillSick { .. } => 1,
        }
    }
}
