//! # Repo Warden Core
//!
//! This crate holds the policy compliance engine of Repo Warden, a tool that creates
//! GitHub repositories in a known good state and keeps them there.
//!
//! ## Overview
//!
//! - [`policy`]: the desired state of repositories and branches.
//! - [`ComplianceEvaluator`]: read-only checks producing ordered [`Assertion`]s.
//! - [`Provisioner`]: creates a repository and applies the full policy to it.
//! - [`Doctor`]: diagnoses one repository, repairs it and diagnoses again.
//! - [`HealthCheck`]: diagnoses every repository of an organization and reports the
//!   ones with issues.
//!
//! All remote access goes through [`github_client::RepositoryClient`] and all human
//! facing output through a [`NotificationSink`].
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use github_client::{create_token_client, GitHubClient};
//! use repo_warden_core::{Doctor, LogOnlyNotifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(GitHubClient::new(create_token_client("ghp_...")?));
//! let doctor = Doctor::new(client, Arc::new(LogOnlyNotifier));
//!
//! let outcome = doctor.run("my-org", "my-repo", "octocat").await?;
//! if !outcome.is_success() {
//!     eprintln!("my-repo still needs attention");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Failed policy checks are data: they are returned as unsatisfied assertions. Errors
//! ([`WardenError`]) are reserved for failed remote calls and for runs that must
//! report failure to their caller.

mod assertion;
pub use assertion::{Assertion, RepoDiagnosis};

pub mod doctor;
pub use doctor::{Doctor, DoctorOutcome};

mod errors;
pub use errors::{WardenError, WardenResult};

mod evaluator;
pub use evaluator::ComplianceEvaluator;

pub mod health_check;
pub use health_check::{FleetReport, HealthCheck};

pub mod notifications;
pub use notifications::{
    chunk_messages, notify, DiscordNotifier, LogOnlyNotifier, NotificationSink,
    MAX_MESSAGE_LENGTH,
};

pub mod policy;
pub use policy::{
    autolink_payload, codeowners_content, default_code_owner, is_valid_code_owner,
    pull_request_template, BranchPolicy, PublicBranchPolicy, RepositoryPolicy, TemplateRef,
    AUTOLINK_URL_PREFIX, CODEOWNERS_PATH, DEFAULT_HOMEPAGE, DEFAULT_TEAM, DEVELOPMENT_BRANCH,
    PRIMARY_BRANCH, PULL_REQUEST_TEMPLATE_PATH,
};

pub mod provisioning;
pub use provisioning::{
    normalize_repository_name, Provisioner, ProvisioningOptions, ProvisioningRequest,
};

#[cfg(test)]
mod test_support;
