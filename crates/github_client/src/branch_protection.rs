//! Branch protection domain types.
//!
//! This module contains types representing GitHub branch protection rules, both as
//! reported by the API (`BranchProtection`) and as submitted when protecting a branch
//! (`BranchProtectionUpdate`). The two shapes differ: GitHub reports toggles as
//! `{ "enabled": bool }` objects but accepts plain booleans when updating.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// A protection toggle as reported by GitHub, e.g. `"allow_force_pushes": { "enabled": false }`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectionToggle {
    pub enabled: bool,
}

impl ProtectionToggle {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Status check requirements of a protected branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredStatusChecks {
    /// Whether the branch must be up to date before merging
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// Pull request review requirements of a protected branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredPullRequestReviews {
    /// Required number of approving reviews before merging
    #[serde(default)]
    pub required_approving_review_count: u32,
    /// Whether code owner reviews are required
    #[serde(default)]
    pub require_code_owner_reviews: bool,
    /// Whether the most recent push must be approved by someone other than the pusher
    #[serde(default)]
    pub require_last_push_approval: bool,
    /// Whether stale reviews are dismissed when new commits are pushed
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
}

/// Branch protection rules for a repository branch, as reported by GitHub.
///
/// Sections GitHub omits (because the rule is disabled) deserialize to `None`.
///
/// # Examples
///
/// ```rust
/// use github_client::{BranchProtection, ProtectionToggle};
///
/// let protection = BranchProtection {
///     lock_branch: Some(ProtectionToggle::new(true)),
///     ..Default::default()
/// };
/// assert!(protection.lock_branch.map(|t| t.enabled).unwrap_or(false));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BranchProtection {
    #[serde(default)]
    pub required_status_checks: Option<RequiredStatusChecks>,
    #[serde(default)]
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
    #[serde(default)]
    pub enforce_admins: Option<ProtectionToggle>,
    /// Users, teams and apps allowed to push; `None` means no push restrictions
    #[serde(default)]
    pub restrictions: Option<serde_json::Value>,
    #[serde(default)]
    pub allow_force_pushes: Option<ProtectionToggle>,
    #[serde(default)]
    pub allow_deletions: Option<ProtectionToggle>,
    #[serde(default)]
    pub lock_branch: Option<ProtectionToggle>,
    #[serde(default)]
    pub required_signatures: Option<ProtectionToggle>,
}

/// Commit signature protection state of a branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignatureProtection {
    pub enabled: bool,
}

/// Status check requirements submitted when protecting a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RequiredStatusChecksUpdate {
    pub strict: bool,
    pub contexts: Vec<String>,
}

/// Review requirements submitted when protecting a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestReviewsUpdate {
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
    pub require_last_push_approval: bool,
}

/// Push restrictions submitted when protecting a branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PushRestrictionsUpdate {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

/// Payload for `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// GitHub requires the first four sections to be present; `None` is serialized as
/// `null`, which disables that rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BranchProtectionUpdate {
    pub required_status_checks: Option<RequiredStatusChecksUpdate>,
    pub enforce_admins: Option<bool>,
    pub required_pull_request_reviews: Option<PullRequestReviewsUpdate>,
    pub restrictions: Option<PushRestrictionsUpdate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_branch: Option<bool>,
}
