//! User and collaborator domain types.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;

/// Repository permissions held by a collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollaboratorPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Represents a collaborator on a repository.
///
/// # Examples
///
/// ```rust
/// use github_client::{Collaborator, CollaboratorPermissions};
///
/// let collaborator = Collaborator {
///     login: "octocat".to_string(),
///     permissions: CollaboratorPermissions { admin: true, ..Default::default() },
/// };
///
/// assert!(collaborator.permissions.admin);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Collaborator {
    /// The login name of the user
    pub login: String,
    #[serde(default)]
    pub permissions: CollaboratorPermissions,
}

/// Payload for adding a collaborator or granting a team access to a repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PermissionPayload {
    /// One of `pull`, `triage`, `push`, `maintain` or `admin`
    pub permission: String,
}
