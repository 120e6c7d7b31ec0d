//! Branch and Git reference domain types.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;

/// The commit a branch points at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// A branch as listed by `GET /repos/{owner}/{repo}/branches`.
///
/// # Examples
///
/// ```rust
/// use github_client::{Branch, BranchCommit};
///
/// let branch = Branch {
///     name: "main".to_string(),
///     commit: BranchCommit { sha: "6dcb09b".to_string() },
///     protected: true,
/// };
/// assert!(branch.protected);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub commit: BranchCommit,
    /// Whether any branch protection rule applies to this branch
    #[serde(default)]
    pub protected: bool,
}

/// The object a Git reference points at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub object_type: String,
}

/// A Git reference such as `refs/heads/main`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub object: GitObject,
}

/// Payload for `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefCreatePayload {
    /// Fully qualified reference name, e.g. `refs/heads/dev`
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: String,
}

impl RefCreatePayload {
    /// Builds the payload for creating branch `branch` at commit `sha`.
    pub fn branch(branch: &str, sha: &str) -> Self {
        Self {
            reference: format!("refs/heads/{}", branch),
            sha: sha.to_string(),
        }
    }
}

/// Payload for `POST /repos/{owner}/{repo}/branches/{branch}/rename`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BranchRenamePayload {
    pub new_name: String,
}
