//! Repository domain types.
//!
//! This module contains the types representing GitHub repositories as returned by the
//! REST API, together with the payloads used to create and update them.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Reference to the template a repository was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRepository {
    /// The name of the template repository
    pub name: String,
    /// The full name of the template repository (owner/name)
    pub full_name: String,
}

/// Represents a GitHub repository.
///
/// This struct contains the repository settings that the compliance checks
/// inspect: visibility, feature toggles, merge strategies and template lineage.
/// Settings GitHub omits from a response are reported as `None`.
///
/// # Examples
///
/// ```rust
/// use github_client::Repository;
///
/// let repo = Repository::new(
///     "my-repo".to_string(),
///     "owner/my-repo".to_string(),
///     true
/// );
///
/// println!("Repository: {}", repo.name());
/// println!("Is private: {}", repo.is_private());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// The full name of the repository (owner/name)
    full_name: String,
    /// The name of the repository
    name: String,
    /// Whether the repository is private
    #[serde(default)]
    private: bool,
    /// Visibility reported by GitHub (`public`, `private` or `internal`)
    #[serde(default)]
    visibility: Option<String>,
    /// Homepage URL shown on the repository page
    #[serde(default)]
    homepage: Option<String>,
    /// Name of the default branch
    #[serde(default)]
    default_branch: Option<String>,
    /// Whether issues are enabled for this repository
    #[serde(default)]
    has_issues: Option<bool>,
    /// Whether the wiki is enabled for this repository
    #[serde(default)]
    has_wiki: Option<bool>,
    #[serde(default)]
    allow_squash_merge: Option<bool>,
    #[serde(default)]
    allow_merge_commit: Option<bool>,
    #[serde(default)]
    allow_rebase_merge: Option<bool>,
    #[serde(default)]
    allow_auto_merge: Option<bool>,
    #[serde(default)]
    delete_branch_on_merge: Option<bool>,
    /// The template this repository was generated from, if any
    #[serde(default)]
    template_repository: Option<TemplateRepository>,
}

impl Repository {
    /// Creates a new Repository instance with all optional settings unknown.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the repository
    /// * `full_name` - The full name including owner (owner/repo)
    /// * `private` - Whether the repository is private
    pub fn new(name: String, full_name: String, private: bool) -> Self {
        Self {
            full_name,
            name,
            private,
            visibility: None,
            homepage: None,
            default_branch: None,
            has_issues: None,
            has_wiki: None,
            allow_squash_merge: None,
            allow_merge_commit: None,
            allow_rebase_merge: None,
            allow_auto_merge: None,
            delete_branch_on_merge: None,
            template_repository: None,
        }
    }

    /// Returns the name of the repository.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full name of the repository (owner/name).
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns whether the repository is private.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Returns whether the repository is publicly visible.
    ///
    /// A repository counts as public when GitHub reports it as not private, or
    /// when its visibility is explicitly `public`.
    pub fn is_public(&self) -> bool {
        !self.private || self.visibility.as_deref() == Some("public")
    }

    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn default_branch(&self) -> Option<&str> {
        self.default_branch.as_deref()
    }

    /// Returns whether issues are enabled for this repository.
    ///
    /// `Some(true)` if issues are enabled, `Some(false)` if disabled, or `None` if unknown.
    pub fn has_issues(&self) -> Option<bool> {
        self.has_issues
    }

    pub fn has_wiki(&self) -> Option<bool> {
        self.has_wiki
    }

    pub fn allow_squash_merge(&self) -> Option<bool> {
        self.allow_squash_merge
    }

    pub fn allow_merge_commit(&self) -> Option<bool> {
        self.allow_merge_commit
    }

    pub fn allow_rebase_merge(&self) -> Option<bool> {
        self.allow_rebase_merge
    }

    pub fn allow_auto_merge(&self) -> Option<bool> {
        self.allow_auto_merge
    }

    pub fn delete_branch_on_merge(&self) -> Option<bool> {
        self.delete_branch_on_merge
    }

    /// Returns the template this repository was generated from, if any.
    pub fn template_repository(&self) -> Option<&TemplateRepository> {
        self.template_repository.as_ref()
    }
}

/// Represents the payload for creating a new repository in an organization.
/// Use `Default::default()` and modify fields as needed.
#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,

    /// Create an initial commit so the repository has a default branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_auto_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit_message: Option<String>,
}

/// Payload for generating a repository from a template repository.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplateRepositoryPayload {
    /// Organization or user that will own the new repository
    pub owner: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Copy every branch of the template instead of only the default branch
    pub include_all_branches: bool,
    pub private: bool,
}

/// Represents the settings that can be updated for a repository.
/// Use `Default::default()` and modify fields as needed; `None` fields are left untouched.
#[derive(Serialize, Default, Debug, Clone, PartialEq)]
pub struct RepositorySettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_auto_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_commit_message: Option<String>,
}
