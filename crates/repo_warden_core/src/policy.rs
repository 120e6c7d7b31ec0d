//! Desired state for repositories and their branches.
//!
//! Everything the compliance checks compare against, and everything the provisioning
//! and remediation flows apply, is derived from the types in this module. The values
//! are fixed: a repository is private, uses squash and merge commits only, deletes
//! merged branches and protects `main` and `dev` with review and signature rules.
//! Public repositories are frozen instead, see [`PublicBranchPolicy`].

use github_client::{
    AutolinkPayload, BranchProtectionUpdate, PullRequestReviewsUpdate, RepositoryCreatePayload,
    RepositorySettingsUpdate, RequiredStatusChecksUpdate, TemplateRepositoryPayload,
};

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// The branch releases are cut from.
pub const PRIMARY_BRANCH: &str = "main";

/// The integration branch created next to [`PRIMARY_BRANCH`].
pub const DEVELOPMENT_BRANCH: &str = "dev";

/// Homepage of repositories that are not generated from a template.
pub const DEFAULT_HOMEPAGE: &str = "https://defi.sucks/";

/// Team granted read access to every new repository.
pub const DEFAULT_TEAM: &str = "engineering";

/// Issue tracker URL prefix used for project autolinks.
pub const AUTOLINK_URL_PREFIX: &str = "https://linear.app/defi-wonderland/issue/";

/// Where the CODEOWNERS file is written.
pub const CODEOWNERS_PATH: &str = ".github/CODEOWNERS";

/// Where the pull request template is written.
pub const PULL_REQUEST_TEMPLATE_PATH: &str = ".github/pull_request_template.md";

const COMMIT_TITLE: &str = "PR_TITLE";
const COMMIT_MESSAGE: &str = "PR_BODY";

/// Identity of a template repository, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub owner: String,
    pub name: String,
}

impl TemplateRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Builds a template reference when both parts are non-empty.
    ///
    /// ```rust
    /// use repo_warden_core::TemplateRef;
    ///
    /// assert!(TemplateRef::from_parts("org", "template").is_some());
    /// assert!(TemplateRef::from_parts("org", "").is_none());
    /// ```
    pub fn from_parts(owner: &str, name: &str) -> Option<Self> {
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Desired settings of a repository.
///
/// Derived from the repository identity and the template it was generated from; two
/// policies built from the same inputs are always equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPolicy {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub has_projects: bool,
    pub allow_squash_merge: bool,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_auto_merge: bool,
    pub delete_branch_on_merge: bool,
    /// Expected homepage. Only repositories created without a template carry one.
    pub homepage: Option<String>,
    /// Template the repository must have been generated from, if any.
    pub template: Option<TemplateRef>,
}

impl RepositoryPolicy {
    pub fn new(
        owner: &str,
        name: &str,
        description: Option<&str>,
        template: Option<&TemplateRef>,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .map(str::to_string),
            private: true,
            has_issues: true,
            has_wiki: true,
            has_projects: true,
            allow_squash_merge: true,
            allow_merge_commit: true,
            allow_rebase_merge: false,
            allow_auto_merge: false,
            delete_branch_on_merge: true,
            homepage: match template {
                Some(_) => None,
                None => Some(DEFAULT_HOMEPAGE.to_string()),
            },
            template: template.cloned(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Payload creating a blank repository with an initial commit.
    pub fn create_payload(&self) -> RepositoryCreatePayload {
        RepositoryCreatePayload {
            name: self.name.clone(),
            description: self.description.clone(),
            homepage: self.homepage.clone(),
            private: Some(self.private),
            visibility: Some(self.visibility().to_string()),
            has_issues: Some(self.has_issues),
            has_projects: Some(self.has_projects),
            has_wiki: Some(self.has_wiki),
            is_template: Some(false),
            auto_init: Some(true),
            allow_squash_merge: Some(self.allow_squash_merge),
            allow_merge_commit: Some(self.allow_merge_commit),
            allow_rebase_merge: Some(self.allow_rebase_merge),
            allow_auto_merge: Some(self.allow_auto_merge),
            delete_branch_on_merge: Some(self.delete_branch_on_merge),
            squash_merge_commit_title: Some(COMMIT_TITLE.to_string()),
            squash_merge_commit_message: Some(COMMIT_MESSAGE.to_string()),
            merge_commit_title: Some(COMMIT_TITLE.to_string()),
            merge_commit_message: Some(COMMIT_MESSAGE.to_string()),
        }
    }

    /// Payload generating the repository from its template. `None` without a template.
    pub fn template_payload(&self) -> Option<TemplateRepositoryPayload> {
        self.template.as_ref().map(|_| TemplateRepositoryPayload {
            owner: self.owner.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            include_all_branches: false,
            private: self.private,
        })
    }

    /// Settings applied to an existing repository to bring it in line with the policy.
    pub fn settings_update(&self) -> RepositorySettingsUpdate {
        RepositorySettingsUpdate {
            description: self.description.clone(),
            homepage: self.homepage.clone(),
            private: Some(self.private),
            has_issues: Some(self.has_issues),
            has_projects: Some(self.has_projects),
            has_wiki: Some(self.has_wiki),
            allow_squash_merge: Some(self.allow_squash_merge),
            allow_merge_commit: Some(self.allow_merge_commit),
            allow_rebase_merge: Some(self.allow_rebase_merge),
            allow_auto_merge: Some(self.allow_auto_merge),
            delete_branch_on_merge: Some(self.delete_branch_on_merge),
            squash_merge_commit_title: Some(COMMIT_TITLE.to_string()),
            squash_merge_commit_message: Some(COMMIT_MESSAGE.to_string()),
            merge_commit_title: Some(COMMIT_TITLE.to_string()),
            merge_commit_message: Some(COMMIT_MESSAGE.to_string()),
        }
    }

    fn visibility(&self) -> &'static str {
        if self.private {
            "private"
        } else {
            "public"
        }
    }
}

/// Desired protection of a branch in a private repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchPolicy {
    pub required_approving_review_count: u32,
    pub require_code_owner_reviews: bool,
    pub require_last_push_approval: bool,
    pub dismiss_stale_reviews: bool,
    pub enforce_admins: bool,
    pub strict_status_checks: bool,
    /// Whether pushes are restricted to specific users or teams.
    pub restrict_pushes: bool,
    pub allow_force_pushes: bool,
    pub allow_deletions: bool,
    pub lock_branch: bool,
    pub require_signatures: bool,
}

impl BranchPolicy {
    /// Policy of the primary branch (`is_primary == true`) or of any other branch.
    pub fn for_primary(is_primary: bool) -> Self {
        Self {
            required_approving_review_count: if is_primary { 2 } else { 1 },
            require_code_owner_reviews: is_primary,
            require_last_push_approval: true,
            dismiss_stale_reviews: true,
            enforce_admins: true,
            strict_status_checks: true,
            restrict_pushes: false,
            allow_force_pushes: false,
            allow_deletions: false,
            lock_branch: false,
            require_signatures: true,
        }
    }

    /// Policy of the branch called `branch`.
    ///
    /// ```rust
    /// use repo_warden_core::BranchPolicy;
    ///
    /// assert_eq!(BranchPolicy::for_branch("main").required_approving_review_count, 2);
    /// assert_eq!(BranchPolicy::for_branch("dev").required_approving_review_count, 1);
    /// ```
    pub fn for_branch(branch: &str) -> Self {
        Self::for_primary(branch == PRIMARY_BRANCH)
    }

    /// Protection payload enforcing this policy. Signatures are required separately.
    pub fn protection_update(&self) -> BranchProtectionUpdate {
        BranchProtectionUpdate {
            required_status_checks: Some(RequiredStatusChecksUpdate {
                strict: self.strict_status_checks,
                contexts: vec![],
            }),
            enforce_admins: Some(self.enforce_admins),
            required_pull_request_reviews: Some(PullRequestReviewsUpdate {
                dismiss_stale_reviews: self.dismiss_stale_reviews,
                require_code_owner_reviews: self.require_code_owner_reviews,
                required_approving_review_count: self.required_approving_review_count,
                require_last_push_approval: self.require_last_push_approval,
            }),
            restrictions: None,
            allow_force_pushes: Some(self.allow_force_pushes),
            allow_deletions: Some(self.allow_deletions),
            lock_branch: Some(self.lock_branch),
        }
    }
}

/// Desired protection of a branch in a public repository: locked, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicBranchPolicy {
    pub lock_branch: bool,
}

impl PublicBranchPolicy {
    pub fn new() -> Self {
        Self { lock_branch: true }
    }

    pub fn protection_update(&self) -> BranchProtectionUpdate {
        BranchProtectionUpdate {
            lock_branch: Some(self.lock_branch),
            ..Default::default()
        }
    }
}

impl Default for PublicBranchPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of the default code owner, `@owner/team`.
pub fn default_code_owner(owner: &str, team: &str) -> String {
    format!("@{}/{}", owner, team)
}

/// Whether `code_owner` is a single `@user` or `@org/team` reference.
pub fn is_valid_code_owner(code_owner: &str) -> bool {
    let Some(name) = code_owner.strip_prefix('@') else {
        return false;
    };
    let is_name = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match name.split_once('/') {
        Some((org, team)) => is_name(org) && is_name(team),
        None => is_name(name),
    }
}

/// Contents of the CODEOWNERS file assigning every path to `code_owner`.
pub fn codeowners_content(code_owner: &str) -> String {
    format!("* {}\n", code_owner)
}

/// Autolink turning `<CODE>-123` references into issue tracker links.
pub fn autolink_payload(project_code: &str) -> AutolinkPayload {
    let key_prefix = format!("{}-", project_code.to_uppercase());
    AutolinkPayload {
        url_template: format!("{}{}<num>", AUTOLINK_URL_PREFIX, key_prefix),
        key_prefix,
        is_alphanumeric: true,
    }
}

/// Pull request template asking authors to link the tracker issue of the project.
pub fn pull_request_template(project_code: &str) -> String {
    format!(
        "# 🤖 Linear\n\nCloses {}-XXX\n\n# 📝 Description\n\n<!-- What does this pull request change, and why? -->\n",
        project_code.to_uppercase()
    )
}
