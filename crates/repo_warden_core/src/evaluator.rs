//! Compliance checks comparing observed repository state with the policy.
//!
//! The [`ComplianceEvaluator`] only reads remote state. Each evaluation fetches what it
//! needs once and turns it into an ordered list of [`Assertion`]s. Any failed remote
//! call is returned as an error: a repository that could not be inspected is never
//! reported as compliant or non-compliant.

use std::sync::Arc;

use github_client::{
    Branch, BranchProtection, Collaborator, Repository, RepositoryClient, SignatureProtection,
};
use tracing::{debug, instrument};

use crate::{
    Assertion, BranchPolicy, PublicBranchPolicy, RepoDiagnosis, RepositoryPolicy, TemplateRef,
    WardenResult, DEVELOPMENT_BRANCH, PRIMARY_BRANCH,
};

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;

/// Evaluates repositories and branches against the policy.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use github_client::{create_token_client, GitHubClient};
/// use repo_warden_core::ComplianceEvaluator;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GitHubClient::new(create_token_client("ghp_...")?);
/// let evaluator = ComplianceEvaluator::new(Arc::new(client));
///
/// let diagnosis = evaluator.diagnose("my-org", "my-repo").await?;
/// for issue in diagnosis.issues() {
///     println!("{}", issue.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ComplianceEvaluator {
    client: Arc<dyn RepositoryClient>,
}

impl ComplianceEvaluator {
    pub fn new(client: Arc<dyn RepositoryClient>) -> Self {
        Self { client }
    }

    /// Checks the repository level settings.
    ///
    /// The repository is fetched once. With `is_new_repo` set and an `admin` given, the
    /// collaborators are fetched as well and `admin` must hold the admin role.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::GitHub` if the repository or its collaborators cannot be read.
    #[instrument(skip(self, template), fields(owner = %owner, repo = %repo))]
    pub async fn evaluate_repository(
        &self,
        owner: &str,
        repo: &str,
        template: Option<&TemplateRef>,
        admin: Option<&str>,
        is_new_repo: bool,
    ) -> WardenResult<Vec<Assertion>> {
        let policy = RepositoryPolicy::new(owner, repo, None, template);
        let repository = self.client.get_repository(owner, repo).await?;

        let mut assertions = repository_assertions(&policy, &repository);
        if is_new_repo {
            if let Some(admin) = admin {
                assertions.push(self.admin_assertion(owner, repo, admin).await?);
            }
        }

        Ok(assertions)
    }

    /// Checks one branch of a private repository against [`BranchPolicy::for_branch`].
    ///
    /// A missing or unprotected branch yields a single failing assertion and nothing
    /// beyond the branch list is fetched.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    pub async fn evaluate_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> WardenResult<Vec<Assertion>> {
        let branches = self.client.list_branches(owner, repo).await?;
        self.branch_assertions(owner, repo, branch, &branches).await
    }

    /// Checks one branch of a public repository against [`PublicBranchPolicy`].
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    pub async fn evaluate_public_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> WardenResult<Vec<Assertion>> {
        let branches = self.client.list_branches(owner, repo).await?;
        self.public_branch_assertions(owner, repo, branch, &branches)
            .await
    }

    /// Runs the recurring health check of a repository.
    ///
    /// Public repositories only have each of their branches checked for the lock.
    /// Private repositories get the repository checks plus `main` and `dev` under the
    /// standard branch policy. Visibility is read once, so exactly one of the two paths
    /// runs.
    pub async fn evaluate_fleet_health(
        &self,
        owner: &str,
        repo: &str,
    ) -> WardenResult<Vec<Assertion>> {
        self.evaluate_fleet_health_with_admin(owner, repo, None)
            .await
    }

    /// Like [`Self::evaluate_fleet_health`], additionally checking that `admin` holds
    /// the admin role on private repositories.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn evaluate_fleet_health_with_admin(
        &self,
        owner: &str,
        repo: &str,
        admin: Option<&str>,
    ) -> WardenResult<Vec<Assertion>> {
        let repository = self.client.get_repository(owner, repo).await?;
        let mut assertions = Vec::new();

        if repository.is_public() {
            debug!("Repository is public, checking branch locks");
            let branches = self.client.list_branches(owner, repo).await?;
            for branch in &branches {
                assertions.extend(
                    self.public_branch_assertions(owner, repo, &branch.name, &branches)
                        .await?,
                );
            }
        } else {
            debug!("Repository is private, checking full governance");
            let policy = RepositoryPolicy::new(owner, repo, None, None);
            assertions.extend(repository_assertions(&policy, &repository));
            if let Some(admin) = admin {
                assertions.push(self.admin_assertion(owner, repo, admin).await?);
            }

            let branches = self.client.list_branches(owner, repo).await?;
            for branch in [PRIMARY_BRANCH, DEVELOPMENT_BRANCH] {
                assertions.extend(
                    self.branch_assertions(owner, repo, branch, &branches)
                        .await?,
                );
            }
        }

        debug!(
            assertions = assertions.len(),
            failing = assertions.iter().filter(|a| !a.satisfied).count(),
            "Evaluated repository health"
        );
        Ok(assertions)
    }

    /// Runs [`Self::evaluate_fleet_health`] and wraps the result.
    pub async fn diagnose(&self, owner: &str, repo: &str) -> WardenResult<RepoDiagnosis> {
        let assertions = self.evaluate_fleet_health(owner, repo).await?;
        Ok(RepoDiagnosis::new(repo, assertions))
    }

    async fn admin_assertion(
        &self,
        owner: &str,
        repo: &str,
        admin: &str,
    ) -> WardenResult<Assertion> {
        let collaborators = self.client.list_collaborators(owner, repo).await?;
        Ok(admin_assertion(repo, admin, &collaborators))
    }

    async fn branch_assertions(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        branches: &[Branch],
    ) -> WardenResult<Vec<Assertion>> {
        if let Some(failure) = existence_failure(repo, branch, branches) {
            return Ok(vec![failure]);
        }

        let protection = self
            .client
            .get_branch_protection(owner, repo, branch)
            .await?;
        let signatures = self
            .client
            .get_commit_signature_protection(owner, repo, branch)
            .await?;

        Ok(protection_assertions(
            repo,
            branch,
            &BranchPolicy::for_branch(branch),
            &protection,
            &signatures,
        ))
    }

    async fn public_branch_assertions(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        branches: &[Branch],
    ) -> WardenResult<Vec<Assertion>> {
        if let Some(failure) = existence_failure(repo, branch, branches) {
            return Ok(vec![failure]);
        }

        let protection = self
            .client
            .get_branch_protection(owner, repo, branch)
            .await?;
        let policy = PublicBranchPolicy::new();

        Ok(vec![Assertion::check(
            enabled(&protection.lock_branch) == policy.lock_branch,
            format!("Branch {} of {} is not locked", branch, repo),
        )])
    }
}

/// The failing assertion for a branch that is missing or unprotected, if it is.
fn existence_failure(repo: &str, branch: &str, branches: &[Branch]) -> Option<Assertion> {
    match branches.iter().find(|b| b.name == branch) {
        None => Some(Assertion::failed(format!(
            "Branch {} does not exist in {}",
            branch, repo
        ))),
        Some(b) if !b.protected => Some(Assertion::failed(format!(
            "Branch {} of {} is not protected",
            branch, repo
        ))),
        Some(_) => None,
    }
}

fn repository_assertions(policy: &RepositoryPolicy, repository: &Repository) -> Vec<Assertion> {
    let repo = policy.name.as_str();
    let mut assertions = vec![
        Assertion::check(
            repository
                .full_name()
                .eq_ignore_ascii_case(&policy.full_name()),
            format!("Repo {} does not exist in {}", repo, policy.owner),
        ),
        Assertion::check(
            repository.has_issues() == Some(policy.has_issues),
            format!("Repo {} does not have issues enabled", repo),
        ),
    ];

    match &policy.template {
        Some(template) => assertions.push(Assertion::check(
            repository
                .template_repository()
                .is_some_and(|t| t.full_name.eq_ignore_ascii_case(&template.full_name())),
            format!(
                "Repo {} is not generated from the {} template",
                repo,
                template.full_name()
            ),
        )),
        None => {
            let expected = policy.homepage.as_deref().unwrap_or_default();
            assertions.push(Assertion::check(
                repository.homepage() == policy.homepage.as_deref(),
                format!("Repo {} homepage is not {}", repo, expected),
            ));
        }
    }

    assertions.extend([
        Assertion::check(
            repository.is_public() != policy.private,
            format!("Repo {} is public", repo),
        ),
        Assertion::check(
            repository.allow_squash_merge() == Some(policy.allow_squash_merge),
            format!("Repo {} does not allow squash merge", repo),
        ),
        Assertion::check(
            repository.allow_merge_commit() == Some(policy.allow_merge_commit),
            format!("Repo {} does not allow merge commit", repo),
        ),
        Assertion::check(
            repository.allow_rebase_merge() == Some(policy.allow_rebase_merge),
            format!("Repo {} allows rebase merge", repo),
        ),
        Assertion::check(
            repository.allow_auto_merge() == Some(policy.allow_auto_merge),
            format!("Repo {} allows auto merge", repo),
        ),
        Assertion::check(
            repository.delete_branch_on_merge() == Some(policy.delete_branch_on_merge),
            format!("Repo {} does not delete branch on merge", repo),
        ),
    ]);

    assertions
}

fn admin_assertion(repo: &str, admin: &str, collaborators: &[Collaborator]) -> Assertion {
    Assertion::check(
        collaborators
            .iter()
            .any(|c| c.login.eq_ignore_ascii_case(admin) && c.permissions.admin),
        format!("{} does not have admin role for {}", admin, repo),
    )
}

fn protection_assertions(
    repo: &str,
    branch: &str,
    policy: &BranchPolicy,
    protection: &BranchProtection,
    signatures: &SignatureProtection,
) -> Vec<Assertion> {
    let reviews = protection
        .required_pull_request_reviews
        .clone()
        .unwrap_or_default();
    let strict = protection
        .required_status_checks
        .as_ref()
        .is_some_and(|c| c.strict);

    let mut assertions = vec![Assertion::check(
        reviews.required_approving_review_count == policy.required_approving_review_count,
        format!(
            "Repo {} does not have the required {} reviews for {} branch",
            repo, policy.required_approving_review_count, branch
        ),
    )];

    if policy.require_code_owner_reviews {
        assertions.push(Assertion::check(
            reviews.require_code_owner_reviews,
            format!(
                "Repo {} does not have require code owner reviews enabled for {} branch",
                repo, branch
            ),
        ));
    }

    assertions.extend([
        Assertion::check(
            reviews.require_last_push_approval == policy.require_last_push_approval,
            format!(
                "Repo {} does not have require last push approval enabled for {} branch",
                repo, branch
            ),
        ),
        Assertion::check(
            reviews.dismiss_stale_reviews == policy.dismiss_stale_reviews,
            format!(
                "Repo {} does not have dismiss stale reviews enabled for {} branch",
                repo, branch
            ),
        ),
        Assertion::check(
            enabled(&protection.enforce_admins) == policy.enforce_admins,
            format!(
                "Repo {} does not have admin cannot bypass checks enabled for {} branch",
                repo, branch
            ),
        ),
        Assertion::check(
            strict == policy.strict_status_checks,
            format!(
                "Repo {} does not have require status checks enabled for {} branch",
                repo, branch
            ),
        ),
        Assertion::check(
            protection.restrictions.is_some() == policy.restrict_pushes,
            format!(
                "Repo {} has restrictions enabled for {} branch",
                repo, branch
            ),
        ),
        Assertion::check(
            enabled(&protection.allow_force_pushes) == policy.allow_force_pushes,
            format!("Repo {} allows force pushes for {} branch", repo, branch),
        ),
        Assertion::check(
            enabled(&protection.allow_deletions) == policy.allow_deletions,
            format!("Repo {} allows deletions for {} branch", repo, branch),
        ),
        Assertion::check(
            enabled(&protection.lock_branch) == policy.lock_branch,
            format!("Repo {} locks branch for {} branch", repo, branch),
        ),
        Assertion::check(
            signatures.enabled == policy.require_signatures,
            format!(
                "Repo {} does not have commit signature protection enabled for {} branch",
                repo, branch
            ),
        ),
    ]);

    assertions
}

fn enabled(toggle: &Option<github_client::ProtectionToggle>) -> bool {
    toggle.is_some_and(|t| t.enabled)
}
