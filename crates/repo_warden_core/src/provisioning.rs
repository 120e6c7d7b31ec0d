//! One-time setup of new repositories.
//!
//! [`Provisioner::provision`] creates a repository and walks it to the fully compliant
//! state without diagnosing first; the desired state is known up front. The order of
//! the steps matters: protection can only be applied once both `main` and `dev`
//! exist, and signatures can only be required on a protected branch. The run ends
//! with a compliance check of the result.

use std::sync::Arc;
use std::time::Duration;

use github_client::{Branch, RefCreatePayload, Repository, RepositoryClient};
use tracing::{debug, info, instrument, warn};

use crate::{
    autolink_payload, codeowners_content, default_code_owner, pull_request_template,
    BranchPolicy, ComplianceEvaluator, RepoDiagnosis, RepositoryPolicy, TemplateRef,
    WardenError, WardenResult, CODEOWNERS_PATH, DEFAULT_TEAM, DEVELOPMENT_BRANCH,
    PRIMARY_BRANCH, PULL_REQUEST_TEMPLATE_PATH,
};

#[cfg(test)]
#[path = "provisioning_tests.rs"]
mod tests;

/// Replaces the spaces in a requested repository name with dashes.
pub fn normalize_repository_name(name: &str) -> String {
    name.trim().replace(' ', "-")
}

/// What to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    /// User granted the admin role on the new repository.
    pub admin: String,
    pub template: Option<TemplateRef>,
    /// Issue tracker project code. Enables the autolink and the pull request template.
    pub project_code: Option<String>,
    /// CODEOWNERS owner, defaults to the default team of the organization.
    pub code_owner: Option<String>,
    pub default_team: String,
}

impl ProvisioningRequest {
    pub fn new(owner: &str, name: &str, admin: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: normalize_repository_name(name),
            description: None,
            admin: admin.to_string(),
            template: None,
            project_code: None,
            code_owner: None,
            default_team: DEFAULT_TEAM.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Timing of the wait for GitHub to finish creating a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningOptions {
    /// Pause between two looks at the branch list.
    pub settle_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ProvisioningOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
            max_attempts: 12,
        }
    }
}

/// Creates repositories and applies the full policy to them.
pub struct Provisioner {
    client: Arc<dyn RepositoryClient>,
    evaluator: ComplianceEvaluator,
    options: ProvisioningOptions,
}

impl Provisioner {
    pub fn new(client: Arc<dyn RepositoryClient>) -> Self {
        Self::with_options(client, ProvisioningOptions::default())
    }

    pub fn with_options(client: Arc<dyn RepositoryClient>, options: ProvisioningOptions) -> Self {
        Self {
            evaluator: ComplianceEvaluator::new(client.clone()),
            client,
            options,
        }
    }

    /// Creates the repository described by `request` and brings it into compliance.
    ///
    /// # Errors
    ///
    /// * `WardenError::GitHub` if any step fails; the remaining steps are skipped.
    /// * `WardenError::NotReady` if the repository has no branch after waiting.
    /// * `WardenError::ComplianceFailed` if the final check finds violations.
    #[instrument(skip(self, request), fields(owner = %request.owner, repo = %request.name))]
    pub async fn provision(&self, request: &ProvisioningRequest) -> WardenResult<RepoDiagnosis> {
        let owner = request.owner.as_str();
        let repo = request.name.as_str();
        let policy = RepositoryPolicy::new(
            owner,
            repo,
            request.description.as_deref(),
            request.template.as_ref(),
        );

        let created = self.create(&policy).await?;
        let branches = self.wait_for_branches(owner, repo).await?;

        ensure_primary_branch(
            self.client.as_ref(),
            owner,
            repo,
            &branches,
            created.default_branch(),
        )
        .await?;

        self.bootstrap_files(request).await?;

        self.client
            .add_collaborator(owner, repo, &request.admin, "admin")
            .await?;
        self.client
            .add_team_access(owner, &request.default_team, owner, repo, "pull")
            .await?;

        let branches = self.client.list_branches(owner, repo).await?;
        ensure_branch_from(
            self.client.as_ref(),
            owner,
            repo,
            &branches,
            DEVELOPMENT_BRANCH,
            PRIMARY_BRANCH,
        )
        .await?;

        self.client
            .update_repository_settings(owner, repo, &policy.settings_update())
            .await?;

        protect_branch(self.client.as_ref(), owner, repo, PRIMARY_BRANCH).await?;
        protect_branch(self.client.as_ref(), owner, repo, DEVELOPMENT_BRANCH).await?;

        self.verify(request).await
    }

    async fn create(&self, policy: &RepositoryPolicy) -> WardenResult<Repository> {
        let repository = match (&policy.template, policy.template_payload()) {
            (Some(template), Some(payload)) => {
                info!(template = %template.full_name(), "Creating repository from template");
                self.client
                    .create_repository_from_template(&template.owner, &template.name, &payload)
                    .await?
            }
            _ => {
                info!("Creating repository");
                self.client
                    .create_org_repository(&policy.owner, &policy.create_payload())
                    .await?
            }
        };
        Ok(repository)
    }

    /// Polls the branch list until the initial commit shows up.
    async fn wait_for_branches(&self, owner: &str, repo: &str) -> WardenResult<Vec<Branch>> {
        for attempt in 1..=self.options.max_attempts {
            match self.client.list_branches(owner, repo).await {
                Ok(branches) if !branches.is_empty() => return Ok(branches),
                Ok(_) | Err(github_client::Error::NotFound) => {
                    debug!(attempt, "Repository has no branches yet");
                }
                Err(e) => return Err(e.into()),
            }

            if attempt < self.options.max_attempts {
                tokio::time::sleep(self.options.settle_delay).await;
            }
        }

        Err(WardenError::NotReady {
            repository: format!("{}/{}", owner, repo),
            attempts: self.options.max_attempts,
        })
    }

    async fn bootstrap_files(&self, request: &ProvisioningRequest) -> WardenResult<()> {
        let owner = request.owner.as_str();
        let repo = request.name.as_str();

        if !self.client.file_exists(owner, repo, CODEOWNERS_PATH).await {
            let code_owner = request
                .code_owner
                .clone()
                .unwrap_or_else(|| default_code_owner(owner, &request.default_team));
            self.client
                .write_file(
                    owner,
                    repo,
                    CODEOWNERS_PATH,
                    &codeowners_content(&code_owner),
                    "Added CODEOWNERS to Repo",
                )
                .await?;
        }

        if let Some(project_code) = &request.project_code {
            self.client
                .add_autolink(owner, repo, &autolink_payload(project_code))
                .await?;

            if !self
                .client
                .file_exists(owner, repo, PULL_REQUEST_TEMPLATE_PATH)
                .await
            {
                self.client
                    .write_file(
                        owner,
                        repo,
                        PULL_REQUEST_TEMPLATE_PATH,
                        &pull_request_template(project_code),
                        "Added pull request template to Repo",
                    )
                    .await?;
            }
        }

        Ok(())
    }

    async fn verify(&self, request: &ProvisioningRequest) -> WardenResult<RepoDiagnosis> {
        let owner = request.owner.as_str();
        let repo = request.name.as_str();

        let mut assertions = self
            .evaluator
            .evaluate_repository(
                owner,
                repo,
                request.template.as_ref(),
                Some(&request.admin),
                true,
            )
            .await?;
        for branch in [PRIMARY_BRANCH, DEVELOPMENT_BRANCH] {
            assertions.extend(self.evaluator.evaluate_branch(owner, repo, branch).await?);
        }

        let diagnosis = RepoDiagnosis::new(repo, assertions);
        if diagnosis.has_issues() {
            let failures = diagnosis.issue_messages();
            warn!(failures = failures.len(), "Provisioned repository is not compliant");
            return Err(WardenError::ComplianceFailed {
                repository: request.full_name(),
                failures,
            });
        }

        info!("Repository provisioned and compliant");
        Ok(diagnosis)
    }
}

/// Renames the default branch to `main` when no `main` branch exists.
///
/// Falls back to the first listed branch when the default branch is unknown. Does
/// nothing when the repository has no branches at all.
pub(crate) async fn ensure_primary_branch(
    client: &dyn RepositoryClient,
    owner: &str,
    repo: &str,
    branches: &[Branch],
    default_branch: Option<&str>,
) -> WardenResult<()> {
    if branches.iter().any(|b| b.name == PRIMARY_BRANCH) {
        return Ok(());
    }

    let current = default_branch
        .filter(|d| branches.iter().any(|b| b.name == *d))
        .or_else(|| branches.first().map(|b| b.name.as_str()));

    match current {
        Some(current) => {
            info!(from = current, "Renaming default branch to {}", PRIMARY_BRANCH);
            client
                .rename_branch(owner, repo, current, PRIMARY_BRANCH)
                .await?;
        }
        None => warn!("Repository has no branch to rename to {}", PRIMARY_BRANCH),
    }
    Ok(())
}

/// Creates `branch` from the head of `source` unless it already exists.
pub(crate) async fn ensure_branch_from(
    client: &dyn RepositoryClient,
    owner: &str,
    repo: &str,
    branches: &[Branch],
    branch: &str,
    source: &str,
) -> WardenResult<()> {
    if branches.iter().any(|b| b.name == branch) {
        return Ok(());
    }

    let source_ref = client
        .get_ref(owner, repo, &format!("heads/{}", source))
        .await?;
    client
        .create_ref(
            owner,
            repo,
            &RefCreatePayload::branch(branch, &source_ref.object.sha),
        )
        .await?;

    info!(branch = branch, source = source, "Created branch");
    Ok(())
}

/// Applies the branch policy of `branch` and requires signed commits on it.
pub(crate) async fn protect_branch(
    client: &dyn RepositoryClient,
    owner: &str,
    repo: &str,
    branch: &str,
) -> WardenResult<()> {
    let policy = BranchPolicy::for_branch(branch);
    client
        .update_branch_protection(owner, repo, branch, &policy.protection_update())
        .await?;
    if policy.require_signatures {
        client.require_commit_signatures(owner, repo, branch).await?;
    }
    Ok(())
}
