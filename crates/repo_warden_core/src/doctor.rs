//! Diagnosis and repair of a single repository.
//!
//! The [`Doctor`] diagnoses a repository, applies the policy when something is wrong
//! and diagnoses again to confirm the result. Every stage is narrated to the
//! notification sink.

use std::sync::Arc;

use github_client::RepositoryClient;
use tracing::{error, info, instrument, warn};

use crate::provisioning::{ensure_branch_from, ensure_primary_branch, protect_branch};
use crate::{
    notify, ComplianceEvaluator, NotificationSink, PublicBranchPolicy, RepoDiagnosis,
    RepositoryPolicy, WardenResult, DEVELOPMENT_BRANCH, PRIMARY_BRANCH,
};

#[cfg(test)]
#[path = "doctor_tests.rs"]
mod tests;

/// Result of a doctor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorOutcome {
    /// Nothing was wrong; no change was made.
    Healthy(RepoDiagnosis),
    /// Issues were found and the repair removed all of them.
    Healed {
        before: RepoDiagnosis,
        after: RepoDiagnosis,
    },
    /// Issues remain after the repair.
    StillSick {
        before: RepoDiagnosis,
        after: RepoDiagnosis,
    },
}

impl DoctorOutcome {
    /// `false` only when issues survived the repair.
    pub fn is_success(&self) -> bool {
        !matches!(self, DoctorOutcome::StillSick { .. })
    }

    /// The most recent diagnosis of the repository.
    pub fn final_diagnosis(&self) -> &RepoDiagnosis {
        match self {
            DoctorOutcome::Healthy(diagnosis) => diagnosis,
            DoctorOutcome::Healed { after, .. } | DoctorOutcome::StillSick { after, .. } => after,
        }
    }
}

/// Diagnoses and repairs one repository at a time.
pub struct Doctor {
    client: Arc<dyn RepositoryClient>,
    evaluator: ComplianceEvaluator,
    sink: Arc<dyn NotificationSink>,
}

impl Doctor {
    pub fn new(client: Arc<dyn RepositoryClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            evaluator: ComplianceEvaluator::new(client.clone()),
            client,
            sink,
        }
    }

    /// Diagnoses `owner/repo`, repairs it when needed and reports the outcome.
    ///
    /// `trigger` names whoever started the run and only appears in the narration.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::GitHub` when a remote call fails. A message asking for
    /// manual intervention is sent before the error is returned.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn run(&self, owner: &str, repo: &str, trigger: &str) -> WardenResult<DoctorOutcome> {
        self.say(&format!(
            "***{} triggered repo doctor 👨‍⚕️: for **{}/{}***",
            trigger, owner, repo
        ))
        .await;

        match self.heal(owner, repo).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "Repo doctor failed");
                self.say(&format!(
                    "Repo doctor 👨‍⚕️ failed to heal **{}** ❌\nIt will need manual intervention, please check the detailed logs",
                    repo
                ))
                .await;
                Err(e)
            }
        }
    }

    async fn heal(&self, owner: &str, repo: &str) -> WardenResult<DoctorOutcome> {
        self.say(&format!("Diagnosing **{}** 🩸🔬...", repo)).await;
        let before = self.evaluator.diagnose(owner, repo).await?;

        if !before.has_issues() {
            self.say(&format!("***After running tests {} is healthy 🏥***", repo))
                .await;
            return Ok(DoctorOutcome::Healthy(before));
        }

        let mut message = format!(
            "***Found {} issues in {}🦠***",
            before.issues().count(),
            repo
        );
        for issue in before.issues() {
            message.push_str(&format!("\n• {}", issue.message));
        }
        message.push_str(&format!("\n\n🛡️ ***Fixing {}...***", repo));
        self.say(&message).await;

        self.remediate(owner, repo).await?;
        let after = self.evaluator.diagnose(owner, repo).await?;

        if after.has_issues() {
            let mut message = format!(
                "***After running tests {} is still sick 🤒 with the following issues:***",
                repo
            );
            for issue in after.issues() {
                message.push_str(&format!("\n• {}", issue.message));
            }
            self.say(&message).await;
            warn!(issues = after.issues().count(), "Repository is still not compliant");
            return Ok(DoctorOutcome::StillSick { before, after });
        }

        self.say(&format!(
            "After applying fixes 🛌💉💊 **{}** is now healthy 🏥\nLink to the repo https://github.com/{}/{}",
            repo, owner, repo
        ))
        .await;
        Ok(DoctorOutcome::Healed { before, after })
    }

    /// Applies the policy matching the visibility of the repository.
    ///
    /// Public repositories only get their `main` and `dev` branches locked. Private
    /// repositories get the full provisioning treatment minus creation and access.
    pub async fn remediate(&self, owner: &str, repo: &str) -> WardenResult<()> {
        let repository = self.client.get_repository(owner, repo).await?;
        let branches = self.client.list_branches(owner, repo).await?;

        if repository.is_public() {
            let update = PublicBranchPolicy::new().protection_update();
            for branch in branches
                .iter()
                .filter(|b| b.name == PRIMARY_BRANCH || b.name == DEVELOPMENT_BRANCH)
            {
                info!(branch = %branch.name, "Locking public branch");
                self.client
                    .update_branch_protection(owner, repo, &branch.name, &update)
                    .await?;
            }
            return Ok(());
        }

        ensure_primary_branch(
            self.client.as_ref(),
            owner,
            repo,
            &branches,
            repository.default_branch(),
        )
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

        let policy = RepositoryPolicy::new(owner, repo, None, None);
        self.client
            .update_repository_settings(owner, repo, &policy.settings_update())
            .await?;

        protect_branch(self.client.as_ref(), owner, repo, PRIMARY_BRANCH).await?;
        protect_branch(self.client.as_ref(), owner, repo, DEVELOPMENT_BRANCH).await?;
        Ok(())
    }

    async fn say(&self, message: &str) {
        info!("{}", message);
        notify(self.sink.as_ref(), message).await;
    }
}
