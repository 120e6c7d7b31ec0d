//! Recurring health check of every repository in an organization.

use std::sync::Arc;
use std::time::Duration;

use github_client::RepositoryClient;
use tracing::{error, info, instrument, warn};

use crate::{
    chunk_messages, notify, ComplianceEvaluator, NotificationSink, RepoDiagnosis, WardenError,
    WardenResult, MAX_MESSAGE_LENGTH,
};

#[cfg(test)]
#[path = "health_check_tests.rs"]
mod tests;

/// Diagnoses of every repository of an organization, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetReport {
    diagnoses: Vec<RepoDiagnosis>,
}

impl FleetReport {
    pub fn new(diagnoses: Vec<RepoDiagnosis>) -> Self {
        Self { diagnoses }
    }

    pub fn diagnoses(&self) -> &[RepoDiagnosis] {
        &self.diagnoses
    }

    /// The diagnoses with at least one unsatisfied assertion.
    pub fn failing(&self) -> impl Iterator<Item = &RepoDiagnosis> {
        self.diagnoses.iter().filter(|d| d.has_issues())
    }

    pub fn failing_count(&self) -> usize {
        self.failing().count()
    }

    pub fn is_healthy(&self) -> bool {
        self.failing_count() == 0
    }

    /// One report section per failing repository, listing its failed assertions.
    pub fn report_sections(&self) -> Vec<String> {
        self.failing()
            .map(|diagnosis| {
                let mut section = format!("\n\n🛡️ ***{}***:", diagnosis.repository());
                for issue in diagnosis.issues() {
                    section.push_str(&format!("\n       • {}", issue.message));
                }
                section
            })
            .collect()
    }
}

/// Runs the compliance check over a whole organization and reports the result.
pub struct HealthCheck {
    client: Arc<dyn RepositoryClient>,
    evaluator: ComplianceEvaluator,
    sink: Arc<dyn NotificationSink>,
    admin: Option<String>,
    message_delay: Duration,
}

impl HealthCheck {
    pub fn new(client: Arc<dyn RepositoryClient>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            evaluator: ComplianceEvaluator::new(client.clone()),
            client,
            sink,
            admin: None,
            message_delay: Duration::from_secs(1),
        }
    }

    /// Also require `admin` to hold the admin role on every private repository.
    pub fn with_admin(mut self, admin: impl Into<String>) -> Self {
        self.admin = Some(admin.into());
        self
    }

    /// Pause between two report messages.
    pub fn with_message_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    /// Diagnoses every repository of `owner`, one after the other.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::GitHub` as soon as one repository cannot be inspected.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn diagnose_fleet(&self, owner: &str) -> WardenResult<FleetReport> {
        let repositories = self.client.list_org_repositories(owner).await?;
        info!(count = repositories.len(), "Running health checks on all repos");

        let mut diagnoses = Vec::with_capacity(repositories.len());
        for repository in &repositories {
            let assertions = self
                .evaluator
                .evaluate_fleet_health_with_admin(owner, repository.name(), self.admin.as_deref())
                .await?;
            diagnoses.push(RepoDiagnosis::new(repository.name(), assertions));
        }

        Ok(FleetReport::new(diagnoses))
    }

    /// Diagnoses the organization and sends the report.
    ///
    /// # Errors
    ///
    /// * `WardenError::FleetNonCompliant` when at least one repository has issues.
    /// * `WardenError::GitHub` when a repository cannot be inspected. A message asking
    ///   for manual intervention is sent before the error is returned.
    pub async fn run(&self, owner: &str, trigger: &str) -> WardenResult<FleetReport> {
        notify(
            self.sink.as_ref(),
            &format!("***{} triggered {} github repos health check*** 🏥", trigger, owner),
        )
        .await;

        let report = match self.diagnose_fleet(owner).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Health check failed");
                notify(
                    self.sink.as_ref(),
                    &format!(
                        "Health check of **{}** failed ❌: {}\nIt will need manual intervention, please check the detailed logs",
                        owner, e
                    ),
                )
                .await;
                return Err(e);
            }
        };
        let failing = report.failing_count();
        let title = format!("***Found {} repos with issues ***", failing);

        if report.is_healthy() {
            info!("No issues found in any of the repositories");
            notify(
                self.sink.as_ref(),
                &format!(
                    "{}\n\n⛵  Sigh, at this rate the healthcare system will go bankrupt.\n\nConsider introducing some bugs for Captain Hook 💸 🪝",
                    title
                ),
            )
            .await;
            return Ok(report);
        }

        warn!(failing, "Repositories with issues found");
        notify(
            self.sink.as_ref(),
            &format!("{}\n💈💈💈 ***Hall of Shame*** 💈💈💈", title),
        )
        .await;

        for chunk in chunk_messages(&report.report_sections(), MAX_MESSAGE_LENGTH) {
            notify(self.sink.as_ref(), &chunk).await;
            tokio::time::sleep(self.message_delay).await;
        }

        notify(
            self.sink.as_ref(),
            "\n\nPlease fix the issues! or run repo-doctor 👨‍⚕️🩺 to fix them automatically.",
        )
        .await;

        Err(WardenError::FleetNonCompliant { count: failing })
    }
}
