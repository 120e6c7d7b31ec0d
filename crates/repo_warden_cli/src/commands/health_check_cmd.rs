//! Organization health check command.

use colored::Colorize;
use repo_warden_core::HealthCheck;

use crate::commands::{connect, notification_sink};
use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "health_check_cmd_tests.rs"]
mod tests;

/// Diagnoses every repository of the configured organization.
pub async fn execute(config: &AppConfig) -> Result<(), Error> {
    let client = connect(config).await?;
    let mut health_check = HealthCheck::new(client, notification_sink(config));
    if let Some(admin) = &config.fleet_admin {
        health_check = health_check.with_admin(admin.as_str());
    }
    run_health_check(&health_check, &config.owner, &config.trigger).await
}

/// Runs `health_check` and prints a summary of the result.
pub async fn run_health_check(
    health_check: &HealthCheck,
    owner: &str,
    trigger: &str,
) -> Result<(), Error> {
    match health_check.run(owner, trigger).await {
        Ok(report) => {
            println!(
                "{} all {} repositories of {} are healthy",
                "✓".green(),
                report.diagnoses().len(),
                owner
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            Err(e.into())
        }
    }
}
