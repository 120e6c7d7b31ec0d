//! Repository doctor command.

use colored::Colorize;
use repo_warden_core::{Doctor, DoctorOutcome};

use crate::commands::{connect, notification_sink};
use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "doctor_cmd_tests.rs"]
mod tests;

/// Diagnoses and repairs the repository named by the configuration.
pub async fn execute(config: &AppConfig) -> Result<(), Error> {
    let repo = config.repository()?;
    let client = connect(config).await?;
    let doctor = Doctor::new(client, notification_sink(config));
    run_doctor(&doctor, &config.owner, repo, &config.trigger).await
}

/// Runs `doctor` and turns a repository that is still sick into an error.
pub async fn run_doctor(doctor: &Doctor, owner: &str, repo: &str, trigger: &str) -> Result<(), Error> {
    let outcome = doctor.run(owner, repo, trigger).await?;

    match &outcome {
        DoctorOutcome::Healthy(_) => {
            println!("{} {}/{} is healthy", "✓".green(), owner, repo);
            Ok(())
        }
        DoctorOutcome::Healed { before, .. } => {
            println!(
                "{} {}/{} healed, {} issues fixed",
                "✓".green(),
                owner,
                repo,
                before.issues().count()
            );
            Ok(())
        }
        DoctorOutcome::StillSick { after, .. } => {
            println!("{} {}/{} is still sick:", "✗".red().bold(), owner, repo);
            for issue in after.issues() {
                println!("  {} {}", "✗".red(), issue.message);
            }
            Err(Error::StillSick {
                repository: format!("{}/{}", owner, repo),
                issues: after.issues().count(),
            })
        }
    }
}
