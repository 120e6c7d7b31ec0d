//! Repository creation command.

use colored::Colorize;
use repo_warden_core::{notify, NotificationSink, Provisioner, ProvisioningRequest};
use tracing::info;

use crate::commands::{connect, notification_sink};
use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "create_cmd_tests.rs"]
mod tests;

/// Creates the repository named by the configuration.
pub async fn execute(config: &AppConfig) -> Result<(), Error> {
    let request = config.provisioning_request()?;
    let client = connect(config).await?;
    run_create(
        Provisioner::new(client),
        notification_sink(config).as_ref(),
        &request,
        &config.trigger,
    )
    .await
}

/// Provisions `request` and announces the new repository.
pub async fn run_create(
    provisioner: Provisioner,
    sink: &dyn NotificationSink,
    request: &ProvisioningRequest,
    trigger: &str,
) -> Result<(), Error> {
    info!(repository = %request.full_name(), "Creating repository");
    let diagnosis = provisioner.provision(request).await?;

    let link = format!("https://github.com/{}", request.full_name());
    println!(
        "{} {} ({} checks passed)",
        "✓ Repository created:".green().bold(),
        link,
        diagnosis.assertions().len()
    );
    notify(
        sink,
        &format!(
            "***{} created {}*** 🎉\nLink to the repo {}",
            trigger,
            request.name,
            link
        ),
    )
    .await;
    Ok(())
}
