//! Command modules for the Repo Warden CLI.
//!
//! - `create_cmd`: provisions a new repository
//! - `doctor_cmd`: diagnoses and repairs one repository
//! - `health_check_cmd`: diagnoses every repository of the organization
//!
//! Each command exposes an `execute` entry point that builds its collaborators from the
//! configuration, and a `run_*` function taking them ready made.

use std::sync::Arc;

use github_client::{
    authenticate_with_access_token, create_app_client, create_token_client, GitHubClient,
    RepositoryClient,
};
use repo_warden_core::{DiscordNotifier, LogOnlyNotifier, NotificationSink};
use secrecy::ExposeSecret;
use tracing::{debug, error};

use crate::config::{AppConfig, Credentials};
use crate::errors::Error;

pub mod create_cmd;
pub mod doctor_cmd;
pub mod health_check_cmd;

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;

/// Creates a GitHub client authenticated with the configured credentials.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn RepositoryClient>, Error> {
    let octocrab = match &config.credentials {
        Credentials::Token(token) => {
            debug!("Creating GitHub client from a personal access token");
            create_token_client(token.expose_secret()).map_err(auth_error)?
        }
        Credentials::App {
            app_id,
            installation_id,
            private_key,
        } => {
            debug!(app_id, installation_id, "Creating GitHub client for the app installation");
            let app = create_app_client(*app_id, private_key.expose_secret())
                .await
                .map_err(auth_error)?;
            authenticate_with_access_token(&app, *installation_id, &config.owner)
                .await
                .map_err(auth_error)?
        }
    };

    Ok(Arc::new(GitHubClient::new(octocrab)))
}

fn auth_error(e: github_client::Error) -> Error {
    error!(error = %e, "Failed to create GitHub client");
    Error::Auth(e.to_string())
}

/// The Discord webhook when one is configured, the log otherwise.
pub fn notification_sink(config: &AppConfig) -> Arc<dyn NotificationSink> {
    match &config.discord_webhook {
        Some(url) => Arc::new(DiscordNotifier::new(url.clone())),
        None => Arc::new(LogOnlyNotifier),
    }
}
