//! Configuration management for the Repo Warden CLI.
//!
//! All configuration comes from environment variables and is read once at startup
//! into an [`AppConfig`], which is then handed to the command being run. Empty
//! variables count as unset.

use repo_warden_core::{is_valid_code_owner, ProvisioningRequest, TemplateRef, DEFAULT_TEAM};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::errors::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

pub const ENV_OWNER: &str = "GH_OWNER";
pub const ENV_REPO_NAME: &str = "GH_REPO_NAME";
pub const ENV_TRIGGER: &str = "GH_USER_CREATOR";
pub const ENV_ADMIN: &str = "GH_ADMIN";
pub const ENV_FLEET_ADMIN: &str = "GH_FLEET_ADMIN";
pub const ENV_TEMPLATE_OWNER: &str = "GH_TEMPLATE_OWNER";
pub const ENV_TEMPLATE_REPO: &str = "GH_TEMPLATE_REPO";
pub const ENV_PROJECT_CODE: &str = "GH_PROJECT_CODE";
pub const ENV_CODE_OWNER: &str = "GH_CODEOWNER";
/// Comma separated list of the code owners `GH_CODEOWNER` may name.
pub const ENV_ALLOWED_CODE_OWNERS: &str = "GH_ALLOWED_CODEOWNERS";
pub const ENV_DEFAULT_TEAM: &str = "GH_DEFAULT_TEAM";
pub const ENV_DESCRIPTION: &str = "GH_REPO_DESCRIPTION";
pub const ENV_DISCORD_WEBHOOK: &str = "DISCORD_WEBHOOK";
pub const ENV_TOKEN: &str = "GH_TOKEN";
pub const ENV_APP_ID: &str = "GH_APP_ID";
pub const ENV_INSTALLATION_ID: &str = "GH_INSTALLATION_ID";
pub const ENV_APP_PRIVATE_KEY: &str = "GH_APP_PRIVATE_KEY";

/// How the CLI authenticates with GitHub.
#[derive(Debug)]
pub enum Credentials {
    /// A personal access token.
    Token(SecretString),

    /// A GitHub App installation.
    App {
        app_id: u64,
        installation_id: u64,
        private_key: SecretString,
    },
}

/// Configuration of a single CLI run.
///
/// Settings that only some commands need are optional here and checked by the
/// accessor the command uses, e.g. [`AppConfig::repository`].
#[derive(Debug)]
pub struct AppConfig {
    pub owner: String,
    /// Who started the run. Used in notifications and as the default admin.
    pub trigger: String,
    pub credentials: Credentials,
    pub discord_webhook: Option<Url>,
    pub repository_name: Option<String>,
    pub admin: Option<String>,
    /// Admin checked on every private repository during the health check.
    pub fleet_admin: Option<String>,
    pub template: Option<TemplateRef>,
    pub project_code: Option<String>,
    pub code_owner: Option<String>,
    pub default_team: String,
    pub description: Option<String>,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which returns the value of a variable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when a variable every command needs is missing, a
    /// value cannot be parsed or the code owner is not allowed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).ok_or_else(|| {
                Error::Config(format!("Environment variable {} is not set", key))
            })
        };

        let credentials = match optional(ENV_TOKEN) {
            Some(token) => Credentials::Token(SecretString::from(token)),
            None => Credentials::App {
                app_id: parse_id(ENV_APP_ID, &required(ENV_APP_ID)?)?,
                installation_id: parse_id(ENV_INSTALLATION_ID, &required(ENV_INSTALLATION_ID)?)?,
                private_key: SecretString::from(required(ENV_APP_PRIVATE_KEY)?),
            },
        };

        let discord_webhook = optional(ENV_DISCORD_WEBHOOK)
            .map(|url| {
                Url::parse(&url).map_err(|e| {
                    Error::Config(format!("{} is not a valid URL: {}", ENV_DISCORD_WEBHOOK, e))
                })
            })
            .transpose()?;

        let template = match (optional(ENV_TEMPLATE_OWNER), optional(ENV_TEMPLATE_REPO)) {
            (Some(owner), Some(name)) => TemplateRef::from_parts(&owner, &name),
            (None, None) => None,
            _ => {
                return Err(Error::Config(format!(
                    "{} and {} must be set together",
                    ENV_TEMPLATE_OWNER, ENV_TEMPLATE_REPO
                )))
            }
        };

        let code_owner = optional(ENV_CODE_OWNER);
        if let Some(code_owner) = &code_owner {
            check_code_owner(code_owner, optional(ENV_ALLOWED_CODE_OWNERS).as_deref())?;
        }

        let config = Self {
            owner: required(ENV_OWNER)?,
            trigger: required(ENV_TRIGGER)?,
            credentials,
            discord_webhook,
            repository_name: optional(ENV_REPO_NAME),
            admin: optional(ENV_ADMIN),
            fleet_admin: optional(ENV_FLEET_ADMIN),
            template,
            project_code: optional(ENV_PROJECT_CODE),
            code_owner,
            default_team: optional(ENV_DEFAULT_TEAM).unwrap_or_else(|| DEFAULT_TEAM.to_string()),
            description: optional(ENV_DESCRIPTION),
        };

        debug!(
            owner = %config.owner,
            repository = ?config.repository_name,
            app_auth = matches!(config.credentials, Credentials::App { .. }),
            notifications = config.discord_webhook.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The repository the command operates on.
    pub fn repository(&self) -> Result<&str, Error> {
        self.repository_name
            .as_deref()
            .ok_or_else(|| Error::Config(format!("Environment variable {} is not set", ENV_REPO_NAME)))
    }

    /// The request describing the repository to create.
    pub fn provisioning_request(&self) -> Result<ProvisioningRequest, Error> {
        let admin = self.admin.as_deref().unwrap_or(&self.trigger);
        let mut request = ProvisioningRequest::new(&self.owner, self.repository()?, admin);
        request.description = self.description.clone();
        request.template = self.template.clone();
        request.project_code = self.project_code.clone();
        request.code_owner = self.code_owner.clone();
        request.default_team = self.default_team.clone();
        Ok(request)
    }
}

fn parse_id(key: &str, value: &str) -> Result<u64, Error> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn check_code_owner(code_owner: &str, allowed: Option<&str>) -> Result<(), Error> {
    if !is_valid_code_owner(code_owner) {
        return Err(Error::Config(format!(
            "{} must be a single @user or @org/team, got '{}'",
            ENV_CODE_OWNER, code_owner
        )));
    }

    if let Some(allowed) = allowed {
        if !allowed.split(',').any(|entry| entry.trim() == code_owner) {
            return Err(Error::Config(format!(
                "Codeowner '{}' is not allowed!",
                code_owner
            )));
        }
    }
    Ok(())
}
