use clap::{Parser, Subcommand};
use repo_warden_cli::{
    commands::{create_cmd, doctor_cmd, health_check_cmd},
    config::AppConfig,
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Repo Warden CLI: create GitHub repositories and keep them compliant
///
/// Configuration is read from the environment, see the README for the variables
/// each command needs.
#[derive(Parser)]
#[command(name = "repo-warden")]
#[command(about = "Create GitHub repositories and keep them compliant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new repository and apply the policy to it
    Create,

    /// Diagnose one repository and repair what is wrong
    Doctor,

    /// Diagnose every repository of the organization
    HealthCheck,

    /// Show the CLI version
    Version,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("REPO_WARDEN_LOG"))
        .init();

    let cli = Cli::parse();
    if let Commands::Version = cli.command {
        println!(
            "repo-warden version {}",
            option_env!("REPO_WARDEN_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
        );
        std::process::exit(0);
    }

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Create => create_cmd::execute(&config).await,
        Commands::Doctor => doctor_cmd::execute(&config).await,
        Commands::HealthCheck => health_check_cmd::execute(&config).await,
        Commands::Version => Ok(()),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    std::process::exit(0);
}
