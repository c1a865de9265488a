//! plasma-publish CLI
//!
//! Uploads the plasma source archive of the current commit to the artifact
//! repository

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plasma_publish::{
    ArtifactPublisher, ConfigLoadOptions, ConfigLoader, FileKeyring, GitRepoInfoResolver,
    Passphrase, PublishConfig, PublishError, PublishOptions, ReqwestRepositoryClient,
    TerminalPrompt,
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const PASSPHRASE_ENV: &str = "PLASMA_KEYRING_PASSPHRASE";

/// Publish plasma artifacts to the artifact repository
#[derive(Parser)]
#[command(name = "plasma-publish")]
#[command(version)]
#[command(about = "Publish plasma artifacts to the artifact repository", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the artifact of the current commit
    Publish {
        /// Repository username
        #[arg(long, default_value = "")]
        username: String,

        /// Repository password
        #[arg(long, default_value = "")]
        password: String,

        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Directory holding built artifacts, relative to the project
        #[arg(long)]
        artifacts_dir: Option<String>,

        /// Keyring file
        #[arg(long)]
        keyring: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Publish {
            username,
            password,
            project_path,
            artifacts_dir,
            keyring,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            let overrides = PublishConfig {
                artifacts_dir,
                keyring_path: keyring,
                ..Default::default()
            };

            publish_command(path, overrides, PublishOptions::new(username, password)).await
        }
    }
}

async fn publish_command(
    project_path: PathBuf,
    overrides: PublishConfig,
    options: PublishOptions,
) -> Result<i32> {
    let config = ConfigLoader::load(ConfigLoadOptions::from_process(
        &project_path,
        Some(overrides),
    ))
    .await?;

    let passphrase = match std::env::var(PASSPHRASE_ENV) {
        Ok(value) => Passphrase::Provided(SecretString::from(value)),
        Err(_) => Passphrase::Interactive,
    };
    let mut keyring = FileKeyring::new(config.keyring_path(), passphrase);

    let repo_info = GitRepoInfoResolver::new(&project_path)
        .context("cannot inspect the project working copy")?;
    let client = ReqwestRepositoryClient::new().context("cannot build the HTTP client")?;

    let mut publisher = ArtifactPublisher::new(
        &project_path,
        config,
        Arc::new(repo_info),
        Arc::new(client),
        Arc::new(TerminalPrompt),
    );

    match publisher.publish(&options, &mut keyring).await {
        Ok(report) => {
            tracing::debug!(
                history = %publisher.state_machine().get_history(),
                duration_ms = report.duration_ms,
                stages_ms = publisher.state_machine().get_elapsed_time(),
                "publish finished"
            );
            if !report.credentials_persisted && report.outcome.success {
                tracing::info!("no credentials were written to the keyring");
            }
            Ok(0)
        }
        Err(e) => {
            tracing::debug!(
                history = %publisher.state_machine().get_history(),
                stages_ms = publisher.state_machine().get_elapsed_time(),
                "publish aborted"
            );
            report_failure(&e);
            Ok(1)
        }
    }
}

fn report_failure(error: &PublishError) {
    eprintln!("\n❌ Publishing failed: {}", error);

    let actions = error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\nSuggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }

    if !error.is_user_actionable() {
        eprintln!("\nRun again with -vv for the underlying error");
    }
}
