//! mockprep - AI interview practice backend
//!
#![doc = "mockprep - AI interview practice backend"]
#![doc = "Main entry point for the mockprep command line."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mockprep::cli::{Cli, Commands};
use mockprep::commands;
use mockprep::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Models { all, json } => {
            tracing::info!("Listing models");
            commands::list_models(&config, all, json).await?;
            Ok(())
        }
        Commands::Evaluate {
            question,
            answer,
            session,
            topic,
            user,
            json,
        } => {
            if let Some(s) = &session {
                tracing::debug!("Appending to session: {}", s);
            }
            let args = commands::EvaluateArgs {
                question,
                answer,
                session,
                topic,
                user,
                json,
            };
            commands::run_evaluate(&config, args).await?;
            Ok(())
        }
        Commands::Session { command } => {
            commands::handle_session(&config, command).await?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "mockprep=debug" } else { "mockprep=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
