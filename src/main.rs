//! pairloop CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use pairloop::cli::{Cli, Commands, ConfigArgs, RunArgs};
use pairloop::config::{ProviderCredentials, TeamConfig};
use pairloop::orchestrator::{Orchestrator, RunReport, RunStatus};
use pairloop::provider::create_provider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pairloop=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => handle_run(args).await,
        Commands::Config(args) => handle_config(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn handle_run(args: RunArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = TeamConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let credentials = ProviderCredentials::from_env();
    let provider = create_provider(&config, &credentials)?;
    let orchestrator = Orchestrator::from_config(&config, Arc::from(provider))?;

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current call");
            cancel.cancel();
        }
    });

    let report = orchestrator.run().await;
    print_report(&report);
    Ok(report.status.exit_code())
}

fn handle_config(args: ConfigArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if args.path {
        match TeamConfig::default_path() {
            Some(path) => println!("{}", path.display()),
            None => return Err("no config directory available on this platform".into()),
        }
        return Ok(0);
    }
    let config = TeamConfig::load(args.config.as_deref())?;
    print!("{}", config.to_toml_string()?);
    Ok(0)
}

fn print_report(report: &RunReport) {
    let program = report.program.render();
    if program.is_empty() {
        eprintln!("(no code was merged)");
    } else {
        println!("{program}");
    }

    eprintln!(
        "run {} finished: {} after {} round(s)",
        report.run_id, report.status, report.rounds
    );
    if let Some(speaker) = report.finished_by {
        eprintln!("finished by {speaker}");
    }
    if report.status == RunStatus::Failed {
        if let Some(failure) = &report.failure {
            eprintln!(
                "failed in round {} during {}: {} ({})",
                failure.round, failure.phase, failure.error, failure.category
            );
            if let Some(hint) = failure.suggestion.hint() {
                eprintln!("hint: {hint}");
            }
        }
    }
}
