//! `imagejob` -- run one image job against the orchestrator from a terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use imagejob_client::api::HttpOrchestrator;
use imagejob_client::config::ClientConfig;
use imagejob_client::controller::{follow, JobController};
use imagejob_core::lifecycle::Lifecycle;
use imagejob_core::payload::{content_type_for, JobPayload};
use imagejob_core::types::ToolKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Submit an image to an inference tool and save the result.
#[derive(Parser, Debug)]
#[command(name = "imagejob")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Submit an image job, follow it to completion and save the result", long_about = None)]
struct Cli {
    /// Tool to run: sketch, super-resolution or photo-restoration
    #[arg(value_name = "TOOL")]
    tool: ToolKind,

    /// Image to upload
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the result
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Extra tool parameter, repeatable
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    verbose: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "imagejob_client=debug"
    } else {
        "imagejob_client=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    let orchestrator = HttpOrchestrator::with_timeout(&config.orchestrator_url, config.request_timeout)
        .context("Failed to build orchestrator client")?;

    let data = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = content_type_for(&file_name);

    let payload = cli
        .params
        .into_iter()
        .fold(
            JobPayload::new(cli.tool, file_name, content_type, data),
            |payload, (key, value)| payload.with_param(key, value),
        );

    let controller = JobController::new(Arc::new(orchestrator), config.poller_config());
    let mut state = controller.subscribe();
    let generation = controller.submit(payload).await?;

    let terminal = follow(&mut state, generation, |lifecycle| {
        eprintln!("{}", lifecycle.progress_message());
    })
    .await?;
    controller.shutdown();

    match terminal {
        Lifecycle::Succeeded { job_id, artifact } => {
            tokio::fs::write(&cli.output, &artifact.data)
                .await
                .with_context(|| format!("Failed to write {}", cli.output.display()))?;
            tracing::info!(job_id = %job_id, bytes = artifact.len(), "Result saved");
            println!("{}", cli.output.display());
            Ok(())
        }
        Lifecycle::Failed { message, .. } => bail!(message),
        other => bail!("job ended in unexpected state '{}'", other.name()),
    }
}
