//! BriefLens CLI
//!
//! Summarizes text with the configured model, falling back across providers

use anyhow::Context;
use brieflens_core::{
    PermissionGate, ProgressEvent, ProviderRegistry, Settings, SettingsSource,
};
use brieflens_egress::{
    anthropic::{AnthropicConfig, AnthropicConnector},
    gemini::{GeminiConfig, GeminiConnector},
    openai::{OpenAIConfig, OpenAIConnector},
};
use brieflens_ondevice::OnDeviceInvoker;
use brieflens_routing::{
    InvokerSet, PipelineConfig, SettingsPermissionGate, SummarizationPipeline, SummarizeRequest,
};
use brieflens_storage::{FileMetricsStorage, FileSettingsStore, MetricsStore};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "brieflens")]
#[command(about = "BriefLens - five-bullet summaries with provider fallback", long_about = None)]
struct Cli {
    /// Settings file (YAML, or TOML by extension)
    #[arg(long, global = true, env = "BRIEFLENS_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a file, or stdin when no file is given
    Summarize {
        /// Text file to summarize
        #[arg(long)]
        file: Option<PathBuf>,

        /// Model id to use instead of the stored default
        #[arg(long)]
        model: Option<String>,

        /// Stop after the first attempt
        #[arg(long, default_value = "false")]
        no_fallback: bool,
    },
    /// List selectable models
    Models,
    /// Show per-provider statistics
    Metrics {
        /// Delete all recorded statistics
        #[arg(long, default_value = "false")]
        reset: bool,

        /// Print the raw stats map as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileSettingsStore::new(path),
        None => FileSettingsStore::default_location(),
    };
    let settings = store
        .load_settings()
        .with_context(|| format!("Failed to load settings from {:?}", store.path()))?;

    init_tracing(&settings)?;
    debug!(path = ?store.path(), "Settings loaded");

    match cli.command {
        Commands::Summarize {
            file,
            model,
            no_fallback,
        } => summarize(store, &settings, file, model, no_fallback).await,
        Commands::Models => {
            list_models(&settings);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Metrics { reset, json } => {
            let metrics = metrics_store(&settings);
            if reset {
                metrics.reset().await?;
                println!("Provider metrics cleared");
                return Ok(ExitCode::SUCCESS);
            }

            let snapshot: BTreeMap<_, _> = metrics.snapshot().await?.into_iter().collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for (provider_id, stats) in &snapshot {
                    println!(
                        "{:<20} {:>6} requests {:>5.1}% ok {:>7.2}s avg",
                        provider_id,
                        stats.total_requests,
                        stats.success_rate() * 100.0,
                        stats.average_time_seconds
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn summarize(
    store: FileSettingsStore,
    settings: &Settings,
    file: Option<PathBuf>,
    model: Option<String>,
    no_fallback: bool,
) -> anyhow::Result<ExitCode> {
    let content = match &file {
        Some(path) => {
            let path = shellexpand::tilde(&path.to_string_lossy()).to_string();
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path))?
        }
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let settings_source: Arc<dyn SettingsSource> = Arc::new(store);
    let permissions: Arc<dyn PermissionGate> =
        Arc::new(SettingsPermissionGate::new(settings_source.clone()));

    let invokers = InvokerSet::new()
        .with(Arc::new(OnDeviceInvoker::unsupported()))
        .with(Arc::new(
            OpenAIConnector::new(OpenAIConfig::new())?.with_permissions(permissions.clone()),
        ))
        .with(Arc::new(
            AnthropicConnector::new(AnthropicConfig::new())?.with_permissions(permissions.clone()),
        ))
        .with(Arc::new(
            GeminiConnector::new(GeminiConfig::new())?.with_permissions(permissions),
        ));

    let mut config = PipelineConfig::default();
    if let Some(secs) = settings.attempt_timeout_secs {
        config = config.with_attempt_timeout(Duration::from_secs(secs));
    }

    // No on-device runtime in the binary
    let pipeline = SummarizationPipeline::new(
        invokers,
        Arc::new(false),
        settings_source,
        metrics_store(settings),
    )
    .with_config(config);

    let mut request = SummarizeRequest::new(content);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if no_fallback {
        request = request.with_fallback(false);
    }

    let result = pipeline
        .summarize(request, |event: ProgressEvent| {
            eprintln!(
                "[{:>3}%] {} (~{:.1}s left)",
                event.percent_complete, event.step_label, event.estimated_seconds_remaining
            );
        })
        .await;

    println!("{}", result.summary_text);
    info!(
        provider = %result.used_provider_id,
        elapsed_seconds = result.elapsed_seconds,
        attempts = result.metrics.attempts.len(),
        "Done"
    );

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        for attempt in &result.metrics.attempts {
            if let Some(message) = &attempt.error_message {
                eprintln!("  {}: {}", attempt.provider_id, message);
            }
        }
        Ok(ExitCode::FAILURE)
    }
}

fn list_models(settings: &Settings) {
    let default_model = settings
        .default_model
        .as_deref()
        .unwrap_or(ProviderRegistry::default_model_id());

    for model in ProviderRegistry::all() {
        let marker = if model.id == default_model { "*" } else { " " };
        println!(
            "{} {:<20} {:<10} {:<26} {:>5.2}",
            marker,
            model.id,
            model.family.as_str(),
            model.display_name,
            model.unit_cost
        );
    }
}

/// Metrics file from settings, else the platform data directory
fn metrics_store(settings: &Settings) -> MetricsStore {
    let path = match &settings.metrics_path {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => dirs::data_dir()
            .or_else(dirs::config_dir)
            .map(|dir| dir.join("brieflens"))
            .unwrap_or_else(|| PathBuf::from(".brieflens"))
            .join("metrics.json"),
    };
    debug!(path = %path.display(), "Using metrics file");
    MetricsStore::new(Arc::new(FileMetricsStorage::new(path)))
}
