use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foundry_local::config::Config;
use foundry_local::models::download::{format_bytes, DownloadEvent, DownloadOptions};
use foundry_local::models::{DeviceType, ModelVariant};
use foundry_local::service::ServiceLauncher;
use foundry_local::{CancelToken, Manager};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "foundry-local")]
#[command(about = "Manage models on the Foundry Local runtime", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Attach to a service at this URL instead of launching one
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the runtime service
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Start the service, then download and load a model
    Run { reference: String },
    #[command(flatten)]
    Model(ModelCommands),
}

/// Commands that need a running service
#[derive(Subcommand)]
enum ModelCommands {
    /// List catalog models
    List {
        /// Only show variants for this device (cpu, gpu, npu)
        #[arg(long)]
        device: Option<DeviceType>,
    },
    /// List models in local storage
    Cached,
    /// List models loaded for inference
    Loaded,
    /// Show the variant a reference resolves to
    Info {
        reference: String,
        #[arg(long)]
        device: Option<DeviceType>,
    },
    /// Download a model
    Download {
        reference: String,
        #[arg(long)]
        device: Option<DeviceType>,
        /// Download again even if already cached
        #[arg(long)]
        force: bool,
        /// Auth token for private models
        #[arg(long)]
        token: Option<String>,
    },
    /// Load a cached model
    Load {
        reference: String,
        #[arg(long)]
        device: Option<DeviceType>,
        /// Seconds the model stays loaded while idle
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Unload a model
    Unload {
        reference: String,
        #[arg(long)]
        device: Option<DeviceType>,
    },
    /// Check whether a newer version is available
    Upgradable { reference: String },
    /// Download the newest version of a model
    Upgrade {
        reference: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the model cache directory
    CacheLocation,
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Start the service (no-op if already running)
    Start,
    /// Stop the service
    Stop,
    /// Show whether the service is running
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;
    if let Some(endpoint) = cli.endpoint {
        config.service.endpoint = Some(endpoint);
    }

    match cli.command {
        Commands::Service { action } => run_service(config, action).await,
        Commands::Run { reference } => {
            let manager = Manager::start_model(config, &reference)
                .await
                .with_context(|| format!("Failed to start model '{reference}'"))?;
            println!("✓ Model '{reference}' is ready");
            println!("Endpoint: {}", manager.endpoint()?);
            println!("API key:  {}", manager.api_key());
            Ok(())
        }
        Commands::Model(command) => {
            let mut manager = Manager::new(config);
            manager
                .start_service()
                .await
                .context("Failed to start Foundry service")?;
            run_model_command(&manager, command).await
        }
    }
}

async fn run_service(config: Config, action: ServiceAction) -> Result<()> {
    match action {
        ServiceAction::Start => {
            let mut manager = Manager::new(config);
            manager.start_service().await?;
            if let Some(url) = manager.service_url() {
                println!("✓ Foundry service running at {url}");
            }
            println!("OpenAI endpoint: {}", manager.endpoint()?);
        }
        ServiceAction::Stop => {
            ServiceLauncher::new(&config.service.program)?.stop().await?;
            println!("✓ Foundry service stopped");
        }
        ServiceAction::Status => {
            let url = match &config.service.endpoint {
                Some(endpoint) => Some(endpoint.clone()),
                None => ServiceLauncher::new(&config.service.program)?
                    .status()
                    .await?
                    .map(String::from),
            };
            match url {
                Some(url) => {
                    let manager = Manager::with_endpoint(config, &url)?;
                    println!("Foundry service is running at {url}");
                    println!("OpenAI endpoint: {}", manager.endpoint()?);
                }
                None => println!("Foundry service is not running"),
            }
        }
    }
    Ok(())
}

async fn run_model_command(manager: &Manager, command: ModelCommands) -> Result<()> {
    match command {
        ModelCommands::List { device } => {
            let catalog = manager.list_catalog().await?;
            let variants: Vec<&ModelVariant> = catalog
                .iter()
                .filter(|v| device.map_or(true, |d| v.device_type() == d))
                .collect();
            print_variants(&variants);
        }
        ModelCommands::Cached => {
            let cached = manager.list_cached_models().await?;
            print_variants(&cached.iter().collect::<Vec<_>>());
        }
        ModelCommands::Loaded => {
            let loaded = manager.list_loaded_models().await?;
            print_variants(&loaded.iter().collect::<Vec<_>>());
        }
        ModelCommands::Info { reference, device } => {
            let variant = manager.resolve(&reference, device).await?;
            print_info(&variant);
        }
        ModelCommands::Download {
            reference,
            device,
            force,
            token,
        } => {
            let options = DownloadOptions { token, force };
            let variant = download_with_progress(manager, &reference, device, options).await?;
            println!("✓ Downloaded {}", variant.id);
        }
        ModelCommands::Load {
            reference,
            device,
            ttl,
        } => {
            let variant = manager
                .load_model(&reference, device, ttl.map(Duration::from_secs))
                .await?;
            println!("✓ Loaded {}", variant.id);
        }
        ModelCommands::Unload { reference, device } => {
            let variant = manager.unload_model(&reference, device).await?;
            println!("✓ Unloaded {}", variant.id);
        }
        ModelCommands::Upgradable { reference } => {
            if manager.is_model_upgradable(&reference).await? {
                let latest = manager.latest_model_info(&reference).await?;
                println!("Upgrade available: {}", latest.id);
            } else {
                println!("'{reference}' is up to date");
            }
        }
        ModelCommands::Upgrade { reference, token } => {
            let variant = manager.upgrade_model(&reference, token.as_deref()).await?;
            println!("✓ Upgraded to {}", variant.id);
        }
        ModelCommands::CacheLocation => {
            println!("{}", manager.cache_location().await?);
        }
    }
    Ok(())
}

/// Download with a progress bar. Ctrl-C cancels.
async fn download_with_progress(
    manager: &Manager,
    reference: &str,
    device: Option<DeviceType>,
    options: DownloadOptions,
) -> Result<ModelVariant> {
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling download");
                cancel.cancel();
            }
        });
    }

    let mut events = manager
        .start_download(reference, device, options, cancel)
        .await?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(reference.to_string());

    while let Some(event) = events.recv().await {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        pb.set_position(event.percentage().round() as u64);
        match event {
            DownloadEvent::Progress { .. } => {}
            DownloadEvent::Completed { variant } => {
                pb.finish_and_clear();
                return Ok(variant);
            }
            DownloadEvent::Failed { message, .. } => {
                pb.abandon_with_message("failed");
                anyhow::bail!("Download of '{reference}' failed: {message}");
            }
        }
    }

    pb.abandon();
    anyhow::bail!("Download of '{reference}' ended without a result")
}

fn print_variants(variants: &[&ModelVariant]) {
    if variants.is_empty() {
        println!("No models");
        return;
    }

    println!("{:<24} {:<40} {:<6} {:<28} {:>10}", "ALIAS", "ID", "DEVICE", "PROVIDER", "SIZE");
    for v in variants {
        println!(
            "{:<24} {:<40} {:<6} {:<28} {:>10}",
            v.alias,
            v.id,
            v.device_type(),
            v.execution_provider(),
            format_bytes(v.file_size_mb * 1024 * 1024)
        );
    }
}

fn print_info(v: &ModelVariant) {
    println!("Id:        {}", v.id);
    println!("Alias:     {}", v.alias);
    println!("Name:      {}", v.display_name);
    println!("Device:    {}", v.device_type());
    println!("Provider:  {}", v.execution_provider());
    if let Some(ep) = &v.ep_override {
        println!("Load EP:   {ep}");
    }
    println!("Version:   {}", v.version_number());
    println!("Size:      {}", format_bytes(v.file_size_mb * 1024 * 1024));
    println!("Publisher: {}", v.publisher);
    println!("License:   {}", v.license);
    if !v.task.is_empty() {
        println!("Task:      {}", v.task);
    }
}
