//! LLM Manager - Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_manager::{
    ModelManager, ModelMetadata, ModelSource, OllamaProvider, api,
    config::ManagerConfig,
    metrics,
    models::{self, ModelStore, format_model_size},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "llm-manager")]
#[command(about = "Unified HuggingFace and Ollama model manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "json", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API (default)
    Serve {
        /// Override API port
        #[arg(long)]
        port: Option<u16>,
    },
    /// List models from every provider
    List {
        /// Restrict to one source (hf, ollama)
        #[arg(long)]
        source: Option<ModelSource>,
    },
    /// Search models
    Search {
        query: String,
        #[arg(long)]
        source: Option<ModelSource>,
    },
    /// Show details for one model, e.g. `ollama/llama2:7b`
    Info { model_id: String },
    Install { model_id: String },
    Uninstall { model_id: String },
    /// Show provider reachability, stored and installed models
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for command output
    match cli.log_format.as_str() {
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
    }

    let mut config = ManagerConfig::load(cli.config)?;

    let command = cli.command.unwrap_or(Command::Serve { port: None });
    if let Command::Serve { port: Some(port) } = &command {
        config.api_port = *port;
    }

    config.validate()?;

    tracing::debug!(
        api_port = config.api_port,
        models_dir = ?config.models_dir,
        ollama_url = %config.ollama.base_url,
        hf_endpoint = %config.huggingface.endpoint,
        "Configuration loaded"
    );

    let manager = ModelManager::from_config(&config).context("Failed to build providers")?;

    match command {
        Command::Serve { .. } => serve(config, manager).await,
        Command::List { source } => {
            print_models(&manager.list_models(source).await);
            Ok(())
        }
        Command::Search { query, source } => {
            print_models(&manager.search_models(&query, source).await);
            Ok(())
        }
        Command::Info { model_id } => match manager.get_model(&model_id).await? {
            Some(model) => {
                println!("{}", serde_json::to_string_pretty(&model)?);
                Ok(())
            }
            None => anyhow::bail!("Model not found: {}", model_id),
        },
        Command::Install { model_id } => {
            manager.install_model(&model_id).await?;
            println!("Installed {}", model_id);
            Ok(())
        }
        Command::Uninstall { model_id } => {
            if !manager.uninstall_model(&model_id).await? {
                anyhow::bail!("Failed to uninstall model: {}", model_id);
            }
            println!("Uninstalled {}", model_id);
            Ok(())
        }
        Command::Status => status(&config, &manager).await,
    }
}

async fn serve(config: ManagerConfig, manager: ModelManager) -> Result<()> {
    tracing::info!("Starting LLM Manager");

    let prometheus_handle = metrics::setup_metrics()?;

    let manager = Arc::new(manager);

    // Warm the catalog without delaying startup
    tokio::spawn({
        let manager = manager.clone();
        async move {
            manager.update_models_cache().await;
        }
    });

    let app = api::create_router(api::AppState {
        manager,
        prometheus_handle,
    });

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn status(config: &ManagerConfig, manager: &ModelManager) -> Result<()> {
    let ollama = OllamaProvider::new(&config.ollama)?;
    let running = ollama.check_server_running().await;
    println!(
        "Ollama ({}): {}",
        ollama.base_url(),
        if running { "running" } else { "unreachable" }
    );

    let hub_cache = config
        .huggingface
        .cache_dir
        .clone()
        .unwrap_or_else(models::default_hub_cache_dir);
    println!("HuggingFace cache: {}", hub_cache.display());

    let store = ModelStore::new(config.models_dir.clone());
    let stored = store.available_models();
    println!("Model store: {} ({} models)", store.root().display(), stored.len());
    for name in stored {
        println!("  {:<48} {}", name, format_model_size(store.model_size(&name)));
    }

    let installed = manager.installed_models().await;
    println!("Installed by this manager: {}", installed.len());
    for id in installed {
        println!("  {}", id);
    }

    Ok(())
}

fn print_models(models: &[ModelMetadata]) {
    for model in models {
        println!(
            "{:<56} {:<10} {}",
            model.qualified_id(),
            model.model_type.as_str(),
            format_model_size(model.size)
        );
    }
    println!("{} models", models.len());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
