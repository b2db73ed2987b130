use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use knowbase_channels::CliChannel;
use knowbase_core::App;
use knowbase_core::bootstrap::{
    build_shutdown, create_embedder, create_provider, document_store, indexer_config,
};
use knowbase_core::config::{Config, resolve_config_path};
use knowbase_core::query::QueryEngine;
use knowbase_core::session::SessionContext;
use knowbase_memory::IndexBuilder;

#[derive(Parser, Debug)]
#[command(name = "knowbase", version)]
#[command(about = "Upload documents and ask questions answered from their content", long_about = None)]
struct Cli {
    /// Configuration file (defaults to `KNOWBASE_CONFIG` or config/default.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding uploaded documents; emptied at startup
    #[arg(long, value_name = "DIR")]
    docs_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_subscriber(cli.log_file.as_deref())?;

    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    if let Some(dir) = cli.docs_dir {
        config.storage.documents_dir = dir;
    }
    config.resolve_secrets();
    config.validate()?;

    let provider = create_provider(&config)?;
    let embedder = create_embedder(&config)?;

    let (status_tx, status_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let builder = IndexBuilder::new(embedder.clone(), indexer_config(&config, &embedder))
        .with_status_tx(status_tx);
    let engine = QueryEngine::new(provider, embedder);

    let session = SessionContext::start(document_store(&config))
        .await
        .context("failed to prepare document directory")?;

    let (shutdown_tx, shutdown_rx) = build_shutdown();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let mut app = App::new(CliChannel::stdio(), session, builder, engine, shutdown_rx)
        .with_status_rx(status_rx);
    app.run().await
}

fn init_subscriber(log_file: Option<&Path>) -> anyhow::Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
    Ok(())
}
