mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::CliArgs;
use server::config::ServerConfig;
use server::server::NetwatchServer;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut cfg = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        None => ServerConfig::default(),
    };

    // Override with command line arguments
    if let Some(listen_addr) = args.listen_addr {
        cfg.listen_addr = listen_addr;
    }
    if let Some(database_path) = args.database_path {
        cfg.database_path = database_path;
    }
    if let Some(log_level) = args.log_level {
        cfg.log_level = log_level;
    }
    if let Some(log_dir) = args.log_dir {
        cfg.log_dir = Some(log_dir);
    }
    if let Some(threads) = args.runtime_threads {
        cfg.runtime_threads = Some(threads);
    }
    cfg.validate().context("Invalid configuration")?;

    let _guard = common::init_tracing(cfg.log_dir.as_deref(), &cfg.log_file, &cfg.log_level)
        .context("Failed to initialize logging")?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = cfg.runtime_threads {
        builder.worker_threads(threads);
    }
    let runtime = builder.build().context("Failed to build tokio runtime")?;

    runtime.block_on(async move {
        info!("Starting netwatch");
        info!("Listen address: {}", cfg.listen_addr);
        info!("Database: {}", cfg.database_path);
        match cfg.runtime_threads {
            Some(threads) => info!("Runtime threads: {}", threads),
            None => info!("Runtime threads: default (CPU cores)"),
        }

        let server = NetwatchServer::new(cfg)
            .await
            .context("Failed to initialize server")?;

        if let Err(e) = server.run(shutdown_signal()).await {
            error!("Server stopped with error: {}", e);
            return Err(anyhow::Error::from(e));
        }

        info!("Shutting down netwatch");
        Ok::<(), anyhow::Error>(())
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
