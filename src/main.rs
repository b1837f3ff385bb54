mod cli;

use reelhouse::{catalog, config, ingest, server, storage, thumbnail};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn start_server(
    host: String,
    port: u16,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting Reelhouse server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    // Open storage; an unwritable root refuses to start.
    let storage = Arc::new(storage::StorageLayout::open(&config.storage.root_dir)?);
    tracing::info!("Storage root: {}", config.storage.root_dir.display());

    for tool in thumbnail::check_tools() {
        if !tool.available {
            tracing::warn!(
                "{} not found on PATH; thumbnail generation will fail until it is installed",
                tool.name
            );
        }
    }

    // Rebuild the catalog from the persisted index and the files actually on
    // disk before accepting any request.
    let (catalog, pending) = catalog::Catalog::rebuild(&storage)?;
    let catalog = Arc::new(catalog);
    tracing::info!(
        "Catalog rebuilt: {} assets, {} awaiting thumbnails",
        catalog.len(),
        pending.len()
    );

    // Start the thumbnail worker pool.
    let settings = thumbnail::ThumbnailSettings::from(&config.thumbnails);
    let (job_tx, job_rx) = tokio::sync::mpsc::channel(256);
    let pool = thumbnail::ThumbnailWorkerPool::start(
        settings,
        Arc::clone(&catalog),
        Arc::clone(&storage),
        Arc::new(thumbnail::FfmpegExtractor),
        job_rx,
    );

    // Re-enqueue assets interrupted before their thumbnail was produced.
    for asset_id in pending {
        if job_tx
            .send(thumbnail::ThumbnailJob { asset_id })
            .await
            .is_err()
        {
            tracing::error!("Worker pool rejected startup job for {}", asset_id);
        }
    }

    let ingest = Arc::new(ingest::IngestService::new(
        Arc::clone(&storage),
        Arc::clone(&catalog),
        job_tx.clone(),
        config.ingest.max_upload_bytes,
    ));

    let ctx = server::AppContext {
        config: Arc::new(config.clone()),
        catalog,
        storage,
        ingest,
    };

    let server_result = server::start_server(&config, ctx).await;

    // Cleanup: close the job channel so workers drain and exit.
    tracing::info!("Shutting down...");
    drop(job_tx);
    pool.join().await;

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelhouse=trace,reelhouse_common=debug,tower_http=debug".to_string()
        } else {
            "reelhouse=debug,reelhouse_common=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelhouse {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = thumbnail::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Thumbnail generation needs them.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Storage root: {}", config.storage.root_dir.display());
            println!("  Max upload: {} bytes", config.ingest.max_upload_bytes);
            println!("  Thumbnail workers: {}", config.thumbnails.workers);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
