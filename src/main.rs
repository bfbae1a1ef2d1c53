//! Account REST API service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use account_service::api::{create_router, AppState};
use account_service::config::Config;
use account_service::metrics;
use account_service::store;
use account_service::utils::shutdown_signal;

/// Exit code telling a process supervisor not to restart workers after a
/// failed store initialization.
const EXIT_STORE_INIT_FAILED: i32 = 4;

/// Account REST API service.
#[derive(Parser, Debug)]
#[command(name = "account-service")]
#[command(about = "CRUD REST microservice for Account records")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let config = Config::load()?;
    init_logging(&config, args.verbose);

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    }
}

/// Install the tracing subscriber, plain or JSON.
fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose || config.verbose {
        EnvFilter::new("account_service=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ACCOUNT SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Store: {}", config.store_kind());
    if let Some(url) = &config.database_url {
        println!("  Database URL: {}", url);
    }
    println!(
        "  Public URL: {}",
        config.public_url.as_deref().unwrap_or("(from Host header)")
    );
    println!("  Log format: {}", if config.log_json { "json" } else { "text" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("{}", "*".repeat(70));
    info!("{:*^70}", "  A C C O U N T   S E R V I C E   R U N N I N G  ");
    info!("{}", "*".repeat(70));

    let store = match store::open(config.database_url.as_deref()).await {
        Ok(store) => store,
        Err(e) => {
            error!("Store initialization failed: {}", e);
            std::process::exit(EXIT_STORE_INIT_FAILED);
        }
    };
    info!("Store backend: {}", config.store_kind());

    let mut state = AppState::new(store);
    if let Some(url) = config.public_base_url()? {
        state = state.with_public_url(url);
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::init_metrics();
            state = state.with_metrics(handle);
        }
        Err(e) => warn!("Metrics recorder not installed: {}", e),
    }

    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!("Service initialized successfully!");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
