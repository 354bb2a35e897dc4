//! Tracehop entry service binary.
//!
//! Serves the traced entry point plus the downstream stand-in endpoints,
//! so a single instance chains to itself:
//!
//! ```bash
//! tracehop-service serve --port 8080
//! curl http://127.0.0.1:8080/service-a        # normal path
//! curl http://127.0.0.1:8080/service-a?n=1.5  # timeout fault
//! curl http://127.0.0.1:8080/service-a?n=3    # error fault
//! ```

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracehop_service::{create_router, AppState, SERVICE_ID, SERVICE_VERSION};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tracehop-service")]
#[command(about = "Trace-relay entry service with scenario-driven fan-out and chaining")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Scheme used to reach the downstream host
        #[arg(long, default_value = "http", env = "DOWNSTREAM_SCHEME")]
        downstream_scheme: String,

        /// Delay served by the designated slow endpoint, in milliseconds
        #[arg(long, default_value = "1000", env = "SLOW_DELAY_MS")]
        slow_delay_ms: u64,

        /// Deployment stage, used to name the demo backends
        #[arg(long, default_value = "dev", env = "STAGE")]
        stage: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            downstream_scheme,
            slow_delay_ms,
            stage,
        } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let state = Arc::new(AppState::new(
                downstream_scheme,
                Duration::from_millis(slow_delay_ms),
                &stage,
            ));
            let router = create_router(state);

            tracing::info!("Starting {} {} on {}", SERVICE_ID, SERVICE_VERSION, addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
