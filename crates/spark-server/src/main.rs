use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spark_runtime::RuntimeConfig;
use spark_server::{AppState, router};

#[derive(Parser)]
#[command(name = "careerspark", version, about = "CareerSpark API server")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RuntimeConfig::from_env();
    let state = AppState::from_config(&config);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("Error: failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    info!(addr = %addr, region = %config.region, "CareerSpark API listening");

    if let Err(err) = axum::serve(listener, router(state)).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
