use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use talkie_server::{ConnectionRegistry, app, spawn_idle_sweeper};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "talkie-server")]
#[command(about = "Two-party WebRTC voice signaling relay")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000")]
    listen: SocketAddr,

    /// Seconds between idle-room sweeps
    #[arg(long, default_value_t = 1800)]
    sweep_interval_secs: u64,

    /// Allow any origin (useful when the host app is served elsewhere)
    #[arg(long)]
    permissive_cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let registry = Arc::new(ConnectionRegistry::new());
    spawn_idle_sweeper(
        registry.clone(),
        Duration::from_secs(args.sweep_interval_secs),
    );

    let mut router = app(registry);

    if args.permissive_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    info!("Signaling server listening on http://{}", args.listen);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    axum::serve(listener, router)
        .await
        .context("server exited with error")?;

    Ok(())
}
