use std::sync::Arc;

use clap::Parser;
use mock_upstream::{Config, MockBackend, Request, Server, ServerContext};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing();

    let server = Server::bind(config.bind_addr()).await?;
    let backend = Arc::new(MockBackend::new(ServerContext::new(&config.server_name)));

    println!(
        "🚀 Mock server '{}' listening on port {}",
        config.server_name, config.port
    );
    println!("   Health check: http://localhost:{}/health", config.port);
    println!("   Press Ctrl+C to stop");

    server
        .run_until(
            move |req: Request| {
                let backend = Arc::clone(&backend);
                async move { backend.handle(&req) }
            },
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for Ctrl+C");
                }
            },
        )
        .await?;

    println!("\n👋 Stopping {}", config.server_name);
    Ok(())
}
