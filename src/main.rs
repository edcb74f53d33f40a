//! courtside HTTP service
//!
//! Usage: courtside [BIND_ADDR]
//!
//! Binds to 0.0.0.0:5000 by default. Log verbosity follows `RUST_LOG`
//! (default `info`).

use courtside::feed::HttpFeed;
use courtside::server::{parse_bind_addr, HttpServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: courtside [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:5000)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  courtside                     # binds to 0.0.0.0:5000");
    eprintln!("  courtside localhost           # binds to 127.0.0.1:5000");
    eprintln!("  courtside 127.0.0.1:8080      # binds to 127.0.0.1:8080");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();
    if let Some(arg) = args.get(1) {
        match parse_bind_addr(arg) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let feed = HttpFeed::new(config.feed.clone())?;
    let server = HttpServer::new(config, feed);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
