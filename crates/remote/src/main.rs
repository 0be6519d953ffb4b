// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cv-remote: WebSocket document store server for convo clients.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cv_remote::ServerState;

/// cv-remote: Conversation document store server
#[derive(Parser, Debug)]
#[command(name = "cv-remote")]
#[command(about = "WebSocket document store server for convo clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7420")]
    bind: SocketAddr,

    /// Directory for conversation storage (in-memory if omitted)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting cv-remote server");
    info!("  Bind address: {}", args.bind);

    let state = match &args.data {
        Some(dir) => {
            info!("  Data directory: {}", dir.display());
            ServerState::new(dir)?
        }
        None => {
            info!("  Data directory: none (in-memory)");
            ServerState::in_memory()
        }
    };

    cv_remote::run(args.bind, state).await?;

    Ok(())
}
