//! Meridian Entitlement Daemon
//!
//! Holds the cluster's single entitlement record and serves the license
//! lifecycle API (activate, deactivate, state).
//!
//! Usage:
//!   meridian-entitlementd --port 9600
//!
//! The daemon is in-memory only; the record lives for the life of the
//! process.

use anyhow::Result;
use clap::Parser;
use meridian_entitlement::EntitlementStateMachine;
use meridian_entitlementd::{build_router, EntitlementService};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "meridian-entitlementd")]
#[command(about = "Meridian enterprise entitlement service")]
struct Args {
    /// Port for the license API
    #[arg(short, long, default_value = "9600")]
    port: u16,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Meridian entitlement service starting...");
    let service = EntitlementService::new(EntitlementStateMachine::new());
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    info!("License API listening on port {}", args.port);
    axum::serve(listener, app).await?;
    Ok(())
}
