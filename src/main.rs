//! Network panel entry point.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!   SIGHUP/SIGTERM │  lifecycle::signals ──▶ bounded event queue      │
//!   ───────────────┼─▶                            │                   │
//!                  │                              ▼                   │
//!                  │                     lifecycle::supervisor        │
//!                  │                      │                │          │
//!                  │            start/stop│                │publish   │
//!                  │                      ▼                ▼          │
//!                  │    server::PanelServer       lifecycle::registry │
//!                  │    server::SubServer   ◀──read── (status route)  │
//!                  │          │                                       │
//!                  │          ▼ settings                              │
//!                  │    service::{setting,user} ──▶ database (JSON)   │
//!                  │          ▲                                       │
//!   netpanel       │          │                                       │
//!   setting/cert/  │    cli::commands, cli::uri                       │
//!   uri/migrate ───┼─▶                                                │
//!                  └──────────────────────────────────────────────────┘
//! ```

use std::io::Write;

use clap::Parser;

use netpanel::cli::{commands, normalize_legacy_flags, uri, Cli, Command};
use netpanel::config::load_from_env;
use netpanel::lifecycle::startup::run_server;
use netpanel::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(normalize_legacy_flags(std::env::args()));
    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    init_logging(&config.log)?;

    let db_path = config.db_path();
    let mut out = std::io::stdout();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            if let Err(e) = run_server(config).await {
                tracing::error!(error = %e, "Fatal error, exiting");
                std::process::exit(1);
            }
        }
        Command::Uri => uri::print_panel_uri(&db_path, &mut out).await?,
        Command::Migrate => {
            if let Err(e) = commands::migrate(&db_path, &mut out) {
                tracing::error!(error = %e, "Migration failed");
                std::process::exit(1);
            }
        }
        Command::Setting(args) => commands::run_setting(&db_path, &args, &mut out)?,
        Command::Cert(args) => commands::run_cert(&db_path, &args, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
