// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Cluster Services Server
//!
//! Serves the versioned cluster services administration API:
//!
//! - Service, role and configuration reads
//! - Lifecycle commands (start, stop, restart, decommission, recommission)
//! - Maintenance mode, HDFS `/tmp` creation and Oozie schema creation
//! - Client configuration downloads as zip archives

use anyhow::{Context, Result};
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::info;

use services_server::ServicesServerImpl;
use services_server::config::{DEFAULT_BIND_ADDRESS, ServerConfig};
use services_server::context::ApiContext;

/// Default maximum request body size (bytes).
const DEFAULT_BODY_MAX_BYTES: usize = 1024 * 1024;

fn print_version() {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");
    let buildstamp = option_env!("STAMP").unwrap_or("no-STAMP");
    println!("{} {} ({})", name, version, buildstamp);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --version and --help
    let args: Vec<String> = std::env::args().collect();
    #[allow(clippy::never_loop)] // Intentional: early return on first recognized arg
    for arg in &args[1..] {
        match arg.as_str() {
            "-V" | "--version" => {
                print_version();
                return Ok(());
            }
            "-h" | "--help" => {
                print_version();
                println!("Usage: {} [OPTIONS]", args[0]);
                println!();
                println!("Options:");
                println!("  -h, --help       Display this information");
                println!("  -V, --version    Display the program's version number");
                println!();
                println!("Environment variables:");
                println!(
                    "  BIND_ADDRESS           Server bind address (default: {})",
                    DEFAULT_BIND_ADDRESS
                );
                println!("  CONFIG_FILE            Cluster topology and users (JSON, required)");
                println!(
                    "  COMMAND_DELAY_MS       Delay before asynchronous commands run (default: 0)"
                );
                println!("  COMMAND_HISTORY_LIMIT  Commands kept for polling (default: 1000)");
                println!("  MAINTENANCE_POLICY     conflict or idempotent (default: conflict)");
                println!(
                    "  RUST_LOG               Log filter (default: services_server=info,dropshot=info)"
                );
                return Ok(());
            }
            _ => {
                eprintln!("Unknown option: {}", arg);
                std::process::exit(1);
            }
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "services_server=info,dropshot=info".to_string()),
        ))
        .init();

    print_version();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address;
    info!(
        clusters = config.topology.clusters.len(),
        users = config.topology.users.len(),
        maintenance_policy = %config.maintenance_policy,
        command_delay_ms = config.command_delay.as_millis() as u64,
        "Loaded configuration"
    );

    let api_context = ApiContext::new(config);

    // Get API description from the trait implementation
    let api = services_api::services_api_mod::api_description::<ServicesServerImpl>()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: DEFAULT_BODY_MAX_BYTES,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };

    let log = config_logging
        .to_logger("services-server")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    // Start the server
    let server = HttpServerStarter::new(&config_dropshot, api, api_context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!("Services server running on http://{}", bind_address);

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}
