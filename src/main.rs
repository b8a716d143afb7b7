//! CLI entry point for panelforge.
//!
//! Thin front end over the core library, useful for bench work without the
//! desktop UI:
//! - `scan`: one-shot board enumeration
//! - `watch`: run the discovery monitor and print events
//! - `validate`: check a project file's structural invariants
//! - `new`: write a fresh default project
//! - `recent`: list recent project files

use anyhow::Result;
use clap::{Parser, Subcommand};
use panelforge::discovery::{DeviceEnumerator, DiscoveryEvent, DiscoveryService};
use panelforge::model::ProjectConfiguration;
use panelforge::settings::SettingsStore;
use panelforge::store::ConfigurationStore;
use panelforge::validation;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "panelforge")]
#[command(about = "Control panel configuration tool for Arduino-based button boxes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan once for connected boards
    Scan,

    /// Monitor boards and print connect/disconnect events until interrupted
    Watch,

    /// Validate a project file
    Validate {
        /// Path to a .panelcfg (or plain JSON) project file
        file: PathBuf,
    },

    /// Create a new default project file
    New {
        /// Destination path
        file: PathBuf,

        /// Project display name
        #[arg(long)]
        name: Option<String>,
    },

    /// List recent project files
    Recent,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan => scan(),
        Commands::Watch => watch().await,
        Commands::Validate { file } => validate_file(&file),
        Commands::New { file, name } => new_project(&file, name),
        Commands::Recent => list_recent(),
    }
}

fn scan() -> Result<()> {
    let enumerator = DeviceEnumerator::system();
    let devices = enumerator.scan()?;

    if devices.is_empty() {
        println!("No boards detected.");
        return Ok(());
    }

    println!("Found {} candidate board(s):\n", devices.len());
    for device in &devices {
        println!(
            "  {:<16} {:<20} [{}]  vid {:04x} pid {:04x}  {}",
            device.port_name,
            device.board_kind.label(),
            device.status.label(),
            device.vendor_id,
            device.product_id,
            device.description.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn watch() -> Result<()> {
    let service = DiscoveryService::with_system_ports();
    let mut events = service.subscribe();
    service.start();
    println!("Monitoring boards (ctrl-c to stop)...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(DiscoveryEvent::Connected(device)) => {
                    println!("+ {} ({})", device.port_name, device.board_kind.label());
                }
                Ok(DiscoveryEvent::Disconnected(device)) => {
                    println!("- {}", device.port_name);
                }
                Ok(DiscoveryEvent::Changed(devices)) => {
                    println!("  {} board(s) present", devices.len());
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    service.stop();
    Ok(())
}

fn validate_file(file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)?;
    let config: ProjectConfiguration = serde_json::from_str(&json)?;
    match validation::validate(&config) {
        Ok(()) => {
            println!(
                "OK: '{}' ({} inputs, {} displays, {} mappings)",
                config.name,
                config.inputs.len(),
                config.displays.len(),
                config.output_mappings.len()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("INVALID: {err}");
            std::process::exit(1);
        }
    }
}

fn new_project(file: &Path, name: Option<String>) -> Result<()> {
    let settings = SettingsStore::load_default().into_handle();
    let mut store = ConfigurationStore::new(settings);
    store.new_project();
    if let Some(name) = name {
        store.set_project_name(name);
    }
    store.save(Some(file))?;
    println!("Wrote {}", file.display());
    Ok(())
}

fn list_recent() -> Result<()> {
    let settings = SettingsStore::load_default().into_handle();
    let recent = settings.lock().recent_files();
    if recent.is_empty() {
        println!("No recent projects.");
    } else {
        for path in recent {
            println!("{}", path.display());
        }
    }
    Ok(())
}
