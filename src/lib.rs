pub mod cli;
pub mod config;
pub mod serial;
pub mod station;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use serial::SerialInterface;
use station::{Completed, Outcome, StationSession};

/// Route `log` records through a colored fmt subscriber. `RUST_LOG` wins over
/// the `--verbose` level when set.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_ports {
        return list_ports();
    }

    let config = cli.session_config().context("Failed to load session settings")?;
    let port = cli.port.as_deref().context("No serial port given")?;
    log::debug!("Session settings: {:?}", config);

    let session = StationSession::open(port, config)?;
    let completed = session.execute(cli.command()).await?;
    print_outcome(&completed);
    Ok(())
}

fn list_ports() -> anyhow::Result<()> {
    let ports = SerialInterface::discover_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  {:04X}:{:04X}  {} {}",
                port.port_name,
                vid,
                pid,
                port.manufacturer.as_deref().unwrap_or(""),
                port.product.as_deref().unwrap_or("")
            ),
            _ => println!("{}", port.port_name),
        }
    }
    Ok(())
}

fn print_outcome(completed: &Completed) {
    match &completed.outcome {
        Outcome::Idle => log::info!("Console awake, no command requested"),
        Outcome::Firmware(reply) => {
            println!("Firmware reply: {}", reply.hex_dump());
            println!("Length: {} bytes", reply.len());
            println!("Text: {}", reply.text());
        }
        Outcome::Model(model) => {
            println!("Station model: {} (code {})", model.name, model.code)
        }
        Outcome::Backlight { on } => {
            println!("Backlight switched {}", if *on { "on" } else { "off" })
        }
    }
}
