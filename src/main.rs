use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use irlap_daemon_lib::config::DaemonConfig;
use irlap_daemon_lib::daemon;
use irlap_daemon_lib::serial::{SerialBackend, SystemSerialBackend};

#[derive(Debug, Parser)]
#[command(name = "ir_daemon", version, about = "Serial IR lap-timing reader")]
struct Cli {
    /// Path of the JSON configuration file
    #[arg(long, default_value = "ir_daemon.json")]
    config: PathBuf,

    /// Serial device to use instead of the configured one
    #[arg(long)]
    device: Option<String>,

    /// Verbose logging, including hex dumps of received bytes
    #[arg(long)]
    debug: bool,

    /// Print the visible serial ports and exit
    #[arg(long)]
    list_serial_ports: bool,

    /// Store the serial device in the configuration file and exit
    #[arg(long, value_name = "NAME")]
    set_device: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.debug |= cli.debug;

    let level = if config.debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("starting ir_daemon v{}", irlap_daemon_lib::VERSION);
    if config.debug {
        log::info!("enabled debug mode");
    }

    if cli.list_serial_ports {
        return list_serial_ports();
    }

    if let Some(device) = cli.set_device {
        config.serial_device = device;
        config
            .save(&cli.config)
            .with_context(|| format!("failed to write {}", cli.config.display()))?;
        return Ok(());
    }

    if let Some(device) = cli.device {
        config.serial_device = device;
    }
    config.validate()?;

    let reader = daemon::build_reader(&config);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(daemon::run(reader, Duration::from_millis(config.tick_interval_ms)))?;
    Ok(())
}

fn list_serial_ports() -> anyhow::Result<()> {
    let ports = SystemSerialBackend::new()
        .available_ports()
        .context("failed to enumerate serial ports")?;

    for port in ports {
        println!(
            "{}\t{}\t{}",
            port.port_name,
            port.port_type,
            port.product.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
