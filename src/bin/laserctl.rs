//! Command-line front end: send one command to a laser and print the result.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::debug;

use fiber_laser::{
    ConnectionSettings, DeviceTable, LaserClient, LaserConfig, Model, TransportKind, Value,
};

#[derive(Parser)]
#[command(version, about = "Send one command to a fiber laser", long_about = None)]
struct Cli {
    /// TOML configuration file (connection and command table)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transport to use: serial, tcp or udp
    #[arg(long)]
    transport: Option<String>,

    /// Serial port name, or network host (optionally host:port)
    #[arg(long)]
    address: Option<String>,

    /// Network port
    #[arg(long)]
    port: Option<u16>,

    /// Serial line speed
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Response timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Built-in command table (rfl-c3000s, rfl-xz, rfl-abp, rfl-qcw150-1500, ylr)
    #[arg(long, conflicts_with = "table")]
    model: Option<String>,

    /// TOML command table
    #[arg(long)]
    table: Option<PathBuf>,

    /// Print the command table and exit
    #[arg(long)]
    list: bool,

    /// Command token, e.g. RCS
    #[arg(required_unless_present = "list")]
    command: Option<String>,

    /// Argument for Set commands
    value: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(|path| {
            LaserConfig::load_from(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        })
        .transpose()?;

    let table = command_table(&cli, config.as_ref())?;

    if cli.list {
        println!("{}", table.name());
        for command in table.iter() {
            println!(
                "  {:<8} {:<4} {}",
                command.token, command.direction, command.value_type
            );
        }
        return Ok(());
    }

    let token = cli
        .command
        .as_deref()
        .ok_or_else(|| anyhow!("No command given"))?;
    let settings = connection_settings(&cli, config.as_ref())?;
    debug!("Connection settings: {settings:?}");

    let mut client = LaserClient::open(&settings, Arc::new(table)).with_context(|| {
        format!(
            "Failed to open {} connection to {}",
            settings.transport, settings.address
        )
    })?;

    let result = client
        .send(token, cli.value.clone().map(Value::from))
        .with_context(|| format!("Command {token} failed"))?;
    println!("{} = {result}", token.trim().to_ascii_uppercase());

    client.close()?;
    Ok(())
}

/// Command-line table selection wins over the configuration file.
fn command_table(cli: &Cli, config: Option<&LaserConfig>) -> Result<DeviceTable> {
    if let Some(model) = &cli.model {
        return Ok(model.parse::<Model>()?.table());
    }
    if let Some(path) = &cli.table {
        return DeviceTable::from_toml_file(path)
            .with_context(|| format!("Failed to load command table {}", path.display()));
    }
    match config {
        Some(config) => Ok(config.device_table()?),
        None => bail!("Specify --model, --table or --config"),
    }
}

fn connection_settings(cli: &Cli, config: Option<&LaserConfig>) -> Result<ConnectionSettings> {
    let mut settings = match (config, &cli.transport, &cli.address) {
        (Some(config), _, _) => config.connection.clone(),
        (None, Some(kind), Some(address)) => {
            ConnectionSettings::new(kind.parse::<TransportKind>()?, address.clone())
        }
        (None, _, _) => bail!("Specify --transport and --address, or --config"),
    };

    if let (Some(_), Some(kind)) = (config, &cli.transport) {
        settings.transport = kind.parse::<TransportKind>()?;
    }
    if let (Some(_), Some(address)) = (config, &cli.address) {
        settings.address = address.clone();
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(baud_rate) = cli.baud_rate {
        settings.baud_rate = baud_rate;
    }
    if let Some(timeout) = cli.timeout {
        settings.timeout = timeout;
    }
    Ok(settings)
}
