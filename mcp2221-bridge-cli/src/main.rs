use clap::Parser;
use mcp2221_bridge::MCP2221;
use tracing_subscriber::EnvFilter;

use cli::Commands;

mod analog;
mod cli;
mod flash;
mod i2c;
mod pins;
mod usb;
mod util;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<mcp2221_bridge::Error>() {
            Some(error) => eprintln!("error [{} {}]: {error}", error.kind_name(), error.code()),
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let device = MCP2221::open(&cli.device_config())?;
    tracing::debug!(key = %device.key(), "opened device");
    match cli.command {
        Commands::Status => println!("{:#?}", device.status()?),
        Commands::I2c(command) => i2c::action(&device, command)?,
        Commands::Pins(command) => pins::action(&device, command)?,
        Commands::Adc(command) => analog::adc_action(&device, command)?,
        Commands::Dac(command) => analog::dac_action(&device, command)?,
        Commands::Clock(args) => analog::clock_action(&device, args)?,
        Commands::Interrupt(command) => analog::interrupt_action(&device, command)?,
        Commands::Flash(command) => flash::action(&device, command)?,
        Commands::Usb(command) => usb::action(&device, command)?,
        Commands::Raw { bytes } => println!("{}", util::hex_bytes(&device.send_raw(&bytes)?)),
        Commands::Reset => device.reset()?,
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::cli::{Cli, Commands};

    use clap::{CommandFactory, Parser};

    #[test]
    fn check_cli_debug_asserts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_enables_driver_logging() {
        let cli = Cli::try_parse_from(["mcp2221-bridge", "-vv", "--serial", "X1", "status"]).unwrap();
        let config = cli.device_config();
        assert!(config.debug_messages);
        assert!(config.trace_packets);
        assert_eq!(config.selector, mcp2221_bridge::DeviceSelector::Serial("X1".into()));
        assert_eq!(cli.log_level(), "trace");
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn i2c_write_takes_hex_bytes() {
        let cli =
            Cli::try_parse_from(["mcp2221-bridge", "i2c", "write", "0x50", "00", "0xFF"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
        assert!(Cli::try_parse_from(["mcp2221-bridge", "i2c", "write", "0x80", "00"]).is_err());
        assert!(Cli::try_parse_from(["mcp2221-bridge", "dac", "write", "32"]).is_err());
    }
}
