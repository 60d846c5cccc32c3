use clap::Parser;
use mcp2221_bridge::MCP2221;

use crate::util;

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum FlashCommand {
    /// Print the contents of the flash memory.
    Info {
        /// Also print the raw chip and GP settings sections.
        #[arg(long)]
        raw: bool,
    },
    /// Save the current SRAM settings to flash, to be used from power-up.
    Save,
}

pub(crate) fn action(device: &MCP2221, command: FlashCommand) -> Result<(), mcp2221_bridge::Error> {
    match command {
        FlashCommand::Info { raw } => {
            let info = device.flash_info()?;
            println!("manufacturer:  {}", info.manufacturer);
            println!("product:       {}", info.product);
            println!("serial number: {}", info.serial_number);
            println!("factory serial number: {}", info.factory_serial_number);
            if raw {
                println!("chip settings: {}", util::hex_bytes(&info.chip_settings));
                println!("GP settings:   {}", util::hex_bytes(&info.gp_settings));
            }
        }
        FlashCommand::Save => device.save_config()?,
    }
    Ok(())
}
