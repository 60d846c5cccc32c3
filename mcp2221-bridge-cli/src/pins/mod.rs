use std::time::Duration;

use clap::{Parser, value_parser};
use mcp2221_bridge::MCP2221;
use mcp2221_bridge::gpio::{GpPin, GpioPoller, PinFunctions};

use modes::GpModes;
use values::PinValues;

mod modes;
mod values;

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum PinsCommand {
    /// Read the direction and level of the pins in GPIO mode.
    Read,
    /// Set the direction and level of pins in GPIO mode.
    #[command(flatten_help = true)]
    Write(PinValues),
    /// Change the mode of the GP pins.
    #[command(flatten_help = true)]
    Function(GpModes),
    /// Print level changes of the GPIO pins until interrupted.
    Poll {
        /// Milliseconds between reads.
        #[arg(long, default_value = "10", value_parser = value_parser!(u64).range(1..))]
        interval_ms: u64,
        /// Stop after this many changes.
        #[arg(long)]
        count: Option<usize>,
    },
}

pub(crate) fn action(device: &MCP2221, command: PinsCommand) -> Result<(), mcp2221_bridge::Error> {
    match command {
        PinsCommand::Read => {
            let values = device.gpio_read()?;
            for pin in GpPin::ALL {
                match values.get(pin) {
                    Some((direction, level)) => println!("{pin}: {direction:?} {level:?}"),
                    None => println!("{pin}: not GPIO"),
                }
            }
        }
        PinsCommand::Write(pin_values) => device.gpio_write(&pin_values.into())?,
        PinsCommand::Function(GpModes { save, pin_modes }) => {
            device.set_pin_functions(&PinFunctions::from(&pin_modes))?;
            if save {
                device.save_config()?;
            }
        }
        PinsCommand::Poll { interval_ms, count } => {
            let mut poller = GpioPoller::new();
            let mut seen = 0;
            while count.is_none_or(|limit| seen < limit) {
                for change in poller.poll(device)?.iter().filter(|c| c.changed) {
                    match change.edge() {
                        Some(edge) => println!("{}: {edge:?}", change.pin),
                        None => println!("{}: {:?} -> {:?}", change.pin, change.old, change.new),
                    }
                    seen += 1;
                }
                std::thread::sleep(Duration::from_millis(interval_ms));
            }
        }
    }
    Ok(())
}
