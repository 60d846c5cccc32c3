use std::time::Duration;

use crate::analog::{AdcCommand, ClockArgs, DacCommand, InterruptCommand};
use crate::flash::FlashCommand;
use crate::i2c::I2cCommand;
use crate::pins::PinsCommand;
use crate::usb::UsbCommand;
use crate::util;

use clap::{ArgAction, Parser};
use mcp2221_bridge::DeviceConfig;

/// CLI for the MCP2221 USB to I2C and GPIO bridge
///
/// This exposes the functionality of the Microchip MCP2221 via the command
/// line.
///
/// You can put the GP pins into any of their possible modes, as well as read
/// from and write to them as GPIO (digital) inputs or outputs. Analog input and
/// output is handled via the adc and dac commands, respectively.
///
/// I2C transfers can be made up to the maximum length of 65,535 bytes. Only
/// 7-bit I2C addresses are supported. The CLI supports writes, reads, and
/// write-reads (where no Stop condition occurs between a write and a read).
///
/// Errors are printed with their kind and numeric code. Use -v to log re-tries
/// and I2C bus recovery, and -vv to also dump every USB report.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Device vendor ID in hexadecimal
    #[arg(long = "vid", default_value = "0x4D8", value_parser = util::u16_from_hex)]
    pub(crate) vid: u16,
    /// Device product ID in hexadecimal
    #[arg(long = "pid", default_value = "0xDD", value_parser = util::u16_from_hex)]
    pub(crate) pid: u16,
    /// Open the n-th matching device, counting from 0
    #[arg(long, conflicts_with = "serial")]
    pub(crate) index: Option<usize>,
    /// Open the device with this USB serial number
    #[arg(long)]
    pub(crate) serial: Option<String>,
    /// Milliseconds to wait for each response from the device
    #[arg(long, default_value = "500")]
    pub(crate) timeout_ms: u64,
    /// Number of times a failed command is re-sent
    #[arg(long, default_value = "3")]
    pub(crate) retries: u32,
    /// Dump every USB report, as with -vv
    #[arg(long)]
    pub(crate) trace_packets: bool,
    /// Increase logging (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

impl Cli {
    /// Driver configuration from the global options.
    pub(crate) fn device_config(&self) -> DeviceConfig {
        let config = DeviceConfig::default()
            .with_vid_and_pid(self.vid, self.pid)
            .with_read_timeout(Duration::from_millis(self.timeout_ms))
            .with_retries(self.retries)
            .with_debug_messages(self.verbose >= 1)
            .with_trace_packets(self.trace_packets || self.verbose >= 2);
        match (&self.serial, self.index) {
            (Some(serial), _) => config.with_serial(serial.clone()),
            (None, Some(index)) => config.with_index(index),
            (None, None) => config,
        }
    }

    /// Default log filter for the verbosity.
    pub(crate) fn log_level(&self) -> &'static str {
        match (self.verbose, self.trace_packets) {
            (0, false) => "warn",
            (1, false) => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Parser)]
pub(crate) enum Commands {
    /// Read the current device status.
    Status,
    /// Perform I2C transfers.
    #[command(subcommand)]
    I2c(I2cCommand),
    /// Read or configure the GP pins.
    #[command(subcommand)]
    Pins(PinsCommand),
    /// Read or configure the ADC.
    #[command(subcommand)]
    Adc(AdcCommand),
    /// Set or configure the DAC output.
    #[command(subcommand)]
    Dac(DacCommand),
    /// Configure the clock output on GP1.
    Clock(ClockArgs),
    /// Configure, read or clear the GP1 interrupt flag.
    #[command(subcommand)]
    Interrupt(InterruptCommand),
    /// Read the flash memory, or save the current settings to it.
    #[command(subcommand)]
    Flash(FlashCommand),
    /// Read or change the USB descriptors.
    #[command(subcommand)]
    Usb(UsbCommand),
    /// Send a raw command report and print the response.
    Raw {
        /// Command bytes in hexadecimal, zero-padded to 64 bytes.
        #[arg(required = true, num_args = 1..=64, value_parser = util::u8_from_hex)]
        bytes: Vec<u8>,
    },
    /// Reset the MCP2221.
    Reset,
}
