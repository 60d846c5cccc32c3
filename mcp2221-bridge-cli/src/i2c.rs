use clap::{Parser, ValueEnum, value_parser};
use mcp2221_bridge::{MCP2221, ReadKind, WriteKind};

use crate::util;

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum I2cCommand {
    /// Set the I2C bus clock speed.
    Speed {
        /// Bus speed in Hz, up to 400 kHz.
        #[arg(value_parser = value_parser!(u32).range(1..=400_000))]
        speed: u32,
    },
    /// List the addresses that acknowledge a one-byte read.
    Scan {
        /// First address to probe.
        #[arg(long, default_value = "0x08", value_parser = util::i2c_address)]
        first: u8,
        /// Last address to probe.
        #[arg(long, default_value = "0x77", value_parser = util::i2c_address)]
        last: u8,
    },
    /// Read bytes from a target.
    Read {
        /// 7-bit target address in hexadecimal.
        #[arg(value_parser = util::i2c_address)]
        address: u8,
        /// Number of bytes to read.
        #[arg(value_parser = value_parser!(u16).range(1..))]
        length: u16,
        /// Start the read with a repeated START.
        #[arg(long)]
        repeated_start: bool,
    },
    /// Write bytes to a target.
    Write {
        /// 7-bit target address in hexadecimal.
        #[arg(value_parser = util::i2c_address)]
        address: u8,
        /// Bytes to write, in hexadecimal.
        #[arg(required = true, value_parser = util::u8_from_hex)]
        data: Vec<u8>,
        /// Framing of the write.
        #[arg(long, default_value = "normal")]
        kind: WriteFraming,
    },
    /// Write bytes, then read with a repeated START and no STOP in between.
    WriteRead {
        /// 7-bit target address in hexadecimal.
        #[arg(value_parser = util::i2c_address)]
        address: u8,
        /// Number of bytes to read.
        #[arg(value_parser = value_parser!(u16).range(1..))]
        length: u16,
        /// Bytes to write, in hexadecimal.
        #[arg(required = true, value_parser = util::u8_from_hex)]
        data: Vec<u8>,
    },
    /// Cancel the current I2C transfer and attempt to free the bus.
    Release,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum WriteFraming {
    /// START, data, STOP.
    Normal,
    /// Repeated START, data, STOP.
    RepeatedStart,
    /// START, data, no STOP.
    NoStop,
}

impl From<WriteFraming> for WriteKind {
    fn from(value: WriteFraming) -> Self {
        match value {
            WriteFraming::Normal => WriteKind::Normal,
            WriteFraming::RepeatedStart => WriteKind::RepeatedStart,
            WriteFraming::NoStop => WriteKind::NoStop,
        }
    }
}

pub(crate) fn action(device: &MCP2221, command: I2cCommand) -> Result<(), mcp2221_bridge::Error> {
    match command {
        I2cCommand::Speed { speed } => device.i2c_set_speed(speed)?,
        I2cCommand::Scan { first, last } => {
            for address in device.i2c_scan(first..=last)? {
                println!("{address:#04x}");
            }
        }
        I2cCommand::Read {
            address,
            length,
            repeated_start,
        } => {
            let kind = if repeated_start {
                ReadKind::RepeatedStart
            } else {
                ReadKind::Normal
            };
            let mut buffer = vec![0u8; usize::from(length)];
            device.i2c_read_simple(address, &mut buffer, kind)?;
            println!("{}", util::hex_bytes(&buffer));
        }
        I2cCommand::Write {
            address,
            data,
            kind,
        } => device.i2c_write_simple(address, &data, kind.into())?,
        I2cCommand::WriteRead {
            address,
            length,
            data,
        } => {
            let mut buffer = vec![0u8; usize::from(length)];
            device.i2c_write_read(address, &data, &mut buffer)?;
            println!("{}", util::hex_bytes(&buffer));
        }
        I2cCommand::Release => device.i2c_release()?,
    }
    Ok(())
}
