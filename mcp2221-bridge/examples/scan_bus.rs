//! # I2C bus-scanning example
//!
//! This attempts to find out which targets are connected to the I2C bus by
//! reading a single byte from each address in the usual 7-bit range. If a target
//! acknowledges its address, the address is printed (in hexadecimal).
//!
//! Reading from a target that does not expect it can leave SDA held low. The
//! driver releases the bus after each failed read, and reports a line that stays
//! stuck.
//!
//! Pass a USB serial number as the first argument to pick one of several
//! MCP2221s.
use mcp2221_bridge::{DeviceConfig, MCP2221};

fn main() -> Result<(), mcp2221_bridge::Error> {
    let mut config = DeviceConfig::default().with_i2c_speed(100_000);
    if let Some(serial) = std::env::args().nth(1) {
        config = config.with_serial(serial);
    }
    let device = MCP2221::open(&config)?;

    println!("Scanning the I2C bus...\n");
    let found = device.i2c_scan(0x08..=0x77)?;
    for address in 0..128u8 {
        if start_line(address) {
            print!("{address:02X}:  ");
        }
        if found.contains(&address) {
            print!("{address:02X} ");
        } else {
            print!("-- ")
        }
        if end_line(address) {
            println!();
        }
    }
    println!("\n{} target(s) found.", found.len());

    Ok(())
}

fn start_line(n: u8) -> bool {
    n % 16 == 0
}

fn end_line(n: u8) -> bool {
    n % 16 == 15
}
