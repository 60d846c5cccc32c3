//! Write and read back a page of a 24LC256 (or similar) I2C EEPROM.
//!
//! These EEPROMs take a two-byte, big-endian memory address, which maps onto a
//! [`RegisterFormat`] of width 2. After a write the part is busy for up to 5 ms
//! and does not acknowledge its address, so we poll until it answers again.
//!
//! [`RegisterFormat`]: mcp2221_bridge::RegisterFormat
use std::rc::Rc;
use std::time::{Duration, Instant};

use mcp2221_bridge::{ByteOrder, DeviceConfig, DeviceRegistry, Error, I2cSlave, RegisterFormat};

/// Address with A0..A2 tied low.
const ADDRESS: u8 = 0x50;

/// The 24LC256 has 64-byte pages; writes must not cross a page boundary.
const PAGE: u32 = 0x0040;

fn main() -> Result<(), Error> {
    let registry = DeviceRegistry::new();
    let device = registry.open(&DeviceConfig::default().with_i2c_speed(400_000))?;

    let format = RegisterFormat::new(2, ByteOrder::Big)?;
    let eeprom = I2cSlave::new(Rc::clone(&device), ADDRESS, format, false)?;

    let data: Vec<u8> = (0..64).collect();
    eeprom.write_register(PAGE, &data)?;
    wait_for_write(&eeprom)?;

    let mut read_back = [0u8; 64];
    eeprom.read_register(PAGE, &mut read_back)?;
    assert_eq!(read_back.as_slice(), data.as_slice());
    println!("Page at {PAGE:#06x} verified.");
    Ok(())
}

/// Poll the EEPROM until it finishes its internal write cycle.
fn wait_for_write(eeprom: &I2cSlave) -> Result<(), Error> {
    let deadline = Instant::now() + Duration::from_millis(50);
    while !eeprom.is_present()? {
        if Instant::now() > deadline {
            return Err(Error::Timeout);
        }
    }
    Ok(())
}
