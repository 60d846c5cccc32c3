//! Tests against real hardware: an MCP2221 wired to a Raspberry Pi Pico that
//! acts as an I2C target at address 0x26.
//!
//! The target serves sequential bytes: a plain read starts at 0, and a write of
//! `[start, count]` makes the next read start at `start`.
//!
//! These are ignored by default. Run them serially, because only one handle can
//! hold the USB device at a time:
//!
//! ```sh
//! cargo test -p mcp2221-bridge --test hardware -- --ignored --test-threads=1
//! ```
use std::rc::Rc;

use embedded_hal::i2c::{I2c, Operation};
use mcp2221_bridge::{DeviceConfig, DeviceRegistry, Error, I2cSlave, MCP2221, RegisterFormat};

const ADDRESS: u8 = 0x26;

fn open() -> Result<MCP2221, Error> {
    MCP2221::open(&DeviceConfig::default().with_i2c_speed(100_000))
}

/// Reads 10 sequential bytes from the Pico.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn eh_i2c_read() -> Result<(), Error> {
    let mut device = open()?;
    let mut buf = [0u8; 10];
    device.read(ADDRESS, &mut buf)?;
    assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    Ok(())
}

/// Reads 10 sequential bytes from the Pico into 2 buffers.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn eh_i2c_read_transaction() -> Result<(), Error> {
    let mut device = open()?;
    let mut buf_1 = [0u8; 5];
    let mut buf_2 = [0u8; 5];
    device.transaction(
        ADDRESS,
        &mut [Operation::Read(&mut buf_1), Operation::Read(&mut buf_2)],
    )?;
    assert_eq!(buf_1, [0, 1, 2, 3, 4]);
    assert_eq!(buf_2, [5, 6, 7, 8, 9]);
    Ok(())
}

/// Writes [0x30, 0x0A] from two buffers, then reads 10 bytes into two buffers.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn eh_i2c_writeread_transaction() -> Result<(), Error> {
    let mut device = open()?;
    let mut buf_1 = [0u8; 5];
    let mut buf_2 = [0u8; 5];
    device.transaction(
        ADDRESS,
        &mut [
            Operation::Write(&[0x30]),
            Operation::Write(&[10]),
            Operation::Read(&mut buf_1),
            Operation::Read(&mut buf_2),
        ],
    )?;
    assert_eq!(buf_1, [0x30, 0x31, 0x32, 0x33, 0x34]);
    assert_eq!(buf_2, [0x35, 0x36, 0x37, 0x38, 0x39]);
    Ok(())
}

/// Reads more than one Get Data chunk.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn long_read_spans_chunks() -> Result<(), Error> {
    let device = open()?;
    let mut buf = [0u8; 130];
    device.i2c_write_read(ADDRESS, &[0x00, 130], &mut buf)?;
    assert!(buf.iter().enumerate().all(|(i, &b)| b == i as u8));
    Ok(())
}

/// The Pico responds to its address, and nothing answers one address up.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn check_address() -> Result<(), Error> {
    let device = open()?;
    assert!(device.i2c_check_address(ADDRESS)?);
    assert!(!device.i2c_check_address(ADDRESS + 1)?);
    Ok(())
}

/// Two slaves opened through one registry share the device.
#[test]
#[ignore = "needs an MCP2221 wired to the Pico target"]
fn slaves_share_a_registry_handle() -> Result<(), Error> {
    let registry = DeviceRegistry::new();
    let config = DeviceConfig::default();
    let device = registry.open(&config)?;
    assert!(Rc::ptr_eq(&device, &registry.open(&config)?));

    let pico = I2cSlave::new(Rc::clone(&device), ADDRESS, RegisterFormat::default(), false)?;
    let mut buf = [0u8; 4];
    pico.read_register(0x10, &mut buf)?;
    assert_eq!(buf, [0x10, 0x11, 0x12, 0x13]);
    Ok(())
}

/// Status reports a plausible hardware revision.
#[test]
#[ignore = "needs an MCP2221"]
fn status_revision() -> Result<(), Error> {
    let device = open()?;
    let status = device.status()?;
    assert_eq!(status.hardware_revision.major, 'A');
    Ok(())
}
