//! SMBus transactions on top of the I2C engine.
//!
//! The MCP2221 has no SMBus support of its own, so each transaction is built from
//! plain I2C writes and reads. Command (register) reads are a write without a
//! STOP followed by a repeated-START read. Packet error checking is not
//! supported.

use crate::driver::MCP2221;
use crate::error::Error;
use crate::i2c::{ReadKind, WriteKind};
use crate::transport::{HidTransport, Transport};

/// Longest block in a block transfer (SMBus 3.x).
pub const SMBUS_BLOCK_MAX: usize = 255;

/// SMBus view of the MCP2221's I2C bus.
///
/// Words are sent and received least significant byte first, as the SMBus
/// specification requires. All transfers use the handle's read timeout as the
/// I2C watchdog.
///
/// ```no_run
/// # use mcp2221_bridge::{DeviceConfig, MCP2221, SmBus};
/// # fn main() -> Result<(), mcp2221_bridge::Error> {
/// let device = MCP2221::open(&DeviceConfig::default())?;
/// let bus = SmBus::new(&device);
/// let voltage = bus.read_word_data(0x0B, 0x09)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SmBus<'a, T: Transport = HidTransport> {
    device: &'a MCP2221<T>,
}

impl<'a, T: Transport> SmBus<'a, T> {
    /// Use the I2C bus of `device`.
    pub fn new(device: &'a MCP2221<T>) -> Self {
        Self { device }
    }

    fn read_command(&self, address: u8, command: u8, buffer: &mut [u8]) -> Result<(), Error> {
        self.device.i2c_write_simple(address, &[command], WriteKind::NoStop)?;
        self.device.i2c_read_simple(address, buffer, ReadKind::RepeatedStart)
    }

    fn write_command(&self, address: u8, command: u8, data: &[u8]) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(1 + data.len());
        payload.push(command);
        payload.extend_from_slice(data);
        self.device.i2c_write_simple(address, &payload, WriteKind::Normal)
    }

    /// Read a byte without a command code (Receive Byte).
    pub fn read_byte(&self, address: u8) -> Result<u8, Error> {
        let mut value = [0u8; 1];
        self.device.i2c_read_simple(address, &mut value, ReadKind::Normal)?;
        Ok(value[0])
    }

    /// Write a byte without a command code (Send Byte).
    pub fn write_byte(&self, address: u8, value: u8) -> Result<(), Error> {
        self.device.i2c_write_simple(address, &[value], WriteKind::Normal)
    }

    /// Read Byte.
    pub fn read_byte_data(&self, address: u8, command: u8) -> Result<u8, Error> {
        let mut value = [0u8; 1];
        self.read_command(address, command, &mut value)?;
        Ok(value[0])
    }

    /// Write Byte.
    pub fn write_byte_data(&self, address: u8, command: u8, value: u8) -> Result<(), Error> {
        self.write_command(address, command, &[value])
    }

    /// Read Word.
    pub fn read_word_data(&self, address: u8, command: u8) -> Result<u16, Error> {
        let mut value = [0u8; 2];
        self.read_command(address, command, &mut value)?;
        Ok(u16::from_le_bytes(value))
    }

    /// Write Word.
    pub fn write_word_data(&self, address: u8, command: u8, value: u16) -> Result<(), Error> {
        self.write_command(address, command, &value.to_le_bytes())
    }

    /// Process Call: write a word and read the word the target answers with.
    pub fn process_call(&self, address: u8, command: u8, value: u16) -> Result<u16, Error> {
        let [low, high] = value.to_le_bytes();
        self.device.i2c_write_simple(address, &[command, low, high], WriteKind::NoStop)?;
        let mut answer = [0u8; 2];
        self.device.i2c_read_simple(address, &mut answer, ReadKind::RepeatedStart)?;
        Ok(u16::from_le_bytes(answer))
    }

    /// Block Read.
    ///
    /// The MCP2221 must know the read length up-front, so the byte count and the
    /// longest possible block are read, and the data is cut to the count the
    /// target sent.
    pub fn read_block_data(&self, address: u8, command: u8) -> Result<Vec<u8>, Error> {
        let mut buffer = [0u8; 1 + SMBUS_BLOCK_MAX];
        self.read_command(address, command, &mut buffer)?;
        Ok(block_from_response(&buffer))
    }

    /// Block Write. The byte count is sent before `data`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `data` is longer than 255 bytes.
    pub fn write_block_data(&self, address: u8, command: u8, data: &[u8]) -> Result<(), Error> {
        let count = block_count(data)?;
        let mut payload = Vec::with_capacity(1 + data.len());
        payload.push(count);
        payload.extend_from_slice(data);
        self.write_command(address, command, &payload)
    }

    /// Block Write-Block Read Process Call.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `data` is longer than 255 bytes.
    pub fn block_process_call(
        &self,
        address: u8,
        command: u8,
        data: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let count = block_count(data)?;
        let mut payload = Vec::with_capacity(2 + data.len());
        payload.extend_from_slice(&[command, count]);
        payload.extend_from_slice(data);
        self.device.i2c_write_simple(address, &payload, WriteKind::NoStop)?;

        let mut buffer = [0u8; 1 + SMBUS_BLOCK_MAX];
        self.device.i2c_read_simple(address, &mut buffer, ReadKind::RepeatedStart)?;
        Ok(block_from_response(&buffer))
    }

    /// Read `buffer.len()` bytes from `command`, without a byte count.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `buffer` is longer than 255 bytes.
    pub fn read_i2c_block_data(
        &self,
        address: u8,
        command: u8,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        block_count(buffer)?;
        self.read_command(address, command, buffer)
    }

    /// Write `data` to `command`, without a byte count.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `data` is longer than 255 bytes.
    pub fn write_i2c_block_data(&self, address: u8, command: u8, data: &[u8]) -> Result<(), Error> {
        block_count(data)?;
        self.write_command(address, command, data)
    }
}

fn block_count(data: &[u8]) -> Result<u8, Error> {
    u8::try_from(data.len()).map_err(|_| Error::InvalidArgument("SMBus block exceeds 255 bytes"))
}

/// The data of a block response, which starts with its byte count.
fn block_from_response(buffer: &[u8; 1 + SMBUS_BLOCK_MAX]) -> Vec<u8> {
    let count = usize::from(buffer[0]);
    buffer[1..=count].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceConfig;
    use crate::mock::{MockTransport, response, status};

    fn device(mock: MockTransport) -> MCP2221<MockTransport> {
        MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap()
    }

    /// Responses for a no-STOP write followed by a read whose data arrives at once.
    fn push_command_read(mock: &MockTransport, data: &[u8]) {
        mock.push(status(0x00, &[]));
        mock.push(response(0x94, &[]));
        mock.push(status(0x45, &[]));
        mock.push(status(0x45, &[]));
        mock.push(response(0x93, &[]));
        let mut get = response(0x40, &[(2, 0x55), (3, data.len() as u8)]);
        get[4..4 + data.len()].copy_from_slice(data);
        mock.push(get);
    }

    #[test]
    fn words_are_little_endian() {
        let mock = MockTransport::new();
        push_command_read(&mock, &[0x34, 0x12]);
        mock.push(status(0x00, &[]));
        mock.push(response(0x90, &[]));
        mock.push(status(0x00, &[]));
        let device = device(mock);
        let bus = SmBus::new(&device);

        assert_eq!(bus.read_word_data(0x0B, 0x09).unwrap(), 0x1234);
        bus.write_word_data(0x0B, 0x0A, 0xBEEF).unwrap();

        let sent = device.transport().sent();
        assert_eq!(&sent[1][..5], &[0x94, 1, 0, 0x16, 0x09]);
        assert_eq!(&sent[7][..7], &[0x90, 3, 0, 0x16, 0x0A, 0xEF, 0xBE]);
    }

    #[test]
    fn block_read_is_cut_to_the_count() {
        let mock = MockTransport::new();
        push_command_read(&mock, &[3, 0xA, 0xB, 0xC]);
        let device = device(mock);
        let bus = SmBus::new(&device);

        // The short final chunk leaves the rest of the buffer untouched.
        assert_eq!(bus.read_block_data(0x20, 0x01).unwrap(), vec![0xA, 0xB, 0xC]);
        let sent = device.transport().sent();
        assert_eq!(&sent[4][..4], &[0x93, 0x00, 0x01, 0x41]);
    }

    #[test]
    fn block_write_prefixes_the_count() {
        let mock = MockTransport::new();
        mock.push(status(0x00, &[]));
        mock.push(response(0x90, &[]));
        mock.push(status(0x00, &[]));
        let device = device(mock);
        let bus = SmBus::new(&device);

        bus.write_block_data(0x20, 0x05, &[1, 2]).unwrap();
        let sent = device.transport().sent();
        assert_eq!(&sent[1][..8], &[0x90, 4, 0, 0x40, 0x05, 2, 1, 2]);
    }

    #[test]
    fn oversized_blocks_are_refused() {
        let device = device(MockTransport::new());
        let bus = SmBus::new(&device);
        let data = [0u8; 256];
        assert!(matches!(
            bus.write_block_data(0x20, 0, &data),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            bus.write_i2c_block_data(0x20, 0, &data),
            Err(Error::InvalidArgument(_))
        ));
        assert!(device.transport().sent().is_empty());
    }
}
