//! Register-oriented access to a single I2C target.

use std::rc::Rc;
use std::time::Duration;

use crate::driver::MCP2221;
use crate::error::Error;
use crate::i2c::{ReadKind, WriteKind};
use crate::transport::{HidTransport, Transport};

/// Watchdog for every transfer made through an [`I2cSlave`].
const SLAVE_TIMEOUT: Duration = Duration::from_millis(50);

/// Byte order of register addresses wider than one byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// How register addresses are sent to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFormat {
    width: u8,
    order: ByteOrder,
}

impl Default for RegisterFormat {
    /// One-byte register addresses.
    fn default() -> Self {
        Self {
            width: 1,
            order: ByteOrder::Big,
        }
    }
}

impl RegisterFormat {
    /// Register addresses of `width` bytes, sent in `order`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `width` is not between 1 and 4.
    pub fn new(width: u8, order: ByteOrder) -> Result<Self, Error> {
        if !(1..=4).contains(&width) {
            return Err(Error::InvalidArgument("register width must be 1 to 4 bytes"));
        }
        Ok(Self { width, order })
    }

    /// Register address width in bytes.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Register address byte order.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Encode `register` into the first `width` bytes of the returned array.
    ///
    /// Bits above the width are dropped.
    fn encode(&self, register: u32) -> ([u8; 4], usize) {
        let width = usize::from(self.width);
        let mut out = [0u8; 4];
        match self.order {
            ByteOrder::Little => out[..width].copy_from_slice(&register.to_le_bytes()[..width]),
            ByteOrder::Big => out[..width].copy_from_slice(&register.to_be_bytes()[4 - width..]),
        }
        (out, width)
    }
}

/// A target on the I2C bus, addressed through registers.
///
/// The slave holds a shared handle to the driver, so several slaves on one bus
/// can be used side by side. Every transfer uses a 50 ms watchdog.
///
/// ```no_run
/// # use std::rc::Rc;
/// # use mcp2221_bridge::{ByteOrder, DeviceConfig, I2cSlave, MCP2221, RegisterFormat};
/// # fn main() -> Result<(), mcp2221_bridge::Error> {
/// let device = Rc::new(MCP2221::open(&DeviceConfig::default())?);
/// let format = RegisterFormat::new(2, ByteOrder::Big)?;
/// let eeprom = I2cSlave::new(Rc::clone(&device), 0x50, format, false)?;
/// let mut page = [0u8; 32];
/// eeprom.read_register(0x0100, &mut page)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct I2cSlave<T: Transport = HidTransport> {
    device: Rc<MCP2221<T>>,
    address: u8,
    format: RegisterFormat,
}

impl<T: Transport> I2cSlave<T> {
    /// Create a slave at the 7-bit `address`.
    ///
    /// Unless `force` is set, the target is probed first.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the address is above 0x7F.
    /// - [`Error::NotAcknowledged`] if the probe found no target.
    pub fn new(
        device: Rc<MCP2221<T>>,
        address: u8,
        format: RegisterFormat,
        force: bool,
    ) -> Result<Self, Error> {
        if address > 0x7F {
            return Err(Error::InvalidArgument("I2C address must be 7 bits"));
        }
        let slave = Self {
            device,
            address,
            format,
        };
        if !force && !slave.is_present()? {
            return Err(Error::NotAcknowledged);
        }
        Ok(slave)
    }

    /// The 7-bit target address.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The shared driver handle.
    pub fn device(&self) -> &Rc<MCP2221<T>> {
        &self.device
    }

    /// Whether the target acknowledges a one-byte read.
    pub fn is_present(&self) -> Result<bool, Error> {
        let mut scratch = [0u8; 1];
        match self.read(&mut scratch) {
            Ok(()) => Ok(true),
            Err(Error::NotAcknowledged) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read from `register` to fill `buffer`.
    ///
    /// The register is written without a STOP, then read with a repeated START.
    pub fn read_register(&self, register: u32, buffer: &mut [u8]) -> Result<(), Error> {
        self.read_register_as(self.format, register, buffer)
    }

    /// [`I2cSlave::read_register`] with a different register format.
    pub fn read_register_as(
        &self,
        format: RegisterFormat,
        register: u32,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        let (bytes, width) = format.encode(register);
        self.device.i2c_write(self.address, &bytes[..width], WriteKind::NoStop, SLAVE_TIMEOUT)?;
        self.device.i2c_read(self.address, buffer, ReadKind::RepeatedStart, SLAVE_TIMEOUT)
    }

    /// Write `data` to `register`, in one transfer.
    pub fn write_register(&self, register: u32, data: &[u8]) -> Result<(), Error> {
        self.write_register_as(self.format, register, data)
    }

    /// [`I2cSlave::write_register`] with a different register format.
    pub fn write_register_as(
        &self,
        format: RegisterFormat,
        register: u32,
        data: &[u8],
    ) -> Result<(), Error> {
        let (bytes, width) = format.encode(register);
        let mut payload = Vec::with_capacity(width + data.len());
        payload.extend_from_slice(&bytes[..width]);
        payload.extend_from_slice(data);
        self.device.i2c_write(self.address, &payload, WriteKind::Normal, SLAVE_TIMEOUT)
    }

    /// Read from the target without addressing a register.
    pub fn read(&self, buffer: &mut [u8]) -> Result<(), Error> {
        self.device.i2c_read(self.address, buffer, ReadKind::Normal, SLAVE_TIMEOUT)
    }

    /// Write to the target without addressing a register.
    pub fn write(&self, data: &[u8]) -> Result<(), Error> {
        self.device.i2c_write(self.address, data, WriteKind::Normal, SLAVE_TIMEOUT)
    }
}
