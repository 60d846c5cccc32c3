#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod analog;
mod commands;
pub mod common;
mod config;
mod constants;
mod driver;
mod error;
pub mod flash;
pub mod gpio;
pub mod i2c;
#[cfg(test)]
mod mock;
mod registry;
pub mod settings;
mod slave;
pub mod smbus;
pub mod status;
mod transport;

pub use common::{ClockDutyCycle, ClockFrequency, ClockSetting, DeviceString};
pub use config::{DeviceConfig, DeviceSelector};
pub use driver::MCP2221;
pub use error::Error;
pub use flash::{FlashInfo, FlashSection, UsbStringKind};
pub use i2c::{I2cState, I2cStatus, ReadKind, WriteKind};
pub use registry::DeviceRegistry;
pub use slave::{ByteOrder, I2cSlave, RegisterFormat};
pub use smbus::SmBus;
pub use status::Status;
pub use transport::{DeviceKey, HidTransport, Transport, TransportError};
