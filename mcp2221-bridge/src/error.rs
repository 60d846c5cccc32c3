use crate::transport::TransportError;

/// Wrapper for problems when communicating with the MCP2221.
///
/// Every variant has a stable numeric code (see [`Error::code`]), which the
/// command line tool prints alongside the message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The USB transport failed to send or receive a report.
    #[error("USB transport error: {0}")]
    Usb(TransportError),
    /// A watchdog expired before the device finished the operation.
    ///
    /// I2C transfers attempt bus recovery before returning this error.
    #[error("operation timed out")]
    Timeout,
    /// The I2C target did not acknowledge its address.
    #[error("I2C target did not acknowledge")]
    NotAcknowledged,
    /// Bus recovery found SCL held low by something on the bus.
    ///
    /// This usually needs external intervention, such as power-cycling the
    /// target. A later operation will attempt recovery again.
    #[error("I2C SCL line is stuck low")]
    LowSclStuck,
    /// Bus recovery found SDA held low by something on the bus.
    #[error("I2C SDA line is stuck low")]
    LowSdaStuck,
    /// A response from the device could not be interpreted.
    #[error("invalid answer from the device")]
    InvalidAnswer,
    /// Any other fault of the MCP2221 I2C engine, or a command that kept
    /// failing after all re-tries.
    ///
    /// The last response received is kept for inspection when there was one.
    #[error("I2C engine error")]
    I2c {
        /// Last response buffer received from the device.
        response: Option<Box<[u8; 64]>>,
    },
    /// Writing to the flash memory was refused.
    #[error("flash write failed")]
    FlashWriteFailed,
    /// The flash access password was not accepted.
    #[error("flash password rejected")]
    FlashPasswordRejected,
    /// A GPIO write targeted a pin that is not configured for GPIO operation.
    #[error("pin is not configured for GPIO operation")]
    GpioModeConflict,
    /// A caller-supplied argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl Error {
    /// Generic I2C engine error with no response attached.
    pub(crate) fn i2c() -> Self {
        Self::I2c { response: None }
    }

    /// Numeric code of this error.
    ///
    /// | Code | Error                            |
    /// |------|----------------------------------|
    /// | -1   | [`Error::Usb`]                   |
    /// | -2   | [`Error::Timeout`]               |
    /// | -3   | [`Error::NotAcknowledged`]       |
    /// | -4   | [`Error::LowSclStuck`]           |
    /// | -5   | [`Error::LowSdaStuck`]           |
    /// | -6   | [`Error::InvalidArgument`]       |
    /// | -7   | [`Error::I2c`]                   |
    /// | -8   | [`Error::FlashWriteFailed`]      |
    /// | -9   | [`Error::FlashPasswordRejected`] |
    /// | -10  | [`Error::GpioModeConflict`]      |
    /// | -11  | [`Error::InvalidAnswer`]         |
    pub fn code(&self) -> i32 {
        match self {
            Error::Usb(_) => -1,
            Error::Timeout => -2,
            Error::NotAcknowledged => -3,
            Error::LowSclStuck => -4,
            Error::LowSdaStuck => -5,
            Error::InvalidArgument(_) => -6,
            Error::I2c { .. } => -7,
            Error::FlashWriteFailed => -8,
            Error::FlashPasswordRejected => -9,
            Error::GpioModeConflict => -10,
            Error::InvalidAnswer => -11,
        }
    }

    /// Short name of the error kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Usb(_) => "usb",
            Error::Timeout => "timeout",
            Error::NotAcknowledged => "not-acknowledged",
            Error::LowSclStuck => "low-scl",
            Error::LowSdaStuck => "low-sda",
            Error::InvalidArgument(_) => "invalid-argument",
            Error::I2c { .. } => "i2c",
            Error::FlashWriteFailed => "flash-write",
            Error::FlashPasswordRejected => "flash-password",
            Error::GpioModeConflict => "gpio-mode",
            Error::InvalidAnswer => "invalid-answer",
        }
    }
}

#[doc(hidden)]
impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Timeout => Self::Timeout,
            other => Self::Usb(other),
        }
    }
}

#[doc(hidden)]
impl From<hidapi::HidError> for Error {
    fn from(value: hidapi::HidError) -> Self {
        Self::Usb(TransportError::Hid(value))
    }
}
