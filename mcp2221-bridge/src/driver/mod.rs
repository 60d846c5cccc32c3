use std::cell::Cell;

use hidapi::HidApi;
use tracing::{debug, trace};

use crate::commands::{McpCommand, UsbReport};
use crate::config::DeviceConfig;
use crate::constants::{COMMAND_SUCCESS, PACKET_SIZE, STATUS_BYTE};
use crate::error::Error;
use crate::i2c::I2cStatus;
use crate::status::Status;
use crate::transport::{DeviceKey, HidTransport, Transport};

mod analog;
mod flash;
mod gpio;
mod i2c;
mod i2c_eh;
mod sram;

/// Locally cached GP settings bytes.
///
/// The device does not reflect Set GPIO Output Values in its SRAM settings, so
/// the driver keeps its own copy of the four GP bytes once they have been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GpioCache {
    Unloaded,
    Loaded([u8; 4]),
}

/// Driver for the MCP2221.
///
/// # Quick start
///
/// Open the first device with the default USB IDs by calling [`MCP2221::open`]
/// with [`DeviceConfig::default`]. Use the builder methods on [`DeviceConfig`] to
/// pick a device by index or serial number, or to change the timeouts.
///
/// ```no_run
/// # use mcp2221_bridge::{DeviceConfig, MCP2221};
/// # fn main() -> Result<(), mcp2221_bridge::Error> {
/// let device = MCP2221::open(&DeviceConfig::default().with_i2c_speed(400_000))?;
/// let mut temperature = [0u8; 2];
/// device.i2c_write_read(0x48, &[0x00], &mut temperature)?;
/// # Ok(())
/// # }
/// ```
///
/// For I2C communication, this struct also implements the [blocking][blocking I2C]
/// and (with the `async` feature) [async][async I2C] I2C traits from
/// [`embedded_hal`].
///
/// [blocking I2C]: embedded_hal::i2c::I2c
/// [async I2C]: https://docs.rs/embedded-hal-async/latest/embedded_hal_async/i2c/trait.I2c.html
///
/// # Bus state
///
/// All methods take `&self`. The handle tracks whether the I2C bus may need
/// recovering ("dirty") and a cache of the GP pin settings in [`Cell`]s, so it
/// is `!Sync` and must be used from one thread at a time. Share it between
/// components with [`std::rc::Rc`], or open it through a
/// [`DeviceRegistry`](crate::DeviceRegistry).
///
/// The transport defaults to [`HidTransport`]. Any other [`Transport`] can be
/// supplied with [`MCP2221::with_transport`].
#[derive(Debug)]
pub struct MCP2221<T: Transport = HidTransport> {
    transport: T,
    config: DeviceConfig,
    /// The bus may be in an inconsistent state and should be released before
    /// the next transfer.
    i2c_dirty: Cell<bool>,
    gpio_cache: Cell<GpioCache>,
}

impl MCP2221<HidTransport> {
    ////////////////////////////////////////////////////////////////////////////////
    // Constructors - USB methods
    ////////////////////////////////////////////////////////////////////////////////

    /// Open the device described by `config`.
    ///
    /// If [`DeviceConfig::i2c_speed_hz`] is set, the I2C bus speed is configured
    /// before the handle is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Usb`] if no device matches or the USB device cannot be opened.
    pub fn open(config: &DeviceConfig) -> Result<Self, Error> {
        let api = HidApi::new()?;
        let transport = HidTransport::open(
            &api,
            config.vendor_id,
            config.product_id,
            &config.selector,
        )?;
        Self::with_transport(transport, config)
    }

    /// Identity of the opened device.
    pub fn key(&self) -> &DeviceKey {
        self.transport.key()
    }

    /// Get the USB HID device information from the host's USB interface.
    ///
    /// This is a thin wrapper around [`hidapi::HidDevice::get_device_info`].
    pub fn usb_device_info(&self) -> Result<hidapi::DeviceInfo, Error> {
        Ok(self.transport.device_info()?)
    }
}

impl<T: Transport> MCP2221<T> {
    /// Create a driver over an already opened transport.
    ///
    /// # Errors
    ///
    /// Only fails if [`DeviceConfig::i2c_speed_hz`] is set and the speed cannot
    /// be configured.
    pub fn with_transport(transport: T, config: &DeviceConfig) -> Result<Self, Error> {
        let device = Self {
            transport,
            config: config.clone(),
            i2c_dirty: Cell::new(false),
            gpio_cache: Cell::new(GpioCache::Unloaded),
        };
        if let Some(speed_hz) = config.i2c_speed_hz {
            device.i2c_set_speed(speed_hz)?;
        }
        Ok(device)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configuration this handle was opened with.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// True if the I2C bus will be released before the next transfer.
    pub fn i2c_is_dirty(&self) -> bool {
        self.i2c_dirty.get()
    }

    ////////////////////////////////////////////////////////////////////////////////
    // USB report exchange with the MCP2221
    ////////////////////////////////////////////////////////////////////////////////

    /// Send a command and read the 64-byte response, re-trying failures.
    ///
    /// The command is attempted up to `retries + 1` times. A transport failure
    /// always counts as a failed attempt. A response that does not echo the
    /// command code, or a non-zero status byte, only does for the commands that
    /// are safe to repeat. I2C commands return their first response for the
    /// engines to interpret, and fail with [`Error::InvalidAnswer`] on a
    /// mismatched echo.
    ///
    /// Reset Chip has no response, which is returned as `None`.
    fn transfer(&self, command: &UsbReport) -> Result<Option<[u8; PACKET_SIZE]>, Error> {
        let code = command.command_code();
        let attempts = self.config.retries.saturating_add(1);
        let mut last_error = Error::i2c();

        for attempt in 1..=attempts {
            if self.config.trace_packets {
                trace!(packet = %HexDump(&command.write_buffer), "sending command {code:#04x}");
            }
            if let Err(e) = self.transport.send_report(&command.write_buffer) {
                self.note_retry(code, attempt, &e);
                last_error = e.into();
                continue;
            }
            if command.has_no_response() {
                return Ok(None);
            }

            let response = match self.transport.receive_report(self.config.read_timeout) {
                Ok(response) => response,
                Err(e) => {
                    self.note_retry(code, attempt, &e);
                    last_error = e.into();
                    continue;
                }
            };
            if self.config.trace_packets {
                trace!(packet = %HexDump(&response), "received response to {code:#04x}");
            }

            if response[0] != code {
                if !command.is_retry_safe() {
                    return Err(Error::InvalidAnswer);
                }
                self.note_retry(
                    code,
                    attempt,
                    &format_args!("response echoes {:#04x}", response[0]),
                );
                last_error = Error::InvalidAnswer;
                continue;
            }
            if response[STATUS_BYTE] == COMMAND_SUCCESS || !command.is_retry_safe() {
                return Ok(Some(response));
            }
            self.note_retry(
                code,
                attempt,
                &format_args!("status {:#04x}", response[STATUS_BYTE]),
            );
            last_error = Error::I2c {
                response: Some(Box::new(response)),
            };
        }

        Err(last_error)
    }

    /// [`Self::transfer`] for commands that always have a response.
    fn transfer_with_response(&self, command: &UsbReport) -> Result<[u8; PACKET_SIZE], Error> {
        self.transfer(command)?.ok_or(Error::InvalidAnswer)
    }

    fn note_retry(&self, code: u8, attempt: u32, reason: &dyn std::fmt::Display) {
        if self.config.debug_messages {
            debug!(
                attempt,
                retries = self.config.retries,
                "command {code:#04x} failed: {reason}"
            );
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // MCP2221 general commands
    ////////////////////////////////////////////////////////////////////////////////

    /// Send an arbitrary command and return the response.
    ///
    /// The payload is zero-padded to a full report and goes through the same
    /// re-try logic as every other command.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the payload is not 1 to 64 bytes long, or is
    /// the Reset Chip command (use [`MCP2221::reset`] instead).
    pub fn send_raw(&self, payload: &[u8]) -> Result<[u8; PACKET_SIZE], Error> {
        let command = UsbReport::from_payload(payload)?;
        if command.has_no_response() {
            return Err(Error::InvalidArgument(
                "use reset() to send the Reset Chip command",
            ));
        }
        self.transfer_with_response(&command)
    }

    /// Reset the MCP2221.
    ///
    /// This can be useful after changing settings in the device's flash memory,
    /// which only take effect on power-up.
    ///
    /// Resetting the chip causes the device to re-enumerate with the USB host,
    /// so you will need to open a new handle afterwards.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.15 for the underlying Reset Chip HID command, and section
    /// 4.2.3 for reset timings.
    pub fn reset(self) -> Result<(), Error> {
        self.transfer(&UsbReport::new(McpCommand::ResetChip))?;
        Ok(())
    }

    /// Read the status of the MCP2221.
    ///
    /// The returned structure includes the current status of the I2C engine, and the
    /// hardware and firmware revision numbers.
    ///
    /// It includes the raw ADC channel readings, but you should prefer to use
    /// [`MCP2221::adc_read`].
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 of the datasheet for the underlying Status/Set Parameters
    /// HID command.
    pub fn status(&self) -> Result<Status, Error> {
        let buf = self.transfer_with_response(&UsbReport::new(McpCommand::StatusSetParameters))?;
        Ok(Status::from_buffer(&buf))
    }

    /// Read only the I2C engine fields of the status.
    pub fn i2c_status(&self) -> Result<I2cStatus, Error> {
        let buf = self.transfer_with_response(&UsbReport::new(McpCommand::StatusSetParameters))?;
        Ok(I2cStatus::from_buffer(&buf))
    }
}

/// Space-separated hex bytes, for packet traces.
struct HexDump<'a>(&'a [u8]);

impl std::fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTransport, response};
    use crate::transport::TransportError;

    fn device(mock: MockTransport) -> MCP2221<MockTransport> {
        MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap()
    }

    #[test]
    fn failed_status_is_retried_for_safe_commands() {
        let mock = MockTransport::new();
        mock.push(response(0x61, &[(1, 0x01)]));
        mock.push(response(0x61, &[(1, 0x01)]));
        mock.push(response(0x61, &[(5, 0x12)]));
        let device = device(mock);

        let buf = device.send_raw(&[0x61]).unwrap();
        assert_eq!(buf[5], 0x12);
        assert_eq!(device.transport().sent().len(), 3);
    }

    #[test]
    fn retries_are_bounded() {
        let mock = MockTransport::new();
        for _ in 0..10 {
            mock.push(response(0x10, &[(1, 0x01)]));
        }
        let device = device(mock);

        match device.send_raw(&[0x10]) {
            Err(Error::I2c {
                response: Some(last),
            }) => assert_eq!(last[0], 0x10),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(device.transport().sent().len(), 4);
    }

    #[test]
    fn i2c_commands_return_first_response() {
        let mock = MockTransport::new();
        mock.push(response(0x90, &[(1, 0x01), (2, 0x41)]));
        let device = device(mock);

        let buf = device.send_raw(&[0x90, 0x01, 0x00, 0xA0, 0x55]).unwrap();
        assert_eq!(buf[1], 0x01);
        assert_eq!(device.transport().sent().len(), 1);
    }

    #[test]
    fn transport_failures_are_retried() {
        let mock = MockTransport::new();
        mock.push_error(TransportError::Timeout);
        mock.push(response(0x51, &[]));
        let device = device(mock);

        device.send_raw(&[0x51]).unwrap();
        assert_eq!(device.transport().sent().len(), 2);
    }

    #[test]
    fn persistent_timeout_is_reported() {
        let device = device(MockTransport::new());
        assert!(matches!(device.send_raw(&[0x10]), Err(Error::Timeout)));
        assert_eq!(device.transport().sent().len(), 4);
    }

    #[test]
    fn mismatched_echo_is_an_invalid_answer() {
        let mock = MockTransport::new();
        for _ in 0..4 {
            mock.push(response(0x51, &[]));
        }
        let device = device(mock);
        assert!(matches!(device.send_raw(&[0x50]), Err(Error::InvalidAnswer)));
    }

    #[test]
    fn mismatched_echo_is_not_retried_for_i2c_commands() {
        let mock = MockTransport::new();
        for _ in 0..4 {
            mock.push(response(0x40, &[]));
        }
        let device = device(mock);
        let result = device.send_raw(&[0x90, 0x01, 0x00, 0xA0, 0x55]);
        assert!(matches!(result, Err(Error::InvalidAnswer)));
        assert_eq!(device.transport().sent().len(), 1);
    }

    #[test]
    fn reset_does_not_wait_for_a_response() {
        let device = device(MockTransport::new());
        let sent = device.transport().clone_log();
        device.reset().unwrap();
        assert_eq!(&sent.borrow()[0][..4], &[0x70, 0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn raw_payload_is_padded() {
        let mock = MockTransport::new();
        mock.push(response(0x10, &[]));
        let device = device(mock);
        device.send_raw(&[0x10, 0x00, 0x10]).unwrap();
        let sent = device.transport().sent();
        assert_eq!(&sent[0][..3], &[0x10, 0x00, 0x10]);
        assert!(sent[0][3..].iter().all(|&b| b == 0));
        assert!(device.send_raw(&[0x70, 0xAB, 0xCD, 0xEF]).is_err());
    }
}
