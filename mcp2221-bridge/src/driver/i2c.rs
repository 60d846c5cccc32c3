//! I2C-related driver public methods and helpers.
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::MCP2221;
use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::constants::{
    COMMAND_SUCCESS, DEFAULT_I2C_TIMEOUT, I2C_CANCEL_TRANSFER, I2C_CHUNK_SIZE,
    I2C_INTERNAL_STATE_BYTE, I2C_SET_BUS_SPEED, STATUS_BYTE,
};
use crate::i2c::{
    ChunkAction, DrainAction, I2cAddressing, I2cState, ReadAction, ReadKind, WriteKind, chunks,
    clock_divider, read_poll_action, read_request_failure, transfer_report, validate_transfer,
    write_chunk_action, write_drain_action,
};
use crate::transport::Transport;

/// Cancel attempts made by [`MCP2221::i2c_release`] before giving up.
const RELEASE_ATTEMPTS: usize = 3;
const RELEASE_DELAY: Duration = Duration::from_millis(10);

/// A zero timeout selects the default per-chunk watchdog.
fn effective_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_I2C_TIMEOUT
    } else {
        timeout
    }
}

/// I2C-related commands.
impl<T: Transport> MCP2221<T> {
    ////////////////////////////////////////////////////////////////////////////////
    // Bus configuration and recovery
    ////////////////////////////////////////////////////////////////////////////////

    /// Set the speed of the I2C bus.
    ///
    /// The clock divider is `12 MHz / speed - 2`, rounded to the nearest integer
    /// (halves to even). Not every rate can be achieved exactly, and the MCP2221
    /// itself is specified up to 400 kbit/s.
    ///
    /// The device refuses to change speed while a transfer is in progress. If it
    /// refuses and the bus is known to be dirty, the bus is released and the
    /// command sent once more.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the divider does not fit in a byte, and
    /// [`Error::I2c`] if the device did not accept the new speed.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 of the datasheet for the underlying Status/Set Parameters
    /// HID command.
    pub fn i2c_set_speed(&self, speed_hz: u32) -> Result<(), Error> {
        let divider = clock_divider(speed_hz)?;
        let mut command = UsbReport::new(McpCommand::StatusSetParameters);
        // When this value is put in this field, the device will take the next command
        // field and interpret it as the system clock divider that will give the
        // I2C/SMBus communication clock.
        command.set_data_byte(3, I2C_SET_BUS_SPEED);
        command.set_data_byte(4, divider);

        let mut response = self.transfer_marking_dirty(&command)?;
        if response[3] != I2C_SET_BUS_SPEED && self.i2c_dirty.get() {
            self.debug_i2c(format_args!("speed change refused, releasing bus"));
            // A stuck line is reported by the failed retry below.
            let _ = self.i2c_release();
            response = self.transfer_marking_dirty(&command)?;
        }
        if response[3] == I2C_SET_BUS_SPEED {
            return Ok(());
        }
        self.i2c_dirty.set(true);
        Err(Error::I2c {
            response: Some(Box::new(response)),
        })
    }

    /// Return the I2C bus to idle.
    ///
    /// If the engine has a transfer set up, it is cancelled up to three times,
    /// checking after each attempt whether the engine is idle with both lines
    /// high. The outcome is classified from a final status read.
    ///
    /// Microchip's Android Java driver for the MCP2221 describes the cancel
    /// command as "forc\[ing\] a STOP condition into the SCL/SDA lines".
    ///
    /// Success clears the dirty flag, and any failure sets it so the next
    /// transfer tries again.
    ///
    /// # Errors
    ///
    /// [`Error::LowSclStuck`] or [`Error::LowSdaStuck`] if a line is held low,
    /// otherwise [`Error::I2c`] if the engine did not return to idle.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.1 of the datasheet for the underlying Status/Set Parameters
    /// HID command.
    pub fn i2c_release(&self) -> Result<(), Error> {
        let result = self.try_release();
        self.i2c_dirty.set(result.is_err());
        result
    }

    fn try_release(&self) -> Result<(), Error> {
        let status = self.i2c_status()?;
        if status.initialized {
            let mut cancel = UsbReport::new(McpCommand::StatusSetParameters);
            cancel.set_data_byte(2, I2C_CANCEL_TRANSFER);
            for attempt in 1..=RELEASE_ATTEMPTS {
                self.debug_i2c(format_args!("cancelling transfer, attempt {attempt}"));
                // The response only echoes whether a cancel was issued.
                let _ = self.transfer(&cancel);
                if self.i2c_status()?.is_released() {
                    return Ok(());
                }
                std::thread::sleep(RELEASE_DELAY);
            }
        }

        let status = self.i2c_status()?;
        if status.is_released() {
            Ok(())
        } else if !status.scl_high {
            warn!(state = %status.state, "I2C SCL line is held low");
            Err(Error::LowSclStuck)
        } else if !status.sda_high {
            warn!(state = %status.state, "I2C SDA line is held low");
            Err(Error::LowSdaStuck)
        } else {
            self.debug_i2c(format_args!("engine did not return to idle: {}", status.state));
            Err(Error::i2c())
        }
    }

    /// Release the bus before a transfer if it is dirty or the engine is confused.
    ///
    /// Stuck lines are not fatal here, and neither is a failed status read: the
    /// transfer itself will fail if the bus is unusable.
    fn i2c_prepare(&self) -> Result<(), Error> {
        if self.i2c_dirty.get() || matches!(self.i2c_status(), Ok(status) if status.confused) {
            match self.i2c_release() {
                Ok(()) | Err(Error::LowSclStuck | Error::LowSdaStuck) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Release the bus after a failed transfer, then return `error`.
    fn recover(&self, error: Error) -> Error {
        if let Err(e) = self.i2c_release() {
            self.debug_i2c(format_args!("recovery after {error} failed: {e}"));
        }
        error
    }

    /// [`Self::transfer_with_response`], setting the dirty flag on failure.
    fn transfer_marking_dirty(&self, command: &UsbReport) -> Result<[u8; 64], Error> {
        self.transfer_with_response(command)
            .inspect_err(|_| self.i2c_dirty.set(true))
    }

    fn debug_i2c(&self, message: std::fmt::Arguments<'_>) {
        if self.config.debug_messages {
            debug!("{message}");
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Write engine
    ////////////////////////////////////////////////////////////////////////////////

    /// Write data to an I2C target.
    ///
    /// The address must be the 7-bit address, not an 8-bit read or write address.
    /// The data is sent in chunks of up to 60 bytes, each one re-sent while the
    /// engine reports that it is busy. `timeout` bounds the time spent on each
    /// chunk and on waiting for the final chunk to go out; a zero `timeout`
    /// selects 20 ms.
    ///
    /// Zero-length writes are not accepted, use [`MCP2221::i2c_check_address`]
    /// instead if you are trying to scan the bus.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty or longer than 65,535 byte
    ///   transfer, or an address above 0x7F.
    /// - [`Error::NotAcknowledged`] if the target did not acknowledge its address.
    /// - [`Error::Timeout`] if a chunk was not accepted in time.
    /// - [`Error::I2c`] for any other engine fault.
    ///
    /// The bus is released before any of the last three are returned.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.5 (normal write), 3.1.6 (repeated-START), and 3.1.7 (no STOP)
    /// for the underlying HID commands.
    pub fn i2c_write(
        &self,
        seven_bit_address: u8,
        data: &[u8],
        kind: WriteKind,
        timeout: Duration,
    ) -> Result<(), Error> {
        let len = validate_transfer(seven_bit_address, data.len())?;
        self.i2c_prepare()?;
        let timeout = effective_timeout(timeout);

        for chunk in chunks(data) {
            let address_byte = seven_bit_address.into_write_address();
            let mut command = transfer_report(kind.into(), len, address_byte);
            command.set_data(4, chunk);
            let deadline = Instant::now() + timeout;
            loop {
                if Instant::now() >= deadline {
                    return Err(self.recover(Error::Timeout));
                }
                let response = self.transfer_marking_dirty(&command)?;
                if response[STATUS_BYTE] == COMMAND_SUCCESS {
                    break;
                }
                let state = I2cState::from(response[I2C_INTERNAL_STATE_BYTE]);
                self.debug_i2c(format_args!("write chunk refused in state {state}"));
                match write_chunk_action(state) {
                    ChunkAction::Resend => continue,
                    ChunkAction::Fail(failure) => return Err(self.recover(failure.into())),
                }
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(self.recover(Error::Timeout));
            }
            let status = self
                .i2c_status()
                .inspect_err(|_| self.i2c_dirty.set(true))?;
            match write_drain_action(status.state) {
                DrainAction::Done => return Ok(()),
                DrainAction::Poll => {
                    self.debug_i2c(format_args!("waiting for write in state {}", status.state));
                }
                DrainAction::Fail(failure) => return Err(self.recover(failure.into())),
            }
        }
    }

    /// [`MCP2221::i2c_write`] with the handle's read timeout as the watchdog.
    pub fn i2c_write_simple(
        &self,
        seven_bit_address: u8,
        data: &[u8],
        kind: WriteKind,
    ) -> Result<(), Error> {
        self.i2c_write(seven_bit_address, data, kind, self.config.read_timeout)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Read engine
    ////////////////////////////////////////////////////////////////////////////////

    /// Read data from an I2C target.
    ///
    /// The address must be the 7-bit address, not an 8-bit read or write address.
    /// After the read is requested, the data is collected with the Get Data
    /// command as the engine makes it available. The `timeout` watchdog restarts
    /// whenever data arrives; a zero `timeout` selects 20 ms.
    ///
    /// Zero-length transfers are not accepted, as they can cause the target to lock
    /// up the I2C bus if it holds SDA low for the first bit.
    ///
    /// # Errors
    ///
    /// As for [`MCP2221::i2c_write`].
    ///
    /// # Datasheet
    ///
    /// See section 3.1.8 (normal read), 3.1.9 (repeated START) and 3.1.10
    /// (Get Data) for the underlying HID commands.
    pub fn i2c_read(
        &self,
        seven_bit_address: u8,
        buffer: &mut [u8],
        kind: ReadKind,
        timeout: Duration,
    ) -> Result<(), Error> {
        let len = validate_transfer(seven_bit_address, buffer.len())?;
        self.i2c_prepare()?;
        let timeout = effective_timeout(timeout);

        let request = transfer_report(kind.into(), len, seven_bit_address.into_read_address());
        let response = self.transfer_marking_dirty(&request)?;
        if response[STATUS_BYTE] != COMMAND_SUCCESS {
            let state = I2cState::from(response[I2C_INTERNAL_STATE_BYTE]);
            self.debug_i2c(format_args!("read request refused in state {state}"));
            return Err(self.recover(read_request_failure(state).into()));
        }

        let get_data = UsbReport::new(McpCommand::I2cGetData);
        let mut filled = 0;
        let mut deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Err(self.recover(Error::Timeout));
            }
            let response = self.transfer_marking_dirty(&get_data)?;
            let state = I2cState::from(response[I2C_INTERNAL_STATE_BYTE]);
            match read_poll_action(state) {
                ReadAction::Wait => {}
                ReadAction::Partial => {
                    filled += copy_read_data(&response, &mut buffer[filled..]);
                    deadline = Instant::now() + timeout;
                }
                ReadAction::Final => {
                    copy_read_data(&response, &mut buffer[filled..]);
                    return Ok(());
                }
                ReadAction::Fail(failure) => {
                    self.debug_i2c(format_args!("read failed in state {state}"));
                    return Err(self.recover(failure.into()));
                }
            }
        }
    }

    /// [`MCP2221::i2c_read`] with the handle's read timeout as the watchdog.
    pub fn i2c_read_simple(
        &self,
        seven_bit_address: u8,
        buffer: &mut [u8],
        kind: ReadKind,
    ) -> Result<(), Error> {
        self.i2c_read(seven_bit_address, buffer, kind, self.config.read_timeout)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Compound operations
    ////////////////////////////////////////////////////////////////////////////////

    /// Perform an I2C write-read to the given target address.
    ///
    /// First the contents of `write` are written to the target, without a final
    /// STOP condition. Then a repeated-START is issued and enough bytes are read from
    /// the target to fill `read`.
    ///
    /// # Datasheet
    ///
    /// See sections 3.1.7 (write, no STOP) and 3.1.9 (read, repeated START) for the
    /// underlying HID commands.
    pub fn i2c_write_read(
        &self,
        seven_bit_address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Error> {
        self.i2c_write_simple(seven_bit_address, write, WriteKind::NoStop)?;
        self.i2c_read_simple(seven_bit_address, read, ReadKind::RepeatedStart)
    }

    /// Check if an I2C target acknowledges the given address.
    ///
    /// A single byte is read from the target and discarded.
    pub fn i2c_check_address(&self, seven_bit_address: u8) -> Result<bool, Error> {
        let mut scratch = [0u8; 1];
        match self.i2c_read_simple(seven_bit_address, &mut scratch, ReadKind::Normal) {
            Ok(()) => Ok(true),
            Err(Error::NotAcknowledged) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List the addresses in `addresses` that acknowledge a read.
    ///
    /// The usual range for 7-bit targets is `0x08..=0x77`.
    pub fn i2c_scan(&self, addresses: RangeInclusive<u8>) -> Result<Vec<u8>, Error> {
        let mut found = Vec::new();
        for address in addresses {
            if self.i2c_check_address(address)? {
                found.push(address);
            }
        }
        Ok(found)
    }
}

/// Copy the data of a Get Data response into `dest`, returning the count.
///
/// Byte 3 holds the number of bytes that follow from byte 4.
fn copy_read_data(response: &[u8; 64], dest: &mut [u8]) -> usize {
    let count = usize::from(response[3]).min(I2C_CHUNK_SIZE).min(dest.len());
    dest[..count].copy_from_slice(&response[4..4 + count]);
    count
}
