use crate::Error;
use crate::constants::PACKET_SIZE;
use crate::flash::FlashSection;

/// USB HID commands understood by the MCP2221.
#[derive(Debug, Clone, Copy)]
pub(crate) enum McpCommand {
    /// Poll for the status of the device, cancel an I2C transfer,
    /// or set the I2C bus speed.
    ///
    /// See section 3.1.1.
    StatusSetParameters,
    /// Read one section of the flash memory.
    ///
    /// See section 3.1.2 of the datasheet.
    ReadFlashData(FlashSection),
    /// Write one section of the flash memory.
    ///
    /// See section 3.1.3 of the datasheet.
    WriteFlashData(FlashSection),
    /// Unlock a password-protected flash.
    ///
    /// See section 3.1.4 of the datasheet.
    SendFlashAccessPassword,
    /// Configure the run-time chip and GP pin settings.
    ///
    /// See section 3.1.13 of the datasheet.
    SetSramSettings,
    /// Retrieve the run-time chip and GP pin settings.
    ///
    /// See section 3.1.14 of the datasheet.
    GetSramSettings,
    /// Change GPIO pin output direction and logic level.
    ///
    /// See section 3.1.11 of the datasheet.
    SetGpioOutputValues,
    /// Retrieve the GPIO direction and pin value for those pins set to GPIO operation.
    ///
    /// See section 3.1.12 of the datasheet.
    GetGpioValues,
    /// Force a reset of the device.
    ///
    /// See section 3.1.15 of the datasheet.
    ResetChip,
    /// Request a read from an I2C target.
    ///
    /// The read data is not returned in response to this command, but to the
    /// Get Data command.
    I2cReadData,
    /// Request a read from an I2C target with a repeated START condition.
    I2cReadDataRepeatedStart,
    /// Read requested I2C data back from the MCP2221.
    ///
    /// See section 3.1.10 of the datasheet.
    I2cGetData,
    /// Write data to an I2C target.
    ///
    /// See section 3.1.5 of the datasheet.
    I2cWriteData,
    /// Write data to an I2C target with a repeated START condition.
    ///
    /// See section 3.1.6 of the datasheet.
    I2cWriteDataRepeatedStart,
    /// Write data to an I2C target without a STOP condition.
    ///
    /// See section 3.1.7 of the datasheet.
    I2cWriteDataNoStop,
}

/// Command codes the device tolerates receiving more than once.
///
/// A failed status byte in the response to one of these triggers a re-try.
/// Every other command returns its first response as-is, because re-issuing
/// an I2C command can corrupt the transfer in progress.
const RETRY_SAFE_CODES: [u8; 8] = [0x10, 0x50, 0x51, 0x60, 0x61, 0xB0, 0xB1, 0x70];

const RESET_CHIP_CODE: u8 = 0x70;

impl McpCommand {
    /// Command prefix to be applied to the buffer sent to the MCP2221.
    ///
    /// In most cases this just involves writing the command code to byte 0 of the
    /// outgoing buffer. The flash commands have a section byte (byte 1), and Reset
    /// Chip has four bytes in total.
    fn buffer_prefix(&self) -> &'static [u8] {
        match self {
            McpCommand::StatusSetParameters => &[0x10],
            McpCommand::ReadFlashData(section) => match section {
                FlashSection::ChipSettings => &[0xB0, 0x00],
                FlashSection::GpSettings => &[0xB0, 0x01],
                FlashSection::UsbManufacturer => &[0xB0, 0x02],
                FlashSection::UsbProduct => &[0xB0, 0x03],
                FlashSection::UsbSerialNumber => &[0xB0, 0x04],
                FlashSection::FactorySerialNumber => &[0xB0, 0x05],
            },
            McpCommand::WriteFlashData(section) => match section {
                FlashSection::ChipSettings => &[0xB1, 0x00],
                FlashSection::GpSettings => &[0xB1, 0x01],
                FlashSection::UsbManufacturer => &[0xB1, 0x02],
                FlashSection::UsbProduct => &[0xB1, 0x03],
                FlashSection::UsbSerialNumber => &[0xB1, 0x04],
                FlashSection::FactorySerialNumber => &[0xB1, 0x05],
            },
            McpCommand::SendFlashAccessPassword => &[0xB2],
            McpCommand::SetSramSettings => &[0x60],
            McpCommand::GetSramSettings => &[0x61],
            McpCommand::SetGpioOutputValues => &[0x50],
            McpCommand::GetGpioValues => &[0x51],
            McpCommand::ResetChip => &[RESET_CHIP_CODE, 0xAB, 0xCD, 0xEF],
            McpCommand::I2cReadData => &[0x91],
            McpCommand::I2cReadDataRepeatedStart => &[0x93],
            McpCommand::I2cGetData => &[0x40],
            McpCommand::I2cWriteData => &[0x90],
            McpCommand::I2cWriteDataRepeatedStart => &[0x92],
            McpCommand::I2cWriteDataNoStop => &[0x94],
        }
    }
}

/// Outgoing 64-byte report.
pub(crate) struct UsbReport {
    /// Outgoing buffer sized to match those in the datasheet.
    ///
    /// The transport adds the HID report number when it is written.
    pub(crate) write_buffer: [u8; PACKET_SIZE],
}

impl UsbReport {
    /// Create a zeroed report with the command prefix written at the start.
    pub(crate) fn new(command: McpCommand) -> Self {
        let mut buf = [0u8; PACKET_SIZE];
        let prefix = command.buffer_prefix();
        buf[0..prefix.len()].copy_from_slice(prefix);
        Self { write_buffer: buf }
    }

    /// Create a report from arbitrary bytes, zero-padded to 64.
    pub(crate) fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        if payload.is_empty() || payload.len() > PACKET_SIZE {
            return Err(Error::InvalidArgument(
                "command payload must be 1 to 64 bytes long",
            ));
        }
        let mut buf = [0u8; PACKET_SIZE];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Self { write_buffer: buf })
    }

    /// Command code at byte 0.
    pub(crate) fn command_code(&self) -> u8 {
        self.write_buffer[0]
    }

    /// Returns true if the command has no response buffer to read.
    ///
    /// The device reboots after Reset Chip instead of replying.
    pub(crate) fn has_no_response(&self) -> bool {
        self.command_code() == RESET_CHIP_CODE
    }

    /// Returns true if a failed status in the response may be re-tried.
    pub(crate) fn is_retry_safe(&self) -> bool {
        RETRY_SAFE_CODES.contains(&self.command_code())
    }

    /// Write a single data byte in the outgoing USB report.
    ///
    /// Command at index 0 cannot be overwritten with this method.
    pub(crate) fn set_data_byte(&mut self, byte_index: usize, value: u8) {
        assert!(byte_index < PACKET_SIZE, "Byte index {byte_index} too large.");
        assert!(byte_index != 0, "Cannot write to command byte index.");
        self.write_buffer[byte_index] = value;
    }

    /// Copy `data` into the report starting at `start`.
    pub(crate) fn set_data(&mut self, start: usize, data: &[u8]) {
        assert!(start != 0, "Cannot write to command byte index.");
        self.write_buffer[start..start + data.len()].copy_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_padded_to_a_full_report() -> Result<(), Error> {
        let report = UsbReport::from_payload(&[0x10, 0x00, 0x10])?;
        assert_eq!(&report.write_buffer[..3], &[0x10, 0x00, 0x10]);
        assert!(report.write_buffer[3..].iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn payload_length_is_checked() {
        assert!(UsbReport::from_payload(&[]).is_err());
        assert!(UsbReport::from_payload(&[0u8; 65]).is_err());
        assert!(UsbReport::from_payload(&[0u8; 64]).is_ok());
    }

    #[test]
    fn retry_safety_follows_the_command_code() {
        assert!(UsbReport::new(McpCommand::GetGpioValues).is_retry_safe());
        assert!(UsbReport::new(McpCommand::WriteFlashData(FlashSection::GpSettings)).is_retry_safe());
        assert!(!UsbReport::new(McpCommand::I2cWriteData).is_retry_safe());
        assert!(!UsbReport::new(McpCommand::I2cGetData).is_retry_safe());
        assert!(!UsbReport::new(McpCommand::SendFlashAccessPassword).is_retry_safe());
    }

    #[test]
    fn reset_has_its_confirmation_bytes() {
        let report = UsbReport::new(McpCommand::ResetChip);
        assert_eq!(&report.write_buffer[..4], &[0x70, 0xAB, 0xCD, 0xEF]);
        assert!(report.has_no_response());
    }
}
