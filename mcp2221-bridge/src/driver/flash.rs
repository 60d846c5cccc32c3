use super::MCP2221;
use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::common::DeviceString;
use crate::constants::{
    COMMAND_SUCCESS, FLASH_READ_OFFSET, FLASH_SECTION_SIZE, FLASH_WRITE_OFFSET, PACKET_SIZE,
    SRAM_CHIP_SETTINGS, STATUS_BYTE,
};
use crate::flash::{FlashInfo, FlashSection, UsbStringKind, descriptor_window, factory_serial};
use crate::transport::Transport;

impl<T: Transport> MCP2221<T> {
    /// Full Read Flash Data response for a section.
    fn flash_read_response(&self, section: FlashSection) -> Result<[u8; PACKET_SIZE], Error> {
        self.transfer_with_response(&UsbReport::new(McpCommand::ReadFlashData(section)))
    }

    /// Read one 60-byte section of flash memory.
    ///
    /// The section data starts at byte 4 of the response. For the chip and GP
    /// settings this is the layout given in tables 3-5 and 3-6 of the datasheet.
    /// For the string sections, see [`MCP2221::flash_info`] for decoded strings.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.2 for the underlying Read Flash Data HID command.
    pub fn flash_read(&self, section: FlashSection) -> Result<[u8; FLASH_SECTION_SIZE], Error> {
        let buf = self.flash_read_response(section)?;
        let mut data = [0u8; FLASH_SECTION_SIZE];
        data.copy_from_slice(&buf[FLASH_READ_OFFSET..FLASH_READ_OFFSET + FLASH_SECTION_SIZE]);
        Ok(data)
    }

    /// Write one 60-byte section of flash memory.
    ///
    /// Settings stored in flash take effect when the device is powered-up.
    ///
    /// <div class="warning">
    ///
    /// The data is written as given. In the chip settings section the low two bits
    /// of the first byte select the chip security mode, and a wrong value there can
    /// lock the device permanently.
    ///
    /// </div>
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for [`FlashSection::FactorySerialNumber`],
    ///   which is read-only.
    /// - [`Error::FlashWriteFailed`] if the device reports a failure, for example
    ///   because the flash is password protected.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.3 for the underlying Write Flash Data HID command.
    pub fn flash_write(
        &self,
        section: FlashSection,
        data: &[u8; FLASH_SECTION_SIZE],
    ) -> Result<(), Error> {
        if section == FlashSection::FactorySerialNumber {
            return Err(Error::InvalidArgument("the factory serial number is read-only"));
        }
        let mut command = UsbReport::new(McpCommand::WriteFlashData(section));
        command.set_data(FLASH_WRITE_OFFSET, data);
        match self.transfer_with_response(&command) {
            Ok(buf) if buf[STATUS_BYTE] == COMMAND_SUCCESS => Ok(()),
            Ok(_) | Err(Error::I2c { .. }) => Err(Error::FlashWriteFailed),
            Err(e) => Err(e),
        }
    }

    /// Send the flash access password.
    ///
    /// Only needed when the chip settings are password protected.
    ///
    /// # Errors
    ///
    /// [`Error::FlashPasswordRejected`] if the device does not accept the password.
    /// After too many failed attempts the device locks until the next reset.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.4 for the underlying Send Access Password HID command.
    pub fn flash_send_password(&self, password: &[u8; 8]) -> Result<(), Error> {
        let mut command = UsbReport::new(McpCommand::SendFlashAccessPassword);
        command.set_data(2, password);
        let buf = self.transfer_with_response(&command)?;
        if buf[STATUS_BYTE] != COMMAND_SUCCESS {
            return Err(Error::FlashPasswordRejected);
        }
        Ok(())
    }

    /// Read the whole flash memory.
    ///
    /// The factory serial number is read with [`String::from_utf8_lossy`]. For the
    /// MCP2221A it appears to always be "01234567".
    pub fn flash_info(&self) -> Result<FlashInfo, Error> {
        let string = |section| {
            let buf = self.flash_read_response(section)?;
            DeviceString::try_from_section(&descriptor_window(&buf))
        };
        let factory = self.flash_read_response(FlashSection::FactorySerialNumber)?;
        Ok(FlashInfo {
            chip_settings: self.flash_read(FlashSection::ChipSettings)?,
            gp_settings: self.flash_read(FlashSection::GpSettings)?,
            manufacturer: string(FlashSection::UsbManufacturer)?,
            product: string(FlashSection::UsbProduct)?,
            serial_number: string(FlashSection::UsbSerialNumber)?,
            factory_serial_number: factory_serial(&descriptor_window(&factory)),
        })
    }

    /// Store the current run-time settings as the power-up settings.
    ///
    /// The chip settings held in SRAM are copied over the start of the flash chip
    /// settings section, and the GP pin settings (including changes made with
    /// [`MCP2221::gpio_write`]) over the start of the GP section. The rest of
    /// both sections, including the USB VID and PID, is written back unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::FlashWriteFailed`] if either section cannot be written. The chip
    /// settings may have been written when the GP settings fail.
    pub fn save_config(&self) -> Result<(), Error> {
        let (sram, gp) = self.sram_read_raw()?;
        let mut chip = self.flash_read(FlashSection::ChipSettings)?;
        let mut gp_flash = self.flash_read(FlashSection::GpSettings)?;

        let sram_chip = &sram[SRAM_CHIP_SETTINGS];
        chip[..sram_chip.len()].copy_from_slice(sram_chip);
        gp_flash[..gp.len()].copy_from_slice(&gp);

        if self.config.debug_messages {
            tracing::debug!(?gp, "saving SRAM settings to flash");
        }
        self.flash_write(FlashSection::ChipSettings, &chip)?;
        self.flash_write(FlashSection::GpSettings, &gp_flash)
    }

    /// Change a USB descriptor string.
    ///
    /// This setting is stored in flash, so the MCP2221 will have to be reset (and
    /// re-enumerate) for the change to take effect.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.3 for the underlying Write Flash Data HID command, and
    /// tables 3-14 to 3-16 for the relevant subcommands.
    pub fn write_usb_string(&self, kind: UsbStringKind, s: &DeviceString) -> Result<(), Error> {
        // The descriptor starts at the first data byte, two before the section data.
        let mut command = UsbReport::new(McpCommand::WriteFlashData(kind.into()));
        command.set_data(FLASH_WRITE_OFFSET, &s.to_section());
        match self.transfer_with_response(&command) {
            Ok(buf) if buf[STATUS_BYTE] == COMMAND_SUCCESS => Ok(()),
            Ok(_) | Err(Error::I2c { .. }) => Err(Error::FlashWriteFailed),
            Err(e) => Err(e),
        }
    }
}
