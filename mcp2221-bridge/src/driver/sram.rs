use super::{GpioCache, MCP2221};
use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::settings::{SramConfigRequest, SramSettings, SramSnapshot, gp_bytes, plan};
use crate::transport::Transport;

impl<T: Transport> MCP2221<T> {
    /// Read the SRAM settings and the effective GP bytes.
    ///
    /// The GP bytes come from the local cache when it is loaded. Otherwise they
    /// are taken from the response, which also loads the cache.
    pub(crate) fn sram_read_raw(&self) -> Result<([u8; 64], [u8; 4]), Error> {
        let buf = self.transfer_with_response(&UsbReport::new(McpCommand::GetSramSettings))?;
        let gp = match self.gpio_cache.get() {
            GpioCache::Loaded(gp) => gp,
            GpioCache::Unloaded => {
                let gp = gp_bytes(&buf);
                self.gpio_cache.set(GpioCache::Loaded(gp));
                gp
            }
        };
        Ok((buf, gp))
    }

    /// Load the GP bytes cache from SRAM if it has not been loaded yet.
    pub(crate) fn gpio_cache_load(&self) -> Result<(), Error> {
        if self.gpio_cache.get() == GpioCache::Unloaded {
            self.sram_read_raw()?;
        }
        Ok(())
    }

    /// Apply `update` to the cached GP bytes, if loaded.
    pub(crate) fn gpio_cache_update(&self, update: impl FnOnce(&mut [u8; 4])) {
        if let GpioCache::Loaded(mut gp) = self.gpio_cache.get() {
            update(&mut gp);
            self.gpio_cache.set(GpioCache::Loaded(gp));
        }
    }

    /// Retrieve the run-time chip and GP pin settings.
    ///
    /// <div class="warning">
    ///
    /// The device does not show changes made with Set GPIO Output Values in its
    /// SRAM settings. The GP pin settings returned here come from the driver's own
    /// record, which includes those changes, once it has been loaded.
    ///
    /// </div>
    ///
    /// # Datasheet
    ///
    /// See section 3.1.14 of the datasheet for details about the underlying Get SRAM
    /// Settings HID command, and section 1.4 for information about the configuration
    /// process at power-up.
    pub fn sram_read_settings(&self) -> Result<SramSettings, Error> {
        let (buf, gp) = self.sram_read_raw()?;
        Ok(SramSettings::from_buffer(&buf, gp))
    }

    /// Change run-time chip and GP pin settings.
    ///
    /// Only the fields set in `request` are changed. The current settings are read
    /// first and merged with the request, so unrelated settings (in particular the
    /// analog references and the GP pins) are preserved.
    ///
    /// This will alter the current behaviour of the MCP2221 but will not persist
    /// across device reset. See [`MCP2221::save_config`].
    ///
    /// <div class="warning">
    ///
    /// Changing the GP pin settings while the ADC or DAC uses the Vrm causes a
    /// glitch on the reference. This appears to be a MCP2221 firmware bug and is
    /// noted in section 1.8.1.1 of the datasheet. In that case the driver sends the
    /// pin settings with the Vrm switched off, then restores the references in a
    /// second command.
    ///
    /// </div>
    ///
    /// # Datasheet
    ///
    /// See section 3.1.13 of the datasheet for details about the underlying Set SRAM
    /// Settings HID command.
    pub fn sram_config(&self, request: &SramConfigRequest) -> Result<(), Error> {
        let (buf, gp) = self.sram_read_raw()?;
        let plan = plan(request, &SramSnapshot::from_buffer(&buf, gp));
        for bytes in &plan.commands {
            let mut command = UsbReport::new(McpCommand::SetSramSettings);
            command.set_data(1, &bytes[1..]);
            self.transfer_with_response(&command)?;
        }
        if let Some(gp) = plan.gp_update {
            self.gpio_cache.set(GpioCache::Loaded(gp));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::analog::{VoltageReference, VrmVoltage};
    use crate::gpio::{GpPin, PinFunction};
    use crate::mock::{MockTransport, response};
    use crate::settings::SramConfigRequest;
    use crate::{DeviceConfig, MCP2221};

    fn sram_response(dac_ref_bits: u8, gp: [u8; 4]) -> [u8; 64] {
        let mut buf = response(0x61, &[(5, 0x12), (6, (dac_ref_bits << 5) | 9)]);
        buf[22..26].copy_from_slice(&gp);
        buf
    }

    #[test]
    fn pin_change_with_vrm_sends_two_commands_and_caches() {
        let vrm = VoltageReference::Vrm(VrmVoltage::V2_048).to_bits();
        let mock = MockTransport::new();
        mock.push(sram_response(vrm, [0x00, 0x00, 0x00, 0x00]));
        mock.push(response(0x60, &[]));
        mock.push(response(0x60, &[]));
        let device = MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap();

        let mut request = SramConfigRequest::new();
        request.with_gp_function(GpPin::Gp3, PinFunction::DAC);
        device.sram_config(&request).unwrap();

        let sent = device.transport().sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0][0], 0x61);
        assert_eq!(&sent[1][..8], &[0x60, 0, 0, 0x81, 0x89, 0x81, 0, 0x80]);
        assert_eq!(sent[1][11], 0b011);
        assert_eq!(&sent[2][..8], &[0x60, 0, 0, 0x80 | vrm, 0x89, 0x80, 0, 0]);

        // The cache now holds the new GP bytes, even though SRAM says otherwise.
        device.transport().push(sram_response(vrm, [0x00; 4]));
        let settings = device.sram_read_settings().unwrap();
        assert_eq!(settings.gp[3].function, Some(PinFunction::DAC));
    }
}
