use super::MCP2221;
use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::gpio::{GpioChanges, GpioValues, PinFunctions};
use crate::transport::Transport;

impl<T: Transport> MCP2221<T> {
    /// Get GPIO pin direction and current logic levels.
    ///
    /// The logic level listed for input pins is the value read at that pin, and for
    /// output pins it is the currently set output. Only pins that are configured for
    /// GPIO operation are present in the returned struct.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.12 for the underlying Get GPIO Values HID command.
    pub fn gpio_read(&self) -> Result<GpioValues, Error> {
        let buf = self.transfer_with_response(&UsbReport::new(McpCommand::GetGpioValues))?;
        Ok(GpioValues::from_buffer(&buf))
    }

    /// Change GPIO pins' direction and output logic level.
    ///
    /// Pins must already be in GPIO mode, see [`MCP2221::set_pin_functions`].
    ///
    /// The driver's record of the GP pin settings is updated with the changes, as
    /// the device does not reflect them in its SRAM settings.
    ///
    /// # Errors
    ///
    /// [`Error::GpioModeConflict`] if a pin with a requested change is not in GPIO
    /// mode. Changes to the other pins are still applied, and recorded.
    ///
    /// # Datasheet
    ///
    /// See section 3.1.11 of the datasheet for the underlying Set GPIO Output Values
    /// HID command.
    pub fn gpio_write(&self, changes: &GpioChanges) -> Result<(), Error> {
        // Later SRAM merges start from the cache, so it must predate this write.
        self.gpio_cache_load()?;

        let mut command = UsbReport::new(McpCommand::SetGpioOutputValues);
        changes.apply_to_buffer(&mut command.write_buffer);
        let response = self.transfer_with_response(&command)?;
        // The other pins are changed even when one is refused.
        let accepted = changes.accepted(&response);
        self.gpio_cache_update(|gp| accepted.apply_to_gp_bytes(gp));
        if let Some(pin) = changes.conflicting_pin(&response) {
            if self.config.debug_messages {
                tracing::debug!("{pin} is not in GPIO mode");
            }
            return Err(Error::GpioModeConflict);
        }
        Ok(())
    }

    /// Change the function of GP pins.
    ///
    /// Pins not given a mode in `functions` keep their current settings.
    /// The change goes through [`MCP2221::sram_config`] and is lost on reset.
    pub fn set_pin_functions(&self, functions: &PinFunctions) -> Result<(), Error> {
        self.sram_config(&functions.to_request())
    }
}

#[cfg(test)]
mod tests {
    use crate::gpio::{GpPin, GpioChanges, GpioDirection, LogicLevel};
    use crate::mock::{MockTransport, response};
    use crate::{DeviceConfig, Error, MCP2221};

    #[test]
    fn write_to_non_gpio_pin_is_a_conflict() {
        let mock = MockTransport::new();
        mock.push(response(0x61, &[]));
        mock.push(response(0x50, &[(7, 0xEE)]));
        let device = MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap();

        let mut changes = GpioChanges::new();
        changes.with_level(GpPin::Gp1, LogicLevel::High);
        assert!(matches!(
            device.gpio_write(&changes),
            Err(Error::GpioModeConflict)
        ));
    }

    #[test]
    fn accepted_pins_are_cached_despite_a_conflict() {
        let mock = MockTransport::new();
        // GP0 GPIO output low, GP1 ADC.
        mock.push(response(0x61, &[(22, 0b0000_0000), (23, 0b0000_0010)]));
        mock.push(response(0x50, &[(7, 0xEE)]));
        mock.push(response(0x61, &[(22, 0b0000_0000), (23, 0b0000_0010)]));
        let device = MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap();

        let mut changes = GpioChanges::new();
        changes
            .with_level(GpPin::Gp0, LogicLevel::High)
            .with_level(GpPin::Gp1, LogicLevel::High);
        assert!(matches!(
            device.gpio_write(&changes),
            Err(Error::GpioModeConflict)
        ));

        let settings = device.sram_read_settings().unwrap();
        assert_eq!(settings.gp[0].value, LogicLevel::High);
        assert_eq!(settings.gp[1].value, LogicLevel::Low);
    }

    #[test]
    fn write_updates_the_cache_without_another_read() {
        let mock = MockTransport::new();
        mock.push(response(0x61, &[(22, 0b0000_1000)]));
        mock.push(response(0x50, &[]));
        mock.push(response(0x50, &[]));
        mock.push(response(0x61, &[(22, 0b0000_1000)]));
        let device = MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap();

        let mut changes = GpioChanges::new();
        changes.with_direction(GpPin::Gp0, GpioDirection::Output);
        device.gpio_write(&changes).unwrap();
        changes.with_level(GpPin::Gp0, LogicLevel::High);
        device.gpio_write(&changes).unwrap();

        let sent = device.transport().sent();
        assert_eq!(sent.iter().filter(|r| r[0] == 0x61).count(), 1);

        let settings = device.sram_read_settings().unwrap();
        assert_eq!(settings.gp[0].direction, GpioDirection::Output);
        assert_eq!(settings.gp[0].value, LogicLevel::High);
    }
}
