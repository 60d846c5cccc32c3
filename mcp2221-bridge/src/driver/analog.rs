use super::MCP2221;
use crate::Error;
use crate::analog::{AdcReading, VoltageReference, VrmVoltage};
use crate::common::{ClockDutyCycle, ClockFrequency, ClockSetting};
use crate::gpio::PinFunction;
use crate::settings::{InterruptEdges, SramConfigRequest};
use crate::transport::Transport;

const DAC_MAX: u8 = 31;

impl<T: Transport> MCP2221<T> {
    /// Configure the ADC voltage reference in SRAM.
    ///
    /// This will alter the current behaviour of the MCP2221 but will not persist
    /// across device reset.
    ///
    /// Unlike with the DAC, setting the ADC reference to Vrm with a level of "off"
    /// results in a reference that seems to be equivalent to Vdd (as the datasheet
    /// suggests).
    ///
    /// # Datasheet
    ///
    /// See section 1.8.2 for information about the 10-bit ADC, section 1.8.1.1 for
    /// details about Vrm, and section 3.1.13 for the underlying Set SRAM Settings
    /// HID command.
    pub fn adc_config(&self, vref: VoltageReference) -> Result<(), Error> {
        self.sram_config(SramConfigRequest::new().with_adc_reference(vref))
    }

    /// Read the current values of the three-channel ADC.
    ///
    /// Pins GP1, GP2, and GP3 are connected to separate channels of the ADC, and the
    /// return value will contain the analog reading for each if that pin is configured
    /// as an analog input. The current ADC voltage reference is included so that you
    /// may convert a 10-bit reading to a voltage (`reading / 1023 * Vref`).
    ///
    /// # Datasheet
    ///
    /// See section 1.8.2 for information about the 10-bit ADC and section 3.1.1 for
    /// the underlying Status/Set Parameters HID command.
    pub fn adc_read(&self) -> Result<AdcReading, Error> {
        let raw = self.status()?.adc_values;
        let settings = self.sram_read_settings()?;
        let is_adc = |index: usize| settings.gp[index].function == Some(PinFunction::ADC);
        Ok(AdcReading {
            vref: settings.adc_reference,
            gp1: is_adc(1).then_some(raw.ch1),
            gp2: is_adc(2).then_some(raw.ch2),
            gp3: is_adc(3).then_some(raw.ch3),
        })
    }

    /// Configure the DAC voltage reference and, optionally, its output value.
    ///
    /// When the reference changes, the DAC is first switched to Vrm-off with an
    /// output of 0, so the output does not pass through an unintended level. The
    /// value is kept when `value` is `None`.
    ///
    /// <div class="warning">
    ///
    /// Setting the DAC reference to Vrm with a level of "off" will cause the output
    /// voltage to be just above 0V at all output values. The datasheet suggests (in
    /// section 1.8.1.1) that "off" means that Vrm will reference Vdd (the supply
    /// voltage). This is true for the ADC but _not_ the DAC. Just use Vdd instead.
    ///
    /// </div>
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `value` is above 31.
    pub fn dac_config(&self, vref: VoltageReference, value: Option<u8>) -> Result<(), Error> {
        if value.is_some_and(|v| v > DAC_MAX) {
            return Err(Error::InvalidArgument("DAC value must be 0..=31"));
        }
        let current = self.sram_read_settings()?;
        if current.dac_reference != vref {
            self.sram_config(
                SramConfigRequest::new()
                    .with_dac_reference(VoltageReference::Vrm(VrmVoltage::Off))
                    .with_dac_value(0),
            )?;
        }
        let mut request = SramConfigRequest::new();
        request.with_dac_reference(vref);
        request.with_dac_value(value.unwrap_or(current.dac_value));
        self.sram_config(&request)
    }

    /// Perform an analog write to the DAC.
    ///
    /// This writes a 5-bit value to the MCP2221's digital-to-analog converter, which
    /// outputs a corresponding voltage on appropriately configured pins. GP2 and GP3
    /// can be used for analog output pins, though they share the single DAC and will
    /// have the same voltage.
    ///
    /// This setting is not persisted across reset. See [`MCP2221::save_config`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `value` is above 31.
    ///
    /// # Datasheet
    ///
    /// See section 1.8.3 for information about the 5-bit DAC, and section 3.1.13 for
    /// the underlying Set SRAM Settings HID command.
    pub fn dac_write(&self, value: u8) -> Result<(), Error> {
        if value > DAC_MAX {
            return Err(Error::InvalidArgument("DAC value must be 0..=31"));
        }
        self.sram_config(SramConfigRequest::new().with_dac_value(value))
    }

    /// Set the duty cycle and frequency of the clock output.
    ///
    /// The clock is only output on GP1 when its dedicated function is selected.
    ///
    /// # Datasheet
    ///
    /// See section 1.9 for the clock output and table 3-36 for the bit layout.
    pub fn clock_config(
        &self,
        duty: ClockDutyCycle,
        frequency: ClockFrequency,
    ) -> Result<(), Error> {
        let clock = ClockSetting(duty, frequency);
        self.sram_config(SramConfigRequest::new().with_clock_output(clock))
    }

    /// Choose the GP1 edges that raise the interrupt flag.
    ///
    /// GP1 must be set to its interrupt-on-change function (`Alt2`) for the flag
    /// to be raised.
    pub fn interrupt_config(&self, edges: InterruptEdges) -> Result<(), Error> {
        self.sram_config(SramConfigRequest::new().with_interrupt_edges(edges))
    }

    /// Whether the interrupt flag is set.
    pub fn interrupt_detected(&self) -> Result<bool, Error> {
        Ok(self.status()?.interrupt_detected)
    }

    /// Clear the interrupt flag.
    pub fn interrupt_clear(&self) -> Result<(), Error> {
        self.sram_config(SramConfigRequest::new().with_interrupt_clear())
    }

    /// Current interrupt edge configuration.
    pub fn interrupt_edges(&self) -> Result<InterruptEdges, Error> {
        Ok(self.sram_read_settings()?.interrupt_edges)
    }
}

#[cfg(test)]
mod tests {
    use crate::analog::{VoltageReference, VrmVoltage};
    use crate::common::{ClockDutyCycle, ClockFrequency};
    use crate::mock::{MockTransport, response, status};
    use crate::settings::InterruptEdges;
    use crate::{DeviceConfig, Error, MCP2221};

    fn device(mock: MockTransport) -> MCP2221<MockTransport> {
        MCP2221::with_transport(mock, &DeviceConfig::default()).unwrap()
    }

    #[test]
    fn adc_channels_follow_pin_functions() {
        let mock = MockTransport::new();
        mock.push(status(0, &[(50, 0xFF), (51, 0x03), (52, 0x10), (54, 0x20)]));
        // ADC reference Vrm 2.048V, GP1 and GP3 analog inputs, GP2 GPIO.
        let mut sram = response(0x61, &[(7, 0b101 << 2)]);
        sram[22..26].copy_from_slice(&[0x00, 0b010, 0x00, 0b010]);
        mock.push(sram);
        let device = device(mock);

        let reading = device.adc_read().unwrap();
        assert_eq!(reading.vref, VoltageReference::Vrm(VrmVoltage::V2_048));
        assert_eq!(reading.gp1, Some(1023));
        assert_eq!(reading.gp2, None);
        assert_eq!(reading.gp3, Some(0x20));
    }

    #[test]
    fn dac_reference_change_passes_through_vrm_off() {
        let mock = MockTransport::new();
        // DAC on Vdd with value 9.
        mock.push(response(0x61, &[(6, 9)]));
        mock.push(response(0x61, &[(6, 9)]));
        mock.push(response(0x60, &[]));
        mock.push(response(0x61, &[(6, 0b001 << 5)]));
        mock.push(response(0x60, &[]));
        let device = device(mock);

        let vrm = VoltageReference::Vrm(VrmVoltage::V4_096);
        device.dac_config(vrm, Some(20)).unwrap();

        let sets: Vec<_> = device
            .transport()
            .sent()
            .into_iter()
            .filter(|r| r[0] == 0x60)
            .collect();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0][3], 0x80 | 0b001);
        assert_eq!(sets[0][4], 0x80);
        assert_eq!(sets[1][3], 0x80 | vrm.to_bits());
        assert_eq!(sets[1][4], 0x80 | 20);
    }

    #[test]
    fn dac_same_reference_is_a_single_write() {
        let mock = MockTransport::new();
        mock.push(response(0x61, &[(6, 3)]));
        mock.push(response(0x61, &[(6, 3)]));
        mock.push(response(0x60, &[]));
        let device = device(mock);

        device.dac_config(VoltageReference::Vdd, None).unwrap();
        let sent = device.transport().sent();
        assert_eq!(sent.iter().filter(|r| r[0] == 0x60).count(), 1);
        assert_eq!(sent[2][4], 0x80 | 3);
    }

    #[test]
    fn dac_value_out_of_range() {
        let device = device(MockTransport::new());
        assert!(matches!(device.dac_write(32), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            device.dac_config(VoltageReference::Vdd, Some(40)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(device.transport().sent().is_empty());
    }

    #[test]
    fn clock_and_interrupt_settings() {
        let mock = MockTransport::new();
        mock.push(response(0x61, &[]));
        mock.push(response(0x60, &[]));
        mock.push(response(0x61, &[]));
        mock.push(response(0x60, &[]));
        mock.push(status(0, &[(24, 1)]));
        let device = device(mock);

        device
            .clock_config(ClockDutyCycle::P50, ClockFrequency::MHz12)
            .unwrap();
        device.interrupt_config(InterruptEdges::Rising).unwrap();
        assert!(device.interrupt_detected().unwrap());

        let sent = device.transport().sent();
        assert_eq!(sent[1][2], 0x80 | 0b10_010);
        assert_eq!(sent[3][6], 0x80 | 0b1_1100);
    }
}
