use super::{GpPin, GpioDirection, LogicLevel};
use crate::settings::{Setting, SramConfigRequest};

/// Function selected for a GP pin, bits 0..=2 of its settings byte.
///
/// The meaning of the dedicated and alternate functions differs per pin:
///
/// | Pin | Dedicated | Alt0   | Alt1    | Alt2 |
/// |-----|-----------|--------|---------|------|
/// | GP0 | SSPND     | LED_URX | -      | -    |
/// | GP1 | CLKR      | ADC1   | LED_UTX | IOC  |
/// | GP2 | USBCFG    | ADC2   | DAC1    | -    |
/// | GP3 | LED_I2C   | ADC3   | DAC2    | -    |
///
/// ## Datasheet
///
/// See table 1-5 and the GP settings bytes in table 3-36.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFunction {
    /// General purpose input or output.
    Gpio,
    /// The pin's dedicated function.
    Dedicated,
    /// First alternate function.
    Alt0,
    /// Second alternate function.
    Alt1,
    /// Third alternate function.
    Alt2,
}

impl PinFunction {
    /// Analog input, on GP1 to GP3.
    pub const ADC: PinFunction = PinFunction::Alt0;
    /// Analog output, on GP2 and GP3.
    pub const DAC: PinFunction = PinFunction::Alt1;

    /// Decode bits 0..=2 of a GP settings byte.
    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b111 {
            0b000 => Some(Self::Gpio),
            0b001 => Some(Self::Dedicated),
            0b010 => Some(Self::Alt0),
            0b011 => Some(Self::Alt1),
            0b100 => Some(Self::Alt2),
            _ => None,
        }
    }
}

impl From<PinFunction> for u8 {
    fn from(value: PinFunction) -> Self {
        match value {
            PinFunction::Gpio => 0b000,
            PinFunction::Dedicated => 0b001,
            PinFunction::Alt0 => 0b010,
            PinFunction::Alt1 => 0b011,
            PinFunction::Alt2 => 0b100,
        }
    }
}

/// Requested use of one GP pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// GPIO input.
    GpioInput,
    /// GPIO output driving the given level.
    GpioOutput(LogicLevel),
    /// Dedicated function.
    Dedicated,
    /// First alternate function.
    Alt0,
    /// Second alternate function.
    Alt1,
    /// Third alternate function.
    Alt2,
}

/// Pin functions to apply with [`MCP2221::set_pin_functions`].
///
/// Pins that are not given a mode keep their current settings.
///
/// ```rust
/// # use mcp2221_bridge::gpio::{GpPin, LogicLevel, PinFunctions, PinMode};
/// let mut functions = PinFunctions::new();
/// functions
///     .with_pin(GpPin::Gp0, PinMode::GpioOutput(LogicLevel::Low))
///     .with_pin(GpPin::Gp2, PinMode::Alt1);
/// ```
///
/// [`MCP2221::set_pin_functions`]: crate::MCP2221::set_pin_functions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PinFunctions {
    modes: [Option<PinMode>; 4],
}

impl PinFunctions {
    /// Create a set of pin functions that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode of a pin.
    pub fn with_pin(&mut self, pin: GpPin, mode: PinMode) -> &mut Self {
        self.modes[pin.index()] = Some(mode);
        self
    }

    /// Requested mode of a pin, if any.
    pub fn get(&self, pin: GpPin) -> Option<PinMode> {
        self.modes[pin.index()]
    }

    /// Express the pin functions as an SRAM configuration request.
    ///
    /// GPIO modes set the function, direction and (for outputs) the value.
    /// Other modes only set the function.
    pub(crate) fn to_request(&self) -> SramConfigRequest {
        let mut request = SramConfigRequest::new();
        for pin in GpPin::ALL {
            let Some(mode) = self.modes[pin.index()] else {
                continue;
            };
            let gp = request.gp_mut(pin);
            match mode {
                PinMode::GpioInput => {
                    gp.function = Setting::Set(PinFunction::Gpio);
                    gp.direction = Setting::Set(GpioDirection::Input);
                }
                PinMode::GpioOutput(level) => {
                    gp.function = Setting::Set(PinFunction::Gpio);
                    gp.direction = Setting::Set(GpioDirection::Output);
                    gp.value = Setting::Set(level);
                }
                PinMode::Dedicated => gp.function = Setting::Set(PinFunction::Dedicated),
                PinMode::Alt0 => gp.function = Setting::Set(PinFunction::Alt0),
                PinMode::Alt1 => gp.function = Setting::Set(PinFunction::Alt1),
                PinMode::Alt2 => gp.function = Setting::Set(PinFunction::Alt2),
            }
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_become_sparse_requests() {
        let mut functions = PinFunctions::new();
        functions
            .with_pin(GpPin::Gp0, PinMode::GpioOutput(LogicLevel::High))
            .with_pin(GpPin::Gp3, PinMode::Alt0);
        let request = functions.to_request();

        let gp0 = request.gp(GpPin::Gp0);
        assert_eq!(gp0.function, Setting::Set(PinFunction::Gpio));
        assert_eq!(gp0.direction, Setting::Set(GpioDirection::Output));
        assert_eq!(gp0.value, Setting::Set(LogicLevel::High));

        assert!(!request.gp(GpPin::Gp1).is_set());
        assert!(!request.gp(GpPin::Gp2).is_set());

        let gp3 = request.gp(GpPin::Gp3);
        assert_eq!(gp3.function, Setting::Set(PinFunction::ADC));
        assert_eq!(gp3.direction, Setting::Keep);
    }
}
