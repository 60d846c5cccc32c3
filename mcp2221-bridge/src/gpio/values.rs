use bit_field::BitField;

use super::{GpPin, GpioDirection, LogicLevel};
use crate::constants::{GPIO_NOT_GPIO_DIRECTION, GPIO_NOT_GPIO_LEVEL};

/// Status of the GPIO pins.
///
/// A field is `None` if the corresponding pin is not configured for GPIO operation.
///
/// If a pin is set as an input, the logic level is the value read on that pin. If
/// it is set as an output, it is the current output value of that pin.
///
/// ## Datasheet
///
/// See section 3.1.12 for the underlying Get GPIO Values HID command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioValues {
    /// GP0 GPIO values.
    pub gp0: Option<(GpioDirection, LogicLevel)>,
    /// GP1 GPIO values.
    pub gp1: Option<(GpioDirection, LogicLevel)>,
    /// GP2 GPIO values.
    pub gp2: Option<(GpioDirection, LogicLevel)>,
    /// GP3 GPIO values.
    pub gp3: Option<(GpioDirection, LogicLevel)>,
}

impl GpioValues {
    /// Parse the response from the Get GPIO Values command.
    ///
    /// ## Datasheet
    ///
    /// See table 3-35 for the Get GPIO Values response layout.
    pub(crate) fn from_buffer(buf: &[u8; 64]) -> Self {
        Self {
            gp0: parse_bytes(buf[2], buf[3]),
            gp1: parse_bytes(buf[4], buf[5]),
            gp2: parse_bytes(buf[6], buf[7]),
            gp3: parse_bytes(buf[8], buf[9]),
        }
    }

    /// Direction and level of one pin.
    pub fn get(&self, pin: GpPin) -> Option<(GpioDirection, LogicLevel)> {
        match pin {
            GpPin::Gp0 => self.gp0,
            GpPin::Gp1 => self.gp1,
            GpPin::Gp2 => self.gp2,
            GpPin::Gp3 => self.gp3,
        }
    }

    /// Logic level of one pin, if it is in GPIO mode.
    pub fn level(&self, pin: GpPin) -> Option<LogicLevel> {
        self.get(pin).map(|(_, level)| level)
    }
}

/// Parse received bytes into a direction and level pair.
///
/// In the Get GPIO Values response, the level byte comes first and the direction
/// byte second. Each has its own sentinel for pins not in GPIO mode.
fn parse_bytes(level_byte: u8, direction_byte: u8) -> Option<(GpioDirection, LogicLevel)> {
    if level_byte == GPIO_NOT_GPIO_LEVEL || direction_byte == GPIO_NOT_GPIO_DIRECTION {
        return None;
    }
    Some((
        GpioDirection::from(direction_byte != 0),
        LogicLevel::from(level_byte != 0),
    ))
}

/// Changes to make to GPIO pin settings.
///
/// This offers a builder-like interface where values that are not set are left
/// unchanged in the device settings.
///
/// You can "set" the logic level for an input pin. This reflects the MCP2221 interface
/// but such a change naturally does not take effect unless and until the pin is set to
/// be an output.
///
/// Note that these changes will not put a pin set to another function into GPIO mode.
/// That is done with [`MCP2221::set_pin_functions`].
///
/// [`MCP2221::set_pin_functions`]: crate::MCP2221::set_pin_functions
///
/// ## Datasheet
///
/// See section 3.1.11 for the underlying Set GPIO Output Values HID command.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioChanges {
    levels: [Option<LogicLevel>; 4],
    directions: [Option<GpioDirection>; 4],
}

impl GpioChanges {
    /// Create a struct with no pending changes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output logic level of a pin.
    pub fn with_level(&mut self, pin: GpPin, level: LogicLevel) -> &mut Self {
        self.levels[pin.index()] = Some(level);
        self
    }

    /// Set the direction of a pin.
    pub fn with_direction(&mut self, pin: GpPin, direction: GpioDirection) -> &mut Self {
        self.directions[pin.index()] = Some(direction);
        self
    }

    /// True if no change has been requested.
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Option::is_none) && self.directions.iter().all(Option::is_none)
    }

    fn touches(&self, pin: GpPin) -> bool {
        self.levels[pin.index()].is_some() || self.directions[pin.index()].is_some()
    }

    /// Write changes into a buffer for Set GPIO Output Values.
    ///
    /// Each pin has four bytes starting at 2, 6, 10 and 14: alter output, output
    /// value, alter direction, direction. A zero "alter" byte preserves the setting.
    pub(crate) fn apply_to_buffer(&self, buf: &mut [u8; 64]) {
        const ENABLE_SETTING: u8 = 0x01;

        for pin in GpPin::ALL {
            let base = 2 + 4 * pin.index();
            if let Some(level) = self.levels[pin.index()] {
                buf[base] = ENABLE_SETTING;
                buf[base + 1] = level.into();
            }
            if let Some(direction) = self.directions[pin.index()] {
                buf[base + 2] = ENABLE_SETTING;
                buf[base + 3] = direction.into();
            }
        }
    }

    /// First changed pin that the device reported as not in GPIO mode.
    ///
    /// The response echoes 0xEE in place of the output value for such pins.
    pub(crate) fn conflicting_pin(&self, response: &[u8; 64]) -> Option<GpPin> {
        GpPin::ALL
            .into_iter()
            .find(|&pin| self.touches(pin) && response[3 + 4 * pin.index()] == GPIO_NOT_GPIO_LEVEL)
    }

    /// The changes the device accepted, leaving out the pins it reported as not in
    /// GPIO mode.
    pub(crate) fn accepted(&self, response: &[u8; 64]) -> Self {
        let mut accepted = *self;
        for pin in GpPin::ALL {
            if response[3 + 4 * pin.index()] == GPIO_NOT_GPIO_LEVEL {
                accepted.levels[pin.index()] = None;
                accepted.directions[pin.index()] = None;
            }
        }
        accepted
    }

    /// Apply the changes to cached GP settings bytes.
    ///
    /// The output value is bit 4 and the direction bit 3 (set for input).
    pub(crate) fn apply_to_gp_bytes(&self, gp: &mut [u8; 4]) {
        for pin in GpPin::ALL {
            let byte = &mut gp[pin.index()];
            if let Some(level) = self.levels[pin.index()] {
                byte.set_bit(4, level.into());
            }
            if let Some(direction) = self.directions[pin.index()] {
                byte.set_bit(3, direction.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_mean_not_gpio() {
        let mut buf = [0u8; 64];
        buf[2..10].copy_from_slice(&[0x01, 0x00, 0xEE, 0xEF, 0x00, 0x01, 0x01, 0xEF]);
        let values = GpioValues::from_buffer(&buf);
        assert_eq!(values.gp0, Some((GpioDirection::Output, LogicLevel::High)));
        assert_eq!(values.gp1, None);
        assert_eq!(values.gp2, Some((GpioDirection::Input, LogicLevel::Low)));
        assert_eq!(values.gp3, None);
    }

    #[test]
    fn changes_use_alter_bytes() {
        let mut buf = [0u8; 64];
        GpioChanges::new()
            .with_level(GpPin::Gp1, LogicLevel::High)
            .with_direction(GpPin::Gp3, GpioDirection::Input)
            .apply_to_buffer(&mut buf);
        assert_eq!(&buf[2..6], &[0, 0, 0, 0]);
        assert_eq!(&buf[6..10], &[1, 1, 0, 0]);
        assert_eq!(&buf[10..14], &[0, 0, 0, 0]);
        assert_eq!(&buf[14..18], &[0, 0, 1, 1]);
    }

    #[test]
    fn conflict_only_for_changed_pins() {
        let mut response = [0u8; 64];
        response[3] = 0xEE;
        response[7] = 0xEE;
        let mut changes = GpioChanges::new();
        changes.with_level(GpPin::Gp2, LogicLevel::Low);
        assert_eq!(changes.conflicting_pin(&response), None);
        changes.with_direction(GpPin::Gp1, GpioDirection::Output);
        assert_eq!(changes.conflicting_pin(&response), Some(GpPin::Gp1));
    }

    #[test]
    fn cache_update_touches_only_value_and_direction() {
        let mut gp = [0b0000_0010, 0b0001_1000, 0x00, 0x00];
        GpioChanges::new()
            .with_level(GpPin::Gp0, LogicLevel::High)
            .with_direction(GpPin::Gp1, GpioDirection::Output)
            .apply_to_gp_bytes(&mut gp);
        assert_eq!(gp, [0b0001_0010, 0b0001_0000, 0x00, 0x00]);
    }
}
