//! Utility types for various settings.

use bit_field::BitField;

use crate::Error;

/// String limited to 30 UTF-16 code units.
///
/// The strings stored in the MCP2221 flash memory (used during USB enumeration)
/// are limited to at most 60 bytes of UTF-16-encoded text.
///
/// Create a `DeviceString` by calling [`str::parse`] on a string slice, or
/// [`DeviceString::try_from`] with an owned `String`.
///
/// ```rust
/// # use mcp2221_bridge::DeviceString;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let product: DeviceString = "I2C bridge for the lab bench".parse()?;
///
/// let too_long = "4 bytes each: 🫐🫑🫒🫓🫔🫕🫖🫗🫘🫙".parse::<DeviceString>();
/// assert!(too_long.is_err(), "More than 60 bytes when UTF-16 encoded.");
/// # Ok(())
/// # }
/// ```
///
/// ## Datasheet
///
/// See table 3-7 and table 3-14 for details of how the device strings are read from
/// and written to the MCP2221, including the length limitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceString(String);

impl TryFrom<String> for DeviceString {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        // Check the number of u16s (two bytes) is within the limit.
        if value.encode_utf16().count() <= 30 {
            Ok(Self(value))
        } else {
            Err("String must be 60 bytes or fewer when UTF-16-encoded.")
        }
    }
}

impl std::str::FromStr for DeviceString {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl DeviceString {
    /// Decode a string descriptor from a flash section payload.
    ///
    /// The payload is the 60 bytes following the response header, so the
    /// descriptor length is at index 0, the 0x03 constant at index 1 and the
    /// UTF-16LE text from index 2. Those are bytes 2, 3 and 4 of the response.
    pub(crate) fn try_from_section(section: &[u8; 60]) -> Result<Self, Error> {
        let n_bytes = usize::from(section[0]).saturating_sub(2).min(58);
        // Round down to whole UTF-16 code units.
        let units: Vec<u16> = section[2..2 + n_bytes]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        String::from_utf16(&units)
            .map(Self)
            .map_err(|_| Error::InvalidAnswer)
    }

    /// Write the descriptor into a flash write payload.
    ///
    /// See table 3-14 in the datasheet. The count goes to index 0 (byte 2 of the
    /// command) and the 0x03 constant to index 1 (byte 3).
    pub(crate) fn to_section(&self) -> [u8; 60] {
        let mut section = [0u8; 60];
        let mut byte_count = 0u8;
        let utf16_pairs = self.0.encode_utf16().map(u16::to_le_bytes);
        for (unit_number, [low, high]) in utf16_pairs.enumerate() {
            let pos = 2 + (2 * unit_number);
            section[pos] = low;
            section[pos + 1] = high;
            byte_count += 2;
        }
        section[0] = byte_count + 2;
        section[1] = 0x03; // Required constant, the USB string descriptor type.
        section
    }

    /// The string as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clock output duty cycle.
///
/// Each case is the percentage of one clock period that is a high logic level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClockDutyCycle {
    /// 75% duty cycle.
    P75,
    /// 50% duty cycle (factory default).
    #[default]
    P50,
    /// 25% duty cycle.
    P25,
    /// 0% duty cycle.
    P0,
}

impl ClockDutyCycle {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0b11 => Self::P75,
            0b10 => Self::P50,
            0b01 => Self::P25,
            _ => Self::P0,
        }
    }
}

#[doc(hidden)]
impl From<ClockDutyCycle> for u8 {
    fn from(value: ClockDutyCycle) -> u8 {
        match value {
            ClockDutyCycle::P75 => 0b11,
            ClockDutyCycle::P50 => 0b10,
            ClockDutyCycle::P25 => 0b01,
            ClockDutyCycle::P0 => 0b00,
        }
    }
}

/// Clock output frequency.
#[allow(non_camel_case_types)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClockFrequency {
    /// 375 kHz clock output.
    kHz375,
    /// 750 kHz clock output.
    kHz750,
    /// 1.5 MHz clock output.
    MHz1_5,
    /// 3 MHz clock output.
    MHz3,
    /// 6 MHz clock output.
    MHz6,
    /// 12 MHz clock output (factory default).
    #[default]
    MHz12,
    /// 24 MHz clock output.
    MHz24,
}

impl ClockFrequency {
    /// Frequency from the 3 low bits of the raw "divider".
    ///
    /// Pattern `0b000` is marked "Reserved" in the datasheet.
    fn from_bits(value: u8) -> Option<Self> {
        match value & 0b111 {
            0b111 => Some(Self::kHz375),
            0b110 => Some(Self::kHz750),
            0b101 => Some(Self::MHz1_5),
            0b100 => Some(Self::MHz3),
            0b011 => Some(Self::MHz6),
            0b010 => Some(Self::MHz12),
            0b001 => Some(Self::MHz24),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<ClockFrequency> for u8 {
    fn from(value: ClockFrequency) -> Self {
        match value {
            ClockFrequency::kHz375 => 0b111,
            ClockFrequency::kHz750 => 0b110,
            ClockFrequency::MHz1_5 => 0b101,
            ClockFrequency::MHz3 => 0b100,
            ClockFrequency::MHz6 => 0b011,
            ClockFrequency::MHz12 => 0b010,
            ClockFrequency::MHz24 => 0b001,
        }
    }
}

/// Clock output duty cycle and frequency.
///
/// See datasheet register 1-2 for details. In the USB command section the datasheet
/// is worded as if this is just a 5-bit divider, but really it is a 2-bit duty cycle
/// selection, and a 3-bit frequency selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockSetting(pub ClockDutyCycle, pub ClockFrequency);

impl ClockSetting {
    /// Decode the 5-bit "divider" read from the MCP2221.
    ///
    /// Returns `None` for the reserved frequency pattern.
    pub(crate) fn from_bits(value: u8) -> Option<Self> {
        Some(Self(
            ClockDutyCycle::from_bits(value.get_bits(3..=4)),
            ClockFrequency::from_bits(value.get_bits(0..=2))?,
        ))
    }
}

#[doc(hidden)]
impl From<ClockSetting> for u8 {
    fn from(value: ClockSetting) -> Self {
        let ClockSetting(duty_cycle, frequency) = value;
        let mut byte = 0u8;
        byte.set_bits(3..=4, duty_cycle.into());
        byte.set_bits(0..=2, frequency.into());
        byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_string_section_layout() {
        let s: DeviceString = "MCP2221 USB-I2C/UART Combo".parse().unwrap();
        let section = s.to_section();
        assert_eq!(section[0], 2 + 2 * 26);
        assert_eq!(section[1], 0x03);
        assert_eq!(&section[2..4], &[b'M', 0]);
        assert_eq!(DeviceString::try_from_section(&section).unwrap(), s);
    }

    #[test]
    fn device_string_stops_at_declared_length() {
        let mut section = [0u8; 60];
        section[0] = 6;
        section[1] = 0x03;
        section[2..8].copy_from_slice(&[b'a', 0, b'b', 0, b'c', 0]);
        assert_eq!(DeviceString::try_from_section(&section).unwrap().as_str(), "ab");
    }

    #[test]
    fn clock_setting_bits() {
        let setting = ClockSetting(ClockDutyCycle::P25, ClockFrequency::MHz3);
        let bits = u8::from(setting);
        assert_eq!(bits, 0b01_100);
        assert_eq!(ClockSetting::from_bits(bits), Some(setting));
        assert_eq!(ClockSetting::from_bits(0b10_000), None);
    }
}
