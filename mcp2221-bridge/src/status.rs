//! Status read from the MCP2221.
//!
//! [`Status`] is decoded from the response to the Status/Set Parameters command,
//! the same command the I2C engines use to poll the bus.

use crate::i2c::I2cStatus;

/// Current status of the MCP2221.
///
/// Bytes in documentation are numbered from 0 through 63 and correspond
/// to table 3-2 in section 3.1.1 (Status/Set Parameters) of the datasheet.
#[derive(Debug, Clone)]
pub struct Status {
    /// I2C engine status
    pub i2c: I2cStatus,
    /// Edge-detection interrupt state.
    ///
    /// True if an interrupt has been detected. Use [`MCP2221::interrupt_clear`]
    /// to clear the flag.
    ///
    /// # Datasheet
    ///
    /// See byte 24 in table 3-2 for the source of this field. It's listed as being
    /// either 0 or 1, so we've made the assumption that 1 means an interrupt has
    /// been detected.
    ///
    /// [`MCP2221::interrupt_clear`]: crate::MCP2221::interrupt_clear
    pub interrupt_detected: bool,
    /// MCP2221 hardware revision.
    pub hardware_revision: Revision,
    /// MCP2221 firmware revision.
    pub firmware_revision: Revision,
    /// Readings from the 3 channels of the 10-bit ADC.
    pub adc_values: RawAdcValues,
}

impl Status {
    pub(crate) fn from_buffer(buf: &[u8; 64]) -> Self {
        Self {
            i2c: I2cStatus::from_buffer(buf),
            interrupt_detected: buf[24] == 0x01,
            hardware_revision: Revision::new(buf[46] as char, buf[47] as char),
            firmware_revision: Revision::new(buf[48] as char, buf[49] as char),
            adc_values: RawAdcValues::from_buffer(buf),
        }
    }
}

/// Two-part revision number.
///
/// Used for the hardware and firmware revisions in the MCP2221 Status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    /// Major component of the revision number. (x.0)
    pub major: char,
    /// Minor component of the revision number. (0.x)
    pub minor: char,
}

impl Revision {
    fn new(major: char, minor: char) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Raw three-channel reading from the ADC.
///
/// Prefer [`MCP2221::adc_read`] and [`AdcReading`] instead of interacting with
/// this directly.
///
/// [`MCP2221::adc_read`]: crate::MCP2221::adc_read
/// [`AdcReading`]: crate::analog::AdcReading
///
/// If the pin for a channel is not configured as an analog input, the value read
/// for that channel is formally undefined.
///
/// # Datasheet
///
/// See bytes `50..=55` in table 3-2 for the source of these values, and table 1-1
/// for the mapping of ADC channels to GP pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAdcValues {
    /// ADC reading of channel 1 (GP1).
    pub ch1: u16,
    /// ADC reading of channel 2 (GP2).
    pub ch2: u16,
    /// ADC reading of channel 3 (GP3).
    pub ch3: u16,
}

impl RawAdcValues {
    fn from_buffer(buf: &[u8; 64]) -> Self {
        Self {
            ch1: u16::from_le_bytes([buf[50], buf[51]]),
            ch2: u16::from_le_bytes([buf[52], buf[53]]),
            ch3: u16::from_le_bytes([buf[54], buf[55]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::I2cState;

    #[test]
    fn decodes_status_poll_response() {
        let mut buf = [0u8; 64];
        buf[0] = 0x10;
        buf[8] = 0x45;
        buf[9..13].copy_from_slice(&[0x82, 0x00, 0x3C, 0x00]);
        buf[14] = 118;
        buf[22] = 1;
        buf[23] = 0;
        buf[24] = 1;
        buf[46..50].copy_from_slice(b"A6B1");
        buf[50..56].copy_from_slice(&[0xFF, 0x03, 0x00, 0x02, 0x10, 0x00]);

        let status = Status::from_buffer(&buf);
        assert_eq!(status.i2c.state, I2cState::WriteDataEndNoStop);
        assert_eq!(status.i2c.requested_length, 130);
        assert_eq!(status.i2c.transmitted_length, 60);
        assert_eq!(status.i2c.clock_divider, 118);
        assert!(status.i2c.scl_high);
        assert!(!status.i2c.sda_high);
        assert!(status.interrupt_detected);
        assert_eq!(status.hardware_revision.to_string(), "A.6");
        assert_eq!(status.firmware_revision.to_string(), "B.1");
        assert_eq!(
            status.adc_values,
            RawAdcValues {
                ch1: 1023,
                ch2: 512,
                ch3: 16
            }
        );
    }
}
