//! Options used when opening a device.

use std::time::Duration;

use crate::constants::{MCP2221_PID, MICROCHIP_VID};

/// Which of several matching USB devices to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// The n-th device (from zero) with matching vendor and product ID.
    Index(usize),
    /// The device with this USB serial number.
    Serial(String),
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

/// Driver configuration.
///
/// The defaults match a factory-fresh MCP2221: the first device with VID 0x04D8
/// and PID 0x00DD, a 500 ms read timeout and three command re-tries.
///
/// ```rust
/// # use mcp2221_bridge::DeviceConfig;
/// # use std::time::Duration;
/// let config = DeviceConfig::default()
///     .with_serial("0001234567")
///     .with_read_timeout(Duration::from_millis(250))
///     .with_i2c_speed(400_000);
/// assert_eq!(config.retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Which matching device to open.
    pub selector: DeviceSelector,
    /// How long to wait for each response report.
    ///
    /// Also the per-chunk watchdog of the "simple" I2C transfer variants.
    pub read_timeout: Duration,
    /// Number of times a command is re-sent after a failure.
    ///
    /// A command is attempted at most `retries + 1` times.
    pub retries: u32,
    /// Emit debug events for re-tries, I2C engine states and bus recovery.
    pub debug_messages: bool,
    /// Emit trace events with a hex dump of every report.
    pub trace_packets: bool,
    /// I2C bus speed to configure when the device is opened.
    pub i2c_speed_hz: Option<u32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: MICROCHIP_VID,
            product_id: MCP2221_PID,
            selector: DeviceSelector::default(),
            read_timeout: Duration::from_millis(500),
            retries: 3,
            debug_messages: false,
            trace_packets: false,
            i2c_speed_hz: None,
        }
    }
}

impl DeviceConfig {
    /// Use a changed USB vendor and product ID.
    pub fn with_vid_and_pid(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    /// Open the n-th matching device.
    pub fn with_index(mut self, index: usize) -> Self {
        self.selector = DeviceSelector::Index(index);
        self
    }

    /// Open the device with this USB serial number.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.selector = DeviceSelector::Serial(serial.into());
        self
    }

    /// Change the response read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Change the number of command re-tries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Enable or disable debug events.
    pub fn with_debug_messages(mut self, enabled: bool) -> Self {
        self.debug_messages = enabled;
        self
    }

    /// Enable or disable report hex dumps.
    pub fn with_trace_packets(mut self, enabled: bool) -> Self {
        self.trace_packets = enabled;
        self
    }

    /// Set the I2C bus speed when the device is opened.
    pub fn with_i2c_speed(mut self, hz: u32) -> Self {
        self.i2c_speed_hz = Some(hz);
        self
    }
}
