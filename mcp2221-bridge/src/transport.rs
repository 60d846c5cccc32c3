//! USB transport for the 64-byte HID reports.
//!
//! The driver only needs two primitives from the transport: send one report and
//! receive one report. [`HidTransport`] provides them over [`hidapi`], and other
//! implementations (for example a simulated device in tests) can be plugged into
//! [`MCP2221::with_transport`].
//!
//! [`MCP2221::with_transport`]: crate::MCP2221::with_transport

use std::ffi::CStr;
use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice};

use crate::config::DeviceSelector;
use crate::constants::PACKET_SIZE;

/// Failure of the underlying USB transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Error reported by the HID library.
    #[error("hidapi: {0}")]
    Hid(#[from] hidapi::HidError),
    /// No report arrived before the read timeout.
    #[error("timed out waiting for a report")]
    Timeout,
    /// Fewer bytes than a full report were transferred.
    #[error("short transfer: expected {expected} bytes, transferred {actual}")]
    ShortTransfer {
        /// Full report size.
        expected: usize,
        /// Bytes actually transferred.
        actual: usize,
    },
    /// No USB device matched the vendor ID, product ID and selector.
    #[error("no matching USB device found")]
    NotFound,
    /// The transport has been closed.
    #[error("transport is closed")]
    Closed,
}

/// Exchange of fixed-size reports with an MCP2221.
///
/// Implementations are used from a single thread at a time and take `&self`, in
/// the same way [`HidDevice`] does.
pub trait Transport {
    /// Send one 64-byte report to the device.
    fn send_report(&self, report: &[u8; PACKET_SIZE]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for one 64-byte report from the device.
    ///
    /// A zero timeout blocks until a report arrives.
    fn receive_report(&self, timeout: Duration) -> Result<[u8; PACKET_SIZE], TransportError>;
}

/// Identity of a physical device, used to deduplicate opens.
///
/// A device selected by serial number is keyed by that serial. A device
/// selected by index is keyed by its platform-specific HID path, which follows
/// its USB bus and address, so two boards sharing a serial number stay apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceKey {
    /// USB serial number string.
    Serial(String),
    /// Platform HID device path.
    Path(String),
}

impl DeviceKey {
    pub(crate) fn for_info(info: &DeviceInfo, selector: &DeviceSelector) -> Self {
        Self::for_selection(selector, info.path())
    }

    fn for_selection(selector: &DeviceSelector, path: &CStr) -> Self {
        match selector {
            DeviceSelector::Serial(serial) => Self::Serial(serial.clone()),
            DeviceSelector::Index(_) => Self::Path(path.to_string_lossy().into_owned()),
        }
    }
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKey::Serial(serial) => write!(f, "serial {serial}"),
            DeviceKey::Path(path) => write!(f, "path {path}"),
        }
    }
}

/// Find the device matching the IDs and selector in the host's device list.
pub(crate) fn find_device<'a>(
    api: &'a HidApi,
    vendor_id: u16,
    product_id: u16,
    selector: &DeviceSelector,
) -> Result<&'a DeviceInfo, TransportError> {
    let mut matching = api
        .device_list()
        .filter(move |d| d.vendor_id() == vendor_id && d.product_id() == product_id);
    let found = match selector {
        DeviceSelector::Index(index) => matching.nth(*index),
        DeviceSelector::Serial(serial) => {
            matching.find(|d| d.serial_number() == Some(serial.as_str()))
        }
    };
    found.ok_or(TransportError::NotFound)
}

/// [`Transport`] over a [`hidapi`] device.
///
/// The device is closed when this struct is dropped.
#[derive(Debug)]
pub struct HidTransport {
    /// Underlying [`hidapi`] device.
    ///
    /// The C hidapi library is not thread safe and the `hidapi` types are
    /// appropriately `!Sync`.
    device: HidDevice,
    key: DeviceKey,
}

impl HidTransport {
    /// Open the device matching the IDs and selector.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotFound`] if no device matches, otherwise any error
    /// from opening the HID device.
    pub fn open(
        api: &HidApi,
        vendor_id: u16,
        product_id: u16,
        selector: &DeviceSelector,
    ) -> Result<Self, TransportError> {
        let info = find_device(api, vendor_id, product_id, selector)?;
        let device = info.open_device(api)?;
        Ok(Self {
            device,
            key: DeviceKey::for_info(info, selector),
        })
    }

    /// Identity of the opened device.
    pub fn key(&self) -> &DeviceKey {
        &self.key
    }

    /// USB information about the opened device, from the host's HID layer.
    pub fn device_info(&self) -> Result<DeviceInfo, TransportError> {
        Ok(self.device.get_device_info()?)
    }
}

impl Transport for HidTransport {
    fn send_report(&self, report: &[u8; PACKET_SIZE]) -> Result<(), TransportError> {
        // hidapi requires the report number to be prepended to the data bytes.
        let mut out = [0u8; PACKET_SIZE + 1];
        out[1..].copy_from_slice(report);
        let written = self.device.write(&out)?;
        // Some backends do not count the report number.
        if written < PACKET_SIZE {
            return Err(TransportError::ShortTransfer {
                expected: PACKET_SIZE + 1,
                actual: written,
            });
        }
        Ok(())
    }

    fn receive_report(&self, timeout: Duration) -> Result<[u8; PACKET_SIZE], TransportError> {
        let timeout_ms = match timeout.as_millis() {
            0 => -1,
            ms => i32::try_from(ms).unwrap_or(i32::MAX),
        };
        let mut buf = [0u8; PACKET_SIZE];
        match self.device.read_timeout(&mut buf, timeout_ms)? {
            0 => Err(TransportError::Timeout),
            PACKET_SIZE => Ok(buf),
            actual => Err(TransportError::ShortTransfer {
                expected: PACKET_SIZE,
                actual,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_selection_keys_by_path_even_with_a_shared_serial() {
        let first = DeviceKey::for_selection(&DeviceSelector::Index(0), c"/dev/hidraw1");
        let second = DeviceKey::for_selection(&DeviceSelector::Index(1), c"/dev/hidraw2");
        assert_eq!(first, DeviceKey::Path("/dev/hidraw1".into()));
        assert_ne!(first, second);
    }

    #[test]
    fn serial_selection_keys_by_serial() {
        let selector = DeviceSelector::Serial("0001".into());
        let a = DeviceKey::for_selection(&selector, c"/dev/hidraw1");
        let b = DeviceKey::for_selection(&selector, c"/dev/hidraw5");
        assert_eq!(a, DeviceKey::Serial("0001".into()));
        assert_eq!(a, b);
    }
}
