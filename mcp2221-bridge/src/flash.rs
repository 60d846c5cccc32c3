//! Sections of the MCP2221 flash memory.
//!
//! Flash holds the settings loaded at power-up and the USB descriptor strings.
//! Each section is read and written as one 60-byte block.

use crate::Error;
use crate::common::DeviceString;
use crate::constants::FLASH_SECTION_SIZE;

/// One section of the flash memory.
///
/// ## Datasheet
///
/// See tables 3-5 to 3-10 for the Read Flash Data sub-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashSection {
    /// Chip settings, including the USB VID and PID and power-up analog settings.
    ChipSettings,
    /// Power-up GP pin settings.
    GpSettings,
    /// USB manufacturer descriptor string.
    UsbManufacturer,
    /// USB product descriptor string.
    UsbProduct,
    /// USB serial number descriptor string.
    UsbSerialNumber,
    /// Factory serial number. Read-only.
    FactorySerialNumber,
}

/// USB descriptor strings that can be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbStringKind {
    /// Manufacturer descriptor.
    Manufacturer,
    /// Product descriptor.
    Product,
    /// Serial number descriptor.
    Serial,
}

impl From<UsbStringKind> for FlashSection {
    fn from(value: UsbStringKind) -> Self {
        match value {
            UsbStringKind::Manufacturer => FlashSection::UsbManufacturer,
            UsbStringKind::Product => FlashSection::UsbProduct,
            UsbStringKind::Serial => FlashSection::UsbSerialNumber,
        }
    }
}

/// Contents of the flash memory.
///
/// The chip and GP settings are kept as raw sections, laid out as described in
/// tables 3-5 and 3-6 of the datasheet (from byte 4 of the response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashInfo {
    /// Raw chip settings section.
    pub chip_settings: [u8; FLASH_SECTION_SIZE],
    /// Raw GP settings section.
    pub gp_settings: [u8; FLASH_SECTION_SIZE],
    /// USB manufacturer descriptor.
    pub manufacturer: DeviceString,
    /// USB product descriptor.
    pub product: DeviceString,
    /// USB serial number descriptor.
    pub serial_number: DeviceString,
    /// Factory serial number.
    pub factory_serial_number: String,
}

/// The 60 bytes of a Read Flash Data response starting at the structure length.
///
/// String descriptors are decoded from this window, which starts two bytes
/// earlier than the section data returned by [`MCP2221::flash_read`].
///
/// [`MCP2221::flash_read`]: crate::MCP2221::flash_read
pub(crate) fn descriptor_window(buf: &[u8; 64]) -> [u8; FLASH_SECTION_SIZE] {
    let mut window = [0u8; FLASH_SECTION_SIZE];
    window.copy_from_slice(&buf[2..2 + FLASH_SECTION_SIZE]);
    window
}

/// Decode the factory serial number from its descriptor window.
///
/// Unlike the USB strings, the factory serial number is stored as ASCII.
pub(crate) fn factory_serial(window: &[u8; FLASH_SECTION_SIZE]) -> String {
    let length = usize::from(window[0]).min(FLASH_SECTION_SIZE - 2);
    String::from_utf8_lossy(&window[2..2 + length]).into_owned()
}

/// Decode a USB string descriptor window.
pub(crate) fn usb_string(window: &[u8; FLASH_SECTION_SIZE]) -> Result<DeviceString, Error> {
    DeviceString::try_from_section(window)
}
