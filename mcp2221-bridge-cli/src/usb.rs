use clap::Parser;
use mcp2221_bridge::{DeviceString, MCP2221, UsbStringKind};

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum UsbCommand {
    /// Print the USB information reported by the host.
    Info,
    /// Change the USB manufacturer descriptor.
    SetManufacturer { value: DeviceString },
    /// Change the USB product descriptor.
    SetProduct { value: DeviceString },
    /// Change the USB serial number descriptor.
    ///
    /// The new serial number is only reported after a reset, and only if
    /// serial number enumeration is enabled in the chip settings.
    SetSerial { value: DeviceString },
}

#[allow(dead_code)]
#[derive(Debug)]
struct UsbInfo<'a> {
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
    serial_number: Option<&'a str>,
    vendor_id: String,
    product_id: String,
    path: String,
}

impl<'a> From<&'a hidapi::DeviceInfo> for UsbInfo<'a> {
    fn from(info: &'a hidapi::DeviceInfo) -> Self {
        Self {
            manufacturer: info.manufacturer_string(),
            product: info.product_string(),
            serial_number: info.serial_number(),
            vendor_id: format!("{:#06X}", info.vendor_id()),
            product_id: format!("{:#06X}", info.product_id()),
            path: info.path().to_string_lossy().to_string(),
        }
    }
}

pub(crate) fn action(device: &MCP2221, command: UsbCommand) -> Result<(), mcp2221_bridge::Error> {
    match command {
        UsbCommand::Info => {
            println!("key: {}", device.key());
            println!("{:#?}", UsbInfo::from(&device.usb_device_info()?));
        }
        UsbCommand::SetManufacturer { value } => {
            device.write_usb_string(UsbStringKind::Manufacturer, &value)?
        }
        UsbCommand::SetProduct { value } => device.write_usb_string(UsbStringKind::Product, &value)?,
        UsbCommand::SetSerial { value } => device.write_usb_string(UsbStringKind::Serial, &value)?,
    }
    Ok(())
}
