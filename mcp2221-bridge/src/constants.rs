//! Fixed values of the MCP2221 HID protocol.

use std::time::Duration;

/// Microchip's USB vendor ID.
pub(crate) const MICROCHIP_VID: u16 = 0x04D8;
/// Factory USB product ID of the MCP2221 and MCP2221A.
pub(crate) const MCP2221_PID: u16 = 0x00DD;

/// Size of every HID report exchanged with the device, in both directions.
pub(crate) const PACKET_SIZE: usize = 64;

/// Byte 1 of most responses is the command status, and 0 means success.
pub(crate) const STATUS_BYTE: usize = 1;
pub(crate) const COMMAND_SUCCESS: u8 = 0x00;

/// Byte of I2C command and Get Data responses holding the internal engine state.
///
/// The Status/Set Parameters response carries it at byte 8 instead.
pub(crate) const I2C_INTERNAL_STATE_BYTE: usize = 2;

/// One report minus the four header bytes of an I2C write.
pub(crate) const I2C_CHUNK_SIZE: usize = 60;
/// The transfer length field of the I2C commands is 16 bits wide.
pub(crate) const MAX_I2C_TRANSFER: usize = 65_535;
pub(crate) const MAX_I2C_TRANSFER_PLUS_1: usize = MAX_I2C_TRANSFER + 1;
/// Watchdog used when the caller passes a zero timeout.
pub(crate) const DEFAULT_I2C_TIMEOUT: Duration = Duration::from_millis(20);

/// Status/Set Parameters sub-command that cancels the current I2C transfer.
pub(crate) const I2C_CANCEL_TRANSFER: u8 = 0x10;
/// Status/Set Parameters sub-command that sets the I2C clock divider.
///
/// The device echoes this value at byte 3 when the new speed was accepted.
pub(crate) const I2C_SET_BUS_SPEED: u8 = 0x20;

/// Internal clock used to derive the I2C bus divider.
pub(crate) const MCP_CLOCK_HZ: u32 = 12_000_000;

/// Level and direction sentinels in the GPIO command responses.
pub(crate) const GPIO_NOT_GPIO_LEVEL: u8 = 0xEE;
pub(crate) const GPIO_NOT_GPIO_DIRECTION: u8 = 0xEF;

/// Payload size of a flash section, as read or written.
pub(crate) const FLASH_SECTION_SIZE: usize = 60;
/// Flash payload starts at byte 4 of a read response...
pub(crate) const FLASH_READ_OFFSET: usize = 4;
/// ...and at byte 2 of a write command.
pub(crate) const FLASH_WRITE_OFFSET: usize = 2;

/// GP0..=GP3 settings bytes in the Get SRAM Settings response.
pub(crate) const SRAM_GP_OFFSET: usize = 22;
/// Chip settings bytes in the Get SRAM Settings response, mirrored in flash.
pub(crate) const SRAM_CHIP_SETTINGS: std::ops::RangeInclusive<usize> = 4..=21;
