//! I2C engine states, status snapshots and transfer framing.
//!
//! The MCP2221 reports the state of its internal I2C engine as a single byte. The
//! write and read engines in the driver look that byte up in the tables here to
//! decide whether to resend, keep polling, collect data or give up.

use bit_field::BitField;

use crate::Error;
use crate::commands::{McpCommand, UsbReport};
use crate::constants::{I2C_CHUNK_SIZE, MAX_I2C_TRANSFER, MCP_CLOCK_HZ};

/// Internal state of the MCP2221 I2C engine.
///
/// The codes are not documented in the datasheet. They are known from Microchip's
/// own host libraries and from observing the device; anything not listed here is
/// kept as [`I2cState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cState {
    /// 0x00: no transfer in progress.
    Idle,
    /// 0x10: sending START.
    Start,
    /// 0x11: waiting for START to complete.
    StartWait,
    /// 0x12: START timed out.
    StartTimeout,
    /// 0x15: sending repeated START.
    RepeatedStart,
    /// 0x16: waiting for repeated START to complete.
    RepeatedStartWait,
    /// 0x17: repeated START timed out.
    RepeatedStartTimeout,
    /// 0x20: sending the (low) address byte.
    WriteAddress,
    /// 0x21: waiting to send the address byte.
    WriteAddressWaitSend,
    /// 0x22: waiting for the address ACK.
    WriteAddressAck,
    /// 0x23: address transmission timed out.
    WriteAddressTimeout,
    /// 0x24: address not acknowledged, STOP pending.
    WriteAddressNackStopPending,
    /// 0x25: address not acknowledged, STOP sent.
    WriteAddressNackStop,
    /// 0x30: sending the high byte of a 10-bit address.
    WriteAddressHigh,
    /// 0x31: waiting to send the high address byte.
    WriteAddressHighWaitSend,
    /// 0x32: waiting for the high address byte ACK.
    WriteAddressHighAck,
    /// 0x33: high address byte timed out.
    WriteAddressHighTimeout,
    /// 0x40: writing data.
    WriteData,
    /// 0x41: waiting to send data.
    WriteDataWaitSend,
    /// 0x42: waiting for a data ACK.
    WriteDataAck,
    /// 0x43: waiting for more data from the host.
    WriteDataWait,
    /// 0x44: data write timed out.
    WriteDataTimeout,
    /// 0x45: all data written, no STOP sent.
    WriteDataEndNoStop,
    /// 0x50: reading data.
    ReadData,
    /// 0x51: receive enabled.
    ReadDataReceiveEnable,
    /// 0x52: data read timed out.
    ReadDataTimeout,
    /// 0x53: sending ACK for received data.
    ReadDataAck,
    /// 0x54: buffer full and more data to come.
    ReadDataWait,
    /// 0x55: buffer full with the last of the data.
    ReadDataWaitGet,
    /// 0x60: sending STOP.
    Stop,
    /// 0x61: waiting for STOP to complete.
    StopWait,
    /// 0x62: STOP timed out.
    StopTimeout,
    /// Any other code.
    Unknown(u8),
}

impl From<u8> for I2cState {
    fn from(value: u8) -> Self {
        use I2cState::*;
        match value {
            0x00 => Idle,
            0x10 => Start,
            0x11 => StartWait,
            0x12 => StartTimeout,
            0x15 => RepeatedStart,
            0x16 => RepeatedStartWait,
            0x17 => RepeatedStartTimeout,
            0x20 => WriteAddress,
            0x21 => WriteAddressWaitSend,
            0x22 => WriteAddressAck,
            0x23 => WriteAddressTimeout,
            0x24 => WriteAddressNackStopPending,
            0x25 => WriteAddressNackStop,
            0x30 => WriteAddressHigh,
            0x31 => WriteAddressHighWaitSend,
            0x32 => WriteAddressHighAck,
            0x33 => WriteAddressHighTimeout,
            0x40 => WriteData,
            0x41 => WriteDataWaitSend,
            0x42 => WriteDataAck,
            0x43 => WriteDataWait,
            0x44 => WriteDataTimeout,
            0x45 => WriteDataEndNoStop,
            0x50 => ReadData,
            0x51 => ReadDataReceiveEnable,
            0x52 => ReadDataTimeout,
            0x53 => ReadDataAck,
            0x54 => ReadDataWait,
            0x55 => ReadDataWaitGet,
            0x60 => Stop,
            0x61 => StopWait,
            0x62 => StopTimeout,
            other => Unknown(other),
        }
    }
}

impl I2cState {
    /// Raw state code as reported by the device.
    pub fn code(&self) -> u8 {
        use I2cState::*;
        match self {
            Idle => 0x00,
            Start => 0x10,
            StartWait => 0x11,
            StartTimeout => 0x12,
            RepeatedStart => 0x15,
            RepeatedStartWait => 0x16,
            RepeatedStartTimeout => 0x17,
            WriteAddress => 0x20,
            WriteAddressWaitSend => 0x21,
            WriteAddressAck => 0x22,
            WriteAddressTimeout => 0x23,
            WriteAddressNackStopPending => 0x24,
            WriteAddressNackStop => 0x25,
            WriteAddressHigh => 0x30,
            WriteAddressHighWaitSend => 0x31,
            WriteAddressHighAck => 0x32,
            WriteAddressHighTimeout => 0x33,
            WriteData => 0x40,
            WriteDataWaitSend => 0x41,
            WriteDataAck => 0x42,
            WriteDataWait => 0x43,
            WriteDataTimeout => 0x44,
            WriteDataEndNoStop => 0x45,
            ReadData => 0x50,
            ReadDataReceiveEnable => 0x51,
            ReadDataTimeout => 0x52,
            ReadDataAck => 0x53,
            ReadDataWait => 0x54,
            ReadDataWaitGet => 0x55,
            Stop => 0x60,
            StopWait => 0x61,
            StopTimeout => 0x62,
            Unknown(code) => *code,
        }
    }

    /// True if the engine has no transfer in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, I2cState::Idle)
    }

    /// States in which the engine is still working through an address or data
    /// write and will accept the same chunk again.
    fn is_write_busy(&self) -> bool {
        use I2cState::*;
        matches!(
            self,
            WriteAddress
                | WriteAddressWaitSend
                | WriteAddressAck
                | WriteAddressNackStopPending
                | WriteData
                | WriteDataWaitSend
                | WriteDataAck
        )
    }
}

impl std::fmt::Display for I2cState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} (0x{:02X})", self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Engine transition tables
////////////////////////////////////////////////////////////////////////////////

/// How an I2C transfer ended when it did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    /// The target did not acknowledge its address.
    NotAcknowledged,
    /// Any other engine fault.
    Bus,
}

impl From<Failure> for Error {
    fn from(value: Failure) -> Self {
        match value {
            Failure::NotAcknowledged => Error::NotAcknowledged,
            Failure::Bus => Error::i2c(),
        }
    }
}

/// Next step after a write chunk was rejected by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkAction {
    /// The engine is busy: send the same chunk again.
    Resend,
    /// Recover the bus and fail.
    Fail(Failure),
}

/// Decide what to do with a write chunk the device did not accept.
pub(crate) fn write_chunk_action(state: I2cState) -> ChunkAction {
    match state {
        s if s.is_write_busy() => ChunkAction::Resend,
        I2cState::WriteAddressNackStop => ChunkAction::Fail(Failure::NotAcknowledged),
        // Includes WriteDataEndNoStop, where a restart would be required.
        _ => ChunkAction::Fail(Failure::Bus),
    }
}

/// Next step while waiting for a write to drain after the last chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrainAction {
    /// The write is complete.
    Done,
    /// Still working, poll again.
    Poll,
    /// Recover the bus and fail.
    Fail(Failure),
}

/// Decide what to do with the state seen while draining a write.
pub(crate) fn write_drain_action(state: I2cState) -> DrainAction {
    match state {
        I2cState::Idle | I2cState::WriteDataEndNoStop => DrainAction::Done,
        s if s.is_write_busy() => DrainAction::Poll,
        I2cState::Stop | I2cState::StopWait => DrainAction::Poll,
        I2cState::WriteAddressNackStop => DrainAction::Fail(Failure::NotAcknowledged),
        _ => DrainAction::Fail(Failure::Bus),
    }
}

/// Next step after a Get Data poll during a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadAction {
    /// No data yet, poll again.
    Wait,
    /// Collect the data in this response and keep polling.
    Partial,
    /// Collect the data in this response and finish.
    Final,
    /// Recover the bus and fail.
    Fail(Failure),
}

/// Decide what to do with the state seen while polling for read data.
pub(crate) fn read_poll_action(state: I2cState) -> ReadAction {
    use I2cState::*;
    match state {
        WriteAddress
        | WriteAddressWaitSend
        | WriteAddressAck
        | WriteAddressNackStopPending
        | ReadData
        | ReadDataAck
        | StopWait => ReadAction::Wait,
        ReadDataWait => ReadAction::Partial,
        ReadDataWaitGet => ReadAction::Final,
        WriteAddressNackStop | WriteAddressTimeout => ReadAction::Fail(Failure::NotAcknowledged),
        _ => ReadAction::Fail(Failure::Bus),
    }
}

/// Classify a read request the device rejected outright.
pub(crate) fn read_request_failure(state: I2cState) -> Failure {
    match state {
        I2cState::WriteAddressNackStop => Failure::NotAcknowledged,
        _ => Failure::Bus,
    }
}

////////////////////////////////////////////////////////////////////////////////
// Status snapshot
////////////////////////////////////////////////////////////////////////////////

/// I2C engine fields of the Status/Set Parameters response.
///
/// A fresh snapshot is decoded on every status read.
///
/// # Datasheet
///
/// See table 3-2. Several of the fields used here (bytes 8, 18 and 21) are
/// marked as reserved or are undocumented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cStatus {
    /// Internal I2C engine state (byte 8).
    pub state: I2cState,
    /// Length of the requested transfer (bytes 9 and 10).
    pub requested_length: u16,
    /// Number of bytes already transferred (bytes 11 and 12).
    pub transmitted_length: u16,
    /// Current I2C clock divider (byte 14).
    pub clock_divider: u8,
    /// The target acknowledged its address.
    ///
    /// The datasheet lists bit 6 of byte 20 as the ACK status. It is 0 when
    /// the ACK was received, so it is inverted here.
    pub target_acknowledged: bool,
    /// SCL line is high (byte 22).
    pub scl_high: bool,
    /// SDA line is high (byte 23).
    pub sda_high: bool,
    /// Read pending value (byte 25).
    pub read_pending: u8,
    /// Heuristic: the engine is in an inconsistent state and should be released
    /// before the next transfer.
    ///
    /// Byte 18 is undocumented. It was found by trial and error to be non-zero
    /// when the engine is confused, except after a write without STOP.
    pub confused: bool,
    /// Heuristic: a transfer has been set up in the engine (byte 21).
    pub initialized: bool,
}

impl I2cStatus {
    pub(crate) fn from_buffer(buf: &[u8; 64]) -> Self {
        let state = I2cState::from(buf[8]);
        Self {
            state,
            requested_length: u16::from_le_bytes([buf[9], buf[10]]),
            transmitted_length: u16::from_le_bytes([buf[11], buf[12]]),
            clock_divider: buf[14],
            target_acknowledged: !buf[20].get_bit(6),
            scl_high: buf[22] == 0x01,
            sda_high: buf[23] == 0x01,
            read_pending: buf[25],
            confused: buf[18] != 0 && state != I2cState::WriteDataEndNoStop,
            initialized: buf[21] != 0,
        }
    }

    /// Idle with both lines released.
    pub fn is_released(&self) -> bool {
        self.state.is_idle() && self.scl_high && self.sda_high
    }
}

////////////////////////////////////////////////////////////////////////////////
// Transfer framing
////////////////////////////////////////////////////////////////////////////////

/// Framing of an I2C write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteKind {
    /// START, address, data, STOP.
    #[default]
    Normal,
    /// Repeated START, address, data, STOP.
    RepeatedStart,
    /// START, address, data, no STOP.
    ///
    /// Used before a [`ReadKind::RepeatedStart`] read to form a write-read.
    NoStop,
}

impl From<WriteKind> for McpCommand {
    fn from(value: WriteKind) -> Self {
        match value {
            WriteKind::Normal => McpCommand::I2cWriteData,
            WriteKind::RepeatedStart => McpCommand::I2cWriteDataRepeatedStart,
            WriteKind::NoStop => McpCommand::I2cWriteDataNoStop,
        }
    }
}

/// Framing of an I2C read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadKind {
    /// START, address, data, STOP.
    #[default]
    Normal,
    /// Repeated START, address, data, STOP.
    RepeatedStart,
}

impl From<ReadKind> for McpCommand {
    fn from(value: ReadKind) -> Self {
        match value {
            ReadKind::Normal => McpCommand::I2cReadData,
            ReadKind::RepeatedStart => McpCommand::I2cReadDataRepeatedStart,
        }
    }
}

/// Conversion of 7-bit addresses into the 8-bit address byte.
pub(crate) trait I2cAddressing {
    fn into_read_address(self) -> u8;
    fn into_write_address(self) -> u8;
}

impl I2cAddressing for u8 {
    fn into_read_address(self) -> u8 {
        (self << 1) + 1
    }

    fn into_write_address(self) -> u8 {
        self << 1
    }
}

/// Check the address and transfer length, returning the little-endian length.
pub(crate) fn validate_transfer(seven_bit_address: u8, len: usize) -> Result<[u8; 2], Error> {
    if seven_bit_address > 0x7F {
        return Err(Error::InvalidArgument("I2C address must be 7 bits"));
    }
    if len == 0 {
        return Err(Error::InvalidArgument("I2C transfer must not be empty"));
    }
    if len > MAX_I2C_TRANSFER {
        return Err(Error::InvalidArgument(
            "I2C transfer must not exceed 65,535 bytes",
        ));
    }
    Ok((len as u16).to_le_bytes())
}

/// I2C read or write command with its four-byte header filled in.
///
/// Bytes 1 and 2 hold the total transfer length and byte 3 the 8-bit address.
/// Every chunk of a write repeats the same header.
pub(crate) fn transfer_report(command: McpCommand, len: [u8; 2], address_byte: u8) -> UsbReport {
    let mut report = UsbReport::new(command);
    report.set_data(1, &[len[0], len[1], address_byte]);
    report
}

/// Split `data` into the payloads of successive write commands.
pub(crate) fn chunks(data: &[u8]) -> std::slice::Chunks<'_, u8> {
    data.chunks(I2C_CHUNK_SIZE)
}

/// Convert a bus speed into the clock divider for Status/Set Parameters.
///
/// The divider is `round(12 MHz / speed) - 2`, rounding halves to even, and must
/// fit in a byte. The `- 2` is from Note 1 in table 3-1 of the datasheet.
pub(crate) fn clock_divider(speed_hz: u32) -> Result<u8, Error> {
    if speed_hz == 0 {
        return Err(Error::InvalidArgument("I2C speed must be non-zero"));
    }
    let quotient = MCP_CLOCK_HZ / speed_hz;
    let remainder = MCP_CLOCK_HZ % speed_hz;
    let rounded = match (2 * u64::from(remainder)).cmp(&u64::from(speed_hz)) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient & 1),
    };
    rounded
        .checked_sub(2)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or(Error::InvalidArgument("I2C speed out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_convert_both_ways() {
        for code in 0..=u8::MAX {
            assert_eq!(I2cState::from(code).code(), code);
        }
        assert_eq!(I2cState::from(0x25), I2cState::WriteAddressNackStop);
        assert_eq!(I2cState::from(0x99), I2cState::Unknown(0x99));
    }

    #[test]
    fn write_chunk_table() {
        for code in [0x20, 0x21, 0x22, 0x24, 0x40, 0x41, 0x42] {
            assert_eq!(write_chunk_action(code.into()), ChunkAction::Resend);
        }
        assert_eq!(
            write_chunk_action(0x25.into()),
            ChunkAction::Fail(Failure::NotAcknowledged)
        );
        for code in [0x44, 0x45, 0x62, 0x00, 0x43, 0x7F] {
            assert_eq!(write_chunk_action(code.into()), ChunkAction::Fail(Failure::Bus));
        }
    }

    #[test]
    fn write_drain_table() {
        assert_eq!(write_drain_action(0x00.into()), DrainAction::Done);
        assert_eq!(write_drain_action(0x45.into()), DrainAction::Done);
        for code in [0x20, 0x41, 0x60, 0x61] {
            assert_eq!(write_drain_action(code.into()), DrainAction::Poll);
        }
        assert_eq!(
            write_drain_action(0x25.into()),
            DrainAction::Fail(Failure::NotAcknowledged)
        );
        assert_eq!(write_drain_action(0x62.into()), DrainAction::Fail(Failure::Bus));
    }

    #[test]
    fn read_poll_table() {
        for code in [0x20, 0x21, 0x22, 0x24, 0x50, 0x53, 0x61] {
            assert_eq!(read_poll_action(code.into()), ReadAction::Wait);
        }
        assert_eq!(read_poll_action(0x54.into()), ReadAction::Partial);
        assert_eq!(read_poll_action(0x55.into()), ReadAction::Final);
        assert_eq!(
            read_poll_action(0x23.into()),
            ReadAction::Fail(Failure::NotAcknowledged)
        );
        assert_eq!(read_poll_action(0x52.into()), ReadAction::Fail(Failure::Bus));
    }

    #[test]
    fn header_encodes_length_and_address() {
        for address in [0u8, 0x3C, 0x50, 0x7F] {
            for len in [1usize, 60, 61, 256, 65_535] {
                let le = validate_transfer(address, len).unwrap();
                let write = transfer_report(McpCommand::I2cWriteData, le, address.into_write_address())
                    .write_buffer;
                let read = transfer_report(McpCommand::I2cReadData, le, address.into_read_address())
                    .write_buffer;
                assert_eq!((write[0], read[0]), (0x90, 0x91));
                assert_eq!(usize::from(u16::from_le_bytes([write[1], write[2]])), len);
                assert_eq!(write[3], address << 1);
                assert_eq!(read[3], (address << 1) + 1);
            }
        }
    }

    #[test]
    fn transfers_are_validated() {
        assert!(matches!(validate_transfer(0x80, 1), Err(Error::InvalidArgument(_))));
        assert!(matches!(validate_transfer(0x50, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            validate_transfer(0x50, 65_536),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn chunks_reassemble_in_order() {
        for len in [1usize, 59, 60, 61, 130, 1000] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let pieces: Vec<&[u8]> = chunks(&data).collect();
            assert!(pieces.iter().all(|c| !c.is_empty() && c.len() <= 60));
            assert_eq!(pieces.concat(), data);
        }
    }

    #[test]
    fn clock_divider_rounds_half_to_even() {
        assert_eq!(clock_divider(100_000).unwrap(), 118);
        assert_eq!(clock_divider(400_000).unwrap(), 28);
        // 12 MHz / 4.8 MHz = 2.5, rounds to 2.
        assert_eq!(clock_divider(4_800_000).unwrap(), 0);
        // 12 MHz / 3.2 MHz = 3.75, rounds to 4.
        assert_eq!(clock_divider(3_200_000).unwrap(), 2);
        assert!(clock_divider(0).is_err());
        assert!(clock_divider(10_000).is_err());
        assert!(clock_divider(12_000_000).is_err());
    }

    #[test]
    fn confused_is_ignored_after_write_without_stop() {
        let mut buf = [0u8; 64];
        buf[18] = 0x01;
        buf[8] = 0x45;
        assert!(!I2cStatus::from_buffer(&buf).confused);
        buf[8] = 0x41;
        assert!(I2cStatus::from_buffer(&buf).confused);
    }

    #[test]
    fn ack_bit_is_inverted() {
        let mut buf = [0u8; 64];
        assert!(I2cStatus::from_buffer(&buf).target_acknowledged);
        buf[20] = 0x40;
        assert!(!I2cStatus::from_buffer(&buf).target_acknowledged);
    }
}
