//! Tests against a simulated MCP2221 with an EEPROM-like I2C target.
//!
//! The simulation answers the HID commands the driver uses: status, SRAM and
//! GPIO settings, and the I2C write, read and Get Data commands. The target at
//! [`TARGET`] has 256 bytes of memory behind a one-byte address pointer.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::i2c::{I2c, Operation};
use mcp2221_bridge::gpio::{GpPin, GpioChanges, GpioDirection, LogicLevel, PinFunctions, PinMode};
use mcp2221_bridge::{
    DeviceConfig, DeviceKey, DeviceRegistry, Error, I2cSlave, MCP2221, RegisterFormat, SmBus,
    Transport, TransportError,
};

const TARGET: u8 = 0x50;

#[derive(Debug)]
struct State {
    memory: [u8; 256],
    pointer: u8,
    /// Remaining bytes of the write in progress, and whether the pointer is set.
    write_remaining: usize,
    pointer_set: bool,
    pending_read: Vec<u8>,
    gp: [u8; 4],
    pending_response: Option<[u8; 64]>,
}

#[derive(Debug)]
struct SimulatedDevice {
    state: RefCell<State>,
}

impl SimulatedDevice {
    fn new() -> Self {
        let mut memory = [0u8; 256];
        for (i, byte) in memory.iter_mut().enumerate() {
            *byte = i as u8;
        }
        Self {
            state: RefCell::new(State {
                memory,
                pointer: 0,
                write_remaining: 0,
                pointer_set: false,
                pending_read: Vec::new(),
                // GP0 GPIO output low, GP1 ADC, GP2 GPIO input, GP3 DAC.
                gp: [0b0000_0000, 0b0000_0010, 0b0000_1000, 0b0000_0011],
                pending_response: None,
            }),
        }
    }

    fn memory(&self, range: std::ops::Range<usize>) -> Vec<u8> {
        self.state.borrow().memory[range].to_vec()
    }
}

fn status_response(request: &[u8; 64]) -> [u8; 64] {
    let mut resp = [0u8; 64];
    resp[0] = 0x10;
    resp[2] = if request[2] == 0x10 { 0x10 } else { 0x00 };
    resp[3] = if request[3] == 0x20 { 0x20 } else { 0x00 };
    resp[22] = 1;
    resp[23] = 1;
    resp[46..50].copy_from_slice(b"A6B1");
    resp
}

impl State {
    fn respond(&mut self, request: &[u8; 64]) -> [u8; 64] {
        let mut resp = [0u8; 64];
        resp[0] = request[0];
        match request[0] {
            0x10 => return status_response(request),
            0x61 => resp[22..26].copy_from_slice(&self.gp),
            0x60 => {
                if request[7] & 0x80 != 0 {
                    self.gp.copy_from_slice(&request[8..12]);
                }
            }
            0x51 => {
                for (i, &gp) in self.gp.iter().enumerate() {
                    let (level, direction) = if gp & 0b111 == 0 {
                        ((gp >> 4) & 1, (gp >> 3) & 1)
                    } else {
                        (0xEE, 0xEF)
                    };
                    resp[2 + 2 * i] = level;
                    resp[3 + 2 * i] = direction;
                }
            }
            0x50 => {
                for i in 0..4 {
                    let base = 2 + 4 * i;
                    if request[base] == 0 && request[base + 2] == 0 {
                        continue;
                    }
                    if self.gp[i] & 0b111 != 0 {
                        resp[base + 1] = 0xEE;
                        continue;
                    }
                    if request[base] != 0 {
                        self.gp[i] = (self.gp[i] & !0x10) | ((request[base + 1] & 1) << 4);
                    }
                    if request[base + 2] != 0 {
                        self.gp[i] = (self.gp[i] & !0x08) | ((request[base + 3] & 1) << 3);
                    }
                }
            }
            0x90 | 0x92 | 0x94 => {
                if request[3] >> 1 != TARGET {
                    resp[1] = 0x01;
                    resp[2] = 0x25;
                    return resp;
                }
                let total = usize::from(u16::from_le_bytes([request[1], request[2]]));
                if self.write_remaining == 0 {
                    self.write_remaining = total;
                    self.pointer_set = false;
                }
                let count = self.write_remaining.min(60);
                for &byte in &request[4..4 + count] {
                    if self.pointer_set {
                        self.memory[usize::from(self.pointer)] = byte;
                        self.pointer = self.pointer.wrapping_add(1);
                    } else {
                        self.pointer = byte;
                        self.pointer_set = true;
                    }
                }
                self.write_remaining -= count;
            }
            0x91 | 0x93 => {
                if request[3] >> 1 != TARGET {
                    resp[1] = 0x01;
                    resp[2] = 0x25;
                    return resp;
                }
                let total = usize::from(u16::from_le_bytes([request[1], request[2]]));
                self.pending_read = (0..total)
                    .map(|_| {
                        let byte = self.memory[usize::from(self.pointer)];
                        self.pointer = self.pointer.wrapping_add(1);
                        byte
                    })
                    .collect();
            }
            0x40 => {
                let count = self.pending_read.len().min(60);
                let chunk: Vec<u8> = self.pending_read.drain(..count).collect();
                resp[2] = if self.pending_read.is_empty() { 0x55 } else { 0x54 };
                resp[3] = count as u8;
                resp[4..4 + count].copy_from_slice(&chunk);
            }
            _ => resp[1] = 0x01,
        }
        resp
    }
}

impl Transport for SimulatedDevice {
    fn send_report(&self, report: &[u8; 64]) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        let response = state.respond(report);
        state.pending_response = Some(response);
        Ok(())
    }

    fn receive_report(&self, _timeout: Duration) -> Result<[u8; 64], TransportError> {
        self.state
            .borrow_mut()
            .pending_response
            .take()
            .ok_or(TransportError::Timeout)
    }
}

fn open() -> MCP2221<SimulatedDevice> {
    let config = DeviceConfig::default().with_i2c_speed(400_000);
    MCP2221::with_transport(SimulatedDevice::new(), &config).unwrap()
}

#[test]
fn scan_finds_the_target() -> Result<(), Error> {
    let device = open();
    assert_eq!(device.i2c_scan(0x08..=0x77)?, vec![TARGET]);
    Ok(())
}

#[test]
fn slave_register_round_trip_across_chunks() -> Result<(), Error> {
    let device = Rc::new(open());
    let slave = I2cSlave::new(Rc::clone(&device), TARGET, RegisterFormat::default(), false)?;

    let data: Vec<u8> = (0..100).map(|i| 0xFF - i).collect();
    slave.write_register(0x10, &data)?;
    assert_eq!(device.transport().memory(0x10..0x74), data);

    let mut read = vec![0u8; 100];
    slave.read_register(0x10, &mut read)?;
    assert_eq!(read, data);
    Ok(())
}

#[test]
fn missing_slave_is_not_acknowledged() {
    let device = Rc::new(open());
    let result = I2cSlave::new(device, 0x51, RegisterFormat::default(), false);
    assert!(matches!(result, Err(Error::NotAcknowledged)));
}

#[test]
fn smbus_words_and_blocks() -> Result<(), Error> {
    let device = open();
    let bus = SmBus::new(&device);

    bus.write_word_data(TARGET, 0x20, 0x1234)?;
    assert_eq!(device.transport().memory(0x20..0x22), [0x34, 0x12]);
    assert_eq!(bus.read_word_data(TARGET, 0x20)?, 0x1234);

    bus.write_block_data(TARGET, 0x30, &[0xA, 0xB])?;
    assert_eq!(bus.read_block_data(TARGET, 0x30)?, vec![0xA, 0xB]);
    Ok(())
}

#[test]
fn embedded_hal_transaction() -> Result<(), Error> {
    let mut device = open();
    let mut first = [0u8; 3];
    let mut second = [0u8; 2];
    device.transaction(
        TARGET,
        &mut [
            Operation::Write(&[0x40]),
            Operation::Read(&mut first),
            Operation::Read(&mut second),
        ],
    )?;
    assert_eq!(first, [0x40, 0x41, 0x42]);
    assert_eq!(second, [0x43, 0x44]);
    Ok(())
}

#[test]
fn gpio_changes_survive_sram_changes() -> Result<(), Error> {
    let device = open();

    let mut changes = GpioChanges::new();
    changes.with_level(GpPin::Gp0, LogicLevel::High);
    device.gpio_write(&changes)?;

    // Changing GP2 goes through the SRAM merge, which must keep GP0 high.
    let mut functions = PinFunctions::new();
    functions.with_pin(GpPin::Gp2, PinMode::GpioOutput(LogicLevel::Low));
    device.set_pin_functions(&functions)?;

    let values = device.gpio_read()?;
    assert_eq!(values.get(GpPin::Gp0), Some((GpioDirection::Output, LogicLevel::High)));
    assert_eq!(values.get(GpPin::Gp2), Some((GpioDirection::Output, LogicLevel::Low)));
    assert_eq!(values.get(GpPin::Gp1), None);
    Ok(())
}

#[test]
fn gpio_write_to_an_analog_pin_conflicts() {
    let device = open();
    let mut changes = GpioChanges::new();
    changes.with_level(GpPin::Gp3, LogicLevel::High);
    assert!(matches!(device.gpio_write(&changes), Err(Error::GpioModeConflict)));
}

#[test]
fn registry_shares_the_simulated_device() -> Result<(), Error> {
    let registry = DeviceRegistry::new();
    let key = DeviceKey::Serial("SIM0001".into());
    let first = registry.get_or_open_with(key.clone(), || Ok(open()))?;
    let second = registry.get_or_open_with(key, || Ok(open()))?;
    assert!(Rc::ptr_eq(&first, &second));

    let status = second.status()?;
    assert_eq!(status.hardware_revision.to_string(), "A.6");
    Ok(())
}
