//! SRAM settings and the read-merge-write used to change them.
//!
//! The Set SRAM Settings command overwrites whole registers, so changing one
//! field means reading the current settings first and sending the merged result.
//! [`SramConfigRequest`] describes the fields to change, and [`plan`] computes
//! the command(s) that apply it on top of a snapshot of the current settings.

use bit_field::BitField;

use crate::analog::VoltageReference;
use crate::common::{ClockDutyCycle, ClockFrequency, ClockSetting};
use crate::constants::SRAM_GP_OFFSET;
use crate::gpio::{GpPin, GpioDirection, LogicLevel, PinFunction};

/// Length of the Set SRAM Settings command up to and including the GP bytes.
pub(crate) const SET_SRAM_LEN: usize = 12;

/// Bit 7 of each Set SRAM Settings byte enables loading the new value.
const ALTER: u8 = 0x80;

/// A field of a sparse request: keep the current value or set a new one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Setting<T> {
    /// Leave the current value unchanged.
    #[default]
    Keep,
    /// Change to this value.
    Set(T),
}

impl<T: Copy> Setting<T> {
    /// True for [`Setting::Set`].
    pub fn is_set(&self) -> bool {
        matches!(self, Setting::Set(_))
    }

    /// The value to set, if any.
    pub fn value(&self) -> Option<T> {
        match self {
            Setting::Keep => None,
            Setting::Set(v) => Some(*v),
        }
    }

    /// The value to set, or `current`.
    pub fn or(&self, current: T) -> T {
        self.value().unwrap_or(current)
    }
}

impl<T> From<Option<T>> for Setting<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Setting::Set(v),
            None => Setting::Keep,
        }
    }
}

/// Changes to one GP pin settings byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GpConfig {
    /// Pin function, bits 0..=2.
    pub function: Setting<PinFunction>,
    /// GPIO direction, bit 3.
    pub direction: Setting<GpioDirection>,
    /// GPIO output value, bit 4.
    pub value: Setting<LogicLevel>,
}

impl GpConfig {
    /// True if any field is to be changed.
    pub fn is_set(&self) -> bool {
        self.function.is_set() || self.direction.is_set() || self.value.is_set()
    }

    /// Apply the changes on top of a current settings byte.
    fn apply(&self, current: u8) -> u8 {
        let mut byte = current;
        if let Setting::Set(function) = self.function {
            byte.set_bits(0..=2, function.into());
        }
        if let Setting::Set(direction) = self.direction {
            byte.set_bit(3, direction.into());
        }
        if let Setting::Set(value) = self.value {
            byte.set_bit(4, value.into());
        }
        byte
    }
}

/// Edges of GP1 that set the interrupt flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptEdges {
    /// Interrupt detection disabled.
    None,
    /// Positive edges only.
    Rising,
    /// Negative edges only.
    Falling,
    /// Both edges.
    Both,
}

impl InterruptEdges {
    fn positive(self) -> bool {
        matches!(self, InterruptEdges::Rising | InterruptEdges::Both)
    }

    fn negative(self) -> bool {
        matches!(self, InterruptEdges::Falling | InterruptEdges::Both)
    }

    fn from_flags(positive: bool, negative: bool) -> Self {
        match (positive, negative) {
            (false, false) => InterruptEdges::None,
            (true, false) => InterruptEdges::Rising,
            (false, true) => InterruptEdges::Falling,
            (true, true) => InterruptEdges::Both,
        }
    }
}

/// Changes to the interrupt detection settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptConfig {
    /// Set the flag on a positive edge.
    pub positive_edge: Setting<bool>,
    /// Set the flag on a negative edge.
    pub negative_edge: Setting<bool>,
    /// Clear the interrupt flag.
    pub clear_flag: Setting<bool>,
}

impl InterruptConfig {
    /// True if any field is to be changed.
    pub fn is_set(&self) -> bool {
        self.positive_edge.is_set() || self.negative_edge.is_set() || self.clear_flag.is_set()
    }

    /// Byte 6 of Set SRAM Settings, without the alter bit.
    ///
    /// Each edge has its own enable bit (4 for positive, 2 for negative) next
    /// to its value bit, so an edge that is kept is simply left out.
    fn to_bits(self) -> u8 {
        let mut byte = 0u8;
        if let Setting::Set(enable) = self.positive_edge {
            byte.set_bit(4, true);
            byte.set_bit(3, enable);
        }
        if let Setting::Set(enable) = self.negative_edge {
            byte.set_bit(2, true);
            byte.set_bit(1, enable);
        }
        if let Setting::Set(clear) = self.clear_flag {
            byte.set_bit(0, clear);
        }
        byte
    }
}

/// Changes to the clock output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    /// Duty cycle, bits 3..=4.
    pub duty: Setting<ClockDutyCycle>,
    /// Frequency, bits 0..=2.
    pub frequency: Setting<ClockFrequency>,
}

impl ClockConfig {
    /// True if any field is to be changed.
    pub fn is_set(&self) -> bool {
        self.duty.is_set() || self.frequency.is_set()
    }

    fn apply(&self, current: u8) -> u8 {
        let mut byte = current & 0x7F;
        if let Setting::Set(frequency) = self.frequency {
            byte.set_bits(0..=2, frequency.into());
        }
        if let Setting::Set(duty) = self.duty {
            byte.set_bits(3..=4, duty.into());
        }
        byte
    }
}

/// Sparse set of changes to the SRAM settings.
///
/// Every field defaults to [`Setting::Keep`]. Apply it with
/// [`MCP2221::sram_config`].
///
/// ```rust
/// # use mcp2221_bridge::settings::SramConfigRequest;
/// # use mcp2221_bridge::gpio::{GpPin, GpioDirection};
/// # use mcp2221_bridge::analog::{VoltageReference, VrmVoltage};
/// let mut request = SramConfigRequest::new();
/// request
///     .with_gp_direction(GpPin::Gp1, GpioDirection::Input)
///     .with_dac_reference(VoltageReference::Vrm(VrmVoltage::V2_048))
///     .with_dac_value(16);
/// ```
///
/// [`MCP2221::sram_config`]: crate::MCP2221::sram_config
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SramConfigRequest {
    /// GP0..=GP3 settings.
    pub gp: [GpConfig; 4],
    /// Interrupt detection.
    pub interrupt: InterruptConfig,
    /// ADC voltage reference.
    pub adc_reference: Setting<VoltageReference>,
    /// DAC voltage reference.
    pub dac_reference: Setting<VoltageReference>,
    /// DAC output value, `0..=31`. Higher bits are ignored.
    pub dac_value: Setting<u8>,
    /// Clock output.
    pub clock: ClockConfig,
}

impl SramConfigRequest {
    /// Create a request that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings changes for one pin.
    pub fn gp(&self, pin: GpPin) -> &GpConfig {
        &self.gp[pin.index()]
    }

    /// Mutable settings changes for one pin.
    pub fn gp_mut(&mut self, pin: GpPin) -> &mut GpConfig {
        &mut self.gp[pin.index()]
    }

    /// Change the function of a pin.
    pub fn with_gp_function(&mut self, pin: GpPin, function: PinFunction) -> &mut Self {
        self.gp_mut(pin).function = Setting::Set(function);
        self
    }

    /// Change the GPIO direction of a pin.
    pub fn with_gp_direction(&mut self, pin: GpPin, direction: GpioDirection) -> &mut Self {
        self.gp_mut(pin).direction = Setting::Set(direction);
        self
    }

    /// Change the GPIO output value of a pin.
    pub fn with_gp_value(&mut self, pin: GpPin, value: LogicLevel) -> &mut Self {
        self.gp_mut(pin).value = Setting::Set(value);
        self
    }

    /// Change the ADC voltage reference.
    pub fn with_adc_reference(&mut self, vref: VoltageReference) -> &mut Self {
        self.adc_reference = Setting::Set(vref);
        self
    }

    /// Change the DAC voltage reference.
    pub fn with_dac_reference(&mut self, vref: VoltageReference) -> &mut Self {
        self.dac_reference = Setting::Set(vref);
        self
    }

    /// Change the DAC output value.
    pub fn with_dac_value(&mut self, value: u8) -> &mut Self {
        self.dac_value = Setting::Set(value);
        self
    }

    /// Change the clock output duty cycle and frequency.
    pub fn with_clock_output(&mut self, clock: ClockSetting) -> &mut Self {
        let ClockSetting(duty, frequency) = clock;
        self.clock = ClockConfig {
            duty: Setting::Set(duty),
            frequency: Setting::Set(frequency),
        };
        self
    }

    /// Change the edges that trigger the interrupt flag.
    pub fn with_interrupt_edges(&mut self, edges: InterruptEdges) -> &mut Self {
        self.interrupt.positive_edge = Setting::Set(edges.positive());
        self.interrupt.negative_edge = Setting::Set(edges.negative());
        self
    }

    /// Clear the interrupt flag.
    pub fn with_interrupt_clear(&mut self) -> &mut Self {
        self.interrupt.clear_flag = Setting::Set(true);
        self
    }

    /// True if any GP pin is to be changed.
    pub fn changes_gp(&self) -> bool {
        self.gp.iter().any(GpConfig::is_set)
    }
}

/// Current SRAM registers as needed by the merge.
///
/// All values are without the alter bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SramSnapshot {
    pub(crate) clock: u8,
    pub(crate) dac_reference: u8,
    pub(crate) dac_value: u8,
    pub(crate) adc_reference: u8,
    pub(crate) gp: [u8; 4],
}

impl SramSnapshot {
    /// Decode a Get SRAM Settings response.
    ///
    /// `gp` takes the place of the GP bytes in the response, which do not
    /// reflect changes made with Set GPIO Output Values.
    pub(crate) fn from_buffer(buf: &[u8; 64], gp: [u8; 4]) -> Self {
        Self {
            clock: buf[5] & 0x7F,
            dac_reference: buf[6].get_bits(5..=7),
            dac_value: buf[6].get_bits(0..=4),
            adc_reference: buf[7].get_bits(2..=4),
            gp,
        }
    }
}

/// GP bytes of a Get SRAM Settings response.
pub(crate) fn gp_bytes(buf: &[u8; 64]) -> [u8; 4] {
    let mut gp = [0u8; 4];
    gp.copy_from_slice(&buf[SRAM_GP_OFFSET..SRAM_GP_OFFSET + 4]);
    gp
}

/// Commands that apply a request, and the GP bytes to cache once they succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SramPlan {
    pub(crate) commands: Vec<[u8; SET_SRAM_LEN]>,
    pub(crate) gp_update: Option<[u8; 4]>,
}

/// Compute the Set SRAM Settings command(s) for a request.
///
/// The DAC reference, DAC value and ADC reference are always sent with their
/// alter bit set, carrying the requested or current value, because the device
/// can otherwise reset them when other settings change. The clock and interrupt
/// bytes are only altered when requested, and all four GP bytes are sent behind
/// a single alter flag.
///
/// Writing GP settings while either reference uses the Vrm glitches the
/// reference. In that case the GP bytes go out with both references set to
/// Vrm-off, followed by a second command that restores the intended references
/// and DAC value.
pub(crate) fn plan(request: &SramConfigRequest, current: &SramSnapshot) -> SramPlan {
    let gp_requested = request.changes_gp();
    let mut gp_new = current.gp;
    for (byte, config) in gp_new.iter_mut().zip(request.gp.iter()) {
        *byte = config.apply(*byte);
    }

    let dac_reference = request
        .dac_reference
        .value()
        .map_or(current.dac_reference, VoltageReference::to_bits);
    let adc_reference = request
        .adc_reference
        .value()
        .map_or(current.adc_reference, VoltageReference::to_bits);
    let dac_value = request.dac_value.or(current.dac_value) & 0x1F;

    let mut cmd = [0u8; SET_SRAM_LEN];
    cmd[0] = 0x60;
    if request.clock.is_set() {
        cmd[2] = ALTER | request.clock.apply(current.clock);
    }
    cmd[3] = ALTER | dac_reference;
    cmd[4] = ALTER | dac_value;
    cmd[5] = ALTER | adc_reference;
    if request.interrupt.is_set() {
        cmd[6] = ALTER | request.interrupt.to_bits();
    }
    if gp_requested {
        cmd[7] = ALTER;
    }
    cmd[8..12].copy_from_slice(&gp_new);

    let vrm_in_use = VoltageReference::from_bits(dac_reference).uses_vrm()
        || VoltageReference::from_bits(adc_reference).uses_vrm();

    let commands = if gp_requested && vrm_in_use {
        let vrm_off = VoltageReference::Vrm(crate::analog::VrmVoltage::Off).to_bits();
        let mut off = cmd;
        off[3] = ALTER | vrm_off;
        off[5] = ALTER | vrm_off;

        let mut reclaim = [0u8; SET_SRAM_LEN];
        reclaim[0] = 0x60;
        reclaim[3..6].copy_from_slice(&cmd[3..6]);
        vec![off, reclaim]
    } else {
        vec![cmd]
    };

    SramPlan {
        commands,
        gp_update: gp_requested.then_some(gp_new),
    }
}

/// Settings of one GP pin as read from SRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpPinSettings {
    /// Pin function, `None` for a reserved bit pattern.
    pub function: Option<PinFunction>,
    /// GPIO direction.
    pub direction: GpioDirection,
    /// GPIO output value.
    pub value: LogicLevel,
}

impl GpPinSettings {
    fn from_byte(byte: u8) -> Self {
        Self {
            function: PinFunction::from_bits(byte.get_bits(0..=2)),
            direction: byte.get_bit(3).into(),
            value: byte.get_bit(4).into(),
        }
    }
}

/// Run-time settings of the MCP2221.
///
/// ## Datasheet
///
/// See table 3-37 for the Get SRAM Settings response layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SramSettings {
    /// Clock output, `None` for the reserved frequency pattern.
    pub clock_output: Option<ClockSetting>,
    /// DAC voltage reference.
    pub dac_reference: VoltageReference,
    /// DAC output value.
    pub dac_value: u8,
    /// ADC voltage reference.
    pub adc_reference: VoltageReference,
    /// Edges of GP1 that set the interrupt flag.
    pub interrupt_edges: InterruptEdges,
    /// GP0..=GP3 settings.
    ///
    /// These include changes made with [`MCP2221::gpio_write`], which the device
    /// itself does not reflect in SRAM.
    ///
    /// [`MCP2221::gpio_write`]: crate::MCP2221::gpio_write
    pub gp: [GpPinSettings; 4],
}

impl SramSettings {
    pub(crate) fn from_buffer(buf: &[u8; 64], gp: [u8; 4]) -> Self {
        let snapshot = SramSnapshot::from_buffer(buf, gp);
        Self {
            clock_output: ClockSetting::from_bits(snapshot.clock),
            dac_reference: VoltageReference::from_bits(snapshot.dac_reference),
            dac_value: snapshot.dac_value,
            adc_reference: VoltageReference::from_bits(snapshot.adc_reference),
            interrupt_edges: InterruptEdges::from_flags(buf[7].get_bit(5), buf[7].get_bit(6)),
            gp: gp.map(GpPinSettings::from_byte),
        }
    }
}
