use clap::{Parser, ValueEnum, value_parser};
use mcp2221_bridge::analog::{VoltageReference, VrmVoltage::*};
use mcp2221_bridge::settings::InterruptEdges;
use mcp2221_bridge::{ClockDutyCycle, ClockFrequency, MCP2221};

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum AdcCommand {
    /// Read the ADC channels of the pins in analog input mode.
    Read,
    /// Set the ADC voltage reference.
    Configure {
        /// Set Vdd or Vrm as the ADC voltage reference.
        reference: VrefSource,
        /// Vrm voltage level.
        ///
        /// Ignored if the reference is Vdd.
        #[arg(default_value = "off")]
        vrm_level: VrmLevel,
    },
}

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum DacCommand {
    /// Change the DAC output value.
    Write {
        #[arg(value_parser = value_parser!(u8).range(0..=31))]
        /// New output value, in the range 0..=31.
        value: u8,
    },
    /// Set the DAC voltage reference, and optionally the output value.
    Configure {
        /// Set Vdd or Vrm as the DAC voltage reference.
        reference: VrefSource,
        /// Vrm voltage level.
        ///
        /// Ignored if the reference is Vdd.
        #[arg(default_value = "off")]
        vrm_level: VrmLevel,
        /// New output value, in the range 0..=31.
        #[arg(long, value_parser = value_parser!(u8).range(0..=31))]
        value: Option<u8>,
    },
}

/// Voltage source to use as the analog reference.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum VrefSource {
    /// Use the supply voltage Vdd.
    Vdd,
    /// Use the internal Vrm voltage reference.
    Vrm,
}

impl VrefSource {
    pub(crate) fn into_mcp_vref(self, vrm_level: VrmLevel) -> VoltageReference {
        match (self, vrm_level) {
            (VrefSource::Vdd, _) => VoltageReference::Vdd,
            (VrefSource::Vrm, VrmLevel::_1V) => VoltageReference::Vrm(V1_024),
            (VrefSource::Vrm, VrmLevel::_2V) => VoltageReference::Vrm(V2_048),
            (VrefSource::Vrm, VrmLevel::_4V) => VoltageReference::Vrm(V4_096),
            (VrefSource::Vrm, VrmLevel::Off) => VoltageReference::Vrm(Off),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum VrmLevel {
    /// 1.024V
    _1V,
    /// 2.048V
    _2V,
    /// 4.096V
    _4V,
    /// Disable the Vrm reference.
    ///
    /// In practice this produces a voltage just above the 0 value voltage of the
    /// other references.
    Off,
}

/// Set the clock output on GP1.
///
/// GP1 must be in clock output mode for the clock to appear on the pin.
#[derive(Debug, Parser)]
pub(crate) struct ClockArgs {
    /// Duty cycle, as the percentage of each period that is high.
    #[arg(long, default_value = "50")]
    duty: Duty,
    /// Output frequency.
    #[arg(long, default_value = "12mhz")]
    frequency: Frequency,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Duty {
    #[value(name = "0")]
    P0,
    #[value(name = "25")]
    P25,
    #[value(name = "50")]
    P50,
    #[value(name = "75")]
    P75,
}

impl From<Duty> for ClockDutyCycle {
    fn from(value: Duty) -> Self {
        match value {
            Duty::P0 => ClockDutyCycle::P0,
            Duty::P25 => ClockDutyCycle::P25,
            Duty::P50 => ClockDutyCycle::P50,
            Duty::P75 => ClockDutyCycle::P75,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Frequency {
    #[value(name = "375khz")]
    KHz375,
    #[value(name = "750khz")]
    KHz750,
    #[value(name = "1.5mhz")]
    MHz1_5,
    #[value(name = "3mhz")]
    MHz3,
    #[value(name = "6mhz")]
    MHz6,
    #[value(name = "12mhz")]
    MHz12,
    #[value(name = "24mhz")]
    MHz24,
}

impl From<Frequency> for ClockFrequency {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::KHz375 => ClockFrequency::kHz375,
            Frequency::KHz750 => ClockFrequency::kHz750,
            Frequency::MHz1_5 => ClockFrequency::MHz1_5,
            Frequency::MHz3 => ClockFrequency::MHz3,
            Frequency::MHz6 => ClockFrequency::MHz6,
            Frequency::MHz12 => ClockFrequency::MHz12,
            Frequency::MHz24 => ClockFrequency::MHz24,
        }
    }
}

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum InterruptCommand {
    /// Choose the GP1 edges that set the interrupt flag.
    ///
    /// GP1 must be in interrupt mode for edges to be detected.
    Configure { edges: Edges },
    /// Print whether the interrupt flag is set.
    Read,
    /// Clear the interrupt flag.
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Edges {
    /// Disable interrupt detection.
    None,
    /// Positive edges only.
    Rising,
    /// Negative edges only.
    Falling,
    /// Both edges.
    Both,
}

impl From<Edges> for InterruptEdges {
    fn from(value: Edges) -> Self {
        match value {
            Edges::None => InterruptEdges::None,
            Edges::Rising => InterruptEdges::Rising,
            Edges::Falling => InterruptEdges::Falling,
            Edges::Both => InterruptEdges::Both,
        }
    }
}

pub(crate) fn adc_action(
    device: &MCP2221,
    command: AdcCommand,
) -> Result<(), mcp2221_bridge::Error> {
    match command {
        AdcCommand::Read => {
            let reading = device.adc_read()?;
            println!("vref: {}", reading.vref);
            for (name, value) in [("GP1", reading.gp1), ("GP2", reading.gp2), ("GP3", reading.gp3)]
            {
                match value {
                    Some(value) => println!("{name}: {value}"),
                    None => println!("{name}: not analog input"),
                }
            }
        }
        AdcCommand::Configure {
            reference,
            vrm_level,
        } => device.adc_config(reference.into_mcp_vref(vrm_level))?,
    }
    Ok(())
}

pub(crate) fn dac_action(
    device: &MCP2221,
    command: DacCommand,
) -> Result<(), mcp2221_bridge::Error> {
    match command {
        DacCommand::Write { value } => device.dac_write(value)?,
        DacCommand::Configure {
            reference,
            vrm_level,
            value,
        } => device.dac_config(reference.into_mcp_vref(vrm_level), value)?,
    }
    Ok(())
}

pub(crate) fn clock_action(
    device: &MCP2221,
    args: ClockArgs,
) -> Result<(), mcp2221_bridge::Error> {
    device.clock_config(args.duty.into(), args.frequency.into())
}

pub(crate) fn interrupt_action(
    device: &MCP2221,
    command: InterruptCommand,
) -> Result<(), mcp2221_bridge::Error> {
    match command {
        InterruptCommand::Configure { edges } => device.interrupt_config(edges.into())?,
        InterruptCommand::Read => {
            println!("edges: {:?}", device.interrupt_edges()?);
            println!("detected: {}", device.interrupt_detected()?);
        }
        InterruptCommand::Clear => device.interrupt_clear()?,
    }
    Ok(())
}
