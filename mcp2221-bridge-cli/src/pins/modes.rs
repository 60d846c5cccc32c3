use clap::{Parser, ValueEnum};
use mcp2221_bridge::gpio::{GpPin, LogicLevel, PinFunctions, PinMode};

/// Set the mode for each of the GPx pins.
///
/// Each pin supports digital input and output, as well as pin-specific
/// alternate functions (aka designations). If the pin is set to digital
/// output, its output value is also set.
///
/// For GPIO (digital) input and output, the following aliases are recognised
/// for each pin and are not repeated in the per-option help text:
///
/// - gpio-output-high:  high
/// - gpio-output-low:   low
/// - gpio-input:        input, in
#[derive(Debug, Parser)]
#[command(verbatim_doc_comment)]
pub(crate) struct GpModes {
    /// Also save the new settings to flash, so they apply from power-up.
    ///
    /// This copies all of the current SRAM settings, not just the pins.
    #[arg(long)]
    pub save: bool,
    #[command(flatten)]
    pub pin_modes: PinModes,
}

#[derive(Debug, Parser)]
#[group(required = true, multiple = true)]
pub(crate) struct PinModes {
    /// GP0 pin mode
    #[arg(short = '0', long, id = "GP0_MODE")]
    pub gp0: Option<Gp0Mode>,
    /// GP1 pin mode
    #[arg(short = '1', long, id = "GP1_MODE")]
    pub gp1: Option<Gp1Mode>,
    /// GP2 pin mode
    #[arg(short = '2', long, id = "GP2_MODE")]
    pub gp2: Option<Gp2Mode>,
    /// GP3 pin mode
    #[arg(short = '3', long, id = "GP3_MODE")]
    pub gp3: Option<Gp3Mode>,
}

impl From<&PinModes> for PinFunctions {
    fn from(value: &PinModes) -> Self {
        let modes = [
            value.gp0.map(Gp0Mode::mode),
            value.gp1.map(Gp1Mode::mode),
            value.gp2.map(Gp2Mode::mode),
            value.gp3.map(Gp3Mode::mode),
        ];
        let mut functions = PinFunctions::new();
        for (pin, mode) in GpPin::ALL.into_iter().zip(modes) {
            if let Some(mode) = mode {
                functions.with_pin(pin, mode);
            }
        }
        functions
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Gp0Mode {
    /// UART receive indicator (LED_URX)
    #[value(aliases = ["led-urx"])]
    UartReceiveLed,
    /// USB Suspend state indicator (SSPND)
    #[value(aliases = ["sspnd"])]
    UsbSuspendState,
    /// Digital output, set high.
    #[value(aliases = ["high"], hide = true)]
    GpioOutputHigh,
    /// Digital output, set low.
    #[value(aliases = ["low"], hide = true)]
    GpioOutputLow,
    /// Digital input.
    #[value(aliases = ["input", "in"], hide = true)]
    GpioInput,
}

impl Gp0Mode {
    fn mode(self) -> PinMode {
        match self {
            Gp0Mode::UartReceiveLed => PinMode::Alt0,
            Gp0Mode::UsbSuspendState => PinMode::Dedicated,
            Gp0Mode::GpioOutputHigh => PinMode::GpioOutput(LogicLevel::High),
            Gp0Mode::GpioOutputLow => PinMode::GpioOutput(LogicLevel::Low),
            Gp0Mode::GpioInput => PinMode::GpioInput,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Gp1Mode {
    /// Clock reference output (CLK OUT or CLKR).
    #[value(aliases = ["clkr"])]
    ClockOutput,
    /// Analog input (ADC channel 1).
    #[value(aliases = ["adc"])]
    AnalogInput,
    /// UART transmit indicator (LED_UTX).
    #[value(aliases = ["led-utx"])]
    UartTransmitLed,
    /// Edge-triggered interrupt detection (IOC).
    #[value(aliases = ["ioc"])]
    Interrupt,
    /// Digital output, set high.
    #[value(aliases = ["high"], hide = true)]
    GpioOutputHigh,
    /// Digital output, set low.
    #[value(aliases = ["low"], hide = true)]
    GpioOutputLow,
    /// Digital input.
    #[value(aliases = ["input", "in"], hide = true)]
    GpioInput,
}

impl Gp1Mode {
    fn mode(self) -> PinMode {
        match self {
            Gp1Mode::ClockOutput => PinMode::Dedicated,
            Gp1Mode::AnalogInput => PinMode::Alt0,
            Gp1Mode::UartTransmitLed => PinMode::Alt1,
            Gp1Mode::Interrupt => PinMode::Alt2,
            Gp1Mode::GpioOutputHigh => PinMode::GpioOutput(LogicLevel::High),
            Gp1Mode::GpioOutputLow => PinMode::GpioOutput(LogicLevel::Low),
            Gp1Mode::GpioInput => PinMode::GpioInput,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Gp2Mode {
    /// USB device-configured status indicator (USBCFG).
    #[value(aliases = ["usbcfg"])]
    UsbDeviceConfigured,
    /// Analog input (ADC channel 2).
    #[value(aliases = ["adc"])]
    AnalogInput,
    /// Analog output (DAC).
    #[value(aliases = ["dac"])]
    AnalogOutput,
    /// Digital output, set high.
    #[value(aliases = ["high"], hide = true)]
    GpioOutputHigh,
    /// Digital output, set low.
    #[value(aliases = ["low"], hide = true)]
    GpioOutputLow,
    /// Digital input.
    #[value(aliases = ["input", "in"], hide = true)]
    GpioInput,
}

impl Gp2Mode {
    fn mode(self) -> PinMode {
        match self {
            Gp2Mode::UsbDeviceConfigured => PinMode::Dedicated,
            Gp2Mode::AnalogInput => PinMode::Alt0,
            Gp2Mode::AnalogOutput => PinMode::Alt1,
            Gp2Mode::GpioOutputHigh => PinMode::GpioOutput(LogicLevel::High),
            Gp2Mode::GpioOutputLow => PinMode::GpioOutput(LogicLevel::Low),
            Gp2Mode::GpioInput => PinMode::GpioInput,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Gp3Mode {
    /// I2C activity indicator (LED_I2C).
    #[value(aliases = ["led-i2c"])]
    I2cLed,
    /// Analog input (ADC channel 3).
    #[value(aliases = ["adc"])]
    AnalogInput,
    /// Analog output (DAC).
    #[value(aliases = ["dac"])]
    AnalogOutput,
    /// Digital output, set high.
    #[value(aliases = ["high"], hide = true)]
    GpioOutputHigh,
    /// Digital output, set low.
    #[value(aliases = ["low"], hide = true)]
    GpioOutputLow,
    /// Digital input.
    #[value(aliases = ["input", "in"], hide = true)]
    GpioInput,
}

impl Gp3Mode {
    fn mode(self) -> PinMode {
        match self {
            Gp3Mode::I2cLed => PinMode::Dedicated,
            Gp3Mode::AnalogInput => PinMode::Alt0,
            Gp3Mode::AnalogOutput => PinMode::Alt1,
            Gp3Mode::GpioOutputHigh => PinMode::GpioOutput(LogicLevel::High),
            Gp3Mode::GpioOutputLow => PinMode::GpioOutput(LogicLevel::Low),
            Gp3Mode::GpioInput => PinMode::GpioInput,
        }
    }
}
