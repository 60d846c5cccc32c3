use clap::{Parser, ValueEnum};
use mcp2221_bridge::gpio::{GpPin, GpioChanges, GpioDirection, LogicLevel};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GpioSetting {
    /// GPIO output, set high.
    #[value(aliases = ["high"])]
    OutputHigh,
    /// GPIO output, set low.
    #[value(aliases = ["low"])]
    OutputLow,
    /// GPIO input.
    #[value(aliases = ["in"])]
    Input,
}

impl GpioSetting {
    fn level(&self) -> Option<LogicLevel> {
        match self {
            GpioSetting::OutputHigh => Some(LogicLevel::High),
            GpioSetting::OutputLow => Some(LogicLevel::Low),
            GpioSetting::Input => None,
        }
    }
}

impl From<GpioSetting> for GpioDirection {
    fn from(value: GpioSetting) -> Self {
        match value {
            GpioSetting::OutputHigh | GpioSetting::OutputLow => GpioDirection::Output,
            GpioSetting::Input => GpioDirection::Input,
        }
    }
}

/// Change the direction and output level of pins in GPIO mode.
///
/// Pins that are not mentioned are left alone. Changing a pin that is not in
/// GPIO mode is an error.
#[derive(Debug, Parser)]
#[group(required = true, multiple = true)]
pub(crate) struct PinValues {
    #[arg(long, short = '0')]
    gp0: Option<GpioSetting>,
    #[arg(long, short = '1')]
    gp1: Option<GpioSetting>,
    #[arg(long, short = '2')]
    gp2: Option<GpioSetting>,
    #[arg(long, short = '3')]
    gp3: Option<GpioSetting>,
}

impl From<PinValues> for GpioChanges {
    fn from(value: PinValues) -> Self {
        let mut changes = Self::new();
        let settings = [value.gp0, value.gp1, value.gp2, value.gp3];
        for (pin, setting) in GpPin::ALL.into_iter().zip(settings) {
            let Some(setting) = setting else { continue };
            changes.with_direction(pin, setting.into());
            if let Some(level) = setting.level() {
                changes.with_level(pin, level);
            }
        }
        changes
    }
}
