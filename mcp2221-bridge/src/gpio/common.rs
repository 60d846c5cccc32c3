/// GPIO pin level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicLevel {
    /// Logic high.
    High,
    /// Logic low.
    Low,
}

impl From<bool> for LogicLevel {
    fn from(value: bool) -> Self {
        if value { Self::High } else { Self::Low }
    }
}

impl From<LogicLevel> for bool {
    fn from(value: LogicLevel) -> Self {
        match value {
            LogicLevel::High => true,
            LogicLevel::Low => false,
        }
    }
}

impl From<LogicLevel> for u8 {
    /// Convert a [`LogicLevel`] to 1 (if high) or 0 (if low).
    fn from(value: LogicLevel) -> Self {
        match value {
            LogicLevel::High => 1,
            LogicLevel::Low => 0,
        }
    }
}

/// GPIO pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDirection {
    /// Pin reads the level applied to it.
    Input,
    /// Pin drives its set level.
    Output,
}

impl From<bool> for GpioDirection {
    fn from(value: bool) -> Self {
        if value { Self::Input } else { Self::Output }
    }
}

impl From<GpioDirection> for bool {
    fn from(value: GpioDirection) -> Self {
        match value {
            GpioDirection::Input => true,
            GpioDirection::Output => false,
        }
    }
}

impl From<GpioDirection> for u8 {
    /// Convert a [`GpioDirection`] to 1 (if input) or 0 (if output).
    fn from(value: GpioDirection) -> Self {
        match value {
            GpioDirection::Input => 1,
            GpioDirection::Output => 0,
        }
    }
}

/// One of the four general-purpose pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpPin {
    /// GP0
    Gp0,
    /// GP1
    Gp1,
    /// GP2
    Gp2,
    /// GP3
    Gp3,
}

impl GpPin {
    /// All four pins in order.
    pub const ALL: [GpPin; 4] = [GpPin::Gp0, GpPin::Gp1, GpPin::Gp2, GpPin::Gp3];

    /// Zero-based pin number.
    pub fn index(self) -> usize {
        match self {
            GpPin::Gp0 => 0,
            GpPin::Gp1 => 1,
            GpPin::Gp2 => 2,
            GpPin::Gp3 => 3,
        }
    }
}

impl TryFrom<u8> for GpPin {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GpPin::Gp0),
            1 => Ok(GpPin::Gp1),
            2 => Ok(GpPin::Gp2),
            3 => Ok(GpPin::Gp3),
            _ => Err(crate::Error::InvalidArgument("GP pin number must be 0 to 3")),
        }
    }
}

impl std::fmt::Display for GpPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GP{}", self.index())
    }
}
