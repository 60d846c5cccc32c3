use super::{GpPin, GpioValues, LogicLevel};
use crate::transport::Transport;
use crate::{Error, MCP2221};

/// Direction of a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

/// Level of one pin between two polls.
///
/// A level is `None` when the pin was not in GPIO mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioChange {
    /// Pin this change refers to.
    pub pin: GpPin,
    /// Level at the previous poll.
    pub old: Option<LogicLevel>,
    /// Level at this poll.
    pub new: Option<LogicLevel>,
    /// `old` and `new` differ.
    pub changed: bool,
}

impl GpioChange {
    /// Classify the change as a rising or falling edge.
    ///
    /// `None` if the level did not change or the pin entered or left GPIO mode.
    pub fn edge(&self) -> Option<Edge> {
        match (self.old?, self.new?) {
            (LogicLevel::Low, LogicLevel::High) => Some(Edge::Rising),
            (LogicLevel::High, LogicLevel::Low) => Some(Edge::Falling),
            _ => None,
        }
    }
}

/// Edge detection on the GPIO pins by repeated reading.
///
/// The first poll records the baseline and reports no changes. Each later poll
/// compares the pin levels against the previous one.
///
/// The poller does no pacing of its own. Callers polling in a loop should sleep
/// between polls.
///
/// ```no_run
/// # use mcp2221_bridge::{DeviceConfig, MCP2221, gpio::GpioPoller};
/// # fn main() -> Result<(), mcp2221_bridge::Error> {
/// let device = MCP2221::open(&DeviceConfig::default())?;
/// let mut poller = GpioPoller::new();
/// loop {
///     for change in poller.poll(&device)?.iter().filter(|c| c.changed) {
///         println!("{}: {:?}", change.pin, change.edge());
///     }
///     std::thread::sleep(std::time::Duration::from_millis(10));
/// }
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct GpioPoller {
    previous: Option<[Option<LogicLevel>; 4]>,
}

impl GpioPoller {
    /// Create a poller with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the GPIO pins and report the changes since the last poll.
    pub fn poll<T: Transport>(&mut self, device: &MCP2221<T>) -> Result<[GpioChange; 4], Error> {
        let values = device.gpio_read()?;
        Ok(self.update(&values))
    }

    /// Compare a reading against the previous one and store it.
    pub fn update(&mut self, values: &GpioValues) -> [GpioChange; 4] {
        let now = GpPin::ALL.map(|pin| values.level(pin));
        let before = self.previous.replace(now).unwrap_or(now);
        GpPin::ALL.map(|pin| {
            let (old, new) = (before[pin.index()], now[pin.index()]);
            GpioChange {
                pin,
                old,
                new,
                changed: old != new,
            }
        })
    }

    /// Forget the baseline, so the next poll reports no changes.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::GpioDirection;

    fn values(levels: [Option<LogicLevel>; 4]) -> GpioValues {
        let pin = |l: Option<LogicLevel>| l.map(|l| (GpioDirection::Input, l));
        GpioValues {
            gp0: pin(levels[0]),
            gp1: pin(levels[1]),
            gp2: pin(levels[2]),
            gp3: pin(levels[3]),
        }
    }

    #[test]
    fn first_poll_is_the_baseline() {
        use LogicLevel::*;
        let mut poller = GpioPoller::new();
        let changes = poller.update(&values([Some(Low), Some(High), None, Some(Low)]));
        assert!(changes.iter().all(|c| !c.changed && c.old == c.new));
    }

    #[test]
    fn later_polls_report_edges() {
        use LogicLevel::*;
        let mut poller = GpioPoller::new();
        poller.update(&values([Some(Low), Some(High), None, Some(Low)]));
        let changes = poller.update(&values([Some(High), Some(Low), None, None]));

        assert_eq!(changes[0].edge(), Some(Edge::Rising));
        assert_eq!(changes[1].edge(), Some(Edge::Falling));
        assert!(!changes[2].changed);
        assert!(changes[3].changed);
        assert_eq!(changes[3].new, None);
        assert_eq!(changes[3].edge(), None);
    }
}
