//! Configuration of and interaction with the GP pins.

mod common;
mod functions;
mod poll;
mod values;

pub use common::{GpPin, GpioDirection, LogicLevel};
pub use functions::{PinFunction, PinFunctions, PinMode};
pub use poll::{Edge, GpioChange, GpioPoller};
pub use values::{GpioChanges, GpioValues};
