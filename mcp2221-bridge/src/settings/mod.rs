//! Run-time (SRAM) settings of the MCP2221.
//!
//! The SRAM holds the settings the device is currently running with. They are
//! loaded from flash at power-up, and changes made here are lost on reset unless
//! saved with [`MCP2221::save_config`].
//!
//! [`MCP2221::save_config`]: crate::MCP2221::save_config

mod sram;

pub use sram::{
    ClockConfig, GpConfig, GpPinSettings, InterruptConfig, InterruptEdges, Setting,
    SramConfigRequest, SramSettings,
};
pub(crate) use sram::{SramSnapshot, gp_bytes, plan};
