//! Sharing one handle per physical device.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use hidapi::HidApi;
use tracing::debug;

use crate::config::DeviceConfig;
use crate::driver::MCP2221;
use crate::error::Error;
use crate::transport::{DeviceKey, HidTransport, Transport, find_device};

/// Caller-owned table of open devices.
///
/// Opening a device that already has a live handle returns that handle instead of
/// opening the device a second time, so separate components (say, two
/// [`I2cSlave`](crate::I2cSlave)s on the same bus) share the bus state and GPIO
/// cache. The registry only holds [`Weak`] references: the device is closed when
/// the last [`Rc`] is dropped.
///
/// ```no_run
/// # use mcp2221_bridge::{DeviceConfig, DeviceRegistry};
/// # fn main() -> Result<(), mcp2221_bridge::Error> {
/// let registry = DeviceRegistry::new();
/// let first = registry.open(&DeviceConfig::default())?;
/// let second = registry.open(&DeviceConfig::default())?;
/// assert!(std::rc::Rc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceRegistry<T: Transport = HidTransport> {
    devices: RefCell<HashMap<DeviceKey, Weak<MCP2221<T>>>>,
}

impl<T: Transport> Default for DeviceRegistry<T> {
    fn default() -> Self {
        Self {
            devices: RefCell::new(HashMap::new()),
        }
    }
}

impl<T: Transport> DeviceRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live handle for `key`, or create one with `open`.
    ///
    /// `open` is only called when there is no live handle, and its result is
    /// recorded under `key`.
    pub fn get_or_open_with<F>(&self, key: DeviceKey, open: F) -> Result<Rc<MCP2221<T>>, Error>
    where
        F: FnOnce() -> Result<MCP2221<T>, Error>,
    {
        if let Some(device) = self.get(&key) {
            debug!(%key, "reusing open device");
            return Ok(device);
        }
        let device = Rc::new(open()?);
        debug!(%key, "opened device");
        self.devices.borrow_mut().insert(key, Rc::downgrade(&device));
        Ok(device)
    }

    /// The live handle for `key`, if any.
    pub fn get(&self, key: &DeviceKey) -> Option<Rc<MCP2221<T>>> {
        self.devices.borrow().get(key).and_then(Weak::upgrade)
    }

    /// Number of devices with a live handle.
    ///
    /// Entries of closed devices are removed.
    pub fn open_count(&self) -> usize {
        let mut devices = self.devices.borrow_mut();
        devices.retain(|_, device| device.strong_count() > 0);
        devices.len()
    }
}

impl DeviceRegistry<HidTransport> {
    /// Open the device described by `config`, or share its live handle.
    ///
    /// The device is identified by its USB serial number when selected by
    /// serial, and by its HID path when selected by index. A handle that already exists keeps its own configuration.
    ///
    /// # Errors
    ///
    /// As for [`MCP2221::open`].
    pub fn open(&self, config: &DeviceConfig) -> Result<Rc<MCP2221>, Error> {
        let api = HidApi::new()?;
        let info = find_device(&api, config.vendor_id, config.product_id, &config.selector)?;
        let key = DeviceKey::for_info(info, &config.selector);
        self.get_or_open_with(key, || {
            let transport =
                HidTransport::open(&api, config.vendor_id, config.product_id, &config.selector)?;
            MCP2221::with_transport(transport, config)
        })
    }
}
