//! FS20 adapter scanner
//!
//! Walks a [`UsbBus`] looking for the PCS and PCE ids.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DetectError;
use crate::transport::{AdapterKind, UsbBus, UsbDeviceInfo, UsbHandle};

/// An FS20 adapter found on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedAdapter {
    pub kind: AdapterKind,
    pub device: UsbDeviceInfo,
}

/// Adapter scanner over a USB bus
pub struct AdapterScanner<B> {
    bus: B,
}

impl<B: UsbBus> AdapterScanner<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// List the FS20 adapters attached to the bus
    pub fn enumerate(&self) -> Vec<DetectedAdapter> {
        info!("Scanning USB bus for FS20 adapters...");
        let devices = self.bus.list_devices();
        debug!("{} USB device(s) on bus", devices.len());

        let result: Vec<_> = devices
            .into_iter()
            .filter_map(|device| {
                AdapterKind::from_usb_id(device.id).map(|kind| DetectedAdapter { kind, device })
            })
            .collect();

        if result.is_empty() {
            info!("No FS20 adapters found");
        } else {
            info!("Found {} FS20 adapter(s)", result.len());
            for adapter in &result {
                info!("  {} at {}", adapter.kind, adapter.device.location);
            }
        }

        result
    }

    /// Open the first adapter of the given kind
    pub fn open(&self, kind: AdapterKind) -> Result<Box<dyn UsbHandle>, DetectError> {
        let id = kind.usb_id();
        match self.bus.find_device(id) {
            Some(handle) => {
                info!("Opened {} ({})", kind, id);
                Ok(handle)
            }
            None => Err(DetectError::DeviceNotFound {
                adapter: kind.name().to_string(),
                vid: id.vid,
                pid: id.pid,
            }),
        }
    }
}
