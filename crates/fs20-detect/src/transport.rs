//! USB transport seam
//!
//! The adapters are plain USB HID-style devices driven through two interrupt
//! endpoints. Drivers only need blocking reads with a timeout and blocking
//! writes, so the host USB stack hides behind [`UsbHandle`] and [`UsbBus`].
//!
//! ```text
//!             write 0x01                read 0x81
//! PCS   <--- tagged frame ---     --- 5-byte ack --->
//! PCE                             --- 13-byte frame -->
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::UsbError;
use crate::usb_ids::{self, UsbId};

/// Endpoint the transmitter accepts frames on
pub const ENDPOINT_WRITE: u8 = 0x01;

/// Endpoint both adapters answer on
pub const ENDPOINT_READ: u8 = 0x81;

/// An open adapter
pub trait UsbHandle: Send {
    /// Read up to `len` bytes from `endpoint`, waiting at most `timeout`
    fn read(&mut self, endpoint: u8, len: usize, timeout: Duration) -> Result<Vec<u8>, UsbError>;

    /// Write `data` to `endpoint`, returning the number of bytes written
    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, UsbError>;
}

/// A USB bus that can be searched for devices
pub trait UsbBus {
    /// Open the first device with the given id
    fn find_device(&self, id: UsbId) -> Option<Box<dyn UsbHandle>>;

    /// List every device currently attached
    fn list_devices(&self) -> Vec<UsbDeviceInfo>;
}

/// Information about an attached USB device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDeviceInfo {
    pub id: UsbId,
    /// Bus location, e.g. `001:004`
    pub location: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// The two FS20 adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterKind {
    /// FS20 PCS
    Transmitter,
    /// FS20 PCE
    Receiver,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 2] = [AdapterKind::Transmitter, AdapterKind::Receiver];

    pub const fn usb_id(&self) -> UsbId {
        match self {
            AdapterKind::Transmitter => usb_ids::PCS,
            AdapterKind::Receiver => usb_ids::PCE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdapterKind::Transmitter => "FS20 PCS",
            AdapterKind::Receiver => "FS20 PCE",
        }
    }

    /// Endpoint frames are written to, if the adapter accepts any
    pub const fn write_endpoint(&self) -> Option<u8> {
        match self {
            AdapterKind::Transmitter => Some(ENDPOINT_WRITE),
            AdapterKind::Receiver => None,
        }
    }

    pub const fn read_endpoint(&self) -> u8 {
        ENDPOINT_READ
    }

    /// Bytes requested per read
    pub const fn read_len(&self) -> usize {
        match self {
            AdapterKind::Transmitter => 5,
            AdapterKind::Receiver => 13,
        }
    }

    /// Default read timeout
    pub const fn default_timeout(&self) -> Duration {
        match self {
            AdapterKind::Transmitter => Duration::from_millis(500),
            AdapterKind::Receiver => Duration::from_millis(100),
        }
    }

    /// Identify an adapter from its USB id
    pub fn from_usb_id(id: UsbId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.usb_id() == id)
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_kind_parameters() {
        let pcs = AdapterKind::Transmitter;
        assert_eq!(pcs.usb_id(), UsbId::new(0x18EF, 0xE015));
        assert_eq!(pcs.write_endpoint(), Some(0x01));
        assert_eq!(pcs.read_endpoint(), 0x81);
        assert_eq!(pcs.read_len(), 5);
        assert_eq!(pcs.default_timeout(), Duration::from_millis(500));

        let pce = AdapterKind::Receiver;
        assert_eq!(pce.usb_id(), UsbId::new(0x18EF, 0xE014));
        assert_eq!(pce.write_endpoint(), None);
        assert_eq!(pce.read_len(), 13);
        assert_eq!(pce.default_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_from_usb_id() {
        assert_eq!(AdapterKind::from_usb_id(usb_ids::PCS), Some(AdapterKind::Transmitter));
        assert_eq!(AdapterKind::from_usb_id(usb_ids::PCE), Some(AdapterKind::Receiver));
        assert_eq!(AdapterKind::from_usb_id(UsbId::new(0x0403, 0x6001)), None);
    }
}
