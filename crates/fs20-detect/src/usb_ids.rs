//! USB Vendor/Product IDs of the FS20 adapters

use std::fmt;

/// USB Vendor ID / Product ID pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct UsbId {
    pub vid: u16,
    pub pid: u16,
}

impl UsbId {
    pub const fn new(vid: u16, pid: u16) -> Self {
        Self { vid, pid }
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vid, self.pid)
    }
}

/// ELV vendor id shared by both adapters
pub const ELV_VID: u16 = 0x18EF;

/// FS20 PCS transmitter
pub const PCS: UsbId = UsbId::new(ELV_VID, 0xE015);

/// FS20 PCE receiver
pub const PCE: UsbId = UsbId::new(ELV_VID, 0xE014);
