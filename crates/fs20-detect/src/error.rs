//! Error types for adapter detection and transport

use thiserror::Error;

/// Errors reported by a USB handle
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsbError {
    /// Nothing arrived within the read timeout
    #[error("USB read timed out")]
    Timeout,

    /// The device went away
    #[error("USB device disconnected")]
    Disconnected,

    /// Any other transfer failure
    #[error("USB I/O error: {0}")]
    Io(String),
}

/// Errors that can occur during detection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// No adapter with the expected USB id is connected
    #[error("{adapter} not found (USB id {vid:04X}:{pid:04X})")]
    DeviceNotFound {
        adapter: String,
        vid: u16,
        pid: u16,
    },

    /// USB error while opening
    #[error("USB error: {0}")]
    Usb(#[from] UsbError),
}
