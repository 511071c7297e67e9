//! FS20 Adapter Detection Library
//!
//! Finds FS20 PCS (transmitter) and PCE (receiver) adapters on a USB bus and
//! defines the blocking transport the drivers in `fs20-io` talk through.
//!
//! The host USB stack is abstracted by [`UsbBus`] and [`UsbHandle`]; the
//! `fs20-sim` crate provides an in-memory implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use fs20_detect::{AdapterKind, AdapterScanner};
//!
//! let scanner = AdapterScanner::new(bus);
//! for adapter in scanner.enumerate() {
//!     println!("Found {} at {}", adapter.kind, adapter.device.location);
//! }
//! let pcs = scanner.open(AdapterKind::Transmitter)?;
//! ```

pub mod error;
pub mod scanner;
pub mod transport;
pub mod usb_ids;

pub use error::{DetectError, UsbError};
pub use scanner::{AdapterScanner, DetectedAdapter};
pub use transport::{AdapterKind, UsbBus, UsbDeviceInfo, UsbHandle};
pub use usb_ids::UsbId;
