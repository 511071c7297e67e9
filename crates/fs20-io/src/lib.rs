//! FS20 Adapter I/O
//!
//! Blocking drivers for the FS20 USB adapters, built on the codecs in
//! `fs20-protocol` and the transport seam in `fs20-detect`:
//!
//! - **Transmitter**: sends commands through an FS20 PCS
//! - **Receiver**: reads events from an FS20 PCE
//! - **Dispatcher**: polls a receiver on a worker thread and fans events out
//!   to filtered listeners and async subscribers
//! - **Device**: switch and dimmer wrappers that track device status
//!
//! # Example
//!
//! ```rust
//! use fs20_detect::AdapterScanner;
//! use fs20_io::{Device, Fs20Config, Transmitter};
//! use fs20_protocol::{Command, TimeCode};
//! use fs20_sim::SimBus;
//!
//! let config = Fs20Config::default();
//! let scanner = AdapterScanner::new(SimBus::new());
//! let mut tx = Transmitter::open(&scanner, &config.transmitter).unwrap();
//!
//! let mut lamp = Device::dimmer("1111-1111-1111".parse().unwrap());
//! let status = lamp.execute(&mut tx, Command::OnBrightnessLevel8, TimeCode::ZERO, 1).unwrap();
//! assert_eq!(status, Some(50));
//! ```

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod receiver;
pub mod transmitter;

pub use config::{AdapterConfig, DispatcherConfig, Fs20Config};
pub use device::{Device, DeviceKind, Status};
pub use dispatcher::{Dispatcher, DispatcherHandle, DispatcherState, Listener, ListenerKey};
pub use error::Fs20Error;
pub use receiver::{Receiver, VersionCell};
pub use transmitter::Transmitter;
