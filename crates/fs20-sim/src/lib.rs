//! FS20 Adapter Simulation Library
//!
//! In-memory stand-ins for the FS20 USB adapters, for testing drivers
//! without hardware:
//!
//! - **SimulatedPcs**: acknowledges frames like the transmitter firmware
//! - **SimulatedPce**: reports frames like the receiver firmware
//! - **SimBus**: a [`fs20_detect::UsbBus`] carrying both
//!
//! Commands accepted by the simulated transmitter are put on a shared
//! [`Air`] and come out of the simulated receiver as events.
//!
//! # Example
//!
//! ```rust
//! use fs20_detect::{AdapterKind, AdapterScanner};
//! use fs20_sim::SimBus;
//!
//! let scanner = AdapterScanner::new(SimBus::new());
//! assert_eq!(scanner.enumerate().len(), 2);
//! let pcs = scanner.open(AdapterKind::Transmitter).unwrap();
//! ```

pub mod air;
pub mod bus;
pub mod pce;
pub mod pcs;

pub use air::Air;
pub use bus::{SimBus, SimBusConfig};
pub use pce::SimulatedPce;
pub use pcs::SimulatedPcs;
