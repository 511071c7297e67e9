//! FS20 Protocol Library
//!
//! Encoding and decoding for the ELV FS20 home automation radio protocol as
//! spoken by the two USB adapters:
//!
//! - **FS20 PCS**: transmitter, accepts tagged frames and answers with a
//!   5-byte acknowledgement
//! - **FS20 PCE**: receiver, reports every command it hears as a 13-byte
//!   BCD frame
//!
//! # Architecture
//!
//! - [`address`]: `1234-1234-1111` style addresses, packed and BCD forms
//! - [`time`]: the one-byte duration encoding (0.25 s to 4 h 16 min)
//! - [`command`]: the static command table and its 32 command groups
//! - [`transmit`]: transmitter frames and acknowledgements
//! - [`receive`]: receiver frames and events
//!
//! Nothing in this crate does I/O. Adapter drivers live in `fs20-io`.
//!
//! # Example
//!
//! ```rust
//! use fs20_protocol::{Address, Command, TimeCode};
//! use fs20_protocol::transmit::send_once_frame;
//!
//! let address: Address = "1111-1111-4444".parse().unwrap();
//! let frame = send_once_frame(address, Command::On, TimeCode::ZERO);
//! assert_eq!(frame, [0x01, 0x06, 0xF1, 0x00, 0x00, 0xFF, 0x10, 0x00]);
//! ```

pub mod address;
pub mod command;
pub mod error;
pub mod receive;
pub mod time;
pub mod transmit;

pub use address::Address;
pub use command::{lookup_group, opcode_for, Command, CommandKind};
pub use error::{CodecError, ProtocolError};
pub use receive::ReceivedEvent;
pub use time::{TimeCode, WallClock};
pub use transmit::{Ack, AckStatus, FirmwareVersion};
