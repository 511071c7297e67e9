//! FS20 PCS transmit frames
//!
//! Every frame written to the transmitter starts with a 3-byte tag:
//!
//! ```text
//! send once:       01 06 F1 [A1 A2 A3] [OP] [TIME]
//! send repeating:  01 07 F2 [A1 A2 A3] [OP] [TIME] [INTERVAL]
//! stop repeating:  01 01 F3
//! version query:   01 01 F0
//! ```
//!
//! The command is always two bytes on the wire. Commands without a time
//! byte send `00` in its place.
//!
//! The transmitter answers every frame with a 5-byte acknowledgement:
//!
//! ```text
//! 02 03 A0 [STATUS] [TRAILER]
//! ```
//!
//! For a version query the trailer holds the firmware version.

use std::fmt;

use tracing::debug;

use crate::address::Address;
use crate::command::Command;
use crate::error::{CodecError, ProtocolError};
use crate::time::TimeCode;

/// Tag of the send-once frame
pub const SEND_ONCE_TAG: [u8; 3] = [0x01, 0x06, 0xF1];
/// Tag of the send-repeating frame
pub const SEND_REPEATING_TAG: [u8; 3] = [0x01, 0x07, 0xF2];
/// Tag of the stop-repeating frame
pub const STOP_REPEATING_TAG: [u8; 3] = [0x01, 0x01, 0xF3];
/// Tag of the version query
pub const VERSION_TAG: [u8; 3] = [0x01, 0x01, 0xF0];

/// Header of every acknowledgement
pub const ACK_HEADER: [u8; 3] = [0x02, 0x03, 0xA0];
/// Length of an acknowledgement
pub const ACK_LEN: usize = 5;

const STATUS_UNKNOWN_DATAFRAME: u8 = 0x02;
const STATUS_MISMATCHED_DATAFRAME: u8 = 0x03;

/// Successful acknowledgement statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AckStatus {
    /// Frame accepted
    Ok = 0x00,
    /// Version query answered
    FirmwareOk = 0x01,
    /// Repeated sending stopped
    StopOk = 0x04,
    /// Stop requested while nothing was being repeated
    StopNotSent = 0x05,
}

impl TryFrom<u8> for AckStatus {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(AckStatus::Ok),
            0x01 => Ok(AckStatus::FirmwareOk),
            0x04 => Ok(AckStatus::StopOk),
            0x05 => Ok(AckStatus::StopNotSent),
            STATUS_UNKNOWN_DATAFRAME => Err(ProtocolError::UnknownDataframe),
            STATUS_MISMATCHED_DATAFRAME => Err(ProtocolError::MismatchedDataframe),
            other => Err(ProtocolError::InvalidResponse(format!(
                "unexpected status 0x{:02X}",
                other
            ))),
        }
    }
}

/// Parsed acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub status: AckStatus,
    pub trailer: u8,
}

impl Ack {
    /// Encode as the transmitter would send it
    pub fn encode(&self) -> [u8; ACK_LEN] {
        [
            ACK_HEADER[0],
            ACK_HEADER[1],
            ACK_HEADER[2],
            self.status as u8,
            self.trailer,
        ]
    }
}

/// Firmware version byte of an adapter
///
/// Displayed from its decimal digits, so `17` reads as `v1.7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareVersion(pub u8);

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut chars = digits.chars();
        match (chars.next(), chars.next()) {
            (Some(major), Some(minor)) => write!(f, "v{}.{}", major, minor),
            (Some(minor), None) => write!(f, "v0.{}", minor),
            _ => write!(f, "v0.0"),
        }
    }
}

fn command_bytes(command: Command, time: TimeCode) -> [u8; 2] {
    if command.takes_time() {
        return [command.opcode(), time.byte()];
    }
    if !time.is_zero() {
        debug!(
            "dropping time {} for {} (command takes no time)",
            time, command
        );
    }
    [command.opcode(), 0x00]
}

/// Build a send-once frame
pub fn send_once_frame(address: Address, command: Command, time: TimeCode) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8);
    frame.extend_from_slice(&SEND_ONCE_TAG);
    frame.extend_from_slice(&address.to_packed());
    frame.extend_from_slice(&command_bytes(command, time));
    frame
}

/// Build a send-repeating frame
///
/// `interval` must be in `1..=255`.
pub fn send_repeating_frame(
    address: Address,
    command: Command,
    time: TimeCode,
    interval: u32,
) -> Result<Vec<u8>, CodecError> {
    let interval = validate_interval(interval)?;
    let mut frame = Vec::with_capacity(9);
    frame.extend_from_slice(&SEND_REPEATING_TAG);
    frame.extend_from_slice(&address.to_packed());
    frame.extend_from_slice(&command_bytes(command, time));
    frame.push(interval);
    Ok(frame)
}

/// Build a stop-repeating frame
pub fn stop_repeating_frame() -> Vec<u8> {
    STOP_REPEATING_TAG.to_vec()
}

/// Build a version query
pub fn version_frame() -> Vec<u8> {
    VERSION_TAG.to_vec()
}

/// Check a repeat interval, returning it as the wire byte
pub fn validate_interval(interval: u32) -> Result<u8, CodecError> {
    match u8::try_from(interval) {
        Ok(byte) if byte >= 1 => Ok(byte),
        _ => Err(CodecError::InvalidInterval(interval)),
    }
}

/// Classify an acknowledgement read from the transmitter
pub fn parse_ack(bytes: &[u8]) -> Result<Ack, ProtocolError> {
    if bytes.len() < ACK_LEN || bytes[..3] != ACK_HEADER {
        return Err(ProtocolError::InvalidResponse(format!(
            "malformed acknowledgement {:02X?}",
            bytes
        )));
    }
    let status = AckStatus::try_from(bytes[3])?;
    Ok(Ack {
        status,
        trailer: bytes[4],
    })
}
