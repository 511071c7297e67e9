//! FS20 PCE receive frames
//!
//! The receiver reports every command it hears as a 13-byte frame:
//!
//! ```text
//! 02 0B [A1a A1b A2a A2b A3a A3b] [GROUP] [T1 T2 T3] [VERSION]
//! ```
//!
//! All fields except the version are BCD. The address uses two bytes per
//! group. `GROUP` is the command group index. The first of the six time
//! digits is a flag: `1` marks a timed command whose duration is the
//! remaining five digits in quarter seconds.

use std::fmt;

use crate::address::{Address, BCD_LEN};
use crate::command::{lookup_group, Command, GROUP_COUNT};
use crate::error::ProtocolError;
use crate::time::STEP_SECONDS;

/// Header of every receive frame
pub const HEADER: [u8; 2] = [0x02, 0x0B];
/// Length of a full receive frame
pub const FRAME_LEN: usize = 13;
/// Length of the payload after the header
pub const PAYLOAD_LEN: usize = 11;

const GROUP_OFFSET: usize = BCD_LEN;
const TIME_OFFSET: usize = GROUP_OFFSET + 1;
const TIME_LEN: usize = 3;
const VERSION_OFFSET: usize = TIME_OFFSET + TIME_LEN;

/// A command heard by the receiver
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub address: Address,
    pub command: Command,
    /// Duration in seconds, present for timed commands only
    pub time: Option<f64>,
    /// Payload as read from the adapter
    pub raw: [u8; PAYLOAD_LEN],
}

impl ReceivedEvent {
    pub fn opcode(&self) -> u8 {
        self.command.opcode()
    }

    /// Firmware version byte carried in the payload
    pub fn version(&self) -> u8 {
        self.raw[VERSION_OFFSET]
    }
}

impl fmt::Display for ReceivedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address: {}, Command: {}, Time: ", self.address, self.command)?;
        match self.time {
            Some(seconds) => write!(f, "{:?}", seconds),
            None => f.write_str("None"),
        }
    }
}

fn invalid(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidResponse(reason.into())
}

/// Decode a BCD byte into its two-digit value
fn bcd_value(byte: u8) -> Option<u8> {
    let (high, low) = (byte >> 4, byte & 0x0F);
    (high <= 9 && low <= 9).then_some(high * 10 + low)
}

/// Decode the 11-byte payload of a receive frame
pub fn parse_event(payload: &[u8]) -> Result<ReceivedEvent, ProtocolError> {
    let raw: [u8; PAYLOAD_LEN] = payload.try_into().map_err(|_| {
        invalid(format!(
            "{} payload bytes ({} expected)",
            payload.len(),
            PAYLOAD_LEN
        ))
    })?;

    let address = Address::from_bcd(&raw[..GROUP_OFFSET])
        .map_err(|e| invalid(format!("bad address in payload: {}", e)))?;

    let group = bcd_value(raw[GROUP_OFFSET])
        .filter(|index| usize::from(*index) < GROUP_COUNT)
        .ok_or_else(|| invalid(format!("bad command group 0x{:02X}", raw[GROUP_OFFSET])))?;

    let mut digits = [0u32; TIME_LEN * 2];
    for (pair, &byte) in digits.chunks_exact_mut(2).zip(&raw[TIME_OFFSET..VERSION_OFFSET]) {
        let value = bcd_value(byte)
            .ok_or_else(|| invalid(format!("bad time field {:02X?}", &raw[TIME_OFFSET..VERSION_OFFSET])))?;
        pair[0] = u32::from(value / 10);
        pair[1] = u32::from(value % 10);
    }

    let timed = digits[0] == 1;
    let command = lookup_group(group, timed)?;
    let time = timed.then(|| {
        let quarters = digits[1..].iter().fold(0u32, |acc, d| acc * 10 + d);
        f64::from(quarters) * STEP_SECONDS
    });

    Ok(ReceivedEvent {
        address,
        command,
        time,
        raw,
    })
}

/// Check the header of a full frame and decode it
///
/// Returns the event together with the firmware version byte.
pub fn parse_frame(frame: &[u8]) -> Result<(ReceivedEvent, u8), ProtocolError> {
    if frame.len() < FRAME_LEN || frame[..2] != HEADER {
        return Err(invalid(format!("malformed frame {:02X?}", frame)));
    }
    let event = parse_event(&frame[2..FRAME_LEN])?;
    let version = event.version();
    Ok((event, version))
}

/// Build a receive frame, as the adapter reports an event
///
/// `quarters` is the duration in quarter seconds for timed commands and is
/// limited to five digits.
pub fn encode_frame(address: Address, command: Command, quarters: Option<u32>, version: u8) -> [u8; FRAME_LEN] {
    let to_bcd = |value: u32| (((value / 10) % 10) << 4 | value % 10) as u8;

    let mut frame = [0u8; FRAME_LEN];
    frame[..2].copy_from_slice(&HEADER);
    frame[2..2 + BCD_LEN].copy_from_slice(&address.to_bcd());
    frame[2 + GROUP_OFFSET] = to_bcd(u32::from(command.group()));

    // leading flag digit plus five duration digits
    let time = match quarters {
        Some(q) if command.takes_time() => 100_000 + q.min(99_999),
        _ => 0,
    };
    frame[2 + TIME_OFFSET] = to_bcd(time / 10_000);
    frame[2 + TIME_OFFSET + 1] = to_bcd(time / 100);
    frame[2 + TIME_OFFSET + 2] = to_bcd(time);
    frame[2 + VERSION_OFFSET] = version;
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn test_parse_untimed_event() {
        let mut payload = [0x11u8; PAYLOAD_LEN];
        payload[6] = 0x16;
        payload[7..10].copy_from_slice(&[0, 0, 0]);
        payload[10] = 22;

        let event = parse_event(&payload).unwrap();
        assert_eq!(event.address.to_string(), "1111-1111-1111");
        assert_eq!(event.command, Command::OnBrightnessLevel16);
        assert_eq!(event.time, None);
        assert_eq!(event.version(), 22);
        assert_eq!(
            event.to_string(),
            "Address: 1111-1111-1111, Command: ON_BRIGHTNESS_LEVEL_16, Time: None"
        );
    }

    #[test]
    fn test_parse_timed_event() {
        let payload = [0x12, 0x34, 0x12, 0x34, 0x11, 0x11, 0x04, 0x14, 0x91, 0x52, 22];
        let event = parse_event(&payload).unwrap();
        assert_eq!(event.address.to_string(), "1234-1234-1111");
        assert_eq!(event.command, Command::DimBrightnessLevel4InTime);
        assert_eq!(event.opcode(), 0x24);
        assert_eq!(event.time, Some(12288.0));
        assert_eq!(
            event.to_string(),
            "Address: 1234-1234-1111, Command: DIM_BRIGHTNESS_LEVEL_4_IN_TIME, Time: 12288.0"
        );
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        let good = [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x12, 0x00, 0x00, 0x00, 22];

        assert!(parse_event(&good[..10]).unwrap_err().is_invalid_response());

        let mut bad_address = good;
        bad_address[0] = 0x51;
        assert!(parse_event(&bad_address).unwrap_err().is_invalid_response());

        let mut bad_group = good;
        bad_group[6] = 0x32;
        assert!(parse_event(&bad_group).unwrap_err().is_invalid_response());
        bad_group[6] = 0x1A;
        assert!(parse_event(&bad_group).unwrap_err().is_invalid_response());

        let mut bad_time = good;
        bad_time[8] = 0xA0;
        assert!(parse_event(&bad_time).unwrap_err().is_invalid_response());
    }

    #[test]
    fn test_parse_event_empty_slot() {
        // group 28 has no plain command
        let payload = [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x28, 0x00, 0x00, 0x00, 22];
        assert_eq!(
            parse_event(&payload),
            Err(ProtocolError::Codec(CodecError::UnknownCommandGroup {
                index: 28,
                timed: false
            }))
        );
    }

    #[test]
    fn test_parse_frame() {
        let mut frame = vec![0x02, 0x0B];
        frame.extend_from_slice(&[0x12, 0x34, 0x12, 0x34, 0x11, 0x11, 0x04, 0x14, 0x91, 0x52, 22]);
        let (event, version) = parse_frame(&frame).unwrap();
        assert_eq!(version, 22);
        assert_eq!(event.time, Some(12288.0));

        frame[1] = 0x0C;
        assert!(parse_frame(&frame).unwrap_err().is_invalid_response());
        assert!(parse_frame(&[]).unwrap_err().is_invalid_response());
    }

    #[test]
    fn test_encode_frame() {
        let address: Address = "1234-1234-1111".parse().unwrap();
        let frame = encode_frame(address, Command::DimBrightnessLevel4InTime, Some(49152), 22);
        assert_eq!(
            frame,
            [0x02, 0x0B, 0x12, 0x34, 0x12, 0x34, 0x11, 0x11, 0x04, 0x14, 0x91, 0x52, 22]
        );

        let frame = encode_frame(address, Command::Toggle, Some(40), 22);
        let (event, _) = parse_frame(&frame).unwrap();
        assert_eq!(event.command, Command::Toggle);
        assert_eq!(event.time, None);
    }
}
