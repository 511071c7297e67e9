//! Simulated FS20 PCS transmitter
//!
//! Answers frames the way the hardware does and puts every accepted command
//! on the [`Air`] as a receiver frame.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fs20_detect::transport::{ENDPOINT_READ, ENDPOINT_WRITE};
use fs20_detect::{UsbError, UsbHandle};
use fs20_protocol::receive::encode_frame;
use fs20_protocol::time::STEP_SECONDS;
use fs20_protocol::transmit::{
    Ack, AckStatus, ACK_HEADER, SEND_ONCE_TAG, SEND_REPEATING_TAG, STOP_REPEATING_TAG, VERSION_TAG,
};
use fs20_protocol::{Address, Command, TimeCode};
use tracing::debug;

use crate::air::Air;

const STATUS_UNKNOWN_DATAFRAME: u8 = 0x02;
const STATUS_MISMATCHED_DATAFRAME: u8 = 0x03;

/// Default firmware version byte (`v1.7`)
pub const DEFAULT_PCS_VERSION: u8 = 17;

#[derive(Debug)]
struct PcsState {
    version: u8,
    pce_version: u8,
    connected: bool,
    repeating: bool,
    written: Vec<Vec<u8>>,
    replies: VecDeque<Vec<u8>>,
    pending_override: Option<Vec<u8>>,
}

/// A simulated transmitter
///
/// Clones share state, so a test can keep one clone for inspection while
/// another is owned by a driver.
#[derive(Debug, Clone)]
pub struct SimulatedPcs {
    air: Air,
    state: Arc<Mutex<PcsState>>,
}

impl SimulatedPcs {
    pub fn new(air: Air) -> Self {
        Self::with_versions(air, DEFAULT_PCS_VERSION, crate::pce::DEFAULT_PCE_VERSION)
    }

    /// `pce_version` is stamped into the frames put on the air
    pub fn with_versions(air: Air, version: u8, pce_version: u8) -> Self {
        Self {
            air,
            state: Arc::new(Mutex::new(PcsState {
                version,
                pce_version,
                connected: true,
                repeating: false,
                written: Vec::new(),
                replies: VecDeque::new(),
                pending_override: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PcsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every frame written so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// Whether a repeating send is in progress
    pub fn is_repeating(&self) -> bool {
        self.lock().repeating
    }

    /// Answer the next write with `bytes` instead of a generated acknowledgement
    ///
    /// That frame is recorded but not acted on: nothing goes on the air and
    /// the repeating flag is left alone.
    pub fn inject_reply(&self, bytes: Vec<u8>) {
        self.lock().pending_override = Some(bytes);
    }

    /// Simulate unplugging or replugging the adapter
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    fn handle_frame(&self, frame: &[u8]) -> Vec<u8> {
        let (tag, body) = frame.split_at(frame.len().min(3));
        let mut state = self.lock();

        let status = match tag {
            t if t == SEND_ONCE_TAG => self.transmit(&state, body, 5),
            t if t == SEND_REPEATING_TAG => {
                let status = self.transmit(&state, body, 6);
                if status == AckStatus::Ok as u8 {
                    state.repeating = true;
                }
                status
            }
            t if t == STOP_REPEATING_TAG && body.is_empty() => {
                if std::mem::take(&mut state.repeating) {
                    AckStatus::StopOk as u8
                } else {
                    AckStatus::StopNotSent as u8
                }
            }
            t if t == VERSION_TAG && body.is_empty() => {
                return Ack {
                    status: AckStatus::FirmwareOk,
                    trailer: state.version,
                }
                .encode()
                .to_vec();
            }
            t if t == STOP_REPEATING_TAG || t == VERSION_TAG => STATUS_MISMATCHED_DATAFRAME,
            _ => STATUS_UNKNOWN_DATAFRAME,
        };

        vec![ACK_HEADER[0], ACK_HEADER[1], ACK_HEADER[2], status, 0x00]
    }

    /// Validate a send body and put it on the air
    fn transmit(&self, state: &PcsState, body: &[u8], expected_len: usize) -> u8 {
        if body.len() != expected_len {
            return STATUS_MISMATCHED_DATAFRAME;
        }
        let address = Address::from_packed([body[0], body[1], body[2]]);
        let Ok(command) = Command::try_from(body[3]) else {
            return STATUS_MISMATCHED_DATAFRAME;
        };
        if expected_len == 6 && body[5] == 0 {
            return STATUS_MISMATCHED_DATAFRAME;
        }

        let quarters = command
            .takes_time()
            .then(|| (TimeCode::from_byte(body[4]).seconds() / STEP_SECONDS) as u32);
        debug!("sim PCS transmits {} to {}", command, address);
        self.air
            .broadcast(encode_frame(address, command, quarters, state.pce_version));
        AckStatus::Ok as u8
    }
}

impl UsbHandle for SimulatedPcs {
    fn read(&mut self, endpoint: u8, len: usize, _timeout: Duration) -> Result<Vec<u8>, UsbError> {
        let mut state = self.lock();
        if !state.connected {
            return Err(UsbError::Disconnected);
        }
        if endpoint != ENDPOINT_READ {
            return Err(UsbError::Io(format!("no such endpoint 0x{:02X}", endpoint)));
        }
        let mut reply = state.replies.pop_front().ok_or(UsbError::Timeout)?;
        reply.truncate(len);
        Ok(reply)
    }

    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, UsbError> {
        if !self.lock().connected {
            return Err(UsbError::Disconnected);
        }
        if endpoint != ENDPOINT_WRITE {
            return Err(UsbError::Io(format!("no such endpoint 0x{:02X}", endpoint)));
        }
        let injected = self.lock().pending_override.take();
        let reply = match injected {
            Some(reply) => reply,
            None => self.handle_frame(data),
        };
        let mut state = self.lock();
        state.written.push(data.to_vec());
        state.replies.push_back(reply);
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs20_protocol::transmit::{parse_ack, send_once_frame, send_repeating_frame, stop_repeating_frame, version_frame};
    use fs20_protocol::ProtocolError;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn roundtrip(pcs: &mut SimulatedPcs, frame: &[u8]) -> Result<Ack, ProtocolError> {
        pcs.write(ENDPOINT_WRITE, frame).unwrap();
        parse_ack(&pcs.read(ENDPOINT_READ, 5, TIMEOUT).unwrap())
    }

    #[test]
    fn test_send_once_puts_frame_on_air() {
        let air = Air::new();
        let mut pcs = SimulatedPcs::new(air.clone());
        let address: Address = "1111-1111-4444".parse().unwrap();

        let ack = roundtrip(&mut pcs, &send_once_frame(address, Command::On, TimeCode::ZERO)).unwrap();
        assert_eq!(ack.status, AckStatus::Ok);
        assert_eq!(air.len(), 1);
        assert_eq!(pcs.written().len(), 1);
    }

    #[test]
    fn test_stop_repeating() {
        let mut pcs = SimulatedPcs::new(Air::new());
        let address: Address = "1111-1111-1111".parse().unwrap();

        assert_eq!(roundtrip(&mut pcs, &stop_repeating_frame()).unwrap().status, AckStatus::StopNotSent);

        let frame = send_repeating_frame(address, Command::Toggle, TimeCode::ZERO, 5).unwrap();
        roundtrip(&mut pcs, &frame).unwrap();
        assert!(pcs.is_repeating());

        assert_eq!(roundtrip(&mut pcs, &stop_repeating_frame()).unwrap().status, AckStatus::StopOk);
        assert!(!pcs.is_repeating());
    }

    #[test]
    fn test_version() {
        let mut pcs = SimulatedPcs::new(Air::new());
        let ack = roundtrip(&mut pcs, &version_frame()).unwrap();
        assert_eq!(ack, Ack { status: AckStatus::FirmwareOk, trailer: 17 });
    }

    #[test]
    fn test_bad_frames() {
        let mut pcs = SimulatedPcs::new(Air::new());
        assert_eq!(roundtrip(&mut pcs, &[0x01, 0x02, 0xFF]), Err(ProtocolError::UnknownDataframe));
        assert_eq!(
            roundtrip(&mut pcs, &[0x01, 0x06, 0xF1, 0x00, 0x00]),
            Err(ProtocolError::MismatchedDataframe)
        );
        // 0x1C is not a command
        assert_eq!(
            roundtrip(&mut pcs, &[0x01, 0x06, 0xF1, 0x00, 0x00, 0x00, 0x1C, 0x00]),
            Err(ProtocolError::MismatchedDataframe)
        );
    }

    #[test]
    fn test_disconnected() {
        let mut pcs = SimulatedPcs::new(Air::new());
        pcs.set_connected(false);
        assert_eq!(pcs.write(ENDPOINT_WRITE, &version_frame()), Err(UsbError::Disconnected));
        assert_eq!(pcs.read(ENDPOINT_READ, 5, TIMEOUT), Err(UsbError::Disconnected));
    }

    #[test]
    fn test_injected_reply_replaces_ack() {
        let air = Air::new();
        let mut pcs = SimulatedPcs::new(air.clone());
        let address: Address = "1111-1111-1111".parse().unwrap();
        pcs.inject_reply(vec![0x02, 0x03, 0xA0, 0x03, 0x00]);

        let frame = send_repeating_frame(address, Command::Toggle, TimeCode::ZERO, 5).unwrap();
        assert_eq!(roundtrip(&mut pcs, &frame), Err(ProtocolError::MismatchedDataframe));
        assert!(air.is_empty());
        assert!(!pcs.is_repeating());

        // the following exchange gets its own ack
        assert_eq!(roundtrip(&mut pcs, &stop_repeating_frame()).unwrap().status, AckStatus::StopNotSent);
        assert_eq!(pcs.read(ENDPOINT_READ, 5, TIMEOUT), Err(UsbError::Timeout));
        assert_eq!(pcs.written().len(), 2);
    }

    #[test]
    fn test_read_without_reply_times_out() {
        let mut pcs = SimulatedPcs::new(Air::new());
        assert_eq!(pcs.read(ENDPOINT_READ, 5, TIMEOUT), Err(UsbError::Timeout));
    }
}
