//! Simulated FS20 PCE receiver

use std::time::Duration;

use fs20_detect::transport::ENDPOINT_READ;
use fs20_detect::{UsbError, UsbHandle};
use fs20_protocol::receive::encode_frame;
use fs20_protocol::{Address, Command};

use crate::air::Air;

/// Default firmware version byte (`v2.2`)
pub const DEFAULT_PCE_VERSION: u8 = 22;

/// A simulated receiver reading frames off the [`Air`]
///
/// Reads time out when nothing is on the air.
#[derive(Debug, Clone)]
pub struct SimulatedPce {
    air: Air,
    version: u8,
}

impl SimulatedPce {
    pub fn new(air: Air) -> Self {
        Self::with_version(air, DEFAULT_PCE_VERSION)
    }

    pub fn with_version(air: Air, version: u8) -> Self {
        Self { air, version }
    }

    /// Put a frame on the air as if a remote control had sent it
    pub fn hear(&self, address: Address, command: Command, quarters: Option<u32>) {
        self.air
            .broadcast(encode_frame(address, command, quarters, self.version));
    }

    pub fn air(&self) -> &Air {
        &self.air
    }
}

impl UsbHandle for SimulatedPce {
    fn read(&mut self, endpoint: u8, len: usize, _timeout: Duration) -> Result<Vec<u8>, UsbError> {
        if endpoint != ENDPOINT_READ {
            return Err(UsbError::Io(format!("no such endpoint 0x{:02X}", endpoint)));
        }
        let frame = self.air.take().ok_or(UsbError::Timeout)?;
        Ok(frame[..len.min(frame.len())].to_vec())
    }

    fn write(&mut self, endpoint: u8, _data: &[u8]) -> Result<usize, UsbError> {
        Err(UsbError::Io(format!(
            "receiver has no write endpoint (0x{:02X} requested)",
            endpoint
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs20_protocol::receive::parse_frame;

    #[test]
    fn test_read_heard_frame() {
        let mut pce = SimulatedPce::new(Air::new());
        let address: Address = "1234-1234-1111".parse().unwrap();
        pce.hear(address, Command::DimBrightnessLevel4InTime, Some(49152));

        let frame = pce.read(ENDPOINT_READ, 13, Duration::from_millis(100)).unwrap();
        let (event, version) = parse_frame(&frame).unwrap();
        assert_eq!(event.address, address);
        assert_eq!(event.time, Some(12288.0));
        assert_eq!(version, 22);
    }

    #[test]
    fn test_empty_air_times_out() {
        let mut pce = SimulatedPce::new(Air::new());
        assert_eq!(pce.read(ENDPOINT_READ, 13, Duration::from_millis(100)), Err(UsbError::Timeout));
        assert!(pce.write(0x01, &[0x00]).is_err());
    }
}
