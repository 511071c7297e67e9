//! FS20 PCS transmitter driver
//!
//! Every operation is one frame written to the adapter followed by one
//! acknowledgement read. Arguments are validated before anything is written.

use std::time::Duration;

use fs20_detect::{AdapterKind, AdapterScanner, UsbBus, UsbError, UsbHandle};
use fs20_protocol::transmit::{
    parse_ack, send_once_frame, send_repeating_frame, stop_repeating_frame, version_frame,
};
use fs20_protocol::{Ack, AckStatus, Address, Command, FirmwareVersion, ProtocolError, TimeCode};
use tracing::{debug, info};

use crate::config::AdapterConfig;
use crate::error::Fs20Error;

const KIND: AdapterKind = AdapterKind::Transmitter;

/// Driver for an FS20 PCS
pub struct Transmitter {
    handle: Box<dyn UsbHandle>,
    timeout: Duration,
}

impl Transmitter {
    /// Wrap an open handle using the default timeout
    pub fn new(handle: Box<dyn UsbHandle>) -> Self {
        Self {
            handle,
            timeout: KIND.default_timeout(),
        }
    }

    pub fn with_config(handle: Box<dyn UsbHandle>, config: &AdapterConfig) -> Self {
        Self {
            handle,
            timeout: config.timeout(),
        }
    }

    /// Find and open the transmitter on a bus
    pub fn open<B: UsbBus>(
        scanner: &AdapterScanner<B>,
        config: &AdapterConfig,
    ) -> Result<Self, Fs20Error> {
        let handle = scanner.open(KIND)?;
        info!("Transmitter ready (timeout {:?})", config.timeout());
        Ok(Self::with_config(handle, config))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a command once
    pub fn send_once(
        &mut self,
        address: Address,
        command: Command,
        time: TimeCode,
    ) -> Result<AckStatus, Fs20Error> {
        let frame = send_once_frame(address, command, time);
        Ok(self.exchange(&frame)?.status)
    }

    /// Keep sending a command until [`Transmitter::stop_repeating`]
    ///
    /// `interval` must be in `1..=255`; it is checked before any write.
    pub fn send_repeating(
        &mut self,
        address: Address,
        command: Command,
        time: TimeCode,
        interval: u32,
    ) -> Result<AckStatus, Fs20Error> {
        let frame = send_repeating_frame(address, command, time, interval)?;
        Ok(self.exchange(&frame)?.status)
    }

    /// Stop a repeating send
    ///
    /// Returns [`AckStatus::StopNotSent`] when nothing was being repeated.
    pub fn stop_repeating(&mut self) -> Result<AckStatus, Fs20Error> {
        Ok(self.exchange(&stop_repeating_frame())?.status)
    }

    /// Query the firmware version
    pub fn firmware_version(&mut self) -> Result<FirmwareVersion, Fs20Error> {
        let ack = self.exchange(&version_frame())?;
        if ack.status != AckStatus::FirmwareOk {
            return Err(ProtocolError::InvalidResponse(format!(
                "version query answered with {:?}",
                ack.status
            ))
            .into());
        }
        Ok(FirmwareVersion(ack.trailer))
    }

    fn exchange(&mut self, frame: &[u8]) -> Result<Ack, Fs20Error> {
        let endpoint = KIND
            .write_endpoint()
            .ok_or_else(|| UsbError::Io(format!("{} has no write endpoint", KIND)))?;
        debug!("PCS <- {:02X?}", frame);
        self.handle.write(endpoint, frame)?;

        let reply = self
            .handle
            .read(KIND.read_endpoint(), KIND.read_len(), self.timeout)
            .map_err(|e| ProtocolError::InvalidResponse(format!("no acknowledgement: {}", e)))?;
        debug!("PCS -> {:02X?}", reply);

        Ok(parse_ack(&reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs20_protocol::CodecError;
    use fs20_sim::{Air, SimulatedPcs};

    fn transmitter() -> (Transmitter, SimulatedPcs) {
        let pcs = SimulatedPcs::new(Air::new());
        (Transmitter::new(Box::new(pcs.clone())), pcs)
    }

    fn addr() -> Address {
        "1111-1111-4444".parse().unwrap()
    }

    #[test]
    fn test_send_once() {
        let (mut tx, pcs) = transmitter();
        assert_eq!(tx.send_once(addr(), Command::On, TimeCode::ZERO).unwrap(), AckStatus::Ok);
        assert_eq!(pcs.written(), vec![vec![0x01, 0x06, 0xF1, 0x00, 0x00, 0xFF, 0x10, 0x00]]);
    }

    #[test]
    fn test_invalid_interval_writes_nothing() {
        let (mut tx, pcs) = transmitter();
        for interval in [0, 256, 1000] {
            let err = tx.send_repeating(addr(), Command::On, TimeCode::ZERO, interval).unwrap_err();
            assert_eq!(err.as_codec(), Some(&CodecError::InvalidInterval(interval)));
        }
        assert!(pcs.written().is_empty());
    }

    #[test]
    fn test_stop_repeating() {
        let (mut tx, _pcs) = transmitter();
        assert_eq!(tx.stop_repeating().unwrap(), AckStatus::StopNotSent);
        tx.send_repeating(addr(), Command::Toggle, TimeCode::ZERO, 3).unwrap();
        assert_eq!(tx.stop_repeating().unwrap(), AckStatus::StopOk);
    }

    #[test]
    fn test_firmware_version() {
        let (mut tx, _pcs) = transmitter();
        assert_eq!(tx.firmware_version().unwrap().to_string(), "v1.7");
    }

    #[test]
    fn test_error_statuses() {
        let (mut tx, pcs) = transmitter();
        pcs.inject_reply(vec![0x02, 0x03, 0xA0, 0x02, 0x00]);
        assert_eq!(
            tx.send_once(addr(), Command::Off, TimeCode::ZERO),
            Err(Fs20Error::Protocol(ProtocolError::UnknownDataframe))
        );

        let (mut tx, pcs) = transmitter();
        pcs.inject_reply(vec![0x02, 0x03, 0xA0, 0x03, 0x00]);
        assert_eq!(
            tx.send_once(addr(), Command::Off, TimeCode::ZERO),
            Err(Fs20Error::Protocol(ProtocolError::MismatchedDataframe))
        );
    }

    #[test]
    fn test_exchange_after_injected_failure() {
        let (mut tx, pcs) = transmitter();
        pcs.inject_reply(vec![0x02, 0x03, 0xA0, 0x03, 0x00]);
        assert_eq!(
            tx.send_once(addr(), Command::Off, TimeCode::ZERO),
            Err(Fs20Error::Protocol(ProtocolError::MismatchedDataframe))
        );
        assert_eq!(tx.stop_repeating().unwrap(), AckStatus::StopNotSent);
        assert_eq!(tx.send_once(addr(), Command::On, TimeCode::ZERO).unwrap(), AckStatus::Ok);
        assert_eq!(tx.firmware_version().unwrap().to_string(), "v1.7");
    }

    #[test]
    fn test_frames_use_adapter_endpoints() {
        let (mut tx, pcs) = transmitter();
        tx.stop_repeating().unwrap();
        assert_eq!(pcs.written(), vec![stop_repeating_frame()]);
        assert_eq!(KIND.read_len(), fs20_protocol::transmit::ACK_LEN);
    }

    #[test]
    fn test_short_reply_is_invalid_response() {
        let (mut tx, pcs) = transmitter();
        pcs.inject_reply(vec![0x02, 0x03]);
        assert!(matches!(
            tx.send_once(addr(), Command::Off, TimeCode::ZERO),
            Err(Fs20Error::Protocol(ProtocolError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn test_disconnected_write() {
        let (mut tx, pcs) = transmitter();
        pcs.set_connected(false);
        assert!(matches!(tx.stop_repeating(), Err(Fs20Error::Usb(_))));
    }
}
