//! FS20 PCE receiver driver
//!
//! The receiver has no request channel: it only reports what it hears. Its
//! firmware version is therefore learned from the first frame it delivers
//! and kept in a [`VersionCell`] that other threads can read.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fs20_detect::{AdapterKind, AdapterScanner, UsbBus, UsbError, UsbHandle};
use fs20_protocol::receive::parse_frame;
use fs20_protocol::{FirmwareVersion, ProtocolError, ReceivedEvent};
use tracing::{debug, info, trace};

use crate::config::AdapterConfig;
use crate::error::Fs20Error;

const KIND: AdapterKind = AdapterKind::Receiver;

/// Upper bound on frames discarded by one [`Receiver::drain`]
pub const MAX_DRAIN_FRAMES: usize = 256;

/// Shared view of the receiver's firmware version
///
/// `0` means unknown; otherwise the stored value is the version byte plus one.
#[derive(Debug, Clone, Default)]
pub struct VersionCell {
    inner: Arc<AtomicU16>,
}

impl VersionCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version byte, if one has been seen
    pub fn get(&self) -> Option<u8> {
        match self.inner.load(Ordering::Acquire) {
            0 => None,
            stored => u8::try_from(stored - 1).ok(),
        }
    }

    pub fn version(&self) -> Option<FirmwareVersion> {
        self.get().map(FirmwareVersion)
    }

    fn set(&self, byte: u8) {
        self.inner.store(u16::from(byte) + 1, Ordering::Release);
    }
}

/// Driver for an FS20 PCE
pub struct Receiver {
    handle: Box<dyn UsbHandle>,
    timeout: Duration,
    version: VersionCell,
}

impl Receiver {
    /// Wrap an open handle using the default timeout
    pub fn new(handle: Box<dyn UsbHandle>) -> Self {
        Self {
            handle,
            timeout: KIND.default_timeout(),
            version: VersionCell::new(),
        }
    }

    pub fn with_config(handle: Box<dyn UsbHandle>, config: &AdapterConfig) -> Self {
        Self {
            timeout: config.timeout(),
            ..Self::new(handle)
        }
    }

    /// Find and open the receiver on a bus
    pub fn open<B: UsbBus>(
        scanner: &AdapterScanner<B>,
        config: &AdapterConfig,
    ) -> Result<Self, Fs20Error> {
        let handle = scanner.open(KIND)?;
        info!("Receiver ready (timeout {:?})", config.timeout());
        Ok(Self::with_config(handle, config))
    }

    /// Read and decode one frame
    ///
    /// A timeout or an empty read is [`ProtocolError::InvalidResponse`].
    pub fn next_event(&mut self) -> Result<ReceivedEvent, Fs20Error> {
        let frame = match self.handle.read(KIND.read_endpoint(), KIND.read_len(), self.timeout) {
            Ok(frame) => frame,
            Err(UsbError::Timeout) => {
                return Err(ProtocolError::InvalidResponse("no frame received".to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };
        debug!("PCE -> {:02X?}", frame);

        let (event, version) = parse_frame(&frame)?;
        self.version.set(version);
        Ok(event)
    }

    /// Firmware version, known once a frame has been decoded
    pub fn firmware_version(&self) -> Result<FirmwareVersion, Fs20Error> {
        self.version
            .version()
            .ok_or_else(|| ProtocolError::VersionNotYetKnown.into())
    }

    /// A cloneable handle to the version learned by this receiver
    pub fn version_cell(&self) -> VersionCell {
        self.version.clone()
    }

    /// Discard the frames the adapter has buffered
    ///
    /// Stops at a read timeout, an empty read or after [`MAX_DRAIN_FRAMES`]
    /// frames, and returns the number discarded. Any other USB error is
    /// returned.
    pub fn drain(&mut self) -> Result<usize, Fs20Error> {
        let mut discarded = 0;
        while discarded < MAX_DRAIN_FRAMES {
            let frame = match self.handle.read(KIND.read_endpoint(), KIND.read_len(), self.timeout) {
                Ok(frame) if frame.is_empty() => break,
                Ok(frame) => frame,
                Err(UsbError::Timeout) => break,
                Err(e) => return Err(e.into()),
            };
            trace!("discarding {:02X?}", frame);
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Drained {} buffered frame(s)", discarded);
        }
        Ok(discarded)
    }
}
