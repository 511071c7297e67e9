//! Error types for adapter drivers

use fs20_detect::{DetectError, UsbError};
use fs20_protocol::{CodecError, ProtocolError};
use thiserror::Error;

/// Errors that can occur while driving FS20 adapters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fs20Error {
    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Adapter detection error
    #[error("detection error: {0}")]
    Detect(#[from] DetectError),

    /// USB transfer error outside an acknowledgement read
    #[error("USB error: {0}")]
    Usb(#[from] UsbError),

    /// Device is blocked against sending
    #[error("device {0} is blocked")]
    DeviceBlocked(String),

    /// Configuration could not be read or written
    #[error("configuration error: {0}")]
    Config(String),

    /// Dispatcher worker thread could not be started or joined
    #[error("worker error: {0}")]
    Worker(String),
}

impl From<CodecError> for Fs20Error {
    fn from(e: CodecError) -> Self {
        Fs20Error::Protocol(ProtocolError::Codec(e))
    }
}

impl Fs20Error {
    /// Returns the codec error, if this is one
    pub fn as_codec(&self) -> Option<&CodecError> {
        match self {
            Fs20Error::Protocol(ProtocolError::Codec(e)) => Some(e),
            _ => None,
        }
    }
}
