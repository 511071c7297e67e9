//! Error types for FS20 encoding and decoding

use thiserror::Error;

/// Errors raised while converting between domain values and wire bytes
///
/// These are always detected before any adapter I/O takes place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Malformed address text or wrong byte width
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Opcode that does not belong to any command
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Command name missing from the command table
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Requested variant of a command group is not populated
    #[error("unknown command group {index} ({})", if *timed { "with time" } else { "without time" })]
    UnknownCommandGroup { index: u8, timed: bool },

    /// Duration outside 0..=15360 seconds, or not a finite number
    #[error("unsupported duration: {0}")]
    UnsupportedDuration(String),

    /// Repeat interval outside 1..=255
    #[error("invalid interval {0} (1-255 expected)")]
    InvalidInterval(u32),
}

/// Errors raised while talking to an adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Codec error
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Malformed, absent or timed-out reply from the adapter
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The transmitter did not recognize the data frame it was sent
    #[error("unknown data frame sent to device")]
    UnknownDataframe,

    /// The transmitter recognized the frame but could not handle its contents
    #[error("device can not handle data frame")]
    MismatchedDataframe,

    /// The receiver reports its version only alongside a received event
    #[error("version only available after receiving commands")]
    VersionNotYetKnown,
}

impl ProtocolError {
    /// Returns true for replies that carried nothing usable
    ///
    /// Pollers treat these as "no event this cycle".
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}
