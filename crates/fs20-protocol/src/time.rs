//! FS20 time values
//!
//! Durations between 0.25 s and 4 h 16 min are carried in one byte using a
//! floating-point style encoding:
//!
//! ```text
//!   7   4 3   0
//! [ exp  | count ]     seconds = 2^exp * count * 0.25
//! ```
//!
//! `0x01` is 0.25 s, `0x2A` is 10 s and `0xCF` is 15360 s (4 h 16 min).
//! Encoding is a quantization: the exponent is chosen from the magnitude and
//! the count is rounded down to the next step. Several bytes decode to the
//! same duration (`0x02` and `0x11` are both 0.5 s); the encoder always
//! produces the canonical one.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CodecError;

/// Largest representable duration in seconds (4 h 16 min)
pub const MAX_SECONDS: f64 = 15360.0;

/// Smallest step of the encoding in seconds
pub const STEP_SECONDS: f64 = 0.25;

const MICROS_PER_STEP: u32 = 250_000;
const MICROS_HALF_STEP: u32 = MICROS_PER_STEP / 2;

/// Decode a time byte into seconds
pub fn byte_to_seconds(value: u8) -> f64 {
    let exponent = i32::from(value >> 4);
    let count = f64::from(value & 0x0F);
    2f64.powi(exponent) * count * STEP_SECONDS
}

/// Encode seconds into a time byte
///
/// Fails with [`CodecError::UnsupportedDuration`] for negative, non-finite or
/// too large values.
pub fn seconds_to_byte(seconds: f64) -> Result<u8, CodecError> {
    if !seconds.is_finite() || !(0.0..=MAX_SECONDS).contains(&seconds) {
        return Err(CodecError::UnsupportedDuration(format!(
            "{} s (0-{} s expected)",
            seconds, MAX_SECONDS
        )));
    }
    if seconds == 0.0 {
        return Ok(0);
    }

    let exponent = (seconds.log2().floor() as i32 - 1).max(0);
    let step = 2f64.powi(exponent) * STEP_SECONDS;
    let count = (seconds / step).floor() as u8;

    Ok(((exponent as u8) << 4) | (count & 0x0F))
}

/// Format a time byte as `HH:MM:S.mmm`
pub fn byte_to_time_string(value: u8) -> String {
    let millis = (byte_to_seconds(value) * 1000.0).round() as u64;
    format!(
        "{:02}:{:02}:{}.{:03}",
        millis / 3_600_000,
        millis / 60_000 % 60,
        millis / 1000 % 60,
        millis % 1000
    )
}

/// Parse an `H:M:S.f` string into a time byte
pub fn time_string_to_byte(text: &str) -> Result<u8, CodecError> {
    let clock: WallClock = text.parse()?;
    seconds_to_byte(clock.to_quarter_seconds())
}

/// Wall-clock style duration input (`H:M:S.f`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WallClock {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub micros: u32,
}

impl WallClock {
    /// Total seconds snapped onto the 0.25 s grid
    ///
    /// A fraction rounds up to the next quarter once it is more than 1/8 s past
    /// a step boundary. Any nonzero input yields at least one quarter second.
    pub fn to_quarter_seconds(&self) -> f64 {
        let whole =
            u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds);
        let mut quarters = whole * 4 + u64::from(self.micros / MICROS_PER_STEP);
        if self.micros % MICROS_PER_STEP > MICROS_HALF_STEP {
            quarters += 1;
        }
        if quarters == 0 && self.micros > 0 {
            quarters = 1;
        }
        quarters as f64 * STEP_SECONDS
    }
}

impl FromStr for WallClock {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CodecError::UnsupportedDuration(format!("malformed time '{}'", s));

        let parts: Vec<&str> = s.trim().split(':').collect();
        let [hours, minutes, rest] = parts[..] else {
            return Err(malformed());
        };
        let (seconds, fraction) = rest.split_once('.').unwrap_or((rest, ""));

        let number = |field: &str| -> Result<u32, CodecError> {
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            field.parse().map_err(|_| malformed())
        };

        if fraction.len() > 6 {
            return Err(malformed());
        }
        let micros = if fraction.is_empty() {
            0
        } else {
            number(fraction)? * 10u32.pow(6 - fraction.len() as u32)
        };

        let clock = WallClock {
            hours: number(hours)?,
            minutes: number(minutes)?,
            seconds: number(seconds)?,
            micros,
        };

        if clock.minutes >= 60 || clock.seconds >= 60 {
            return Err(malformed());
        }
        Ok(clock)
    }
}

/// An encoded FS20 time value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeCode(u8);

impl TimeCode {
    /// No time (the reserved all-zero byte)
    pub const ZERO: TimeCode = TimeCode(0);

    /// Longest representable time, 4 h 16 min
    pub const MAX: TimeCode = TimeCode(0xCF);

    /// Wrap a raw time byte
    pub const fn from_byte(value: u8) -> Self {
        Self(value)
    }

    /// Quantize seconds into a time code
    pub fn from_seconds(seconds: f64) -> Result<Self, CodecError> {
        seconds_to_byte(seconds).map(Self)
    }

    /// Raw byte as written on the wire
    pub const fn byte(&self) -> u8 {
        self.0
    }

    /// Decoded duration in seconds
    pub fn seconds(&self) -> f64 {
        byte_to_seconds(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.seconds() == 0.0
    }

    /// Decoded duration
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds())
    }
}

impl TryFrom<Duration> for TimeCode {
    type Error = CodecError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        Self::from_seconds(duration.as_secs_f64())
    }
}

impl FromStr for TimeCode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time_string_to_byte(s).map(Self)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&byte_to_time_string(self.0))
    }
}
