//! FS20 device addresses
//!
//! An address is written as three groups of four digits, each digit in
//! `1..=4`, e.g. `1234-1111-4321`. On the wire it takes one of two forms:
//!
//! ```text
//! packed (transmitter):  [G1] [G2] [G3]               1 byte per group
//! BCD (receiver):        [G1a G1b] [G2a G2b] [G3a G3b] 2 bytes per group
//! ```
//!
//! In the packed form every digit becomes two bits (`digit - 1`), most
//! significant digit first, so `1111` is `0x00` and `4444` is `0xFF`.
//! In the BCD form each byte carries two digits as nibbles, so `1234` is
//! `0x12 0x34`.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Separator between the three address groups
pub const DELIMITER: char = '-';

/// Number of digits in one address group
pub const GROUP_DIGITS: usize = 4;

/// Width of the packed (transmit) form
pub const PACKED_LEN: usize = 3;

/// Width of the BCD (receive) form
pub const BCD_LEN: usize = 6;

/// Address of an FS20 device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    raw: [u8; PACKED_LEN],
}

impl Address {
    /// Create an address from its packed bytes
    ///
    /// Every byte value is a valid group, so this cannot fail.
    pub const fn from_packed(raw: [u8; PACKED_LEN]) -> Self {
        Self { raw }
    }

    /// Packed form as written into transmit frames
    pub const fn to_packed(&self) -> [u8; PACKED_LEN] {
        self.raw
    }

    /// Decode the 6-byte BCD form reported by the receiver
    pub fn from_bcd(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != BCD_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "{} BCD bytes given ({} expected)",
                bytes.len(),
                BCD_LEN
            )));
        }

        let mut raw = [0u8; PACKED_LEN];
        for (group, pair) in raw.iter_mut().zip(bytes.chunks_exact(2)) {
            let mut value = 0u8;
            for byte in pair {
                for digit in [byte >> 4, byte & 0x0F] {
                    if !(1..=4).contains(&digit) {
                        return Err(CodecError::InvalidAddress(format!(
                            "BCD digit {} out of range in {:02X?}",
                            digit, bytes
                        )));
                    }
                    value = (value << 2) | (digit - 1);
                }
            }
            *group = value;
        }

        Ok(Self { raw })
    }

    /// BCD form as reported by the receiver
    pub fn to_bcd(&self) -> [u8; BCD_LEN] {
        let mut out = [0u8; BCD_LEN];
        for (i, &group) in self.raw.iter().enumerate() {
            let digits = group_digits(group);
            out[i * 2] = (digits[0] << 4) | digits[1];
            out[i * 2 + 1] = (digits[2] << 4) | digits[3];
        }
        out
    }

    /// The three groups in text form
    pub fn groups(&self) -> [String; 3] {
        self.raw.map(byte_to_group)
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split(DELIMITER).collect();
        if groups.len() != PACKED_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "'{}' has {} groups ({} expected)",
                s,
                groups.len(),
                PACKED_LEN
            )));
        }

        let mut raw = [0u8; PACKED_LEN];
        for (byte, group) in raw.iter_mut().zip(groups) {
            *byte = group_to_byte(group)?;
        }

        Ok(Self { raw })
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; PACKED_LEN] = bytes.try_into().map_err(|_| {
            CodecError::InvalidAddress(format!(
                "{} bytes given ({} expected)",
                bytes.len(),
                PACKED_LEN
            ))
        })?;
        Ok(Self { raw })
    }
}

impl From<[u8; PACKED_LEN]> for Address {
    fn from(raw: [u8; PACKED_LEN]) -> Self {
        Self::from_packed(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.groups();
        write!(f, "{}{}{}{}{}", a, DELIMITER, b, DELIMITER, c)
    }
}

/// Returns true if `group` is four digits, each in `1..=4`
pub fn is_valid_group(group: &str) -> bool {
    group.len() == GROUP_DIGITS && group.bytes().all(|b| (b'1'..=b'4').contains(&b))
}

/// Pack one four-digit group into a byte
pub fn group_to_byte(group: &str) -> Result<u8, CodecError> {
    if !is_valid_group(group) {
        return Err(CodecError::InvalidAddress(format!(
            "invalid address group '{}'",
            group
        )));
    }

    Ok(group
        .bytes()
        .fold(0u8, |acc, digit| (acc << 2) | (digit - b'1')))
}

/// Unpack a byte into its four-digit group
pub fn byte_to_group(value: u8) -> String {
    group_digits(value)
        .iter()
        .map(|d| char::from(b'0' + d))
        .collect()
}

fn group_digits(value: u8) -> [u8; GROUP_DIGITS] {
    [6u8, 4, 2, 0].map(|shift| ((value >> shift) & 0x03) + 1)
}
