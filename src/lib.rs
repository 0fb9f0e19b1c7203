//! Hide text messages in the least-significant bits of image pixels, with
//! optional password-based AES-256-GCM encryption of the message.
//!
//! ```rust,ignore
//! use std::io::Cursor;
//! use stegocrypt::{decoder::Decoder, encoder::Encoder};
//!
//! let cover = std::fs::read("cover.png")?;
//! let mut stego = Vec::new();
//! let summary = Encoder::new().encode(Cursor::new(cover), "hello", Some("pw"), &mut stego)?;
//! let decoded = Decoder::new().decode(Cursor::new(stego), Some("pw"))?;
//! assert_eq!("hello", decoded.message);
//! ```

pub mod bits;
pub mod capacity;
pub mod carrier;
pub mod config;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod lsb;
pub mod server;

pub use capacity::Capacity;
pub use carrier::Carrier;
pub use decoder::{DecodeOutcome, Decoder};
pub use encoder::{EncodeSummary, Encoder};
pub use error::{Result, StegoError};

/// Flag byte plus big-endian u32 body length.
pub const HEADER_LENGTH: usize = 5;
pub const HEADER_BITS: usize = HEADER_LENGTH * 8;

const FLAG_PLAIN: u8 = 0;
const FLAG_ENCRYPTED: u8 = 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameHeader {
    pub encrypted: bool,
    pub length: u32,
}

impl FrameHeader {
    pub fn body_bits(&self) -> usize {
        (self.length as usize).saturating_mul(8)
    }

    pub fn frame_bits(&self) -> usize {
        HEADER_BITS.saturating_add(self.body_bits())
    }
}

impl TryFrom<[u8; HEADER_LENGTH]> for FrameHeader {
    type Error = StegoError;

    fn try_from(data: [u8; HEADER_LENGTH]) -> Result<Self> {
        let encrypted = match data[0] {
            FLAG_PLAIN => false,
            FLAG_ENCRYPTED => true,
            other => return Err(StegoError::InvalidFlag(other)),
        };

        let length = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);

        if length == 0 || (encrypted && (length as usize) < crypto::SEALED_OVERHEAD) {
            return Err(StegoError::InvalidLength(length));
        }

        Ok(FrameHeader { encrypted, length })
    }
}

impl From<FrameHeader> for [u8; HEADER_LENGTH] {
    fn from(header: FrameHeader) -> Self {
        let mut raw: [u8; HEADER_LENGTH] = [0; HEADER_LENGTH];
        raw[0] = if header.encrypted {
            FLAG_ENCRYPTED
        } else {
            FLAG_PLAIN
        };
        raw[1..].copy_from_slice(&header.length.to_be_bytes());
        raw
    }
}

/// The unit that gets embedded. `body` is either UTF-8 plaintext or
/// `salt || nonce || ciphertext-with-tag`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    pub encrypted: bool,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn plain(body: Vec<u8>) -> Self {
        Self {
            encrypted: false,
            body,
        }
    }

    pub fn encrypted(body: Vec<u8>) -> Self {
        Self {
            encrypted: true,
            body,
        }
    }

    pub fn header(&self) -> Result<FrameHeader> {
        let length = u32::try_from(self.body.len())
            .map_err(|_| StegoError::InvalidLength(u32::MAX))?;
        Ok(FrameHeader {
            encrypted: self.encrypted,
            length,
        })
    }

    pub fn bit_len(&self) -> usize {
        (HEADER_LENGTH + self.body.len()) * 8
    }
}

/// A blank or whitespace-only password counts as no password.
pub fn effective_password(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.trim().is_empty())
}

mod byte_encodings {
    /// Most significant bit first.
    pub fn split_byte(byte: u8) -> [u8; 8] {
        [
            (byte >> 7) & 0x01,
            (byte >> 6) & 0x01,
            (byte >> 5) & 0x01,
            (byte >> 4) & 0x01,
            (byte >> 3) & 0x01,
            (byte >> 2) & 0x01,
            (byte >> 1) & 0x01,
            byte & 0x01,
        ]
    }

    pub fn zip_bit(left: u8, bit: u8) -> u8 {
        (left & 0xFE) | (bit & 0x01)
    }

    pub fn merge_bits(bits: &[u8]) -> u8 {
        (bits[0] << 7) & 0x80
            | (bits[1] << 6) & 0x40
            | (bits[2] << 5) & 0x20
            | (bits[3] << 4) & 0x10
            | (bits[4] << 3) & 0x08
            | (bits[5] << 2) & 0x04
            | (bits[6] << 1) & 0x02
            | (bits[7] & 0x01)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_split_merge() {
            test_split_merge_byte(0xFF, [1, 1, 1, 1, 1, 1, 1, 1]);
            test_split_merge_byte(0x03, [0, 0, 0, 0, 0, 0, 1, 1]);
            test_split_merge_byte(0x02, [0, 0, 0, 0, 0, 0, 1, 0]);
            test_split_merge_byte(0x01, [0, 0, 0, 0, 0, 0, 0, 1]);
            test_split_merge_byte(0x00, [0, 0, 0, 0, 0, 0, 0, 0]);
            test_split_merge_byte(0x0F, [0, 0, 0, 0, 1, 1, 1, 1]);
            test_split_merge_byte(0x11, [0, 0, 0, 1, 0, 0, 0, 1]);
            test_split_merge_byte(0xEC, [1, 1, 1, 0, 1, 1, 0, 0]);
        }

        #[test]
        fn test_zip_bit() {
            assert_eq!(0xF7, zip_bit(0xF7, 0x1));
            assert_eq!(0xF9, zip_bit(0xF8, 0x1));
            assert_eq!(0xF6, zip_bit(0xF7, 0x0));
            assert_eq!(0x01, zip_bit(0x00, 0x1));
            assert_eq!(0x00, zip_bit(0x01, 0x0));
        }

        fn test_split_merge_byte(input: u8, expected: [u8; 8]) {
            let result = split_byte(input);
            assert_eq!(expected, result);
            assert_eq!(input, merge_bits(&result));
        }
    }
}
