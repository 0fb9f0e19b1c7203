//! Serialise frames to and from a flat bit sequence.
//!
//! A bit sequence is a `Vec<u8>` holding one bit (0 or 1) per element,
//! most significant bit of each byte first. Layout:
//!
//! ```text
//! [8 bits ] encryption flag (0 or 1)
//! [32 bits] body length in bytes, big-endian
//! [N bits ] body
//! ```

use crate::byte_encodings;
use crate::{Frame, FrameHeader, Result, StegoError, HEADER_BITS, HEADER_LENGTH};
use log::debug;

pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for b in bytes {
        out.extend_from_slice(&byte_encodings::split_byte(*b));
    }
    out
}

/// Trailing bits that do not fill a whole byte are dropped.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(byte_encodings::merge_bits)
        .collect()
}

pub fn pack(frame: &Frame) -> Result<Vec<u8>> {
    let header = frame.header()?;
    debug!("pack header: {:?}", header);

    let raw_header: [u8; HEADER_LENGTH] = header.into();

    let mut out = Vec::with_capacity(frame.bit_len());
    out.extend(bytes_to_bits(&raw_header));
    out.extend(bytes_to_bits(&frame.body));
    Ok(out)
}

/// Parse only the header. Needs at least [`HEADER_BITS`] bits.
pub fn unpack_header(bits: &[u8]) -> Result<FrameHeader> {
    if bits.len() < HEADER_BITS {
        return Err(StegoError::TruncatedFrame {
            needed: HEADER_BITS,
            available: bits.len(),
        });
    }

    let raw: [u8; HEADER_LENGTH] = bits_to_bytes(&bits[..HEADER_BITS])
        .try_into()
        .map_err(|_| StegoError::TruncatedFrame {
            needed: HEADER_BITS,
            available: bits.len(),
        })?;

    FrameHeader::try_from(raw)
}

/// The body length is checked against the bits actually present before any
/// of the body is read. Bits beyond the frame end are ignored.
pub fn unpack(bits: &[u8]) -> Result<Frame> {
    let header = unpack_header(bits)?;
    debug!("unpack header: {:?}", header);

    let needed = header.frame_bits();
    if bits.len() < needed {
        return Err(StegoError::TruncatedFrame {
            needed,
            available: bits.len(),
        });
    }

    Ok(Frame {
        encrypted: header.encrypted,
        body: bits_to_bytes(&bits[HEADER_BITS..needed]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        let bits = pack(&Frame::plain(vec![0xA5])).unwrap();
        assert_eq!(48, bits.len());
        // flag
        assert_eq!(vec![0u8; 8], bits[0..8].to_vec());
        // length = 1
        assert_eq!(bytes_to_bits(&[0, 0, 0, 1]), bits[8..40].to_vec());
        assert_eq!(vec![1, 0, 1, 0, 0, 1, 0, 1], bits[40..48].to_vec());
    }

    #[test]
    fn test_unpack_ignores_trailing_bits() {
        let frame = Frame::plain(b"hidden".to_vec());
        let mut bits = pack(&frame).unwrap();
        bits.extend_from_slice(&[1, 0, 1, 1, 0, 0, 1]);
        assert_eq!(frame, unpack(&bits).unwrap());
    }

    #[test]
    fn test_unpack_short_header() {
        let result = unpack(&[0u8; 12]);
        assert!(matches!(
            result,
            Err(StegoError::TruncatedFrame {
                needed: 40,
                available: 12
            })
        ));
    }

    #[test]
    fn test_unpack_length_beyond_available_bits() {
        let mut bits = bytes_to_bits(&[0, 0, 0, 0, 200]);
        bits.extend(bytes_to_bits(b"too short"));
        let result = unpack(&bits);
        assert!(matches!(
            result,
            Err(StegoError::TruncatedFrame { needed: 1640, .. })
        ));
    }

    #[test]
    fn test_unpack_header_from_encrypted_frame() {
        let frame = Frame::encrypted(vec![7u8; 60]);
        let bits = pack(&frame).unwrap();
        let header = unpack_header(&bits[..HEADER_BITS]).unwrap();
        assert!(header.encrypted);
        assert_eq!(60, header.length);
    }

    #[test]
    fn test_bits_to_bytes_drops_partial_byte() {
        assert_eq!(vec![0xFF], bits_to_bytes(&[1, 1, 1, 1, 1, 1, 1, 1, 1, 1]));
    }
}
