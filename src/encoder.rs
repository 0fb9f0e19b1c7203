use crate::capacity::Capacity;
use crate::crypto::{self, SEALED_OVERHEAD};
use crate::{bits, effective_password, lsb, Carrier, Frame, Result, StegoError};
use log::debug;
use std::io::{BufRead, Seek, Write};

/// What the caller gets to see about an embedding besides the image itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    /// Frame bits as a share of all embeddable bits, 0-100.
    pub capacity_used_percent: f64,
    pub encryption_used: bool,
    /// Embedded body size: the message, or salt + nonce + ciphertext + tag.
    pub message_size_bytes: usize,
}

#[derive(Debug, Default)]
pub struct Encoder {}

impl Encoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Hides `message` in `cover_image` and writes the stego image to
    /// `output` as PNG. Nothing is written on failure.
    pub fn encode<R: BufRead + Seek, W: Write + Seek>(
        &self,
        cover_image: R,
        message: &str,
        password: Option<&str>,
        output: &mut W,
    ) -> Result<EncodeSummary> {
        let mut carrier = Carrier::read(cover_image)?;
        let summary = self.encode_carrier(&mut carrier, message, password)?;
        carrier.write_png(output)?;
        Ok(summary)
    }

    pub fn encode_carrier(
        &self,
        carrier: &mut Carrier,
        message: &str,
        password: Option<&str>,
    ) -> Result<EncodeSummary> {
        if message.is_empty() {
            return Err(StegoError::EmptyMessage);
        }

        let password = effective_password(password);
        let capacity = Capacity::of(carrier);

        // Checked before key derivation, which is the expensive part.
        let overhead = if password.is_some() { SEALED_OVERHEAD } else { 0 };
        let needed = message.len() + overhead;
        if needed > capacity.max_bytes {
            return Err(StegoError::CapacityExceeded {
                needed,
                available: capacity.max_bytes,
            });
        }

        let frame = match password {
            Some(password) => {
                let sealed = crypto::encrypt(message.as_bytes(), password)?;
                Frame::encrypted(sealed.to_bytes())
            }
            None => Frame::plain(message.as_bytes().to_vec()),
        };

        let payload = bits::pack(&frame)?;
        lsb::embed(carrier, &payload)?;

        let summary = EncodeSummary {
            capacity_used_percent: 100.0 * payload.len() as f64 / carrier.embeddable_bits() as f64,
            encryption_used: frame.encrypted,
            message_size_bytes: frame.body.len(),
        };

        debug!("encode summary: {:?}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn carrier(width: u32, height: u32) -> Carrier {
        Carrier::from_rgb(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 3) as u8, (y * 5) as u8, ((x + y) * 7) as u8])
        }))
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let mut c = carrier(10, 10);
        let original = c.clone();
        let result = Encoder::new().encode_carrier(&mut c, "", None);
        assert!(matches!(result, Err(StegoError::EmptyMessage)));
        assert_eq!(original, c);
    }

    #[test]
    fn test_summary_for_plain_message() {
        let mut c = carrier(20, 20);
        let message = "The quick brown fox jumps over a dog.";
        assert_eq!(37, message.len());

        let summary = Encoder::new().encode_carrier(&mut c, message, None).unwrap();
        assert!(!summary.encryption_used);
        assert_eq!(37, summary.message_size_bytes);
        // (5 + 37) * 8 bits of 20 * 20 * 3
        assert!((summary.capacity_used_percent - 28.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_for_encrypted_message() {
        let mut c = carrier(20, 20);
        let summary = Encoder::new()
            .encode_carrier(&mut c, "thirty-seven bytes of secret message!", Some("pw"))
            .unwrap();
        assert!(summary.encryption_used);
        assert_eq!(37 + SEALED_OVERHEAD, summary.message_size_bytes);
    }

    #[test]
    fn test_blank_password_means_plain() {
        let mut c = carrier(10, 10);
        let summary = Encoder::new().encode_carrier(&mut c, "hi", Some("   ")).unwrap();
        assert!(!summary.encryption_used);
        assert_eq!(2, summary.message_size_bytes);
    }

    #[test]
    fn test_oversized_message_leaves_carrier_untouched() {
        let mut c = carrier(10, 10);
        let original = c.clone();
        // 300 bits -> 37 bytes -> 32 usable
        let result = Encoder::new().encode_carrier(&mut c, &"x".repeat(33), None);
        assert!(matches!(
            result,
            Err(StegoError::CapacityExceeded {
                needed: 33,
                available: 32
            })
        ));
        assert_eq!(original, c);
    }

    #[test]
    fn test_encrypted_bound_is_tighter() {
        let mut c = carrier(10, 10);
        let result = Encoder::new().encode_carrier(&mut c, "fits in plain", Some("pw"));
        assert!(matches!(
            result,
            Err(StegoError::CapacityExceeded { available: 32, .. })
        ));
    }
}
