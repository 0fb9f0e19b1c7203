//! Least-significant-bit embedding.
//!
//! Bits are laid out in row-major pixel order and, within a pixel, over the
//! R, G and B channels in that order. Alpha is skipped. Embed and extract
//! walk the exact same sequence.

use crate::byte_encodings;
use crate::carrier::EMBED_CHANNELS;
use crate::{Capacity, Carrier, Result, StegoError, HEADER_LENGTH};
use log::debug;

fn channel_bytes(carrier: &Carrier) -> impl Iterator<Item = &u8> {
    carrier
        .pixels()
        .chunks_exact(carrier.channels())
        .flat_map(|px| px[..EMBED_CHANNELS].iter())
}

/// Writes the packed frame `bits` into the carrier. Nothing is modified when
/// the carrier is too small.
pub fn embed(carrier: &mut Carrier, bits: &[u8]) -> Result<()> {
    let available = carrier.embeddable_bits();
    let utilisation = (bits.len() as f64 / available as f64) * 100.0;
    debug!(
        "carrier bits: {}, payload bits: {}, utilisation: {:.4}%",
        available,
        bits.len(),
        utilisation
    );

    if bits.len() > available {
        return Err(StegoError::CapacityExceeded {
            needed: ((bits.len() + 7) / 8).saturating_sub(HEADER_LENGTH),
            available: Capacity::of(carrier).max_bytes,
        });
    }

    let channels = carrier.channels();
    carrier
        .pixels_mut()
        .chunks_exact_mut(channels)
        .flat_map(|px| px[..EMBED_CHANNELS].iter_mut())
        .zip(bits)
        .for_each(|(channel, bit)| {
            *channel = byte_encodings::zip_bit(*channel, *bit);
        });

    Ok(())
}

/// Reads up to `max_bits` bits from the start of the carrier.
pub fn extract(carrier: &Carrier, max_bits: usize) -> Vec<u8> {
    extract_range(carrier, 0, max_bits)
}

/// Reads up to `count` bits starting `offset` bits in. Fewer are returned
/// when the carrier runs out.
pub fn extract_range(carrier: &Carrier, offset: usize, count: usize) -> Vec<u8> {
    channel_bytes(carrier)
        .skip(offset)
        .take(count)
        .map(|channel| channel & 0x01)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_embed_order_is_rgb_row_major() {
        let mut carrier = Carrier::from_rgb(RgbImage::from_pixel(2, 2, Rgb([0x10, 0x10, 0x10])));
        embed(&mut carrier, &[1, 0, 1, 1, 1, 0, 0, 1]).unwrap();
        assert_eq!(
            &[0x11, 0x10, 0x11, 0x11, 0x11, 0x10, 0x10, 0x11, 0x10, 0x10, 0x10, 0x10],
            carrier.pixels()
        );
    }

    #[test]
    fn test_alpha_is_never_touched() {
        let mut carrier =
            Carrier::from_rgba(RgbaImage::from_pixel(2, 2, Rgba([0xFE, 0xFE, 0xFE, 0xFE])));
        embed(&mut carrier, &[1; 12]).unwrap();
        for px in carrier.pixels().chunks_exact(4) {
            assert_eq!(&[0xFF, 0xFF, 0xFF, 0xFE], px);
        }
    }

    #[test]
    fn test_extract_mirrors_embed() {
        let mut carrier =
            Carrier::from_rgba(RgbaImage::from_fn(5, 5, |x, y| Rgba([x as u8, y as u8, 7, 200])));
        let bits: Vec<u8> = (0..60).map(|i| ((i * 7) % 3 == 0) as u8).collect();
        embed(&mut carrier, &bits).unwrap();
        assert_eq!(bits, extract(&carrier, bits.len()));
        assert_eq!(bits[20..35].to_vec(), extract_range(&carrier, 20, 15));
    }

    #[test]
    fn test_extract_stops_at_carrier_end() {
        let carrier = Carrier::from_rgb(RgbImage::from_pixel(2, 1, Rgb([1, 1, 1])));
        assert_eq!(vec![1; 6], extract(&carrier, 100));
        assert_eq!(vec![1; 2], extract_range(&carrier, 4, 100));
    }

    #[test]
    fn test_oversized_payload_leaves_carrier_untouched() {
        // 4x4 px = 48 bits: the header plus a single body byte
        let mut carrier = Carrier::from_rgb(RgbImage::from_pixel(4, 4, Rgb([0x80, 0x80, 0x80])));
        let original = carrier.clone();
        let result = embed(&mut carrier, &[1; 57]);
        assert!(matches!(
            result,
            Err(StegoError::CapacityExceeded {
                needed: 3,
                available: 1
            })
        ));
        assert_eq!(original, carrier);
    }

    #[test]
    fn test_every_channel_changes_by_at_most_one() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 255]));
        let original = Carrier::from_rgb(img);
        let mut carrier = original.clone();
        let bits: Vec<u8> = (0..original.embeddable_bits()).map(|i| (i % 2) as u8).collect();
        embed(&mut carrier, &bits).unwrap();
        for (before, after) in original.pixels().iter().zip(carrier.pixels()) {
            assert!((*before as i16 - *after as i16).abs() <= 1);
        }
    }
}
