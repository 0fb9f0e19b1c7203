use crate::crypto::SEALED_OVERHEAD;
use crate::{Carrier, HEADER_LENGTH};
use serde::Serialize;

/// How much message a carrier can take, recomputed for every request.
///
/// `max_bytes` is the plaintext headline figure. An encrypted message has
/// [`SEALED_OVERHEAD`] fewer bytes available, see [`Capacity::max_encrypted_bytes`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Capacity {
    pub max_bytes: usize,
    pub max_kb: f64,
    pub width: u32,
    pub height: u32,
    pub total_pixels: usize,
    /// Embeddable bits, R, G and B of every pixel.
    pub total_bits: usize,
}

impl Capacity {
    pub fn of(carrier: &Carrier) -> Self {
        let total_bits = carrier.embeddable_bits();
        let max_bytes = max_body_bytes(total_bits);
        Self {
            max_bytes,
            max_kb: (max_bytes as f64 / 1024.0 * 100.0).round() / 100.0,
            width: carrier.width(),
            height: carrier.height(),
            total_pixels: carrier.width() as usize * carrier.height() as usize,
            total_bits,
        }
    }

    pub fn max_encrypted_bytes(&self) -> usize {
        self.max_bytes.saturating_sub(SEALED_OVERHEAD)
    }
}

fn max_body_bytes(embeddable_bits: usize) -> usize {
    (embeddable_bits / 8).saturating_sub(HEADER_LENGTH)
}
