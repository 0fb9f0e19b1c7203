use thiserror::Error;

pub type Result<T> = std::result::Result<T, StegoError>;

/// Every way an encode, decode or capacity request can fail.
///
/// None of these are retryable without a changed input.
#[derive(Debug, Error)]
pub enum StegoError {
    #[error("Invalid file format. Allowed: PNG, BMP, JPEG")]
    UnsupportedFormat,

    #[error("Corrupt image: {0}")]
    CorruptImage(String),

    #[error("Image too small: {width}x{height} cannot hold a message header")]
    CarrierTooSmall { width: u32, height: u32 },

    #[error("Message must not be empty")]
    EmptyMessage,

    /// Sizes are message body bytes, the 5-byte frame header excluded.
    #[error(
        "Message too large. Max capacity: {:.2} KB, Message size: {:.2} KB",
        kilobytes(.available),
        kilobytes(.needed)
    )]
    CapacityExceeded { needed: usize, available: usize },

    /// Sizes are in bits.
    #[error("truncated frame: need {needed} bits, only {available} available")]
    TruncatedFrame { needed: usize, available: usize },

    #[error("invalid frame length: {0}")]
    InvalidLength(u32),

    #[error("invalid frame flag: {0:#04x}")]
    InvalidFlag(u8),

    #[error("No hidden message found in image")]
    NoHiddenMessage,

    #[error("Message is encrypted, a password is required")]
    PasswordRequired,

    /// Wrong password and tampered ciphertext are deliberately indistinguishable.
    #[error("Invalid password or corrupted data")]
    InvalidPassword,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("could not write output image: {0}")]
    ImageEncoding(String),
}

fn kilobytes(bytes: &usize) -> f64 {
    *bytes as f64 / 1024.0
}

impl From<image::ImageError> for StegoError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(_) => StegoError::UnsupportedFormat,
            other => StegoError::CorruptImage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_substrings() {
        assert!(StegoError::NoHiddenMessage
            .to_string()
            .contains("No hidden message"));
        assert!(StegoError::InvalidPassword
            .to_string()
            .contains("Invalid password"));
    }

    #[test]
    fn test_capacity_exceeded_message() {
        let err = StegoError::CapacityExceeded {
            needed: 2048,
            available: 1024,
        };
        assert_eq!(
            "Message too large. Max capacity: 1.00 KB, Message size: 2.00 KB",
            err.to_string()
        );
    }
}
