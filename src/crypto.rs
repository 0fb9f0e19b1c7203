//! Password-based authenticated encryption of the message body.
//!
//! The key is PBKDF2-HMAC-SHA256 over the password and a fresh random salt;
//! the cipher is AES-256-GCM with a fresh random nonce. Both are generated per
//! call, so encrypting the same message twice never produces the same bytes.
//! Sealed layout:
//!
//! ```text
//! [16 bytes] PBKDF2 salt
//! [12 bytes] AES-GCM nonce
//! [N bytes ] ciphertext, followed by the 16-byte tag
//! ```

use crate::{Result, StegoError};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Fixed forever: changing it breaks decoding of every existing image.
pub const PBKDF2_ROUNDS: u32 = 600_000;

/// Bytes an encrypted body carries on top of the plaintext.
pub const SEALED_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Per-call key material. The derived key is wiped on drop.
pub struct EncryptionContext {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl EncryptionContext {
    pub fn generate(password: &str) -> Self {
        let mut rng = rand::thread_rng();

        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);

        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        Self::restore(password, salt, nonce)
    }

    pub fn restore(password: &str, salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            salt,
            nonce,
            key: derive_key(password, &salt),
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key[..]))
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed> {
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&self.nonce), plaintext)
            .map_err(|_| StegoError::EncryptionFailed)?;

        Ok(Sealed {
            salt: self.salt,
            nonce: self.nonce,
            ciphertext,
        })
    }

    /// The tag is verified before any plaintext is released.
    pub fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(&self.nonce), ciphertext)
            .map_err(|_| StegoError::InvalidPassword)
    }
}

pub fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut *key);
    key
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Sealed {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Includes the trailing authentication tag.
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        if body.len() < SEALED_OVERHEAD {
            return Err(StegoError::InvalidLength(body.len() as u32));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&body[..SALT_LEN]);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&body[SALT_LEN..SALT_LEN + NONCE_LEN]);

        Ok(Self {
            salt,
            nonce,
            ciphertext: body[SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }
}

pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Sealed> {
    EncryptionContext::generate(password).seal(plaintext)
}

/// Wrong password and tampered data both fail with [`StegoError::InvalidPassword`].
pub fn decrypt(sealed: &Sealed, password: &str) -> Result<Vec<u8>> {
    EncryptionContext::restore(password, sealed.salt, sealed.nonce).open(&sealed.ciphertext)
}
