//! ChaCha20-Poly1305 sealing of entry payloads.
//!
//! A wrong key or any modified byte makes [`decrypt`] fail rather than return
//! altered plaintext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

/// ChaCha20-Poly1305 nonce length.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length, appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// A sealed payload: the nonce it was sealed with and `ciphertext || tag`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Encoded length of [`to_bytes`](Self::to_bytes).
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    /// True only for a layout with no ciphertext. [`encrypt`] never
    /// produces one.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// `nonce || ciphertext`, the layout stored inside a blob after the salt.
    pub fn to_bytes(&self) -> Vec<u8> {
        [self.nonce.as_slice(), self.ciphertext.as_slice()].concat()
    }

    /// Inverse of [`to_bytes`](Self::to_bytes). Anything shorter than a nonce
    /// plus a tag cannot be a sealed payload.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::InvalidBlob(format!(
                "sealed payload is {} bytes, need at least {}",
                bytes.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let nonce: [u8; NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| CryptoError::InvalidBlob("bad nonce length".to_string()))?;
        Ok(Self {
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

fn aead(key: &DerivedKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(key.as_bytes().into())
}

/// Seals `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = aead(key)
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let nonce: [u8; NONCE_SIZE] = nonce
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Encryption("bad nonce length".to_string()))?;
    Ok(EncryptedData { nonce, ciphertext })
}

/// Opens a sealed payload. Fails on a wrong key or tampered data.
pub fn decrypt(key: &DerivedKey, sealed: &EncryptedData) -> CryptoResult<Vec<u8>> {
    aead(key)
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| CryptoError::Decryption("authentication failed".to_string()))
}
