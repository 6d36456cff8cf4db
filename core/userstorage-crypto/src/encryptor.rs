//! Payload cipher interface.
//!
//! The storage adapter depends on `Arc<dyn PayloadCipher>` and never handles
//! derived keys itself. [`SecretCipher`] is the production implementation.

use crate::blob::EncryptedBlob;
use crate::cipher;
use crate::error::CryptoResult;
use crate::key::{KdfParams, RootSecret, Salt};
use crate::key_cache::KeyCache;

/// Encrypts and decrypts entry payloads under a root secret.
pub trait PayloadCipher: Send + Sync {
    /// Encrypts `plaintext` into a fresh blob (new nonce every call).
    fn encrypt(&self, plaintext: &[u8], secret: &RootSecret) -> CryptoResult<EncryptedBlob>;

    /// Decrypts a blob, failing if authentication does not verify.
    fn decrypt(&self, blob: &EncryptedBlob, secret: &RootSecret) -> CryptoResult<Vec<u8>>;

    /// KDF parameters used for new blobs.
    fn current_params(&self) -> &KdfParams;

    /// Encrypts and renders the envelope string stored remotely.
    fn encrypt_to_string(&self, plaintext: &[u8], secret: &RootSecret) -> CryptoResult<String> {
        self.encrypt(plaintext, secret)?.to_json()
    }

    /// Parses an envelope string and decrypts it.
    fn decrypt_str(&self, encoded: &str, secret: &RootSecret) -> CryptoResult<Vec<u8>> {
        let blob = EncryptedBlob::from_json(encoded)?;
        self.decrypt(&blob, secret)
    }
}

/// Argon2id + ChaCha20-Poly1305 cipher with a derived-key cache.
#[derive(Debug, Default)]
pub struct SecretCipher {
    params: KdfParams,
    keys: KeyCache,
}

impl SecretCipher {
    /// Creates a cipher writing new blobs with `params` and an empty key cache.
    pub fn new(params: KdfParams) -> Self {
        Self {
            params,
            keys: KeyCache::default(),
        }
    }

    /// Derived keys held by this cipher.
    pub fn key_cache(&self) -> &KeyCache {
        &self.keys
    }

    /// Encrypts under an explicit salt instead of the shared one.
    ///
    /// Blobs written this way are reported as stale by
    /// [`EncryptedBlob::is_stale`].
    pub fn encrypt_with_salt(
        &self,
        plaintext: &[u8],
        secret: &RootSecret,
        salt: Salt,
    ) -> CryptoResult<EncryptedBlob> {
        let key = self.keys.get_or_derive(secret, &salt, &self.params)?;
        let data = cipher::encrypt(&key, plaintext)?;
        Ok(EncryptedBlob {
            params: self.params.clone(),
            salt,
            data,
        })
    }
}

impl PayloadCipher for SecretCipher {
    fn encrypt(&self, plaintext: &[u8], secret: &RootSecret) -> CryptoResult<EncryptedBlob> {
        self.encrypt_with_salt(plaintext, secret, Salt::shared())
    }

    fn decrypt(&self, blob: &EncryptedBlob, secret: &RootSecret) -> CryptoResult<Vec<u8>> {
        let key = self.keys.get_or_derive(secret, &blob.salt, &blob.params)?;
        cipher::decrypt(&key, &blob.data)
    }

    fn current_params(&self) -> &KdfParams {
        &self.params
    }
}
