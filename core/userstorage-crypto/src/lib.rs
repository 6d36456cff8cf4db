//! Encryption layer for encrypted user storage.
//!
//! Two independent derivations hang off the caller's [`RootSecret`]:
//!
//! - **Entry identifiers**: HMAC-SHA256, deterministic, used as the remote
//!   index so the service never sees plaintext paths.
//! - **Payload key**: Argon2id, used with ChaCha20-Poly1305 to encrypt entry
//!   values into self-describing [`EncryptedBlob`]s.
//!
//! # Example
//!
//! ```
//! use userstorage_crypto::{derive_entry_id, KdfParams, PayloadCipher, RootSecret, SecretCipher};
//! use userstorage_schema::StoragePath;
//!
//! let secret = RootSecret::from("correct horse battery staple");
//! let path = StoragePath::parse("notifications.notification_settings").unwrap();
//!
//! let id = derive_entry_id(&path, &secret).unwrap();
//! assert_eq!(id.to_hex().len(), 64);
//!
//! let cipher = SecretCipher::new(KdfParams { memory_cost: 1024, time_cost: 1, parallelism: 1 });
//! let blob = cipher.encrypt(b"on", &secret).unwrap();
//! assert_eq!(cipher.decrypt(&blob, &secret).unwrap(), b"on");
//! ```

mod blob;
mod cipher;
mod encryptor;
mod error;
mod identifier;
mod key;
mod key_cache;

pub use blob::{EncryptedBlob, BLOB_KDF, BLOB_VERSION};
pub use cipher::{decrypt, encrypt, EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use encryptor::{PayloadCipher, SecretCipher};
pub use error::{CryptoError, CryptoResult};
pub use identifier::{derive_entry_id, EntryIdentifier, IdentifierKey, IDENTIFIER_SIZE};
pub use key::{derive_key, DerivedKey, KdfParams, RootSecret, Salt, KEY_SIZE, SALT_SIZE, SHARED_SALT};
pub use key_cache::{KeyCache, DEFAULT_KEY_CACHE_CAPACITY};
