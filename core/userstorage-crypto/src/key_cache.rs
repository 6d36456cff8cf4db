//! In-process cache of Argon2-derived keys.
//!
//! Argon2id is deliberately slow, so decrypting a namespace with dozens of
//! entries would otherwise pay the derivation cost per entry. Keys are cached
//! by (secret fingerprint, salt, params) and never leave memory.

use crate::error::CryptoResult;
use crate::key::{derive_key, DerivedKey, KdfParams, RootSecret, Salt};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::debug;

/// Default number of derived keys kept.
pub const DEFAULT_KEY_CACHE_CAPACITY: usize = 16;

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fingerprint: [u8; 32],
    salt: Salt,
    params: KdfParams,
}

/// Bounded LRU cache of derived payload keys.
pub struct KeyCache {
    cache: Mutex<LruCache<CacheKey, DerivedKey>>,
}

impl KeyCache {
    /// Creates a cache holding at most `capacity` keys (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached key or derives and caches it.
    pub fn get_or_derive(
        &self,
        secret: &RootSecret,
        salt: &Salt,
        params: &KdfParams,
    ) -> CryptoResult<DerivedKey> {
        let cache_key = CacheKey {
            fingerprint: secret.fingerprint(),
            salt: salt.clone(),
            params: params.clone(),
        };

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(key) = cache.get(&cache_key) {
                return Ok(key.clone());
            }
        }

        // Derive outside the lock; a concurrent miss derives the same key twice.
        debug!(shared_salt = salt.is_shared(), "deriving payload key");
        let key = derive_key(secret, salt, params)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(cache_key, key.clone());
        }
        Ok(key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached key.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache").field("len", &self.len()).finish()
    }
}
