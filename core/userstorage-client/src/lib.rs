//! Remote user-storage API client.
//!
//! Layers, bottom up:
//!
//! - **Transport** ([`StorageTransport`]): raw `{HashedKey, Data}` records over
//!   HTTP ([`HttpTransport`]) or in memory ([`MemoryTransport`])
//! - **Adapter** ([`StorageClient`]): path-level get/set/delete that derives
//!   entry identifiers and encrypts/decrypts payloads
//! - **Fixtures** ([`mocks`]): request/response pairs matching the API shape,
//!   for tests
//!
//! # Endpoints
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | GET    | `/api/v1/userstorage/{feature}/{hashedKey}` | |
//! | GET    | `/api/v1/userstorage/{feature}` | |
//! | PUT    | `/api/v1/userstorage/{feature}/{hashedKey}` | `{"Data": blob}` |
//! | PUT    | `/api/v1/userstorage/{feature}` | `{"Data": {hashedKey: blob}}` |
//! | PUT    | `/api/v1/userstorage/{feature}` | `{"batch_delete": [hashedKey]}` |
//! | DELETE | `/api/v1/userstorage/{feature}/{hashedKey}` | |
//! | DELETE | `/api/v1/userstorage/{feature}` | |

mod adapter;
pub mod api;
mod config;
mod error;
mod http;
mod memory;
pub mod mocks;
mod transport;

pub use adapter::{DecryptedEntry, EntryRead, SealedEntry, StorageClient};
pub use api::StorageRecord;
pub use config::{Env, UserStorageConfig};
pub use error::{ClientError, ClientResult};
pub use http::HttpTransport;
pub use memory::MemoryTransport;
pub use transport::{AccessTokenProvider, StaticTokenProvider, StorageTransport};
