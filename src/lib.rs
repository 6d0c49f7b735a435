//! # albumsync
//!
//! Maps end-to-end encrypted remote albums and files into local records.
//!
//! The work is split across two crates, re-exported here:
//! - [`crypto`]: layered keys, AEAD, sealed boxes and local sealing
//! - [`mapping`]: remote/local record types, the album and file mappers, and the
//!   batch driver
//!
//! ```rust,no_run
//! use albumsync::mapping::{map_export, AccountKeyring, BatchConfig, Mapper, RemoteExport};
//! use albumsync::crypto::{AccountKeyPair, ClientKey, LayerKey};
//! use std::sync::Arc;
//!
//! # async fn run(export: RemoteExport) -> albumsync::mapping::Result<()> {
//! let keyring = AccountKeyring::new(7, LayerKey::generate(), AccountKeyPair::generate());
//! let mapper = Arc::new(Mapper::new(ClientKey::generate(), keyring));
//!
//! let report = map_export(mapper, 7, export, &BatchConfig::default()).await?;
//! println!("{} albums, {} files", report.albums.len(), report.files.len());
//! # Ok(())
//! # }
//! ```

pub use albumsync_core as mapping;
pub use albumsync_crypto as crypto;
