//! # albumsync Core
//!
//! The trust boundary of the albumsync client. Remote collection and file
//! records arrive encrypted; this crate walks the key chain, decrypts names and
//! metadata blocks, and re-seals every recovered key under the local client key.
//!
//! - [`Mapper::map_album`] turns a [`RemoteCollection`] into a [`LocalAlbum`]
//! - [`Mapper::map_file`] turns a [`RemoteFile`] into a [`LocalFile`], given its
//!   already-mapped album
//! - [`batch::map_export`] drives both over a whole export, in parallel
//!
//! ## Example
//!
//! ```rust,ignore
//! use albumsync_core::{AccountKeyring, Mapper};
//!
//! let mapper = Mapper::new(client_key, AccountKeyring::new(user_id, master_key, keypair));
//! let album = mapper.map_album(user_id, &collection)?;
//! for file in &files {
//!     match mapper.map_file(&album, file) {
//!         Ok(local) => store(local),
//!         Err(e) if e.is_deleted() => forget(file.id),
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod keyring;
pub mod local;
pub mod mapper;
pub mod metadata;
pub mod remote;

pub use batch::{map_export, BatchReport, RecordFailure};
pub use config::BatchConfig;
pub use error::{Field, MapError, RecordRef, Result};
pub use keyring::{AccountKeyring, CachingResolver, CollectionKeyResolver};
pub use local::{LocalAlbum, LocalFile};
pub use mapper::Mapper;
pub use metadata::*;
pub use remote::{
    CollectionUser, FileAttributes, FileInfo, MagicMetadata, RemoteCollection, RemoteExport,
    RemoteFile,
};
