//! Mapping error types

use albumsync_crypto::CryptoError;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, MapError>;

/// The remote record a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    Collection(i64),
    File(i64),
}

impl RecordRef {
    /// The record's id
    pub fn id(&self) -> i64 {
        match self {
            Self::Collection(id) | Self::File(id) => *id,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(id) => write!(f, "collection {id}"),
            Self::File(id) => write!(f, "file {id}"),
        }
    }
}

/// The encrypted attribute a decryption or parse failure happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AlbumName,
    AlbumKey,
    FileKey,
    FileMetadata,
    PrivateMetadata,
    PublicMetadata,
    SharedMetadata,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlbumName => "album name",
            Self::AlbumKey => "album key",
            Self::FileKey => "file key",
            Self::FileMetadata => "file metadata",
            Self::PrivateMetadata => "private metadata",
            Self::PublicMetadata => "public metadata",
            Self::SharedMetadata => "shared metadata",
        })
    }
}

/// Errors returned by the album and file mappers
#[derive(Error, Debug)]
pub enum MapError {
    /// The acting user cannot obtain the collection's key
    #[error("cannot resolve key for collection {collection_id}: {reason}")]
    KeyResolution { collection_id: i64, reason: String },

    /// Authenticated decryption failed: wrong key, tampered data, or bad nonce/header
    #[error("failed to decrypt {field} of {record}: {source}")]
    Decryption {
        record: RecordRef,
        field: Field,
        #[source]
        source: CryptoError,
    },

    /// Decryption succeeded but the plaintext does not fit the expected schema
    #[error("failed to parse {field} of {record}: {source}")]
    MetadataParse {
        record: RecordRef,
        field: Field,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote record is a tombstone; there is nothing to materialize
    #[error("file {id} is deleted")]
    Deleted { id: i64 },

    /// A recovered key could not be sealed under the client key
    #[error("failed to seal key of {record}: {source}")]
    Seal {
        record: RecordRef,
        #[source]
        source: CryptoError,
    },

    /// The file was handed an album other than the collection it belongs to
    #[error("file {file_id} belongs to collection {expected}, not album {actual}")]
    AlbumMismatch {
        file_id: i64,
        expected: i64,
        actual: i64,
    },

    /// The file's album has not been mapped successfully
    #[error("file {file_id} has no mapped album {collection_id}")]
    AlbumNotMapped { file_id: i64, collection_id: i64 },

    /// A mapping worker panicked or was cancelled
    #[error("mapping task failed: {0}")]
    Join(String),
}

impl MapError {
    /// Check if this is the tombstone outcome rather than a failure
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    /// Check if this is an authenticated-decryption failure
    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption { .. })
    }

    pub(crate) fn decryption(record: RecordRef, field: Field) -> impl Fn(CryptoError) -> Self + Copy {
        move |source| Self::Decryption {
            record,
            field,
            source,
        }
    }

    pub(crate) fn parse<E>(record: RecordRef, field: Field) -> impl Fn(E) -> Self + Copy
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| Self::MetadataParse {
            record,
            field,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_record_and_field() {
        let err = MapError::decryption(RecordRef::Collection(4), Field::SharedMetadata)(
            CryptoError::Decryption("aead::Error".into()),
        );
        assert_eq!(
            err.to_string(),
            "failed to decrypt shared metadata of collection 4: decryption failed: aead::Error"
        );
        assert!(err.is_decryption());
        assert!(!err.is_deleted());
    }

    #[test]
    fn test_deleted_is_distinct() {
        let err = MapError::Deleted { id: 9 };
        assert!(err.is_deleted());
        assert!(!err.is_decryption());
        assert_eq!(err.to_string(), "file 9 is deleted");
    }
}
