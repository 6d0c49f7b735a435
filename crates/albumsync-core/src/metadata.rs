//! Decrypted metadata schemas
//!
//! Each block is a JSON object. Keys this client does not know about are kept
//! in `extra`, so a record written by a newer client survives a round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Visibility of an album or file in the owner's library
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Archived,
    Hidden,
    Unknown(i64),
}

impl Visibility {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Visible,
            1 => Self::Archived,
            2 => Self::Hidden,
            other => Self::Unknown(other),
        }
    }
}

/// Kind of asset a file holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Image,
    Video,
    LivePhoto,
    Unknown(i64),
}

impl FileType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Image,
            1 => Self::Video,
            2 => Self::LivePhoto,
            other => Self::Unknown(other),
        }
    }
}

fn visibility_of(code: Option<i64>) -> Visibility {
    code.map_or(Visibility::Visible, Visibility::from_code)
}

// ═══════════════════════════════════════════════════════════════════════════
// ALBUM METADATA
// ═══════════════════════════════════════════════════════════════════════════

/// Owner-only album settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPrivateMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlbumPrivateMetadata {
    pub fn visibility(&self) -> Visibility {
        visibility_of(self.visibility)
    }
}

/// Album settings visible to every collaborator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumPublicMetadata {
    /// Sort oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asc: Option<bool>,
    #[serde(rename = "coverID", default, skip_serializing_if = "Option::is_none")]
    pub cover_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A collaborator's own settings for an album shared with them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumSharedMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlbumSharedMetadata {
    pub fn visibility(&self) -> Visibility {
        visibility_of(self.visibility)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FILE METADATA
// ═══════════════════════════════════════════════════════════════════════════

/// Asset metadata captured at upload time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Microseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Live photos carry separate hashes for their two parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_hash: Option<String>,
    /// Seconds, for videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileMetadata {
    pub fn file_type(&self) -> FileType {
        self.file_type.map_or(FileType::Image, FileType::from_code)
    }

    /// Location, when both coordinates are known and not the (0, 0) placeholder
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 || lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Owner-only file settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePrivateMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FilePrivateMetadata {
    pub fn visibility(&self) -> Visibility {
        visibility_of(self.visibility)
    }
}

/// Edits visible to everyone the file is shared with
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePublicMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
