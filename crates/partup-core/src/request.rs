//! Part upload requests sent to the storage endpoint and the resulting file reference.

use serde::{Deserialize, Serialize};

/// One part of a file, ready to hand to an upload worker.
///
/// Small files use `SaveFilePart`; big files carry the total part count so the
/// remote side can assemble parts that arrive out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartUploadRequest {
    SaveFilePart {
        file_id: i64,
        part_index: u32,
        bytes: Vec<u8>,
    },
    SaveBigFilePart {
        file_id: i64,
        part_index: u32,
        total_parts: u32,
        bytes: Vec<u8>,
    },
}

impl PartUploadRequest {
    pub fn file_id(&self) -> i64 {
        match self {
            PartUploadRequest::SaveFilePart { file_id, .. }
            | PartUploadRequest::SaveBigFilePart { file_id, .. } => *file_id,
        }
    }

    /// Absolute index of this part within the file (0-based).
    pub fn part_index(&self) -> u32 {
        match self {
            PartUploadRequest::SaveFilePart { part_index, .. }
            | PartUploadRequest::SaveBigFilePart { part_index, .. } => *part_index,
        }
    }

    /// Total part count; present only on big-file parts.
    pub fn total_parts(&self) -> Option<u32> {
        match self {
            PartUploadRequest::SaveFilePart { .. } => None,
            PartUploadRequest::SaveBigFilePart { total_parts, .. } => Some(*total_parts),
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            PartUploadRequest::SaveFilePart { bytes, .. }
            | PartUploadRequest::SaveBigFilePart { bytes, .. } => bytes,
        }
    }

    pub fn is_big(&self) -> bool {
        matches!(self, PartUploadRequest::SaveBigFilePart { .. })
    }
}

/// Reference to an uploaded small file, with its MD5 checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub id: i64,
    pub parts: u32,
    pub name: String,
    /// Lowercase hex MD5 of the whole file.
    pub md5_checksum: String,
}

/// Reference to an uploaded big file (no checksum).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFileBig {
    pub id: i64,
    pub parts: u32,
    pub name: String,
}

/// Result of a completed upload, usable by higher-level API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileReference {
    Small(InputFile),
    Big(InputFileBig),
}

impl FileReference {
    pub fn id(&self) -> i64 {
        match self {
            FileReference::Small(f) => f.id,
            FileReference::Big(f) => f.id,
        }
    }

    pub fn parts(&self) -> u32 {
        match self {
            FileReference::Small(f) => f.parts,
            FileReference::Big(f) => f.parts,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileReference::Small(f) => &f.name,
            FileReference::Big(f) => &f.name,
        }
    }

    /// MD5 checksum; only small files carry one.
    pub fn checksum(&self) -> Option<&str> {
        match self {
            FileReference::Small(f) => Some(&f.md5_checksum),
            FileReference::Big(_) => None,
        }
    }
}
