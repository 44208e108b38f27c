//! Upload planning: part count, mode selection, and per-mode request shape.

use crate::error::UploadError;
use crate::limits::{self, BIG_FILE_WORKERS, PART_SIZE, SMALL_FILE_WORKERS};
use crate::request::{FileReference, InputFile, InputFileBig, PartUploadRequest};

/// Identifies one previously uploaded part to send again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePart {
    pub file_id: i64,
    pub part_index: u32,
}

/// How an upload is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Whole file, one worker, MD5 checksum.
    Small,
    /// Whole file, parallel workers, no checksum.
    Big,
    /// A single part sent again for an existing upload; `big` selects the request shape.
    Resume { big: bool },
}

impl UploadMode {
    pub fn select(file_size: u64, resume: Option<ResumePart>) -> Self {
        let big = limits::is_big_file(file_size);
        match resume {
            Some(_) => UploadMode::Resume { big },
            None if big => UploadMode::Big,
            None => UploadMode::Small,
        }
    }

    pub fn worker_count(&self) -> usize {
        match self {
            UploadMode::Big => BIG_FILE_WORKERS,
            UploadMode::Small | UploadMode::Resume { .. } => SMALL_FILE_WORKERS,
        }
    }

    pub fn computes_checksum(&self) -> bool {
        matches!(self, UploadMode::Small)
    }

    /// Whether parts are sent as big-file parts carrying the total part count.
    pub fn sends_big_parts(&self) -> bool {
        matches!(self, UploadMode::Big | UploadMode::Resume { big: true, .. })
    }

    pub fn is_resume(&self) -> bool {
        matches!(self, UploadMode::Resume { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Small => "small",
            UploadMode::Big => "big",
            UploadMode::Resume { .. } => "resume",
        }
    }
}

/// Per-call upload context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub file_id: i64,
    pub file_size: u64,
    pub part_size: u64,
    pub total_parts: u32,
    pub mode: UploadMode,
    pub start_part: u32,
}

impl UploadPlan {
    /// Plan an upload of `file_size` bytes. A fresh random file id is drawn
    /// unless `resume` names an existing one.
    pub fn new(file_size: u64, resume: Option<ResumePart>) -> Result<Self, UploadError> {
        let total_parts = limits::total_parts(file_size);
        let mode = UploadMode::select(file_size, resume);
        let (file_id, start_part) = match resume {
            Some(r) => {
                if r.part_index >= total_parts {
                    return Err(UploadError::InvalidInput(format!(
                        "part {} is out of range for a file of {} parts",
                        r.part_index, total_parts
                    )));
                }
                (r.file_id, r.part_index)
            }
            None => (rand::random::<i64>(), 0),
        };
        Ok(Self {
            file_id,
            file_size,
            part_size: PART_SIZE,
            total_parts,
            mode,
            start_part,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.mode.worker_count()
    }

    pub fn build_request(&self, part_index: u32, bytes: Vec<u8>) -> PartUploadRequest {
        if self.mode.sends_big_parts() {
            PartUploadRequest::SaveBigFilePart {
                file_id: self.file_id,
                part_index,
                total_parts: self.total_parts,
                bytes,
            }
        } else {
            PartUploadRequest::SaveFilePart {
                file_id: self.file_id,
                part_index,
                bytes,
            }
        }
    }

    /// Result for a completed full upload; `None` for resume mode.
    pub fn file_reference(&self, name: &str, checksum: Option<String>) -> Option<FileReference> {
        match self.mode {
            UploadMode::Big => Some(FileReference::Big(InputFileBig {
                id: self.file_id,
                parts: self.total_parts,
                name: name.to_string(),
            })),
            UploadMode::Small => Some(FileReference::Small(InputFile {
                id: self.file_id,
                parts: self.total_parts,
                name: name.to_string(),
                md5_checksum: checksum.unwrap_or_default(),
            })),
            UploadMode::Resume { .. } => None,
        }
    }
}
