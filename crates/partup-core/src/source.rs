//! Upload source: open, validate, and read a file in fixed-size parts.
//!
//! Accepts a filesystem path (opened and owned here) or a caller's stream
//! (borrowed, never closed here). Size is found by seeking to the end and back.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::error::UploadError;
use crate::limits::{SizeLimitPolicy, PART_SIZE};

/// Name used when neither the path nor the caller provides one.
pub const DEFAULT_FILE_NAME: &str = "file.jpg";

/// Any seekable async byte stream (e.g. `tokio::fs::File`, `std::io::Cursor<Vec<u8>>`).
pub trait UploadStream: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T: AsyncRead + AsyncSeek + Unpin + Send> UploadStream for T {}

/// What to upload.
pub enum UploadSource<'a> {
    /// A file on disk; opened for the duration of the upload.
    Path(PathBuf),
    /// An already-open stream owned by the caller.
    Stream {
        reader: &'a mut dyn UploadStream,
        name: Option<String>,
    },
}

impl<'a> UploadSource<'a> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        UploadSource::Path(path.into())
    }

    pub fn stream(reader: &'a mut dyn UploadStream, name: Option<String>) -> Self {
        UploadSource::Stream { reader, name }
    }
}

enum Reader<'a> {
    Owned(tokio::fs::File),
    Borrowed(&'a mut dyn UploadStream),
}

impl Reader<'_> {
    fn get(&mut self) -> &mut dyn UploadStream {
        match self {
            Reader::Owned(f) => f,
            Reader::Borrowed(r) => &mut **r,
        }
    }
}

/// Validated source positioned for sequential part reads.
pub struct FileSource<'a> {
    reader: Reader<'a>,
    size: u64,
    name: String,
}

impl std::fmt::Debug for FileSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("size", &self.size)
            .field("name", &self.name)
            .field("owned", &matches!(self.reader, Reader::Owned(_)))
            .finish()
    }
}

impl<'a> FileSource<'a> {
    /// Open and validate `source` against the account size limit.
    ///
    /// A self-opened file is dropped (closed) on every error path before returning.
    pub async fn open(source: UploadSource<'a>, limit: &dyn SizeLimitPolicy) -> Result<Self, UploadError> {
        let (reader, name) = match source {
            UploadSource::Path(path) => {
                let file = open_path(&path).await?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
                (Reader::Owned(file), name)
            }
            UploadSource::Stream { reader, name } => (
                Reader::Borrowed(reader),
                name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            ),
        };

        let mut src = FileSource { reader, size: 0, name };
        let size = src.reader.get().seek(SeekFrom::End(0)).await?;
        src.reader.get().seek(SeekFrom::Start(0)).await?;
        src.size = size;

        if size == 0 {
            return Err(UploadError::EmptyFile);
        }
        let max = limit.max_file_size();
        if size > max {
            return Err(UploadError::SizeLimitExceeded { size, limit: max });
        }
        tracing::debug!(name = %src.name, size, "opened upload source");
        Ok(src)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if this source opened the underlying file itself.
    pub fn owns_stream(&self) -> bool {
        matches!(self.reader, Reader::Owned(_))
    }

    /// Absolute seek to the start of part `part`.
    pub async fn seek_to_part(&mut self, part: u32) -> Result<(), UploadError> {
        let offset = u64::from(part) * PART_SIZE;
        self.reader.get().seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    /// Read the next part: up to `PART_SIZE` bytes, `None` at end of input.
    /// Short reads from the stream are retried until the part is full or EOF.
    pub async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>, UploadError> {
        let mut buf = vec![0u8; PART_SIZE as usize];
        let mut filled = 0;
        let reader = self.reader.get();
        while filled < buf.len() {
            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }
}

async fn open_path(path: &Path) -> Result<tokio::fs::File, UploadError> {
    if path.as_os_str().is_empty() {
        return Err(UploadError::InvalidInput(
            "expected a file path or a binary stream, got an empty path".into(),
        ));
    }
    if tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(UploadError::InvalidInput(format!(
            "{} is a directory, not a file",
            path.display()
        )));
    }
    Ok(tokio::fs::File::open(path).await?)
}
