//! In-memory stream that breaks at a fixed offset.

use std::io::{self, Cursor, SeekFrom};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

/// What a read at or past the break offset does.
#[derive(Debug, Clone, Copy)]
pub enum Break {
    /// Fail with an I/O error.
    Error,
    /// Report end of input although the stream claims a larger size.
    Truncate,
}

/// Reports the full length of `data` when seeked, but stops serving bytes at `at`.
pub struct FlakyStream {
    inner: Cursor<Vec<u8>>,
    at: u64,
    mode: Break,
}

impl FlakyStream {
    pub fn new(data: Vec<u8>, at: u64, mode: Break) -> Self {
        Self {
            inner: Cursor::new(data),
            at,
            mode,
        }
    }
}

impl AsyncRead for FlakyStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = self.inner.position();
        if pos >= self.at {
            return match self.mode {
                Break::Error => Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk gone"))),
                Break::Truncate => Poll::Ready(Ok(())),
            };
        }
        // Never hand out bytes past the break offset.
        let room = (self.at - pos).min(buf.remaining() as u64) as usize;
        let mut chunk = vec![0u8; room];
        let mut limited = ReadBuf::new(&mut chunk);
        ready!(Pin::new(&mut self.inner).poll_read(cx, &mut limited))?;
        buf.put_slice(limited.filled());
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for FlakyStream {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.inner).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.inner).poll_complete(cx)
    }
}
