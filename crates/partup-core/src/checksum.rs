//! MD5 checksum for small-file uploads.
//!
//! The accumulator is fed by the producer in part order, so the digest matches
//! a sequential read of the file no matter how workers are scheduled.

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Incremental MD5 over the parts handed to workers.
#[derive(Clone, Default)]
pub struct ChecksumAccumulator {
    hasher: Md5,
    bytes: u64,
}

impl ChecksumAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Bytes fed so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Consume the accumulator and return the digest as lowercase hex.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Compute MD5 of a file and return the digest as lowercase hex.
pub fn md5_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut acc = ChecksumAccumulator::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        acc.update(&buf[..n]);
    }
    Ok(acc.finalize_hex())
}
