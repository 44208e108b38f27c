//! `partup assemble` – rebuild a file from stored parts.

use anyhow::Result;
use partup_core::config::UploadConfig;
use std::path::{Path, PathBuf};

use super::store_for;

pub async fn run_assemble(
    cfg: &UploadConfig,
    file_id: i64,
    parts: u32,
    out: &Path,
    store: Option<PathBuf>,
) -> Result<()> {
    let store = store_for(cfg, store)?;
    let written = store.assemble(file_id, parts, out).await?;
    println!("wrote {} bytes to {}", written, out.display());
    Ok(())
}
