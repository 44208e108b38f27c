//! `partup upload` – upload a file into the part store.

use anyhow::{Context, Result};
use partup_core::config::UploadConfig;
use partup_core::progress::{ProgressCallback, ProgressState};
use partup_core::source::UploadSource;
use partup_core::SaveFileOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{cancel_on_ctrl_c, store_for, uploader_for};

pub async fn run_upload(cfg: &UploadConfig, path: &Path, store: Option<PathBuf>, quiet: bool) -> Result<()> {
    let store = store_for(cfg, store)?;
    let root = store.root().to_path_buf();
    let uploader = uploader_for(cfg, store);

    let mut options = SaveFileOptions::default().cancel(cancel_on_ctrl_c());
    if !quiet {
        options = options.progress(ProgressCallback::blocking(|current, total| {
            let state = ProgressState {
                bytes_transferred: current,
                total_bytes: total,
            };
            eprint!("\r{:>6.1}%  {}/{} bytes", state.fraction() * 100.0, current, total);
            let _ = std::io::stderr().flush();
        }));
    }

    let result = uploader
        .save_file(UploadSource::path(path), options)
        .await
        .with_context(|| format!("upload {}", path.display()))?;
    if !quiet {
        eprintln!();
    }

    match result {
        Some(reference) => {
            println!("{}", serde_json::to_string_pretty(&reference)?);
            tracing::info!(file_id = reference.id(), store = %root.display(), "upload stored");
        }
        None => anyhow::bail!("upload of {} did not complete; see log for failed parts", path.display()),
    }
    Ok(())
}
