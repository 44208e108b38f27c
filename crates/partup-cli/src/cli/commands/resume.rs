//! `partup resume` – resend one part of an earlier upload.

use anyhow::{bail, Context, Result};
use partup_core::config::UploadConfig;
use partup_core::source::UploadSource;
use partup_core::SaveFileOptions;
use std::path::{Path, PathBuf};

use super::{cancel_on_ctrl_c, store_for, uploader_for};

pub async fn run_resume(
    cfg: &UploadConfig,
    path: &Path,
    file_id: i64,
    part: u32,
    store: Option<PathBuf>,
) -> Result<()> {
    let store = store_for(cfg, store)?;
    let check = store.clone();
    let uploader = uploader_for(cfg, store);

    let options = SaveFileOptions::default()
        .resume(file_id, part)
        .cancel(cancel_on_ctrl_c());
    uploader
        .save_file(UploadSource::path(path), options)
        .await
        .with_context(|| format!("resend part {} of {}", part, path.display()))?;

    let summary = uploader.wait_resends().await;
    if summary.failed > 0 || summary.delivered == 0 {
        bail!(
            "part {} of file {} was not stored in {} (see log for details)",
            part,
            file_id,
            check.root().display()
        );
    }
    println!("part {} of file {} stored", part, file_id);
    Ok(())
}
