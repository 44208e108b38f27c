//! CLI command handlers. Each command is in its own file.

mod assemble;
mod checksum;
mod resume;
mod upload;

pub use assemble::run_assemble;
pub use checksum::run_checksum;
pub use resume::run_resume;
pub use upload::run_upload;

use anyhow::Result;
use partup_core::config::UploadConfig;
use partup_core::limits::AccountTier;
use partup_core::store::{DirectoryStore, LocalProvider};
use partup_core::Uploader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Store directory: command-line flag, then config, then XDG default.
pub(crate) fn store_for(cfg: &UploadConfig, flag: Option<PathBuf>) -> Result<DirectoryStore> {
    let root = match flag {
        Some(dir) => dir,
        None => cfg.resolved_store_dir()?,
    };
    Ok(DirectoryStore::new(root))
}

/// Uploader writing into `store`, limited by the configured account tier.
pub(crate) fn uploader_for(cfg: &UploadConfig, store: DirectoryStore) -> Uploader {
    let tier = AccountTier::from_flag(Some(cfg.privileged_account));
    Uploader::new(
        Arc::new(LocalProvider::new(store)),
        Arc::new(tier),
        cfg.clone(),
    )
}

/// Token cancelled when the user presses Ctrl-C; the upload drains its workers and stops.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling upload");
            trigger.cancel();
        }
    });
    token
}
