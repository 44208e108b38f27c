//! Checksum command: compute MD5 of a file.

use anyhow::Result;
use partup_core::checksum;
use std::path::Path;

/// Compute and print MD5 of the given file.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::md5_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
