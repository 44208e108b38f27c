//! CLI for the partup uploader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use partup_core::config;
use std::path::PathBuf;

use commands::{run_assemble, run_checksum, run_resume, run_upload};

/// Top-level CLI for the partup uploader.
#[derive(Debug, Parser)]
#[command(name = "partup")]
#[command(about = "partup: chunked, resumable uploads to a part store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload a file in 512 KiB parts and print its file reference as JSON.
    Upload {
        /// Path to the file.
        path: PathBuf,
        /// Part store directory (default from config, else XDG data dir).
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Do not print progress.
        #[arg(long)]
        quiet: bool,
    },

    /// Resend one part of an earlier upload.
    Resume {
        /// Path to the original file.
        path: PathBuf,
        /// File id from the earlier upload.
        #[arg(long, allow_hyphen_values = true)]
        file_id: i64,
        /// Index of the part to resend (0-based).
        #[arg(long)]
        part: u32,
        /// Part store directory.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },

    /// Compute MD5 of a file (matches the checksum of small-file references).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Rebuild a file from the parts in a local store.
    Assemble {
        /// File id of the upload.
        #[arg(long, allow_hyphen_values = true)]
        file_id: i64,
        /// Total number of parts.
        #[arg(long)]
        parts: u32,
        /// Output path.
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
        /// Part store directory.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload { path, store, quiet } => {
                run_upload(&cfg, &path, store, quiet).await?
            }
            CliCommand::Resume {
                path,
                file_id,
                part,
                store,
            } => run_resume(&cfg, &path, file_id, part, store).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Assemble {
                file_id,
                parts,
                out,
                store,
            } => run_assemble(&cfg, file_id, parts, &out, store).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
