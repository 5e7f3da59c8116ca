// src/output/writer.rs
//! Persists downloaded byte streams to disk.
//!
//! This module is the only place where downloaded files are written. The
//! file handle is owned by one scope and closed on every exit path; a write
//! that fails partway removes what was written.

use crate::api::ByteStream;
use crate::constants::DOWNLOAD_CHUNK_SIZE;
use crate::error::AppError;
use crate::model::FastaDownload;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Receives per-chunk progress of a download.
pub trait DownloadProgress: Send {
    fn chunk_written(&mut self, chunk_index: usize, chunk_len: usize, total_bytes: u64);

    fn finished(&mut self, _total_bytes: u64) {}
}

/// Logs progress at debug level.
#[derive(Debug, Default)]
pub struct LogProgress;

impl DownloadProgress for LogProgress {
    fn chunk_written(&mut self, chunk_index: usize, chunk_len: usize, total_bytes: u64) {
        log::debug!(
            "chunk {}: {} bytes ({} total)",
            chunk_index + 1,
            chunk_len,
            total_bytes
        );
    }

    fn finished(&mut self, total_bytes: u64) {
        log::info!("downloaded {} bytes", total_bytes);
    }
}

/// Writes `body` to a new file at `path` in chunks of at most
/// [`DOWNLOAD_CHUNK_SIZE`] bytes.
///
/// The file must not exist yet. On any error the partial file is removed.
pub async fn persist_stream(
    path: &Path,
    body: ByteStream,
    progress: &mut dyn DownloadProgress,
) -> Result<FastaDownload, AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => AppError::OutputExists {
                path: path.to_path_buf(),
            },
            _ => AppError::Io(e),
        })?;

    match write_chunks(file, body, progress).await {
        Ok((bytes_written, chunks_written)) => {
            progress.finished(bytes_written);
            Ok(FastaDownload {
                path: path.to_path_buf(),
                bytes_written,
                chunks_written,
            })
        }
        Err(e) => {
            log::warn!("download to {} failed, removing partial file", path.display());
            if let Err(cleanup) = tokio::fs::remove_file(path).await {
                log::warn!("could not remove {}: {}", path.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Consumes the file; it is flushed and closed before this returns.
async fn write_chunks(
    mut file: File,
    mut body: ByteStream,
    progress: &mut dyn DownloadProgress,
) -> Result<(u64, usize), AppError> {
    let mut total = 0u64;
    let mut chunks = 0usize;

    while let Some(piece) = body.next().await {
        let piece = piece?;
        for chunk in piece.chunks(DOWNLOAD_CHUNK_SIZE) {
            file.write_all(chunk).await?;
            total += chunk.len() as u64;
            progress.chunk_written(chunks, chunk.len(), total);
            chunks += 1;
        }
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    Ok((total, chunks))
}
