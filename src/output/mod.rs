// src/output/mod.rs
//! Everything that leaves the process as a file or a stream of text.

mod export;
mod paths;
mod writer;

pub use export::write_table_tsv;
pub use paths::{destination_for, filename_from_disposition};
pub use writer::{persist_stream, DownloadProgress, LogProgress};
