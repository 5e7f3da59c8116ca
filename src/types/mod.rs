// src/types/mod.rs
use std::path::PathBuf;
use thiserror::Error;

mod filters;
mod ids;
mod search;

pub use filters::*;
pub use ids::*;
pub use search::*;

/// Local precondition failures, detected before any request is sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid search type: {0} (expected one of mash_dist, mash_screen, blastn, tblastn)")]
    InvalidSearchType(String),

    #[error("Value of {name} is out of range: {value}, expected {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Either an input file or an inline sequence is required")]
    MissingSearchInput,

    #[error("Input file not found: {}", path.display())]
    SearchFileNotFound { path: PathBuf },

    #[error("Only one of input file and inline sequence may be given")]
    ConflictingSearchInput,

    #[error("List of ids is empty")]
    EmptyIdentifierList,

    #[error("Invalid accession: {input:?} - {reason}")]
    InvalidAccession { input: String, reason: String },

    #[error("Filter {kind} needs at least one non-empty parameter")]
    EmptyFilter { kind: FilterKind },

    #[error("Unknown parameter {name} for filter {kind}")]
    UnknownFilterParameter { kind: FilterKind, name: String },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}
