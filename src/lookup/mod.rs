// src/lookup/mod.rs
//! Accession lookup: one request per identifier, classified and assembled
//! into a single summary table.

pub mod assembler;
pub mod classifier;

pub use assembler::assemble;
pub use classifier::{classify, classify_batch, IdentifierQueryResult, Partition};
