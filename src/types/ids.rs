// src/types/ids.rs
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An NCBI nucleotide accession as accepted by the PLSDB API (e.g. `NZ_CP031107.1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accession(String);

impl Accession {
    /// Parses a single accession, trimming surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::InvalidAccession {
                input: input.to_string(),
                reason: "accession cannot be blank".to_string(),
            });
        }

        // ';' is the separator of the bulk download request
        if trimmed.contains(';') || trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidAccession {
                input: input.to_string(),
                reason: "accession cannot contain whitespace or ';'".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Parses a batch of accessions. The batch must not be empty.
    pub fn parse_list<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Self>, ValidationError> {
        if inputs.is_empty() {
            return Err(ValidationError::EmptyIdentifierList);
        }
        inputs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// Splits a whitespace separated string into accessions.
    pub fn split_whitespace(input: &str) -> Result<Vec<Self>, ValidationError> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        Self::parse_list(&parts)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque server-issued identifier of an asynchronous job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
