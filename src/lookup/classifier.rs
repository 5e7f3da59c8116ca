// src/lookup/classifier.rs
//! Per-accession classification of lookup answers into found / not found.

use crate::api::{parser, LookupResponse, LookupSchema, PlsdbRepository};
use crate::constants::{LABEL_COLUMN, SEARCHED_COLUMN};
use crate::error::{AppError, ProtocolError};
use crate::model::ResultRecord;
use crate::types::{Accession, ValidationError};
use tokio_util::sync::CancellationToken;

pub const FOUND_LABEL: &str = "found";
pub const NOT_FOUND_LABEL: &str = "notfound";

/// Classification of one looked-up accession.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentifierQueryResult {
    /// Exactly one plasmid matched; the record carries `label` and `searched`.
    Found(ResultRecord),
    /// Several plasmids matched; the record keeps the server's ambiguity data.
    NotFound {
        record: ResultRecord,
        candidates: Vec<String>,
    },
    /// The answer matched neither schema.
    Error(ProtocolError),
}

/// Classifies one decoded answer for `accession`.
pub fn classify(accession: &Accession, response: LookupResponse) -> IdentifierQueryResult {
    match response {
        LookupResponse::Unique { schema, mut record } => {
            if schema == LookupSchema::Legacy {
                log::debug!("{}: legacy lookup record", accession);
            }
            record.insert(SEARCHED_COLUMN, accession.as_str());
            record.insert(LABEL_COLUMN, FOUND_LABEL);
            IdentifierQueryResult::Found(record)
        }
        LookupResponse::Ambiguous {
            schema,
            candidates,
            mut record,
        } => {
            if schema == LookupSchema::Legacy {
                log::debug!("{}: legacy multi-match {:?}", accession, candidates);
            }
            record.insert(SEARCHED_COLUMN, accession.as_str());
            record.insert(LABEL_COLUMN, NOT_FOUND_LABEL);
            IdentifierQueryResult::NotFound { record, candidates }
        }
        LookupResponse::Unrecognized { fields } => {
            IdentifierQueryResult::Error(ProtocolError::UnexpectedShape(format!(
                "lookup of {} returned fields {:?}",
                accession, fields
            )))
        }
    }
}

/// Order-preserving found / not-found partition of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub found: Vec<ResultRecord>,
    pub not_found: Vec<ResultRecord>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len()
    }

    /// Accessions of the found records, in input order.
    pub fn found_accessions(&self) -> Vec<Accession> {
        self.found
            .iter()
            .filter_map(|record| record.get(SEARCHED_COLUMN)?.as_str())
            .filter_map(|id| Accession::parse(id).ok())
            .collect()
    }
}

/// Looks up every accession, one request at a time, in input order.
///
/// The first unclassifiable answer or failed request aborts the batch, and
/// so does `cancel`, between lookups or while one is in flight.
pub async fn classify_batch(
    repository: &dyn PlsdbRepository,
    accessions: &[Accession],
    cancel: &CancellationToken,
) -> Result<Partition, AppError> {
    if accessions.is_empty() {
        return Err(ValidationError::EmptyIdentifierList.into());
    }

    log::info!("start searching for plasmids");
    let mut partition = Partition::default();

    for (done, accession) in accessions.iter().enumerate() {
        let value = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("lookup cancelled after {} of {} ids", done, accessions.len());
                return Err(AppError::Cancelled);
            }
            reply = repository.lookup_summary(accession) => reply?,
        };
        match classify(accession, parser::decode_lookup(value)) {
            IdentifierQueryResult::Found(record) => partition.found.push(record),
            IdentifierQueryResult::NotFound { record, .. } => partition.not_found.push(record),
            IdentifierQueryResult::Error(e) => return Err(e.into()),
        }
    }

    log::info!("search is finished");
    log::info!(
        "{} of {} ids were found",
        partition.found.len(),
        accessions.len()
    );
    Ok(partition)
}
