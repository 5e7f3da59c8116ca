// src/lookup/assembler.rs
//! Builds the summary table from a classified batch.

use super::classifier::Partition;
use crate::constants::{LABEL_COLUMN, SEARCHED_COLUMN};
use crate::model::ResultTable;

/// Found records first, then not-found ones, each group in input order.
///
/// `label` and `searched` lead the columns; the rest is the union of all
/// record fields in first-seen order, with missing cells left null.
pub fn assemble(partition: &Partition) -> ResultTable {
    let records = partition
        .found
        .iter()
        .chain(partition.not_found.iter())
        .cloned()
        .collect();
    ResultTable::from_records(records, &[LABEL_COLUMN, SEARCHED_COLUMN])
}
