// src/types/filters.rs
//! Metadata filter queries against the plasmid collection.

use super::ValidationError;
use indexmap::IndexMap;
use std::fmt;

/// Which filter endpoint a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Nuccore,
    Biosample,
    Taxonomy,
}

const NUCCORE_PARAMETERS: &[&str] = &[
    "NUCCORE_Source",
    "NUCCORE_Topology",
    "NUCCORE_has_identical",
    "AMR_genes",
    "BGC_types",
];

const BIOSAMPLE_PARAMETERS: &[&str] = &[
    "BIOSAMPLE_UID",
    "LOCATION_name",
    "ECOSYSTEM_tags",
    "ECOSYSTEM_taxid_name",
    "ECOSYSTEM_taxid",
    "DISEASE_ontid_name",
    "DISEASE_ontid",
];

const TAXONOMY_PARAMETERS: &[&str] = &[
    "TAXONOMY_strain",
    "TAXONOMY_strain_id",
    "TAXONOMY_species",
    "TAXONOMY_species_id",
    "TAXONOMY_genus",
    "TAXONOMY_genus_id",
    "TAXONOMY_family",
    "TAXONOMY_family_id",
    "TAXONOMY_order",
    "TAXONOMY_order_id",
    "TAXONOMY_class",
    "TAXONOMY_class_id",
    "TAXONOMY_phylum",
    "TAXONOMY_phylum_id",
    "TAXONOMY_superkingdom",
    "TAXONOMY_superkingdom_id",
];

impl FilterKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Nuccore => "filter_nuccore",
            Self::Biosample => "filter_biosample",
            Self::Taxonomy => "filter_taxonomy",
        }
    }

    pub fn allowed_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Nuccore => NUCCORE_PARAMETERS,
            Self::Biosample => BIOSAMPLE_PARAMETERS,
            Self::Taxonomy => TAXONOMY_PARAMETERS,
        }
    }

    /// Taxonomy results do not offer a FASTA download.
    pub fn supports_fasta(&self) -> bool {
        !matches!(self, Self::Taxonomy)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nuccore => "nuccore",
            Self::Biosample => "biosample",
            Self::Taxonomy => "taxonomy",
        };
        f.write_str(name)
    }
}

/// A validated, non-empty filter parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    kind: FilterKind,
    params: IndexMap<String, String>,
}

impl FilterQuery {
    /// Drops blank values, then checks the remaining names against the filter kind.
    pub fn new<I, K, V>(kind: FilterKind, params: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut kept = IndexMap::new();
        for (name, value) in params {
            let (name, value) = (name.into(), value.into());
            if value.trim().is_empty() {
                continue;
            }
            if !kind.allowed_parameters().contains(&name.as_str()) {
                return Err(ValidationError::UnknownFilterParameter { kind, name });
            }
            kept.insert(name, value);
        }

        if kept.is_empty() {
            return Err(ValidationError::EmptyFilter { kind });
        }

        Ok(Self { kind, params: kept })
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{} {{{}}}", self.kind, pairs.join(", "))
    }
}
