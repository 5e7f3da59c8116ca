// src/types/search.rs
//! Similarity search request vocabulary and its local validation rules.

use super::ValidationError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Search algorithm run by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    MashDist,
    MashScreen,
    Blastn,
    Tblastn,
}

impl SearchType {
    pub const ALL: [SearchType; 4] = [
        SearchType::MashDist,
        SearchType::MashScreen,
        SearchType::Blastn,
        SearchType::Tblastn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MashDist => "mash_dist",
            Self::MashScreen => "mash_screen",
            Self::Blastn => "blastn",
            Self::Tblastn => "tblastn",
        }
    }
}

impl FromStr for SearchType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidSearchType(s.to_string()))
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valid range of a numeric search parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericRange {
    /// Fraction in `[0, 1]`.
    Proportion,
    /// Percentage in `[0, 100]`.
    Percentage,
}

impl NumericRange {
    pub fn upper_bound(&self) -> f64 {
        match self {
            Self::Proportion => 1.0,
            Self::Percentage => 100.0,
        }
    }

    /// Checks `value` against the range. NaN is never in range.
    pub fn check(&self, name: &'static str, value: f64) -> Result<f64, ValidationError> {
        let max = self.upper_bound();
        if (0.0..=max).contains(&value) {
            Ok(value)
        } else {
            Err(ValidationError::OutOfRange {
                name,
                value,
                min: 0.0,
                max,
            })
        }
    }
}

/// Tuning knobs for the four search types. Every field is sent on each submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParameters {
    /// Maximum p-value for mash screen and mash dist.
    pub mash_max_v: f64,
    /// Maximum distance for mash dist.
    pub mash_max_d: f64,
    /// Minimum identity for mash screen.
    pub mash_min_i: f64,
    /// Winner-takes-all strategy for mash screen.
    pub mash_screen_w: bool,
    /// Process each sequence individually for mash dist.
    pub mash_dist_i: bool,
    /// Minimum identity for blastn.
    pub blastn_min_i: f64,
    /// Minimum query coverage per HSP for blastn.
    pub blastn_min_c: f64,
    /// Minimum query coverage per HSP for tblastn.
    pub tblastn_min_c: f64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            mash_max_v: 0.1,
            mash_max_d: 0.1,
            mash_min_i: 0.99,
            mash_screen_w: false,
            mash_dist_i: false,
            blastn_min_i: 60.0,
            blastn_min_c: 90.0,
            tblastn_min_c: 90.0,
        }
    }
}

impl SearchParameters {
    fn numeric(&self) -> [(&'static str, f64, NumericRange); 6] {
        [
            ("mash_max_v", self.mash_max_v, NumericRange::Proportion),
            ("mash_max_d", self.mash_max_d, NumericRange::Proportion),
            ("mash_min_i", self.mash_min_i, NumericRange::Proportion),
            ("blastn_min_i", self.blastn_min_i, NumericRange::Percentage),
            ("blastn_min_c", self.blastn_min_c, NumericRange::Percentage),
            ("tblastn_min_c", self.tblastn_min_c, NumericRange::Percentage),
        ]
    }

    /// Fails on the first parameter outside its declared range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value, range) in self.numeric() {
            range.check(name, value)?;
        }
        Ok(())
    }

    /// Form fields in the order the server documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let flag = |b: bool| if b { "True" } else { "False" }.to_string();
        vec![
            ("mash_max_v", self.mash_max_v.to_string()),
            ("mash_max_d", self.mash_max_d.to_string()),
            ("mash_min_i", self.mash_min_i.to_string()),
            ("mash_screen_w", flag(self.mash_screen_w)),
            ("mash_dist_i", flag(self.mash_dist_i)),
            ("blastn_min_i", self.blastn_min_i.to_string()),
            ("blastn_min_c", self.blastn_min_c.to_string()),
            ("tblastn_min_c", self.tblastn_min_c.to_string()),
        ]
    }
}

/// The query sequence(s) of a search: a FASTA file or one inline sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchInput {
    File(PathBuf),
    Inline { name: String, sequence: String },
}

impl SearchInput {
    /// Builds the input from the two optional sources; exactly one must be given.
    pub fn from_sources(
        file: Option<PathBuf>,
        sequence: Option<String>,
        name: Option<String>,
    ) -> Result<Self, ValidationError> {
        let sequence = sequence.filter(|s| !s.trim().is_empty());
        match (file, sequence) {
            (Some(_), Some(_)) => Err(ValidationError::ConflictingSearchInput),
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(sequence)) => Ok(Self::Inline {
                name: name.unwrap_or_else(|| crate::constants::DEFAULT_SEQUENCE_NAME.to_string()),
                sequence,
            }),
            (None, None) => Err(ValidationError::MissingSearchInput),
        }
    }

    /// Rejects a blank inline sequence or an empty file path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let blank = match self {
            Self::File(path) => path.as_os_str().is_empty(),
            Self::Inline { sequence, .. } => sequence.trim().is_empty(),
        };
        if blank {
            return Err(ValidationError::MissingSearchInput);
        }
        Ok(())
    }

    /// Name of the uploaded multipart file part.
    pub fn upload_name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "query.fasta".to_string()),
            Self::Inline { name, .. } => format!("{}.fasta", name),
        }
    }
}

/// A validated similarity search submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub search_type: SearchType,
    pub input: SearchInput,
    pub parameters: SearchParameters,
}

impl SearchRequest {
    /// Validates the input and parameters and assembles a request.
    pub fn new(
        search_type: &str,
        input: SearchInput,
        parameters: SearchParameters,
    ) -> Result<Self, ValidationError> {
        let search_type = search_type.parse()?;
        input.validate()?;
        parameters.validate()?;
        Ok(Self {
            search_type,
            input,
            parameters,
        })
    }

    /// Form fields sent next to the uploaded file.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("search_type", self.search_type.to_string())];
        fields.extend(self.parameters.form_fields());
        fields
    }
}
