// src/config.rs
use crate::constants::{API_URL_ENV, DEFAULT_API_URL};
use crate::error::AppError;
use crate::jobs::PollPolicy;
use crate::types::{
    Accession, FilterKind, FilterQuery, SearchInput, SearchParameters, SearchRequest,
    ValidationError,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about = "Query the PLSDB plasmid database", long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log file, appended to (defaults to plsdbapi.log in the working directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Base URL of the PLSDB API
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    pub base_url: String,

    /// Directory that receives downloaded FASTA files
    #[arg(short = 'd', long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// Seconds between two status queries of a running job
    #[arg(long, global = true, default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Give up after this many status queries
    #[arg(long, global = true)]
    pub max_polls: Option<u32>,

    /// Give up on a job after this many seconds of waiting
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Write the result table (TSV) to this file instead of stdout
    #[arg(short, long, global = true)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up plasmids by NUCCORE accession
    Summary {
        /// Accessions; a single argument may hold several separated by whitespace
        #[arg(required = true)]
        ids: Vec<String>,

        /// Also download the FASTA sequences of the plasmids that were found
        #[arg(long, default_value_t = false)]
        fasta: bool,
    },

    /// Download the FASTA sequences of the given accessions
    Fasta {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Run a similarity search (mash_dist, mash_screen, blastn, tblastn)
    Search(SearchArgs),

    /// Filter plasmids by metadata
    Filter {
        #[command(subcommand)]
        filter: FilterCommand,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// One of mash_dist, mash_screen, blastn, tblastn
    #[arg(long)]
    pub search_type: String,

    /// FASTA file with the query sequence(s)
    #[arg(long, conflicts_with = "sequence")]
    pub file: Option<PathBuf>,

    /// Query sequence given inline
    #[arg(long)]
    pub sequence: Option<String>,

    /// Record name for an inline sequence
    #[arg(long)]
    pub seqname: Option<String>,

    #[arg(long, default_value_t = 0.1)]
    pub mash_max_v: f64,

    #[arg(long, default_value_t = 0.1)]
    pub mash_max_d: f64,

    #[arg(long, default_value_t = 0.99)]
    pub mash_min_i: f64,

    #[arg(long, default_value_t = false)]
    pub mash_screen_w: bool,

    #[arg(long, default_value_t = false)]
    pub mash_dist_i: bool,

    #[arg(long, default_value_t = 60.0)]
    pub blastn_min_i: f64,

    #[arg(long, default_value_t = 90.0)]
    pub blastn_min_c: f64,

    #[arg(long, default_value_t = 90.0)]
    pub tblastn_min_c: f64,
}

impl SearchArgs {
    pub fn parameters(&self) -> SearchParameters {
        SearchParameters {
            mash_max_v: self.mash_max_v,
            mash_max_d: self.mash_max_d,
            mash_min_i: self.mash_min_i,
            mash_screen_w: self.mash_screen_w,
            mash_dist_i: self.mash_dist_i,
            blastn_min_i: self.blastn_min_i,
            blastn_min_c: self.blastn_min_c,
            tblastn_min_c: self.tblastn_min_c,
        }
    }

    /// Validates the arguments into a request without touching the input file.
    pub fn to_request(&self) -> Result<SearchRequest, ValidationError> {
        let input = SearchInput::from_sources(
            self.file.clone(),
            self.sequence.clone(),
            self.seqname.clone(),
        )?;
        SearchRequest::new(&self.search_type, input, self.parameters())
    }
}

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    /// Filter on nucleotide record metadata
    Nuccore(FilterArgs),
    /// Filter on biosample metadata
    Biosample(FilterArgs),
    /// Filter on host taxonomy
    Taxonomy(TaxonomyArgs),
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Filter parameter as NAME=VALUE; repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Also download the FASTA sequences of the matching plasmids
    #[arg(long, default_value_t = false)]
    pub fasta: bool,
}

#[derive(Args, Debug)]
pub struct TaxonomyArgs {
    /// Filter parameter as NAME=VALUE; repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

impl FilterCommand {
    /// The validated query and whether FASTA was requested.
    pub fn to_query(&self) -> Result<(FilterQuery, bool), ValidationError> {
        let (kind, params, fasta) = match self {
            Self::Nuccore(args) => (FilterKind::Nuccore, &args.params, args.fasta),
            Self::Biosample(args) => (FilterKind::Biosample, &args.params, args.fasta),
            Self::Taxonomy(args) => (FilterKind::Taxonomy, &args.params, false),
        };
        let query = FilterQuery::new(kind, params.iter().cloned())?;
        Ok((query, fasta))
    }
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in {:?}", input));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Splits positional id arguments into accessions.
pub fn parse_ids(raw: &[String]) -> Result<Vec<Accession>, ValidationError> {
    Accession::split_whitespace(&raw.join(" "))
}

/// Resolved client settings, validated and ready to drive every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub poll_policy: PollPolicy,
    pub output_dir: PathBuf,
}

impl ClientConfig {
    /// Resolves the client configuration from CLI input (which already folds
    /// in the `PLSDB_API_URL` environment variable).
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        let base_url = parse_base_url(&cli.base_url)?;

        let mut poll_policy =
            PollPolicy::default().with_interval(Duration::from_secs(cli.poll_interval_secs));
        if let Some(attempts) = cli.max_polls {
            poll_policy = poll_policy.with_max_attempts(attempts);
        }
        if let Some(secs) = cli.timeout_secs {
            poll_policy = poll_policy.with_deadline(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url,
            poll_policy,
            output_dir: cli.output_dir.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL should be valid"),
            poll_policy: PollPolicy::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Accepts absolute http(s) URLs only.
pub fn parse_base_url(input: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(input.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}
