// src/pipeline.rs
//! The client facade: one method per user-facing operation.
//!
//! Each call drives its stages in order on the calling task: validate,
//! request, classify or poll, assemble, and optionally download FASTA.

use crate::api::{parser, PlsdbHttpClient, PlsdbRepository};
use crate::config::ClientConfig;
use crate::constants::ACCESSION_COLUMN;
use crate::error::AppError;
use crate::jobs::{fasta, search, JobContext, Pause, PollPolicy, TokioPause};
use crate::lookup;
use crate::model::{FastaDownload, PartialFailure, ResultTable, TableReport};
use crate::output::LogProgress;
use crate::types::{Accession, FilterQuery, SearchInput, SearchParameters, SearchRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const FASTA_STAGE: &str = "fasta download";

/// Entry point for every PLSDB operation.
#[derive(Clone)]
pub struct PlsdbClient {
    repository: Arc<dyn PlsdbRepository>,
    pause: Arc<dyn Pause>,
    policy: PollPolicy,
    cancel: CancellationToken,
    output_dir: PathBuf,
}

impl PlsdbClient {
    /// Creates a client talking HTTP to the configured base URL.
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let http = PlsdbHttpClient::new(config.base_url.clone())?;
        Ok(Self::with_repository(Arc::new(http), config))
    }

    /// Creates a client over any repository implementation.
    pub fn with_repository(repository: Arc<dyn PlsdbRepository>, config: &ClientConfig) -> Self {
        Self {
            repository,
            pause: Arc::new(TokioPause),
            policy: config.poll_policy.clone(),
            cancel: CancellationToken::new(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Token that aborts any poll loop of this client when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn context(&self) -> JobContext<'_> {
        JobContext {
            repository: self.repository.as_ref(),
            pause: self.pause.as_ref(),
            policy: &self.policy,
            cancel: &self.cancel,
        }
    }

    /// Looks up each accession and returns the summary table.
    ///
    /// With `fasta`, the found accessions are downloaded afterwards; a failed
    /// download is reported on the returned report instead of failing the call.
    pub async fn summary(
        &self,
        accessions: &[Accession],
        fasta: bool,
    ) -> Result<TableReport, AppError> {
        let partition =
            lookup::classify_batch(self.repository.as_ref(), accessions, &self.cancel).await?;
        let mut report = TableReport::new(lookup::assemble(&partition));

        if fasta {
            self.attach_fasta(&mut report, partition.found_accessions()).await?;
        }
        Ok(report)
    }

    /// Downloads the FASTA sequences of `accessions` into the output directory.
    pub async fn download_fasta(
        &self,
        accessions: &[Accession],
    ) -> Result<FastaDownload, AppError> {
        log::info!("START fasta download for {} accession(s)", accessions.len());
        fasta::download_fasta(
            &self.context(),
            accessions,
            &self.output_dir,
            &mut LogProgress,
        )
        .await
    }

    /// Runs an already validated similarity search.
    pub async fn query_sequence(&self, request: &SearchRequest) -> Result<ResultTable, AppError> {
        search::run_search(&self.context(), request).await
    }

    /// Validates and runs a similarity search.
    pub async fn search(
        &self,
        search_type: &str,
        input: SearchInput,
        parameters: SearchParameters,
    ) -> Result<ResultTable, AppError> {
        let request = SearchRequest::new(search_type, input, parameters)?;
        self.query_sequence(&request).await
    }

    /// Runs a metadata filter.
    ///
    /// With `fasta`, nuccore and biosample results are downloaded afterwards
    /// under the same partial-failure policy as [`summary`](Self::summary).
    pub async fn filter(&self, query: &FilterQuery, fasta: bool) -> Result<TableReport, AppError> {
        log::info!("START filter {}", query);
        let value = self.repository.filter(query).await?;
        let table = parser::decode_filter_table(value)?;

        if table.is_empty() {
            log::info!("No plasmid found for filter {}", query);
            return Ok(TableReport::default());
        }
        log::info!("{} plasmid(s) match filter {}", table.len(), query);

        let accessions = if fasta && query.kind().supports_fasta() {
            Some(accessions_in(&table))
        } else {
            if fasta {
                log::warn!("fasta download is not offered for {} filters", query.kind());
            }
            None
        };

        let mut report = TableReport::new(table);
        if let Some(accessions) = accessions {
            self.attach_fasta(&mut report, accessions).await?;
        }
        Ok(report)
    }

    /// Downloads FASTA for a finished table. Only cancellation propagates;
    /// every other failure becomes a [`PartialFailure`].
    async fn attach_fasta(
        &self,
        report: &mut TableReport,
        accessions: Vec<Accession>,
    ) -> Result<(), AppError> {
        if accessions.is_empty() {
            record_partial(report, "no plasmid was found, nothing to download".to_string());
            return Ok(());
        }

        match self.download_fasta(&accessions).await {
            Ok(download) => report.fasta = Some(download),
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => record_partial(report, e.to_string()),
        }
        Ok(())
    }
}

fn record_partial(report: &mut TableReport, message: String) {
    log::warn!("{} failed: {}", FASTA_STAGE, message);
    report.partial_failures.push(PartialFailure {
        stage: FASTA_STAGE,
        message,
    });
}

/// Distinct accessions of the `NUCCORE_ACC` column, in row order.
fn accessions_in(table: &ResultTable) -> Vec<Accession> {
    let mut seen = Vec::new();
    for value in table.column_values(ACCESSION_COLUMN).unwrap_or_default() {
        let Some(id) = value.as_str() else { continue };
        match Accession::parse(id) {
            Ok(accession) if !seen.contains(&accession) => seen.push(accession),
            Ok(_) => {}
            Err(e) => log::debug!("skipping accession {:?}: {}", id, e),
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::{RecordingPause, ScriptedFasta, ScriptedPlsdb};
    use crate::types::FilterKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Harness {
        repo: Arc<ScriptedPlsdb>,
        pause: Arc<RecordingPause>,
        client: PlsdbClient,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(ScriptedPlsdb::default());
        let pause = Arc::new(RecordingPause::default());
        let config = ClientConfig::default().with_output_dir(dir.path());
        let client = PlsdbClient::with_repository(repo.clone(), &config).with_pause(pause.clone());
        Harness {
            repo,
            pause,
            client,
            _dir: dir,
        }
    }

    fn ids(raw: &[&str]) -> Vec<Accession> {
        Accession::parse_list(raw).unwrap()
    }

    fn script_lookups(repo: &ScriptedPlsdb) {
        let mut lookups = repo.lookups.lock().unwrap();
        lookups.insert(
            "ACC1".into(),
            json!({"NUCCORE_ACC": "ACC1", "Metadata_annotations": {"host": "E. coli"}}),
        );
        lookups.insert(
            "ACC2".into(),
            json!({"searched": "ACC2", "found": ["ACC2.1", "ACC2.2"]}),
        );
    }

    #[tokio::test]
    async fn summary_labels_found_and_ambiguous_rows() {
        let h = harness();
        script_lookups(&h.repo);

        let report = h.client.summary(&ids(&["ACC1", "ACC2"]), false).await.unwrap();

        assert!(report.is_complete());
        assert!(report.fasta.is_none());
        let table = report.table;
        assert_eq!(&table.columns()[..2], &["label", "searched"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "label"), Some(&json!("found")));
        assert_eq!(table.cell(0, "searched"), Some(&json!("ACC1")));
        assert_eq!(table.cell(1, "label"), Some(&json!("notfound")));
        assert_eq!(table.cell(1, "searched"), Some(&json!("ACC2")));
        assert_eq!(table.index(), &[json!(0), json!(1)]);
    }

    #[tokio::test]
    async fn summary_fasta_downloads_only_found_accessions() {
        let h = harness();
        script_lookups(&h.repo);
        h.repo.submit_replies.lock().unwrap().push_back(json!({"job_id": "j1"}));
        h.repo.fasta_replies.lock().unwrap().push_back(ScriptedFasta::File {
            disposition: Some("attachment; filename=plsdb.fasta".into()),
            chunks: vec![b">ACC1\nACGT\n".to_vec()],
        });

        let report = h.client.summary(&ids(&["ACC1", "ACC2"]), true).await.unwrap();

        assert!(report.is_complete());
        let download = report.fasta.unwrap();
        assert_eq!(download.path, h.client.output_dir().join("plsdb.fasta"));
        assert!(h.repo.requests().contains(&"POST fasta ACC1;".to_string()));
        assert_eq!(h.pause.count(), 0);
    }

    #[tokio::test]
    async fn failed_download_keeps_the_table() {
        let h = harness();
        script_lookups(&h.repo);
        h.repo.submit_replies.lock().unwrap().push_back(json!({"job_id": "j1"}));
        h.repo
            .fasta_replies
            .lock()
            .unwrap()
            .push_back(ScriptedFasta::Json(json!({"label": "failed"})));

        let report = h.client.summary(&ids(&["ACC1", "ACC2"]), true).await.unwrap();

        assert_eq!(report.table.len(), 2);
        assert!(report.fasta.is_none());
        assert_eq!(report.partial_failures.len(), 1);
        assert_eq!(report.partial_failures[0].stage, "fasta download");
    }

    #[tokio::test]
    async fn nothing_found_skips_the_download_request() {
        let h = harness();
        script_lookups(&h.repo);

        let report = h.client.summary(&ids(&["ACC2"]), true).await.unwrap();

        assert_eq!(report.partial_failures.len(), 1);
        assert_eq!(h.repo.requests(), vec!["GET summary ACC2".to_string()]);
    }

    #[tokio::test]
    async fn blank_inline_sequence_sends_nothing() {
        let h = harness();
        let input = SearchInput::Inline {
            name: "q".into(),
            sequence: "   ".into(),
        };

        let err = h
            .client
            .search("blastn", input, SearchParameters::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(h.repo.request_count(), 0);
    }

    #[tokio::test]
    async fn out_of_range_search_sends_nothing() {
        let h = harness();
        let params = SearchParameters {
            blastn_min_i: 150.0,
            ..SearchParameters::default()
        };
        let input = SearchInput::from_sources(None, Some("ACGT".into()), None).unwrap();

        let err = h.client.search("blastn", input, params).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(h.repo.request_count(), 0);
    }

    #[tokio::test]
    async fn search_polls_until_finished() {
        let h = harness();
        let results = json!({"columns": ["query", "identity"], "index": [0], "data": [["q1", 99.5]]});
        h.repo.submit_replies.lock().unwrap().push_back(json!({"job_id": "s1"}));
        {
            let mut replies = h.repo.search_replies.lock().unwrap();
            for _ in 0..3 {
                replies.push_back(json!({"label": "running"}));
            }
            replies.push_back(json!({"label": "finished", "results": results.clone()}));
        }
        let input = SearchInput::from_sources(None, Some("ACGT".into()), None).unwrap();

        let table = h
            .client
            .search("mash_dist", input, SearchParameters::default())
            .await
            .unwrap();

        assert_eq!(h.pause.count(), 3);
        assert_eq!(table, parser::decode_split_table(results).unwrap());
    }

    #[tokio::test]
    async fn empty_filter_result_yields_empty_report() {
        let h = harness();
        *h.repo.filter_reply.lock().unwrap() = Some(json!([]));
        let query = FilterQuery::new(FilterKind::Nuccore, [("NUCCORE_Topology", "circular")]).unwrap();

        let report = h.client.filter(&query, true).await.unwrap();

        assert!(report.table.is_empty());
        assert!(report.is_complete());
        assert_eq!(h.repo.request_count(), 1);
    }

    #[tokio::test]
    async fn filter_fasta_uses_accession_column() {
        let h = harness();
        *h.repo.filter_reply.lock().unwrap() = Some(json!({
            "NUCCORE_ACC": ["NZ_1", "NZ_2", "NZ_1"],
            "NUCCORE_Topology": ["circular", "circular", "circular"]
        }));
        h.repo.submit_replies.lock().unwrap().push_back(json!({"job_id": "f1"}));
        h.repo.fasta_replies.lock().unwrap().push_back(ScriptedFasta::File {
            disposition: Some("attachment; filename=\"filter.fasta\"".into()),
            chunks: vec![b">NZ_1\nAC\n>NZ_2\nGT\n".to_vec()],
        });
        let query = FilterQuery::new(FilterKind::Nuccore, [("NUCCORE_Topology", "circular")]).unwrap();

        let report = h.client.filter(&query, true).await.unwrap();

        assert_eq!(report.table.len(), 3);
        assert!(report.fasta.is_some());
        assert!(h.repo.requests().contains(&"POST fasta NZ_1;NZ_2;".to_string()));
    }

    #[tokio::test]
    async fn taxonomy_filter_never_downloads() {
        let h = harness();
        *h.repo.filter_reply.lock().unwrap() = Some(json!({"NUCCORE_ACC": ["NZ_1"]}));
        let query =
            FilterQuery::new(FilterKind::Taxonomy, [("TAXONOMY_genus", "Escherichia")]).unwrap();

        let report = h.client.filter(&query, true).await.unwrap();

        assert_eq!(report.table.len(), 1);
        assert_eq!(h.repo.requests(), vec!["GET filter_taxonomy".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_summary_sends_no_lookup() {
        let h = harness();
        script_lookups(&h.repo);
        h.client.cancellation_token().cancel();

        let err = h.client.summary(&ids(&["ACC1", "ACC2"]), true).await.unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(h.repo.request_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_client_submits_no_download() {
        let h = harness();
        h.repo.submit_replies.lock().unwrap().push_back(json!({"job_id": "j1"}));
        h.client.cancellation_token().cancel();

        let err = h.client.download_fasta(&ids(&["ACC1"])).await.unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(h.repo.request_count(), 0);
    }
}
