// tests/job_protocol.rs
//! Submit / poll / deliver against a mock PLSDB over real HTTP.

mod common;

use common::TestPlsdb;
use plsdb_client::{
    decode_split_table, Accession, AppError, PollPolicy, ProtocolError, SearchInput,
    SearchParameters,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn inline(sequence: &str) -> SearchInput {
    SearchInput::from_sources(None, Some(sequence.to_string()), None).unwrap()
}

fn results_table() -> serde_json::Value {
    json!({
        "columns": ["query", "hit", "identity"],
        "index": [0, 1],
        "data": [["seq1", "NZ_CP031107.1", 99.8], ["seq1", "NZ_CP012345.1", 97.1]]
    })
}

#[tokio::test]
async fn search_pauses_once_per_running_answer() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "s-42"})))
        .expect(1)
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sequence/"))
        .and(query_param("job_id", "s-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "running"})))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sequence/"))
        .and(query_param("job_id", "s-42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "finished", "results": results_table()})),
        )
        .with_priority(2)
        .mount(&plsdb.server)
        .await;

    let table = plsdb
        .client
        .search("blastn", inline("ACGTACGT"), SearchParameters::default())
        .await
        .unwrap();

    assert_eq!(plsdb.pause.count(), 3);
    assert_eq!(plsdb.pause.total(), Duration::from_secs(15));
    assert_eq!(table, decode_split_table(results_table()).unwrap());
    assert_eq!(plsdb.request_count().await, 5);
}

#[tokio::test]
async fn search_upload_carries_file_and_parameters() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .and(body_string_contains("name=\"fasta_file\""))
        .and(body_string_contains(">query1\nACGT"))
        .and(body_string_contains("mash_screen_w"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "finished", "results": results_table()})),
        )
        .expect(1)
        .mount(&plsdb.server)
        .await;

    let input =
        SearchInput::from_sources(None, Some("ACGT".into()), Some("query1".into())).unwrap();
    let table = plsdb
        .client
        .search("mash_screen", input, SearchParameters::default())
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(plsdb.pause.count(), 0);
}

#[tokio::test]
async fn search_file_input_is_uploaded() {
    let plsdb = TestPlsdb::start().await;
    let query = plsdb.output.path().join("query.fasta");
    std::fs::write(&query, ">from_file\nTTTT\n").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .and(body_string_contains(">from_file\nTTTT"))
        .and(body_string_contains("filename=\"query.fasta\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "s-1"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sequence/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "finished", "results": results_table()})),
        )
        .mount(&plsdb.server)
        .await;

    let input = SearchInput::from_sources(Some(query), None, None).unwrap();
    let table = plsdb
        .client
        .search("tblastn", input, SearchParameters::default())
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
}

#[tokio::test]
async fn out_of_range_percentage_sends_no_request() {
    let plsdb = TestPlsdb::start().await;
    let parameters = SearchParameters {
        blastn_min_c: 150.0,
        ..SearchParameters::default()
    };

    let err = plsdb
        .client
        .search("blastn", inline("ACGT"), parameters)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(plsdb.request_count().await, 0);
}

#[tokio::test]
async fn unknown_search_type_sends_no_request() {
    let plsdb = TestPlsdb::start().await;

    let err = plsdb
        .client
        .search("diamond", inline("ACGT"), SearchParameters::default())
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(plsdb.request_count().await, 0);
}

#[tokio::test]
async fn blank_or_missing_search_input_sends_no_request() {
    let plsdb = TestPlsdb::start().await;
    let blank = SearchInput::Inline {
        name: "q".to_string(),
        sequence: String::new(),
    };
    let missing = SearchInput::File(plsdb.output.path().join("absent.fasta"));

    for input in [blank, missing] {
        let err = plsdb
            .client
            .search("blastn", input, SearchParameters::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
    assert_eq!(plsdb.request_count().await, 0);
}

#[tokio::test]
async fn invalid_post_fails_with_server_message() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "invalid post", "error": "no sequence given"})),
        )
        .mount(&plsdb.server)
        .await;

    let err = plsdb
        .client
        .search("mash_dist", inline("ACGT"), SearchParameters::default())
        .await
        .unwrap_err();

    assert!(err.is_job_failure());
    assert!(err.to_string().contains("no sequence given"));
    assert_eq!(plsdb.request_count().await, 1);
}

#[tokio::test]
async fn failed_label_is_never_retried() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "s-9"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sequence/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "failed"})))
        .expect(1)
        .mount(&plsdb.server)
        .await;

    let err = plsdb
        .client
        .search("mash_dist", inline("ACGT"), SearchParameters::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::JobFailed { ref label } if label == "failed"));
    assert_eq!(plsdb.pause.count(), 0);
}

#[tokio::test]
async fn non_200_status_poll_is_a_protocol_error() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sequence/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "s-5"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sequence/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&plsdb.server)
        .await;

    let err = plsdb
        .client
        .search("mash_dist", inline("ACGT"), SearchParameters::default())
        .await
        .unwrap_err();

    match err {
        AppError::Protocol(protocol) => assert_eq!(protocol.status(), Some(502)),
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn submit_without_job_id_is_a_protocol_error() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "queued"})))
        .mount(&plsdb.server)
        .await;

    let ids = Accession::parse_list(&["NZ_1"]).unwrap();
    let err = plsdb.client.download_fasta(&ids).await.unwrap_err();

    assert!(matches!(err, AppError::Protocol(ProtocolError::MissingJobId)));
}

#[tokio::test]
async fn attempt_cap_stops_a_job_that_never_ends() {
    let plsdb = TestPlsdb::start_with_policy(
        PollPolicy::default()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(4),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "f-1"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "running"})))
        .mount(&plsdb.server)
        .await;

    let ids = Accession::parse_list(&["NZ_1"]).unwrap();
    let err = plsdb.client.download_fasta(&ids).await.unwrap_err();

    assert!(matches!(err, AppError::PollExhausted { attempts: 4 }));
    assert_eq!(plsdb.request_count().await, 5);
    assert_eq!(plsdb.pause.count(), 3);
    assert!(plsdb.output_files().is_empty());
}

#[tokio::test]
async fn bulk_download_streams_the_delivered_file() {
    let plsdb = TestPlsdb::start().await;
    let fasta = format!(">NZ_1\n{}\n>NZ_2\n{}\n", "A".repeat(1500), "C".repeat(900));

    Mock::given(method("POST"))
        .and(path("/api/fasta"))
        .and(body_string_contains("fastas=NZ_1%3BNZ_2%3B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "f-7"})))
        .expect(1)
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fasta"))
        .and(query_param("job_id", "f-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"label": "running"})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fasta"))
        .and(query_param("job_id", "f-7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .insert_header("content-disposition", "attachment; filename=\"plsdb_f-7.fasta\"")
                .set_body_bytes(fasta.clone().into_bytes()),
        )
        .with_priority(2)
        .mount(&plsdb.server)
        .await;

    let ids = Accession::parse_list(&["NZ_1", "NZ_2"]).unwrap();
    let download = plsdb.client.download_fasta(&ids).await.unwrap();

    assert_eq!(plsdb.pause.count(), 1);
    assert_eq!(download.path, plsdb.output.path().join("plsdb_f-7.fasta"));
    assert_eq!(download.bytes_written, fasta.len() as u64);
    assert_eq!(std::fs::read_to_string(&download.path).unwrap(), fasta);
}

#[tokio::test]
async fn notfound_accessions_fail_without_creating_a_file() {
    let plsdb = TestPlsdb::start().await;

    Mock::given(method("POST"))
        .and(path("/api/fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "f-2"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fasta"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"label": "failed", "notfound": ["X1"]})),
        )
        .mount(&plsdb.server)
        .await;

    let ids = Accession::parse_list(&["NZ_1", "X1"]).unwrap();
    let err = plsdb.client.download_fasta(&ids).await.unwrap_err();

    match &err {
        AppError::AccessionsNotFound { accessions } => assert_eq!(accessions, &["X1"]),
        other => panic!("expected not found, got {:?}", other),
    }
    assert!(err.to_string().contains("X1"));
    assert!(plsdb.output_files().is_empty());
}

#[tokio::test]
async fn existing_download_is_not_overwritten() {
    let plsdb = TestPlsdb::start().await;
    let existing = plsdb.output.path().join("plsdb.fasta");
    std::fs::write(&existing, ">old\n").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/fasta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "f-3"})))
        .mount(&plsdb.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/fasta"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=plsdb.fasta")
                .set_body_bytes(b">new\nACGT\n".to_vec()),
        )
        .mount(&plsdb.server)
        .await;

    let ids = Accession::parse_list(&["NZ_1"]).unwrap();
    let err = plsdb.client.download_fasta(&ids).await.unwrap_err();

    assert!(matches!(err, AppError::OutputExists { .. }));
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), ">old\n");
}
