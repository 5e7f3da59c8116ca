// src/api/client.rs
//! HTTP client for the PLSDB API.
//!
//! A thin wrapper around reqwest: it builds requests, rejects non-200
//! answers, and hands bodies back undecoded. Parsing lives in `parser`.

use super::responses::{FastaDelivery, FastaReply};
use super::{parser, PlsdbRepository, SearchUpload};
use crate::constants::{
    FASTA_ENDPOINT, SEARCH_UPLOAD_FIELD, SEQUENCE_ENDPOINT, SUMMARY_ENDPOINT,
};
use crate::error::{AppError, ProtocolError};
use crate::types::{Accession, FilterQuery, JobId, ValidationError};
use futures::StreamExt;
use reqwest::{header, multipart, Client, Response, StatusCode};
use serde_json::Value;
use url::Url;

/// A thin wrapper around reqwest Client for PLSDB API requests.
#[derive(Clone)]
pub struct PlsdbHttpClient {
    client: Client,
    base_url: Url,
}

impl PlsdbHttpClient {
    /// Creates a client rooted at `base_url`. Endpoint paths are joined onto it.
    pub fn new(base_url: Url) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("plsdb-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_base(base_url),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, AppError> {
        self.base_url.join(endpoint).map_err(|e| {
            ValidationError::InvalidUrl {
                url: format!("{}{}", self.base_url, endpoint),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Makes a GET request with query parameters.
    async fn get<Q: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        query: &Q,
    ) -> Result<Response, AppError> {
        let url = self.endpoint_url(endpoint)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        ensure_ok(response, endpoint)
    }

    /// Makes a POST request with a url-encoded form body.
    async fn post_form<F: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        form: &F,
    ) -> Result<Response, AppError> {
        let url = self.endpoint_url(endpoint)?;
        log::debug!("POST {}", url);
        let response = self.client.post(url).form(form).send().await?;
        ensure_ok(response, endpoint)
    }

    /// Makes a POST request with a multipart body.
    async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<Response, AppError> {
        let url = self.endpoint_url(endpoint)?;
        log::debug!("POST multipart {}", url);
        let response = self.client.post(url).multipart(form).send().await?;
        ensure_ok(response, endpoint)
    }
}

#[async_trait::async_trait]
impl PlsdbRepository for PlsdbHttpClient {
    async fn submit_fasta(&self, joined_accessions: &str) -> Result<Value, AppError> {
        let response = self
            .post_form(FASTA_ENDPOINT, &[("fastas", joined_accessions)])
            .await?;
        read_json(response).await
    }

    async fn fasta_status(&self, job: &JobId) -> Result<FastaReply, AppError> {
        let response = self
            .get(FASTA_ENDPOINT, &[("job_id", job.as_str())])
            .await?;

        if is_json(&response) {
            return Ok(FastaReply::Structured(read_json(response).await?));
        }

        let content_disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(AppError::from))
            .boxed();

        Ok(FastaReply::Delivery(FastaDelivery {
            content_disposition,
            body,
        }))
    }

    async fn lookup_summary(&self, accession: &Accession) -> Result<Value, AppError> {
        let response = self
            .get(SUMMARY_ENDPOINT, &[("NUCCORE_ACC", accession.as_str())])
            .await?;
        read_json(response).await
    }

    async fn submit_search(&self, upload: SearchUpload) -> Result<Value, AppError> {
        let part = multipart::Part::bytes(upload.contents).file_name(upload.file_name);
        let form = upload
            .fields
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            })
            .part(SEARCH_UPLOAD_FIELD, part);

        let response = self.post_multipart(SEQUENCE_ENDPOINT, form).await?;
        read_json(response).await
    }

    async fn search_status(&self, job: &JobId) -> Result<Value, AppError> {
        let response = self
            .get(SEQUENCE_ENDPOINT, &[("job_id", job.as_str())])
            .await?;
        read_json(response).await
    }

    async fn filter(&self, query: &FilterQuery) -> Result<Value, AppError> {
        let params: Vec<(&str, &str)> = query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let response = self.get(query.kind().endpoint(), &params).await?;
        read_json(response).await
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Rejects every answer other than 200 OK.
fn ensure_ok(response: Response, endpoint: &str) -> Result<Response, AppError> {
    let status = response.status();
    if status != StatusCode::OK {
        log::debug!("{} answered {}", endpoint, status);
        return Err(ProtocolError::UnexpectedStatus {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        }
        .into());
    }
    Ok(response)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}

async fn read_json(response: Response) -> Result<Value, AppError> {
    let text = response.text().await?;
    Ok(parser::parse_json(&text)?)
}
