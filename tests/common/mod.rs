// tests/common/mod.rs
//! Shared set-up for the HTTP-level tests: a wiremock PLSDB and a client
//! whose pauses are recorded instead of slept.

#![allow(dead_code)]

use plsdb_client::{ClientConfig, Pause, PlsdbClient, PollPolicy};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn count(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }

    pub fn total(&self) -> Duration {
        self.pauses.lock().unwrap().iter().sum()
    }
}

#[async_trait::async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

pub struct TestPlsdb {
    pub server: MockServer,
    pub client: PlsdbClient,
    pub pause: Arc<RecordingPause>,
    pub output: TempDir,
}

impl TestPlsdb {
    pub async fn start() -> Self {
        Self::start_with_policy(PollPolicy::default()).await
    }

    pub async fn start_with_policy(policy: PollPolicy) -> Self {
        let server = MockServer::start().await;
        let output = tempfile::tempdir().unwrap();
        let pause = Arc::new(RecordingPause::default());

        let base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        let config = ClientConfig::default()
            .with_base_url(base)
            .with_poll_policy(policy)
            .with_output_dir(output.path());
        let client = PlsdbClient::new(&config).unwrap().with_pause(pause.clone());

        Self {
            server,
            client,
            pause,
            output,
        }
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Names of the files in the output directory.
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
