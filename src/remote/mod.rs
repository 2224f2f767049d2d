//! Remote note persistence against a demo JSON collection endpoint.
//!
//! There is no retry, conflict handling or authentication. Any transport
//! or status failure is returned to the caller as a [`RemoteError`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collection endpoint used when no `--remote-url` is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

const NOTE_TITLE: &str = "Markdown Note";
const DEMO_USER_ID: u32 = 1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A remote place the current document can be sent to and fetched from.
pub trait RemoteSync {
    /// Submit `text` as a new record.
    ///
    /// # Errors
    /// Returns an error on any transport or server failure.
    fn save(&self, text: &str) -> Result<(), RemoteError>;

    /// Body of the first remote record, or an empty string when there are none.
    ///
    /// # Errors
    /// Returns an error on any transport or server failure.
    fn load(&self) -> Result<String, RemoteError>;
}

/// Record submitted on save.
#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(rename = "userId")]
    user_id: u32,
}

/// Record returned by the collection listing. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct Record {
    #[serde(default)]
    body: Option<String>,
}

fn first_body(records: Vec<Record>) -> String {
    records
        .into_iter()
        .next()
        .and_then(|record| record.body)
        .unwrap_or_default()
}

/// [`RemoteSync`] over blocking HTTP.
///
/// Calls block the current thread; the TUI runs them on a worker thread.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport(&self, source: reqwest::Error) -> RemoteError {
        RemoteError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }

    fn check_status(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(RemoteError::Status {
                url: self.endpoint.clone(),
                status,
            })
        }
    }
}

impl Default for HttpRemote {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl RemoteSync for HttpRemote {
    fn save(&self, text: &str) -> Result<(), RemoteError> {
        let record = NewRecord {
            title: NOTE_TITLE,
            body: text,
            user_id: DEMO_USER_ID,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&record)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .map_err(|e| self.transport(e))?;
        self.check_status(response)?;
        tracing::info!(endpoint = %self.endpoint, bytes = text.len(), "saved note remotely");
        Ok(())
    }

    fn load(&self) -> Result<String, RemoteError> {
        let response = self
            .client
            .get(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .map_err(|e| self.transport(e))?;
        let records: Vec<Record> =
            self.check_status(response)?
                .json()
                .map_err(|source| RemoteError::Decode {
                    url: self.endpoint.clone(),
                    source,
                })?;
        tracing::info!(endpoint = %self.endpoint, records = records.len(), "loaded notes");
        Ok(first_body(records))
    }
}
