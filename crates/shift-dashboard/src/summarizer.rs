//! External summarization service.
//!
//! The board hands the current faults, planned works and a
//! [`SummaryContext`] to a [`Summarizer`] and gets back one generated text.
//! A failure never touches the board; the caller logs it and moves on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use shift_core::config::SummarizerConfig;
use shift_core::{Fault, PlannedWork, SummaryContext};

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("no summarizer endpoint is configured")]
    NotConfigured,

    #[error("summarizer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("summarizer answered with status {0}")]
    Status(StatusCode),

    #[error("summarizer returned an empty summary")]
    Empty,
}

/// Payload posted to the summarization service.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    pub faults: Vec<Fault>,
    pub planned_works: Vec<PlannedWork>,
    pub context: SummaryContext,
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    text: String,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError>;
}

/// Used when no endpoint is configured; every request fails.
pub struct UnconfiguredSummarizer;

#[async_trait]
impl Summarizer for UnconfiguredSummarizer {
    async fn summarize(&self, _request: &SummaryRequest) -> Result<String, SummarizeError> {
        Err(SummarizeError::NotConfigured)
    }
}

/// JSON-over-HTTP summarizer. Posts a [`SummaryRequest`] and expects
/// `{ "text": "..." }` back.
pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpSummarizer {
    pub fn new(endpoint: Url, api_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let mut call = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status));
        }

        let reply: SummaryReply = response.json().await?;
        debug!(endpoint = %self.endpoint, chars = reply.text.chars().count(), "summary received");
        non_empty(reply.text)
    }
}

fn non_empty(text: String) -> Result<String, SummarizeError> {
    if text.trim().is_empty() {
        Err(SummarizeError::Empty)
    } else {
        Ok(text)
    }
}

/// Build the summarizer described by the config section.
pub fn from_config(config: &SummarizerConfig) -> anyhow::Result<Box<dyn Summarizer>> {
    match &config.endpoint {
        Some(endpoint) => {
            let endpoint = Url::parse(endpoint)?;
            let summarizer = HttpSummarizer::new(
                endpoint,
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(summarizer))
        }
        None => Ok(Box::new(UnconfiguredSummarizer)),
    }
}
