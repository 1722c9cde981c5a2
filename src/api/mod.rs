//! Remote fetch client for the NASA APOD service.
//!
//! Each fetch is one HTTP GET executed on a spawned tokio task. The caller
//! receives coarse progress values followed by exactly one terminal result,
//! all delivered in order over a single event channel.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::debug;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{ImageRecord, MediaType};

const BASE_URL: &str = "https://api.nasa.gov/planetary/apod";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Earliest date the APOD archive covers.
pub const FIRST_APOD_DATE: &str = "1995-06-16";

/// Whether `date` parses as YYYY-MM-DD and falls within the archive range
/// (first APOD through today). The service is still the authority; this only
/// lets callers warn before spending a request.
pub fn date_in_range(date: &str) -> bool {
    let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
        return false;
    };
    let Ok(first) = NaiveDate::parse_from_str(FIRST_APOD_DATE, "%Y-%m-%d") else {
        return false;
    };
    parsed >= first && parsed <= Local::now().date_naive()
}

/// Terminal failure of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, timeout, or other transport fault.
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx response. `message` is the service's `msg` field when the
    /// error body carries one, otherwise `HTTP Error: <code>`.
    #[error("{message}")]
    HttpStatus { code: u16, message: String },
    /// Response body was not the expected JSON shape.
    #[error("Error parsing response: {0}")]
    Parse(String),
}

/// Events emitted by an in-flight fetch: zero or more `Progress` values
/// (non-decreasing, in `[0, 100]`) and then exactly one `Done`.
#[derive(Debug)]
pub enum FetchEvent {
    Progress(u8),
    Done(Result<ImageRecord, FetchError>),
}

/// Handle to one in-flight fetch.
///
/// Dropping the handle abandons the events; the task still runs to
/// completion. There is no cancellation contract.
pub struct FetchTask {
    events: mpsc::UnboundedReceiver<FetchEvent>,
}

impl FetchTask {
    /// Next event, or `None` once the channel is drained after `Done`.
    pub async fn next_event(&mut self) -> Option<FetchEvent> {
        self.events.recv().await
    }

    /// Discard progress and wait for the terminal result.
    pub async fn join(mut self) -> Result<ImageRecord, FetchError> {
        while let Some(event) = self.events.recv().await {
            if let FetchEvent::Done(result) = event {
                return result;
            }
        }
        Err(FetchError::Network(
            "fetch task ended without a result".to_string(),
        ))
    }
}

/// Client for the APOD endpoint. Cheap to clone; clones share the underlying
/// HTTP connection pool.
#[derive(Debug, Clone)]
pub struct ApodClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApodClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Start a fetch for `date` (YYYY-MM-DD). Must be called from within a
    /// tokio runtime.
    ///
    /// Never blocks and never fails synchronously; every outcome arrives as
    /// an event on the returned task. The date range is not validated here,
    /// out-of-range dates come back as an HTTP error from the service.
    pub fn fetch(&self, date: &str) -> FetchTask {
        let (tx, rx) = mpsc::unbounded_channel();
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();
        let date = date.to_string();

        tokio::spawn(async move {
            debug!("fetching APOD entry for {date}");
            let result = run_fetch(&http, &base_url, &api_key, &date, &tx).await;
            // Sole terminal send; fails only if the caller dropped the task.
            let _ = tx.send(FetchEvent::Done(result));
        });

        FetchTask { events: rx }
    }
}

fn send_progress(tx: &mpsc::UnboundedSender<FetchEvent>, value: u8) {
    let _ = tx.send(FetchEvent::Progress(value));
}

async fn run_fetch(
    http: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    date: &str,
    tx: &mpsc::UnboundedSender<FetchEvent>,
) -> Result<ImageRecord, FetchError> {
    send_progress(tx, 10);

    let response = http
        .get(base_url)
        .query(&[("api_key", api_key), ("date", date)])
        .send()
        .await
        .map_err(|err| FetchError::Network(err.to_string()))?;

    send_progress(tx, 30);

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::HttpStatus {
            code: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        });
    }

    send_progress(tx, 50);

    let body = response
        .text()
        .await
        .map_err(|err| FetchError::Network(err.to_string()))?;

    send_progress(tx, 70);

    let raw: ApodResponse =
        serde_json::from_str(&body).map_err(|err| FetchError::Parse(err.to_string()))?;
    let record = raw.into_record();

    send_progress(tx, 100);

    Ok(record)
}

/// Prefer the service's `msg` field when the error body carries one.
fn error_message(code: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.msg)
        .unwrap_or_else(|| format!("HTTP Error: {code}"))
}

#[derive(Deserialize)]
struct ErrorBody {
    msg: Option<String>,
}

/// Raw response shape. Every field is optional; defaults are applied when
/// mapping to an [`ImageRecord`], never inferred stricter than the service.
#[derive(Deserialize)]
struct ApodResponse {
    title: Option<String>,
    date: Option<String>,
    explanation: Option<String>,
    url: Option<String>,
    hdurl: Option<String>,
    media_type: Option<String>,
    copyright: Option<String>,
}

impl ApodResponse {
    fn into_record(self) -> ImageRecord {
        ImageRecord {
            id: None,
            title: self.title.unwrap_or_else(|| "No Title".to_string()),
            date: self.date.unwrap_or_default(),
            explanation: self.explanation.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            hd_url: self.hdurl.unwrap_or_default(),
            media_type: self.media_type.map(MediaType::from).unwrap_or_default(),
            copyright: self.copyright.unwrap_or_default(),
        }
    }
}
