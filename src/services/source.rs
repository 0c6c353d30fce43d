use crate::models::SourceSettings;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::io::{self, Read};
use std::time::Duration;
use thiserror::Error;

/// Encodings advertised to the sources; each one is handled by [`decode_body`].
pub const ACCEPTED_ENCODINGS: &str = "gzip, deflate, br, zstd";

const BROTLI_BUFFER_SIZE: usize = 4096;

/// Errors that can occur while fetching one dataset
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request execution failed for URL {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status code for URL {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decompress {encoding} body for URL {url}: {source}")]
    Decompress {
        url: String,
        encoding: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode JSON body for URL {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decompress { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

/// HTTP client shared by every fetch task.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    /// Build the client with the configured timeout, idle pool and browser-like headers.
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .pool_max_idle_per_host(settings.max_idle_connections)
            .pool_idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .default_headers(default_headers())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// GET `url`, decompress per `Content-Encoding` and decode the JSON body into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let decoded =
            decode_body(encoding.as_deref(), &body).map_err(|source| FetchError::Decompress {
                url: url.to_string(),
                encoding: encoding.clone().unwrap_or_default(),
                source,
            })?;

        let value = serde_json::from_slice(&decoded).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!("Fetched {} ({} bytes decoded)", url, decoded.len());
        Ok(value)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPTED_ENCODINGS));
    headers.insert(
        HeaderName::from_static("priority"),
        HeaderValue::from_static("u=1"),
    );
    headers
}

/// Decompress a response body according to its `Content-Encoding`.
///
/// Unknown or absent encodings are treated as identity and borrowed unchanged.
pub fn decode_body<'a>(encoding: Option<&str>, body: &'a [u8]) -> io::Result<Cow<'a, [u8]>> {
    let mut decoded = Vec::new();
    match encoding.map(str::trim) {
        Some("gzip") => {
            flate2::read::GzDecoder::new(body).read_to_end(&mut decoded)?;
        }
        Some("deflate") => {
            flate2::read::ZlibDecoder::new(body).read_to_end(&mut decoded)?;
        }
        Some("br") => {
            brotli::Decompressor::new(body, BROTLI_BUFFER_SIZE).read_to_end(&mut decoded)?;
        }
        Some("zstd") => {
            decoded = zstd::stream::decode_all(body)?;
        }
        _ => return Ok(Cow::Borrowed(body)),
    }
    Ok(Cow::Owned(decoded))
}
