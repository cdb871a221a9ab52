use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, LAST_MODIFIED, USER_AGENT};
use tracing::{debug, warn};

use crate::error::AmrError;
use crate::release::{extract_file_name, transport_url};

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    pub path: PathBuf,
    /// The file was already present and nothing was transferred.
    pub skipped: bool,
}

pub trait PatricClient: Send + Sync {
    /// Downloads `url` into `destination_dir`. An existing file is kept
    /// unless `overwrite` is set, in which case it is replaced only once the
    /// new copy has been written in full.
    fn fetch(
        &self,
        url: &Url,
        destination_dir: &Path,
        overwrite: bool,
    ) -> Result<DownloadInfo, AmrError>;
    fn last_modified(&self, url: &Url) -> Result<Option<DateTime<Utc>>, AmrError>;
}

#[derive(Clone)]
pub struct PatricHttpClient {
    client: Client,
}

impl PatricHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, AmrError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("patric-amr/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| AmrError::PatricHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| AmrError::PatricHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
        url: &Url,
    ) -> Result<reqwest::blocking::Response, AmrError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(AmrError::PatricStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }

    /// Sends the request built by `request`, retrying transient failures
    /// with a linear backoff.
    fn send_with_retries<F>(&self, request: F) -> Result<reqwest::blocking::Response, AmrError>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        for attempt in 0..RETRY_ATTEMPTS {
            let transient = match request().send() {
                Ok(response) if !is_retryable_status(response.status().as_u16()) => {
                    return Ok(response);
                }
                Ok(response) => response.status().to_string(),
                Err(err) if is_retryable_error(&err) => err.to_string(),
                Err(err) => return Err(AmrError::PatricHttp(err.to_string())),
            };
            warn!(attempt, reason = %transient, "PATRIC request failed, retrying");
            thread::sleep(RETRY_BACKOFF * (attempt + 1));
        }
        request()
            .send()
            .map_err(|err| AmrError::PatricHttp(err.to_string()))
    }
}

impl PatricClient for PatricHttpClient {
    fn fetch(
        &self,
        url: &Url,
        destination_dir: &Path,
        overwrite: bool,
    ) -> Result<DownloadInfo, AmrError> {
        let file_name = extract_file_name(url.as_str())?;
        let destination = destination_dir.join(&file_name);
        if !overwrite && destination.is_file() {
            debug!(path = %destination.display(), "already downloaded");
            return Ok(DownloadInfo {
                path: destination,
                skipped: true,
            });
        }

        let transport = transport_url(url)?;
        debug!(url = %transport, "downloading");
        let response = self.send_with_retries(|| self.client.get(transport.clone()))?;
        let mut response = Self::handle_status(response, url)?;

        std::fs::create_dir_all(destination_dir)
            .map_err(|err| AmrError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".patric-amr")
            .tempfile_in(destination_dir)
            .map_err(|err| AmrError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, temp.as_file_mut())
            .map_err(|err| AmrError::PatricHttp(format!("{url}: {err}")))?;
        temp.persist(&destination)
            .map_err(|err| AmrError::Filesystem(err.to_string()))?;

        Ok(DownloadInfo {
            path: destination,
            skipped: false,
        })
    }

    fn last_modified(&self, url: &Url) -> Result<Option<DateTime<Utc>>, AmrError> {
        let transport = transport_url(url)?;
        let response = self.send_with_retries(|| self.client.head(transport.clone()))?;
        let response = Self::handle_status(response, url)?;
        let Some(value) = response.headers().get(LAST_MODIFIED) else {
            return Ok(None);
        };
        let value = value
            .to_str()
            .map_err(|err| AmrError::PatricHttp(err.to_string()))?;
        parse_http_date(value).map(Some)
    }
}

pub fn parse_http_date(value: &str) -> Result<DateTime<Utc>, AmrError> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| AmrError::PatricHttp(format!("invalid Last-Modified {value:?}: {err}")))
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_last_modified_header() {
        let date = parse_http_date("Tue, 15 Nov 1994 08:12:31 GMT").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1994, 11, 15));
        assert_eq!((date.hour(), date.minute(), date.second()), (8, 12, 31));
    }
}
