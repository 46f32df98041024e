use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::OptlibError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved,
    NotFound,
}

/// Retrieval of catalog pages, solution feeds and instance files.
pub trait RemoteSource: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, OptlibError>;
    /// Streams `url` into `destination`. A missing remote file is reported
    /// as [`DownloadOutcome::NotFound`] rather than an error.
    fn download(&self, url: &str, destination: &Path) -> Result<DownloadOutcome, OptlibError>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &T {
    fn fetch_text(&self, url: &str) -> Result<String, OptlibError> {
        (**self).fetch_text(url)
    }

    fn download(&self, url: &str, destination: &Path) -> Result<DownloadOutcome, OptlibError> {
        (**self).download(url, destination)
    }
}

#[derive(Clone)]
pub struct HttpRemoteSource {
    client: Client,
}

impl HttpRemoteSource {
    pub fn new() -> Result<Self, OptlibError> {
        Self::with_timeout(Duration::from_secs(120))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, OptlibError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("optlib-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OptlibError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| OptlibError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response, OptlibError> {
        self.client
            .get(url)
            .send()
            .map_err(|err| OptlibError::Http(format!("{url}: {err}")))
    }

    fn handle_status(response: Response) -> Result<Response, OptlibError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .ok()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "request failed".to_string());
        Err(OptlibError::HttpStatus { status, message })
    }
}

impl RemoteSource for HttpRemoteSource {
    fn fetch_text(&self, url: &str) -> Result<String, OptlibError> {
        let response = Self::handle_status(self.get(url)?)?;
        response
            .text()
            .map_err(|err| OptlibError::Http(format!("{url}: {err}")))
    }

    fn download(&self, url: &str, destination: &Path) -> Result<DownloadOutcome, OptlibError> {
        let response = self.get(url)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DownloadOutcome::NotFound);
        }
        let mut response = Self::handle_status(response)?;
        let mut file =
            File::create(destination).map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        Ok(DownloadOutcome::Saved)
    }
}
