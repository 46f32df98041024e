#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;

use optlib_fetch::app::{ProgressEvent, ProgressSink};
use optlib_fetch::config::Settings;
use optlib_fetch::domain::Library;
use optlib_fetch::error::OptlibError;
use optlib_fetch::remote::{DownloadOutcome, RemoteSource};

pub const MIPLIB_BENCHMARK_URL: &str = "https://miplib.zib.de/tag_benchmark.html";
pub const MIPLIB_COLLECTION_URL: &str = "https://miplib.zib.de/tag_collection.html";
pub const MINLPLIB_URL: &str = "https://www.minlplib.org/instances.html";
pub const QPLIB_URL: &str = "https://qplib.zib.de/instances.html";
pub const QPLIB_SOLU_URL: &str = "https://qplib.zib.de/qplib.solu";

pub const MIPLIB_PAGE: &str = include_str!("../fixtures/miplib_benchmark.html");
pub const MINLPLIB_PAGE: &str = include_str!("../fixtures/minlplib.html");
pub const QPLIB_PAGE: &str = include_str!("../fixtures/qplib.html");
pub const QPLIB_SOLU: &str = include_str!("../fixtures/qplib.solu");

/// Serves fixture pages and instance files from memory. Any file URL not
/// registered answers 404.
#[derive(Default)]
pub struct MockRemote {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    calls: Mutex<usize>,
    downloads: Mutex<Vec<String>>,
}

impl MockRemote {
    pub fn with_fixtures() -> Self {
        let mut remote = Self::default();
        remote.page(MIPLIB_BENCHMARK_URL, MIPLIB_PAGE);
        remote.page(MIPLIB_COLLECTION_URL, MIPLIB_PAGE);
        remote.page(MINLPLIB_URL, MINLPLIB_PAGE);
        remote.page(QPLIB_URL, QPLIB_PAGE);
        remote.page(QPLIB_SOLU_URL, QPLIB_SOLU);
        remote
    }

    pub fn page(&mut self, url: &str, body: &str) {
        self.pages.insert(url.to_string(), body.to_string());
    }

    pub fn file(&mut self, url: &str, body: &[u8]) {
        self.files.insert(url.to_string(), body.to_vec());
    }

    pub fn gzip_file(&mut self, url: &str, body: &[u8]) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        self.files.insert(url.to_string(), encoder.finish().unwrap());
    }

    /// Makes every request to `url` fail with a server error.
    pub fn fail(&mut self, url: &str) {
        self.failing.insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    fn record(&self, url: &str) -> Result<(), OptlibError> {
        *self.calls.lock().unwrap() += 1;
        if self.failing.contains(url) {
            return Err(OptlibError::HttpStatus {
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteSource for MockRemote {
    fn fetch_text(&self, url: &str) -> Result<String, OptlibError> {
        self.record(url)?;
        self.pages.get(url).cloned().ok_or(OptlibError::HttpStatus {
            status: 404,
            message: format!("no page for {url}"),
        })
    }

    fn download(&self, url: &str, destination: &Path) -> Result<DownloadOutcome, OptlibError> {
        self.record(url)?;
        self.downloads.lock().unwrap().push(url.to_string());
        match self.files.get(url) {
            Some(body) => {
                std::fs::write(destination, body).unwrap();
                Ok(DownloadOutcome::Saved)
            }
            None => Ok(DownloadOutcome::NotFound),
        }
    }
}

/// Collects progress events for later inspection.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn cache_root(temp: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join("cache")).unwrap()
}

pub fn settings(temp: &tempfile::TempDir, library: Library) -> Settings {
    Settings {
        library,
        local_directory: cache_root(temp),
        ..Settings::default()
    }
}
