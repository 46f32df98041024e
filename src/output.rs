use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, TracingSink};
use crate::domain::Library;
use crate::instance::Instance;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct CatalogResult<'a> {
    pub library: Library,
    pub path: &'a Utf8Path,
}

#[derive(Debug, Serialize)]
pub struct QueryResult<'a> {
    pub library: Library,
    pub count: usize,
    pub instances: &'a [Instance],
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_catalog(result: &CatalogResult<'_>) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", result.path)
    }

    pub fn print_query(result: &QueryResult<'_>) -> io::Result<()> {
        let mut stdout = io::stdout();
        for instance in result.instances {
            writeln!(stdout, "{instance}")?;
        }
        writeln!(
            stdout,
            "{} matching instances in {}",
            result.count, result.library
        )
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_catalog(result: &CatalogResult<'_>) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_query(result: &QueryResult<'_>) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

// Stdout carries only the JSON document; missing files still reach stderr.
impl ProgressSink for JsonOutput {
    fn event(&self, event: ProgressEvent) {
        if let ProgressEvent::NotFound { .. } = event {
            TracingSink.event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged(events: Vec<ProgressEvent>) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            for event in events {
                JsonOutput.event(event);
            }
        });
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn json_sink_still_warns_about_missing_files() {
        let log = logged(vec![
            ProgressEvent::Downloading {
                name: "ex1221".to_string(),
                url: "https://www.minlplib.org/gms/ex1221.gms".to_string(),
            },
            ProgressEvent::NotFound {
                name: "infeas1".to_string(),
                url: "https://www.minlplib.org/gms/infeas1.gms".to_string(),
                alternatives: Some("gms nl".to_string()),
            },
        ]);
        assert!(log.contains("WARN"));
        assert!(log.contains("instance infeas1: file https://www.minlplib.org/gms/infeas1.gms does not exist"));
        assert!(!log.contains("ex1221"));
    }
}
