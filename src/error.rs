use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OptlibError {
    #[error("precondition violated: {0}")]
    #[diagnostic(help("check which filters and options the selected library supports"))]
    Precondition(String),

    #[error("invalid library: {0}")]
    InvalidLibrary(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("missing config file optlib.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("catalog not found at {0}; build it first")]
    CatalogMissing(String),

    #[error("failed to parse catalog: {0}")]
    CatalogParse(String),

    #[error("no table found at {0}")]
    TableNotFound(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("server returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("failed to decompress {0}")]
    Decompression(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
