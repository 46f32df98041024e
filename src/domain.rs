use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::OptlibError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Library {
    #[value(name = "miplib2017-benchmark", alias = "benchmark")]
    #[serde(
        alias = "benchmark",
        alias = "MIPLIB2017_Benchmark",
        alias = "miplib2017_benchmark"
    )]
    Miplib2017Benchmark,
    #[value(name = "miplib2017-collection", alias = "collection")]
    #[serde(
        alias = "collection",
        alias = "MIPLIB2017_Collection",
        alias = "miplib2017_collection"
    )]
    Miplib2017Collection,
    #[serde(alias = "MINLPLIB")]
    Minlplib,
    #[serde(alias = "QPLIB")]
    Qplib,
}

impl Library {
    /// Directory name under the cache root; also the catalog file stem.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Library::Miplib2017Benchmark => "MIPLIB2017_Benchmark",
            Library::Miplib2017Collection => "MIPLIB2017_Collection",
            Library::Minlplib => "MINLPLIB",
            Library::Qplib => "QPLIB",
        }
    }

    pub fn catalog_file_name(&self) -> String {
        format!("{}.csv", self.dir_name())
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for Library {
    type Err = OptlibError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "miplib2017-benchmark" | "benchmark" => Ok(Library::Miplib2017Benchmark),
            "miplib2017-collection" | "collection" => Ok(Library::Miplib2017Collection),
            "minlplib" => Ok(Library::Minlplib),
            "qplib" => Ok(Library::Qplib),
            _ => Err(OptlibError::InvalidLibrary(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Easy,
    Hard,
    Open,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Easy => "easy",
            Status::Hard => "hard",
            Status::Open => "open",
            Status::Closed => "closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Status {
    type Err = OptlibError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Status::Easy),
            "hard" => Ok(Status::Hard),
            "open" => Ok(Status::Open),
            "closed" => Ok(Status::Closed),
            _ => Err(OptlibError::InvalidStatus(value.to_string())),
        }
    }
}

/// Where a library keeps its instance files remotely and how they are named
/// once cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLayout {
    pub remote_directory: String,
    pub remote_file_ext: String,
    pub local_file_prefix: String,
    pub local_file_ext: String,
    /// Remote files are gzip streams that must be inflated locally.
    pub compressed: bool,
}

impl FileLayout {
    pub fn remote_url(&self, name: &str) -> String {
        format!("{}{name}{}", self.remote_directory, self.remote_file_ext)
    }

    pub fn local_file_name(&self, name: &str) -> String {
        format!("{}{name}{}", self.local_file_prefix, self.local_file_ext)
    }
}
