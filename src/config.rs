use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::Library;
use crate::error::OptlibError;
use crate::store::DEFAULT_CACHE_DIR;

pub const DEFAULT_CONFIG_FILE: &str = "optlib.json";

/// Everything needed to select a library and locate its cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub library: Library,
    pub force_refresh: bool,
    pub verbose: bool,
    pub local_directory: Utf8PathBuf,
    /// File format for MINLPLIB / QPLIB downloads; must be unset for MIPLIB.
    pub file_extension: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            library: Library::Miplib2017Benchmark,
            force_refresh: false,
            verbose: false,
            local_directory: Utf8PathBuf::from(DEFAULT_CACHE_DIR),
            file_extension: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub library: Option<Library>,
    #[serde(default)]
    pub local_directory: Option<Utf8PathBuf>,
    #[serde(default)]
    pub file_extension: Option<String>,
    #[serde(default)]
    pub force_refresh: Option<bool>,
    #[serde(default)]
    pub verbose: Option<bool>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `optlib.json` in the current directory when no path
    /// is given. Only the implicit file may be absent.
    pub fn resolve(path: Option<&str>) -> Result<Settings, OptlibError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(OptlibError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| OptlibError::ConfigRead(config_path.clone()))?;
        Self::parse(&content)
    }

    /// Like [`ConfigLoader::resolve`], falling back to defaults when the
    /// implicit config file does not exist.
    pub fn resolve_or_default(path: Option<&str>) -> Result<Settings, OptlibError> {
        match Self::resolve(path) {
            Err(OptlibError::MissingConfig) => Ok(Settings::default()),
            other => other,
        }
    }

    pub fn parse(content: &str) -> Result<Settings, OptlibError> {
        let config: ConfigFile =
            serde_json::from_str(content).map_err(|err| OptlibError::ConfigParse(err.to_string()))?;
        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: ConfigFile) -> Settings {
        let defaults = Settings::default();
        Settings {
            library: config.library.unwrap_or(defaults.library),
            force_refresh: config.force_refresh.unwrap_or(defaults.force_refresh),
            verbose: config.verbose.unwrap_or(defaults.verbose),
            local_directory: config.local_directory.unwrap_or(defaults.local_directory),
            file_extension: config.file_extension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = ConfigLoader::parse("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.local_directory, "optlib_cache");
    }

    #[test]
    fn config_overrides_fields() {
        let settings = ConfigLoader::parse(
            r#"{"library": "qplib", "local_directory": "/tmp/cache", "file_extension": "lp", "verbose": true}"#,
        )
        .unwrap();
        assert_eq!(settings.library, Library::Qplib);
        assert_eq!(settings.local_directory, "/tmp/cache");
        assert_eq!(settings.file_extension.as_deref(), Some("lp"));
        assert!(settings.verbose);
        assert!(!settings.force_refresh);
    }

    #[test]
    fn library_accepts_directory_and_short_names() {
        for (name, library) in [
            ("benchmark", Library::Miplib2017Benchmark),
            ("MIPLIB2017_Benchmark", Library::Miplib2017Benchmark),
            ("miplib2017-benchmark", Library::Miplib2017Benchmark),
            ("collection", Library::Miplib2017Collection),
            ("MIPLIB2017_Collection", Library::Miplib2017Collection),
            ("MINLPLIB", Library::Minlplib),
            ("QPLIB", Library::Qplib),
        ] {
            let settings = ConfigLoader::parse(&format!(r#"{{"library": "{name}"}}"#)).unwrap();
            assert_eq!(settings.library, library, "{name}");
        }
        let err = ConfigLoader::parse(r#"{"library": "miplib"}"#).unwrap_err();
        assert!(matches!(err, OptlibError::ConfigParse(_)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ConfigLoader::parse(r#"{"libary": "qplib"}"#).unwrap_err();
        assert!(matches!(err, OptlibError::ConfigParse(_)));
    }
}
