use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::builder::CatalogBuilder;
use crate::catalog::Catalog;
use crate::config::Settings;
use crate::domain::Library;
use crate::error::OptlibError;
use crate::instance::Instance;
use crate::library::{LibraryStrategy, strategy_for};
use crate::query::InstanceQuery;
use crate::remote::RemoteSource;
use crate::resolver::Resolver;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    CatalogReused {
        library: Library,
        path: Utf8PathBuf,
    },
    CatalogDownload {
        library: Library,
        url: String,
    },
    CatalogWritten {
        library: Library,
        path: Utf8PathBuf,
        rows: usize,
    },
    AlreadyDownloaded {
        name: String,
        path: Utf8PathBuf,
    },
    Downloading {
        name: String,
        url: String,
    },
    /// The remote file does not exist; `alternatives` lists the formats the
    /// catalog reports for the instance, when known.
    NotFound {
        name: String,
        url: String,
        alternatives: Option<String>,
    },
}

impl ProgressEvent {
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::CatalogReused { library, path } => {
                format!("{library}: using catalog {path}")
            }
            ProgressEvent::CatalogDownload { library, url } => {
                format!("{library}: downloading instance data from {url}")
            }
            ProgressEvent::CatalogWritten {
                library,
                path,
                rows,
            } => format!("{library}: wrote {rows} instances to {path}"),
            ProgressEvent::AlreadyDownloaded { name, .. } => {
                format!("instance {name}: already downloaded")
            }
            ProgressEvent::Downloading { name, url } => {
                format!("instance {name}: downloading from {url}")
            }
            ProgressEvent::NotFound {
                name,
                url,
                alternatives: Some(formats),
            } => format!(
                "instance {name}: file {url} does not exist, but you can download it in the following formats: {formats}"
            ),
            ProgressEvent::NotFound {
                name,
                url,
                alternatives: None,
            } => format!("instance {name}: file {url} does not exist"),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress to `tracing`; missing remote files are warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::NotFound { name, .. } => {
                warn!(instance = %name, "{}", event.message());
            }
            _ => info!("{}", event.message()),
        }
    }
}

/// Entry point tying settings, cache layout, remote source and the
/// selected library together. Construction performs no I/O.
pub struct App<R: RemoteSource> {
    settings: Settings,
    store: Store,
    strategy: Box<dyn LibraryStrategy>,
    remote: R,
}

impl<R: RemoteSource> App<R> {
    pub fn new(settings: Settings, remote: R) -> Result<Self, OptlibError> {
        let strategy = strategy_for(settings.library, settings.file_extension.as_deref())?;
        let store = Store::new(settings.local_directory.clone());
        Ok(Self {
            settings,
            store,
            strategy,
            remote,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> Library {
        self.settings.library
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn strategy(&self) -> &dyn LibraryStrategy {
        self.strategy.as_ref()
    }

    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.store.catalog_path(self.library())
    }

    /// Builds the catalog when missing, or always when the settings ask
    /// for a refresh.
    pub fn refresh_catalog(&self, sink: &dyn ProgressSink) -> Result<Utf8PathBuf, OptlibError> {
        self.build_catalog(self.settings.force_refresh, sink)
    }

    pub fn build_catalog(
        &self,
        force_refresh: bool,
        sink: &dyn ProgressSink,
    ) -> Result<Utf8PathBuf, OptlibError> {
        CatalogBuilder::new(&self.store, self.strategy(), &self.remote).build(force_refresh, sink)
    }

    pub fn load_catalog(&self) -> Result<Catalog, OptlibError> {
        self.resolver().load_catalog()
    }

    /// Matching instances with their files fetched into the cache. The
    /// catalog must already exist.
    pub fn get_instances(
        &self,
        query: &InstanceQuery,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Instance>, OptlibError> {
        self.resolver().query(query, sink)
    }

    /// Matching instances without downloading anything.
    pub fn list_instances(&self, query: &InstanceQuery) -> Result<Vec<Instance>, OptlibError> {
        self.resolver().select(query)
    }

    pub fn materialize(
        &self,
        instance: Instance,
        sink: &dyn ProgressSink,
    ) -> Result<Instance, OptlibError> {
        self.resolver().materialize(instance, sink)
    }

    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.store.library_dir(self.library())
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            &self.store,
            self.strategy(),
            &self.remote,
            self.settings.verbose,
        )
    }
}
