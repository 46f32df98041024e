use std::fs::File;
use std::io;

use camino::Utf8PathBuf;
use flate2::read::GzDecoder;

use crate::app::{ProgressEvent, ProgressSink};
use crate::catalog::Catalog;
use crate::error::OptlibError;
use crate::instance::Instance;
use crate::library::LibraryStrategy;
use crate::query::InstanceQuery;
use crate::remote::{DownloadOutcome, RemoteSource};
use crate::store::Store;

/// Filters the local catalog and makes the matching instance files
/// available in the cache.
pub struct Resolver<'a> {
    store: &'a Store,
    strategy: &'a dyn LibraryStrategy,
    remote: &'a dyn RemoteSource,
    verbose: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a Store,
        strategy: &'a dyn LibraryStrategy,
        remote: &'a dyn RemoteSource,
        verbose: bool,
    ) -> Self {
        Self {
            store,
            strategy,
            remote,
            verbose,
        }
    }

    pub fn load_catalog(&self) -> Result<Catalog, OptlibError> {
        let library = self.strategy.library();
        Catalog::load(library, &self.store.catalog_path(library))
    }

    /// Matching instances without touching the network. Paths are only set
    /// for files already in the cache.
    pub fn select(&self, query: &InstanceQuery) -> Result<Vec<Instance>, OptlibError> {
        let predicates = query.predicates(self.strategy)?;
        let catalog = self.load_catalog()?;
        let rows = catalog.select(&predicates);
        rows.iter()
            .map(|row| {
                let mut instance = self.strategy.build_instance(row)?;
                let path = self.local_path(&instance);
                instance.path = Store::file_exists(&path).then_some(path);
                Ok(instance)
            })
            .collect()
    }

    /// Matching instances, each fetched into the cache in turn. Instances
    /// whose remote file does not exist are returned with no path.
    pub fn query(
        &self,
        query: &InstanceQuery,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<Instance>, OptlibError> {
        self.select(query)?
            .into_iter()
            .map(|instance| self.materialize(instance, sink))
            .collect()
    }

    /// Ensures the instance file is in the cache. An existing file is reused
    /// as-is.
    pub fn materialize(
        &self,
        mut instance: Instance,
        sink: &dyn ProgressSink,
    ) -> Result<Instance, OptlibError> {
        let library = self.strategy.library();
        let final_path = self.local_path(&instance);

        if Store::file_exists(&final_path) {
            if self.verbose {
                sink.event(ProgressEvent::AlreadyDownloaded {
                    name: instance.name.clone(),
                    path: final_path.clone(),
                });
            }
            instance.path = Some(final_path);
            return Ok(instance);
        }

        let dir = self.store.ensure_library_dir(library)?;
        let url = self.strategy.remote_url_for(&instance.name);
        if self.verbose {
            sink.event(ProgressEvent::Downloading {
                name: instance.name.clone(),
                url: url.clone(),
            });
        }

        let download = tempfile::Builder::new()
            .prefix(".download")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        if self.remote.download(&url, download.path())? == DownloadOutcome::NotFound {
            sink.event(ProgressEvent::NotFound {
                name: instance.name.clone(),
                url,
                alternatives: instance.formats.clone(),
            });
            instance.path = None;
            return Ok(instance);
        }

        if self.strategy.layout().compressed {
            let input = File::open(download.path())
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
            let mut decoder = GzDecoder::new(input);
            let mut output = tempfile::Builder::new()
                .prefix(".inflate")
                .tempfile_in(dir.as_std_path())
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
            io::copy(&mut decoder, output.as_file_mut())
                .map_err(|err| OptlibError::Decompression(format!("{url}: {err}")))?;
            output
                .persist(final_path.as_std_path())
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
            // `download` is removed when dropped.
        } else {
            download
                .persist(final_path.as_std_path())
                .map_err(|err| OptlibError::Filesystem(err.to_string()))?;
        }

        instance.path = Some(final_path);
        Ok(instance)
    }

    fn local_path(&self, instance: &Instance) -> Utf8PathBuf {
        self.store.instance_path(
            self.strategy.library(),
            &self.strategy.local_file_name(&instance.name),
        )
    }
}
