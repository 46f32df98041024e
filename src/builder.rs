use camino::Utf8PathBuf;
use tracing::debug;

use crate::app::{ProgressEvent, ProgressSink};
use crate::catalog::Catalog;
use crate::error::OptlibError;
use crate::library::LibraryStrategy;
use crate::remote::RemoteSource;
use crate::store::Store;
use crate::table::Table;

/// Downloads a library's listing and persists it as the local catalog CSV.
pub struct CatalogBuilder<'a> {
    store: &'a Store,
    strategy: &'a dyn LibraryStrategy,
    remote: &'a dyn RemoteSource,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        store: &'a Store,
        strategy: &'a dyn LibraryStrategy,
        remote: &'a dyn RemoteSource,
    ) -> Self {
        Self {
            store,
            strategy,
            remote,
        }
    }

    /// Returns the catalog path. An existing catalog is kept untouched
    /// unless `force_refresh` is set; network and parse failures propagate.
    pub fn build(
        &self,
        force_refresh: bool,
        sink: &dyn ProgressSink,
    ) -> Result<Utf8PathBuf, OptlibError> {
        let library = self.strategy.library();
        let path = self.store.catalog_path(library);
        self.store.ensure_library_dir(library)?;

        if !force_refresh && self.store.catalog_exists(library) {
            sink.event(ProgressEvent::CatalogReused {
                library,
                path: path.clone(),
            });
            return Ok(path);
        }

        let url = self.strategy.catalog_url();
        sink.event(ProgressEvent::CatalogDownload {
            library,
            url: url.to_string(),
        });
        let html = self.remote.fetch_text(url)?;
        let table = Table::from_html(&html).map_err(|err| match err {
            OptlibError::TableNotFound(_) => OptlibError::TableNotFound(url.to_string()),
            other => other,
        })?;
        debug!(
            library = %library,
            rows = table.len(),
            columns = table.columns.len(),
            "parsed listing"
        );

        let table = self.strategy.normalize_catalog(table, self.remote)?;
        Catalog::write_csv(&table, self.strategy.text_columns(), &path)?;
        sink.event(ProgressEvent::CatalogWritten {
            library,
            path: path.clone(),
            rows: table.len(),
        });
        Ok(path)
    }
}
