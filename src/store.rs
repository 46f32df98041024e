use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Library;
use crate::error::OptlibError;

pub const DEFAULT_CACHE_DIR: &str = "optlib_cache";

/// Local cache layout: one directory per library holding its catalog CSV
/// and the fetched instance files.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn library_dir(&self, library: Library) -> Utf8PathBuf {
        self.root.join(library.dir_name())
    }

    pub fn catalog_path(&self, library: Library) -> Utf8PathBuf {
        self.library_dir(library).join(library.catalog_file_name())
    }

    pub fn instance_path(&self, library: Library, file_name: &str) -> Utf8PathBuf {
        self.library_dir(library).join(file_name)
    }

    pub fn ensure_library_dir(&self, library: Library) -> Result<Utf8PathBuf, OptlibError> {
        let dir = self.library_dir(library);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| OptlibError::Filesystem(format!("create {dir}: {err}")))?;
        Ok(dir)
    }

    pub fn catalog_exists(&self, library: Library) -> bool {
        self.catalog_path(library).as_std_path().is_file()
    }

    pub fn file_exists(path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new("cache");
        assert_eq!(
            store.catalog_path(Library::Miplib2017Benchmark),
            Utf8PathBuf::from("cache/MIPLIB2017_Benchmark/MIPLIB2017_Benchmark.csv")
        );
        assert_eq!(
            store.instance_path(Library::Qplib, "QPLIB_0018.qplib"),
            Utf8PathBuf::from("cache/QPLIB/QPLIB_0018.qplib")
        );
    }

    #[test]
    fn ensure_creates_library_dir() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        let dir = store.ensure_library_dir(Library::Minlplib).unwrap();
        assert!(dir.as_std_path().is_dir());
        assert!(!store.catalog_exists(Library::Minlplib));
    }
}
