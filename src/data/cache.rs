use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::{load_file, LoadOptions};
use super::model::NameDataset;
use crate::error::LoadError;

/// Identity of a file's contents as seen by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl CacheKey {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(CacheKey {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Entry {
    key: CacheKey,
    dataset: Arc<NameDataset>,
}

/// Load-once store of immutable datasets, keyed by path and file identity.
///
/// A lookup whose modification time or length no longer matches reloads the
/// file. Failed loads are never cached.
#[derive(Debug, Default)]
pub struct DatasetCache {
    options: LoadOptions,
    entries: HashMap<PathBuf, Entry>,
}

impl DatasetCache {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<NameDataset>, LoadError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let key = CacheKey::of(&canonical)?;

        if let Some(entry) = self.entries.get(&canonical) {
            if entry.key == key {
                log::debug!("cache hit for {}", canonical.display());
                return Ok(Arc::clone(&entry.dataset));
            }
            log::debug!("{} changed on disk, reloading", canonical.display());
        } else {
            log::debug!("cache miss for {}", canonical.display());
        }

        let dataset = Arc::new(load_file(&canonical, &self.options)?);
        self.entries.insert(
            canonical,
            Entry {
                key,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&canonical).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Category;
    use std::io::Write;
    use tempfile::Builder;

    fn write_csv(path: &Path, body: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        write!(f, "sexe,preusuel,annais,nombre\n{body}").unwrap();
    }

    #[test]
    fn test_second_lookup_is_shared() {
        let dir = Builder::new().tempdir().unwrap();
        let path = dir.path().join("nat.csv");
        write_csv(&path, "1,LÉO,2022,70\n");

        let mut cache = DatasetCache::default();
        let a = cache.get_or_load(&path).unwrap();
        let b = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_file_reloads() {
        let dir = Builder::new().tempdir().unwrap();
        let path = dir.path().join("nat.csv");
        write_csv(&path, "1,LÉO,2022,70\n");

        let mut cache = DatasetCache::default();
        let before = cache.get_or_load(&path).unwrap();

        // A different length changes the key even if the mtime granularity is coarse.
        write_csv(&path, "1,LÉO,2022,70\n2,LÉA,2022,95\n");
        let after = cache.get_or_load(&path).unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.label_count(), 2);
        assert_eq!(before.label_count(), 1);
        assert!(after.series("LÉA", Category::Girl).is_some());
    }

    #[test]
    fn test_invalidate_and_errors() {
        let dir = Builder::new().tempdir().unwrap();
        let path = dir.path().join("nat.csv");
        write_csv(&path, "1,LÉO,2022,70\n");

        let mut cache = DatasetCache::default();
        let first = cache.get_or_load(&path).unwrap();
        assert!(cache.invalidate(&path));
        let second = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let missing = dir.path().join("missing.csv");
        assert!(matches!(cache.get_or_load(&missing), Err(LoadError::NotFound(_))));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
