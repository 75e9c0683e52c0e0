use crate::error::Result;
use crate::extract::strip_code;
use crate::model::{CategoryMap, DiseaseStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CATEGORIES_FILE: &str = "categories.json";
pub const DISEASES_FILE: &str = "icd11.json";
pub const PAGE_HTML_FILE: &str = "page.html";
pub const PAGE_PNG_FILE: &str = "page.png";

pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Read a JSON document, falling back to `T::default()` on any failure.
pub fn load<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found, starting empty", path.display());
            return T::default();
        }
        Err(e) => {
            warn!("Failed to read {}: {}, starting empty", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Failed to parse {}: {}, starting empty", path.display(), e);
            T::default()
        }
    }
}

/// Serialize `doc` and overwrite `path`, creating parent directories.
pub fn save<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec(doc)?;
    fs::write(path, bytes)?;
    info!("Write to file ({}) success!", path.display());
    Ok(())
}

/// Titles keep no leading code, matching what the walker records.
pub fn load_categories(path: &Path) -> CategoryMap {
    let mut categories: CategoryMap = load(path);
    for (code, title) in categories.iter_mut() {
        *title = strip_code(title, code);
    }
    categories
}

pub fn load_diseases(path: &Path) -> DiseaseStore {
    let mut store: DiseaseStore = load(path);
    store.normalize();
    store
}

pub fn save_categories(path: &Path, categories: &CategoryMap) -> Result<()> {
    save(path, categories)
}

/// Normalizes before writing so `count` and `captured` always land on
/// disk consistent.
pub fn save_diseases(path: &Path, diseases: &mut DiseaseStore) -> Result<()> {
    diseases.normalize();
    save(path, diseases)
}

/// Locations of every artifact a harvest reads or writes.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub categories: PathBuf,
    pub diseases: PathBuf,
    pub page_html: PathBuf,
    pub page_png: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            categories: dir.join(CATEGORIES_FILE),
            diseases: dir.join(DISEASES_FILE),
            page_html: dir.join(PAGE_HTML_FILE),
            page_png: dir.join(PAGE_PNG_FILE),
        }
    }
}

/// Decides when the disease store is due for a flush: every time its size
/// lands on a multiple of the interval, once per boundary.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    interval: usize,
    last_flushed_at: Option<usize>,
}

impl Checkpoint {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            last_flushed_at: None,
        }
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn is_due(&self, size: usize) -> bool {
        size > 0 && size % self.interval == 0 && self.last_flushed_at != Some(size)
    }

    pub fn mark_flushed(&mut self, size: usize) {
        self.last_flushed_at = Some(size);
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_fires_once_per_boundary() {
        let mut checkpoint = Checkpoint::default();
        let due: Vec<usize> = (0..=35)
            .filter(|&size| {
                let due = checkpoint.is_due(size);
                if due {
                    checkpoint.mark_flushed(size);
                }
                // ask twice, as re-entering the walker does
                due || checkpoint.is_due(size)
            })
            .collect();
        assert_eq!(due, vec![10, 20, 30]);
    }

    #[test]
    fn checkpoint_interval_never_zero() {
        let checkpoint = Checkpoint::new(0);
        assert_eq!(checkpoint.interval(), 1);
        assert!(checkpoint.is_due(1));
    }

    #[test]
    fn store_paths_in_dir() {
        let paths = StorePaths::in_dir(Path::new("/tmp/out"));
        assert_eq!(paths.categories, Path::new("/tmp/out/categories.json"));
        assert_eq!(paths.diseases, Path::new("/tmp/out/icd11.json"));
        assert_eq!(paths.page_html, Path::new("/tmp/out/page.html"));
        assert_eq!(paths.page_png, Path::new("/tmp/out/page.png"));
    }
}
