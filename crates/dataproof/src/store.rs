//! Keyed persistence for datasets, validation history and comparisons.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DataproofError, Result};

/// Load/save capability over values keyed by id.
pub trait Store<T> {
    /// Load a value; `Ok(None)` when nothing is stored under `id`.
    fn load(&self, id: &str) -> Result<Option<T>>;

    /// Store a value, replacing any previous one.
    fn save(&mut self, id: &str, value: &T) -> Result<()>;

    /// Stored ids.
    fn ids(&self) -> Result<Vec<String>>;
}

/// In-process store, ordered by first insertion.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    entries: IndexMap<String, T>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Store<T> for MemoryStore<T> {
    fn load(&self, id: &str) -> Result<Option<T>> {
        Ok(self.entries.get(id).cloned())
    }

    fn save(&mut self, id: &str, value: &T) -> Result<()> {
        self.entries.insert(id.to_string(), value.clone());
        Ok(())
    }

    fn ids(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// One pretty-printed JSON file per id inside a directory.
///
/// Ids are reduced to `[A-Za-z0-9_.-]` for file names, so ids that differ
/// only in other characters share a file. [`Store::ids`] returns the reduced
/// form, sorted.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    dir: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> JsonFileStore<T> {
    /// Open a store, creating its directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            DataproofError::Persistence(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
            _marker: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing an id.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(id)))
    }
}

fn file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    // Keep the stem from being empty or a relative path component.
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        format!("_{}", stem)
    } else {
        stem
    }
}

/// Serialize through a buffer and flush it, so a failed final write surfaces.
fn write_pretty<W: Write, T: Serialize>(inner: W, value: &T) -> std::io::Result<()> {
    let mut writer = BufWriter::new(inner);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}

impl<T: Serialize + DeserializeOwned> Store<T> for JsonFileStore<T> {
    fn load(&self, id: &str) -> Result<Option<T>> {
        let path = self.path_for(id);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DataproofError::Persistence(format!(
                    "Failed to open file '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DataproofError::Persistence(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        Ok(Some(value))
    }

    fn save(&mut self, id: &str, value: &T) -> Result<()> {
        let path = self.path_for(id);
        let file = File::create(&path).map_err(|e| {
            DataproofError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        write_pretty(file, value).map_err(|e| {
            DataproofError::Persistence(format!("Failed to write '{}': {}", path.display(), e))
        })
    }

    fn ids(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            DataproofError::Persistence(format!(
                "Failed to read directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
