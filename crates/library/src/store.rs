use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug)]
pub enum StoreError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, source } => write!(f, "io error on {:?}: {}", path, source),
            StoreError::Json { path, source } => {
                write!(f, "json error in {:?}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    data: Option<T>,
    caching: bool,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Default,
{
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let mut store = Self {
            path,
            data: None,
            caching: false,
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cached(&self) -> bool {
        self.caching
    }

    pub fn read(&mut self) -> Result<T, StoreError> {
        self.refresh()?;
        Ok(self.data.clone().unwrap_or_default())
    }

    /// Re-parses the file if the cache was cleared since the last load.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        if !self.caching {
            self.load()?;
        }
        Ok(())
    }

    pub fn value(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub(crate) fn value_mut(&mut self) -> &mut T {
        debug_assert!(self.caching, "{:?} mutated while its cache is cleared", self.path);
        self.data.get_or_insert_with(T::default)
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        self.refresh()?;
        let value = self.data.clone().unwrap_or_default();
        self.write(&value)
    }

    /// Writes `value` and adopts it as the cached value when caching is active.
    pub fn save_value(&mut self, value: T) -> Result<(), StoreError> {
        self.write(&value)?;
        if self.caching {
            self.data = Some(value);
        }
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.data = None;
        self.caching = false;
    }

    fn load(&mut self) -> Result<(), StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                    path: self.path.clone(),
                    source,
                })?;
                self.data = Some(value);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.data = None;
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }
        self.caching = true;
        Ok(())
    }

    fn write(&self, value: &T) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_vec(value).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }
}
