//! A single JSON file read and written wholesale.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use crate::StoreError;

/// A JSON document on local disk.
///
/// Reads see whatever is on disk. Mutations go through [`update`](Self::update)
/// or [`replace`](Self::replace), which hold the document's write lock for
/// the whole read-modify-write, so two writers never interleave and no
/// update is lost. Files are pretty-printed and replaced atomically
/// (temp file in the same directory, then rename).
///
/// A missing file reads as `T::default()`. A file that fails to parse is an
/// error, never silently treated as empty.
pub struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    normalize: fn(&mut T),
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_normalizer(path, |_| {})
    }

    /// Like [`new`](Self::new), with a fix-up applied to every loaded value.
    pub fn with_normalizer(path: impl Into<PathBuf>, normalize: fn(&mut T)) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            normalize,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document.
    pub async fn load(&self) -> Result<T, StoreError> {
        let mut value = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        (self.normalize)(&mut value);
        Ok(value)
    }

    /// Reload, apply `f`, and rewrite the file under the write lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut value = self.load().await?;
        let out = f(&mut value);
        self.save(&value).await?;
        Ok(out)
    }

    /// Overwrite the whole document under the write lock.
    pub async fn replace(&self, value: &T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.save(value).await
    }

    async fn save(&self, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes)).await??;
        debug!(path = %self.path.display(), "document written");
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}
