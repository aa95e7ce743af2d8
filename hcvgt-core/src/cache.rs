//! Persistent memoizing cache
//!
//! Results are keyed by an MD5 digest of the stringified call arguments and
//! kept in a single bincode file on disk. Entries are written once per key and
//! never evicted.
//!
//! The store is loaded fully into memory at [`PersistentCache::open`] and written
//! back atomically on [`PersistentCache::flush`], [`PersistentCache::close`] or
//! when the cache is dropped.
//!
//! Known limitation: there is no locking. Two processes sharing one store file
//! may both recompute the same key, and the last one to flush wins. Within a
//! process, `get` takes `&mut self`; sharing across threads needs a lock chosen
//! by the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Current on-disk format version
const CACHE_FORMAT_VERSION: u32 = 1;

/// Errors that can occur while opening or persisting the cache store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error on cache store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode cache store: {0}")]
    Encode(String),

    #[error("Failed to decode cache store {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Unsupported cache format version: {0}")]
    UnsupportedVersion(u32),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Serialize)]
struct StoreFileRef<'a, V> {
    version: u32,
    entries: &'a BTreeMap<String, V>,
}

/// Compute the lookup key for a list of call arguments.
///
/// Each argument is rendered with `Display` and fed to the digest prefixed by
/// its byte length, so `["ab", "c"]` and `["a", "bc"]` get different keys.
pub fn cache_key(args: &[&dyn fmt::Display]) -> String {
    let mut context = md5::Context::new();
    for arg in args {
        let rendered = arg.to_string();
        context.consume((rendered.len() as u64).to_le_bytes());
        context.consume(rendered.as_bytes());
    }
    format!("{:x}", context.compute())
}

/// Memoizing key-value cache backed by a file on disk
pub struct PersistentCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    path: PathBuf,
    entries: BTreeMap<String, V>,
    dirty: bool,
    closed: bool,
}

impl<V> PersistentCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Open the store at `path`, creating an empty one if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut cache = Self {
            entries: BTreeMap::new(),
            path,
            dirty: false,
            closed: false,
        };

        if cache.path.exists() {
            cache.entries = read_store(&cache.path)?;
            log::info!(
                "Opened cache {} ({} entries)",
                cache.path.display(),
                cache.entries.len()
            );
        } else {
            // Create the file now so an unusable path fails here and not at exit
            cache.write_store()?;
            log::info!("Created cache {}", cache.path.display());
        }

        Ok(cache)
    }

    /// Return the cached value for `args`, or run `compute` and remember its result.
    ///
    /// Errors from `compute` are passed through and nothing is stored.
    pub fn get<F, E>(&mut self, args: &[&dyn fmt::Display], compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let key = cache_key(args);

        if let Some(value) = self.entries.get(&key) {
            log::debug!("Cache hit for {}", key);
            return Ok(value.clone());
        }

        log::debug!("Cache miss for {}", key);
        let value = compute()?;
        self.entries.insert(key, value.clone());
        self.dirty = true;
        Ok(value)
    }

    pub fn contains(&self, args: &[&dyn fmt::Display]) -> bool {
        self.entries.contains_key(&cache_key(args))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write unsaved entries to disk. A no-op when nothing changed.
    pub fn flush(&mut self) -> CacheResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write_store()?;
        self.dirty = false;
        log::info!(
            "Flushed cache {} ({} entries)",
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }

    /// Flush and release the cache, reporting any storage error
    pub fn close(mut self) -> CacheResult<()> {
        let result = self.flush();
        self.closed = true;
        result
    }

    fn write_store(&self) -> CacheResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            let store = StoreFileRef {
                version: CACHE_FORMAT_VERSION,
                entries: &self.entries,
            };
            bincode::serialize_into(&mut writer, &store)
                .map_err(|e| CacheError::Encode(e.to_string()))?;
            writer.flush().map_err(io_err)?;
        }
        temp_file.as_file().sync_all().map_err(io_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|e| io_err(e.error))?;

        Ok(())
    }
}

impl<V> Drop for PersistentCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush() {
            log::warn!("Failed to flush cache {}: {}", self.path.display(), e);
        }
    }
}

fn read_store<V: DeserializeOwned>(path: &Path) -> CacheResult<BTreeMap<String, V>> {
    let bytes = fs::read(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }

    let decode_err = |e: bincode::Error| CacheError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let version: u32 = bincode::deserialize(&bytes).map_err(decode_err)?;
    if version != CACHE_FORMAT_VERSION {
        return Err(CacheError::UnsupportedVersion(version));
    }

    // Same layout as `StoreFileRef`: the version header, then the entries
    let (_, entries): (u32, BTreeMap<String, V>) =
        bincode::deserialize(&bytes).map_err(decode_err)?;
    Ok(entries)
}
