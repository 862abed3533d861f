//! Loaders
//!
//! The data source a group falls back to on a miss for a key it owns.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{CacheError, Result};

// == Loader Trait ==
/// Loads the bytes for a key from the backing data source.
///
/// Return [`CacheError::NotFound`] when the key does not exist and
/// [`CacheError::LoadFailure`] for anything else that went wrong.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> Result<Vec<u8>>;
}

// == Function Adapter ==
/// Adapts an async function into a [`Loader`].
///
/// ```rust
/// use peercache::{group::LoaderFn, CacheError};
///
/// let loader = LoaderFn(|key: String| async move { Ok::<_, CacheError>(key.into_bytes()) });
/// # let _ = loader;
/// ```
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        (self.0)(key.to_string()).await
    }
}

// == Map Loader ==
/// Serves keys from an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct MapLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a loader from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }
}

#[async_trait]
impl Loader for MapLoader {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }
}

// == File Loader ==
/// Serves each key from the file of the same name under a root directory.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `key` to a path, refusing anything that is not a single
    /// plain file name.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(CacheError::InvalidArgument(format!(
                "key {key:?} is not a plain file name"
            ))),
        }
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(err) => Err(CacheError::LoadFailure(format!(
                "reading {}: {err}",
                path.display()
            ))),
        }
    }
}
