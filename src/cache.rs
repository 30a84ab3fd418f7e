//! Our caching system keeps the little state a CLI session needs between invocations: the
//! session token, the canvas being built and the last console output.
//!
//! To use the cache system, implement the Cacheable and CacheKey traits, then you can
//! use the read() and write() methods of a CacheDir.
use crate::session::{Session, SessionKey};
use crate::studio::canvas::Canvas;
use crate::studio::console::ConsoleOutput;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

/// You need a cache key in order to read something from the cache.
pub trait CacheKey {
    fn as_path(&self) -> String;
}

/// Anything that can be cached needs to implement this trait.
///
/// Cacheable has an associated type so that we can always pair up a struct to be cached
/// with its cache key. Reading a `Session` with a key meant for the `Canvas` does not compile:
/// ```compile_fail
/// use sqlmate::cache::{CacheDir, SharedCacheKey};
/// use sqlmate::session::Session;
///
/// let cache = CacheDir::at("/tmp");
/// let session: Session = cache.read(&SharedCacheKey::new("canvas")).unwrap();
/// ```
pub trait Cacheable {
    // Binding the cache key type to the type that it will point to helps with type safety.
    type CacheKey;

    fn cache_key(&self) -> Self::CacheKey;

    /// All structs of the same type are saved in the same folder. Type ids should be unique.
    fn type_id() -> &'static str;
}

#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// `$HOME/.cache/sqlmate/v1`
    pub fn default_location() -> Result<CacheDir, crate::Error> {
        let home = std::env::var("HOME")?;

        let mut path = PathBuf::from(home);
        path.push(".cache");
        path.push("sqlmate");
        path.push("v1");

        Ok(CacheDir { root: path })
    }

    pub fn at(root: impl Into<PathBuf>) -> CacheDir {
        CacheDir { root: root.into() }
    }

    pub fn read<D, K>(&self, cache_key: &K) -> Result<D, crate::Error>
    where
        // So you can't do `let a: StructA = read(cache_key_that_is_used_for_StructB)`.
        D: Cacheable<CacheKey = K> + DeserializeOwned,
        K: CacheKey,
    {
        let file_location = self.get_cache_path(D::type_id(), cache_key.as_path().as_str())?;

        let data = serde_json::from_reader(fs::File::open(file_location)?)?;

        Ok(data)
    }

    /// Like read(), but a missing entry is not an error.
    pub fn read_optional<D, K>(&self, cache_key: &K) -> Result<Option<D>, crate::Error>
    where
        D: Cacheable<CacheKey = K> + DeserializeOwned,
        K: CacheKey,
    {
        let file_location = self.get_cache_path(D::type_id(), cache_key.as_path().as_str())?;

        let file = match fs::File::open(&file_location) {
            Ok(file) => file,
            Err(error) if error.kind() == IoErrorKind::NotFound => {
                debug!("nothing cached at {}", file_location.display());
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Some(serde_json::from_reader(file)?))
    }

    pub fn write<D, K>(&self, data: &D) -> Result<(), crate::Error>
    where
        D: Cacheable<CacheKey = K> + Serialize,
        K: CacheKey,
    {
        let file_location = self.get_cache_path(D::type_id(), data.cache_key().as_path().as_str())?;

        let serialized = serde_json::to_string(&data)?;

        fs::write(&file_location, serialized)?;
        info!("cached {} at {}", D::type_id(), file_location.display());

        Ok(())
    }

    /// Removing something that is not there is fine.
    pub fn remove<D, K>(&self, cache_key: &K) -> Result<(), crate::Error>
    where
        D: Cacheable<CacheKey = K>,
        K: CacheKey,
    {
        let file_location = self.get_cache_path(D::type_id(), cache_key.as_path().as_str())?;

        match fs::remove_file(file_location) {
            Err(error) if error.kind() != IoErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }

    fn get_cache_path(&self, type_id: &'static str, cache_key: &str) -> Result<PathBuf, crate::Error> {
        let mut location = self.require_cache_folder(type_id)?;

        location.push(cache_key);

        Ok(location)
    }

    fn require_cache_folder(&self, type_id: &'static str) -> Result<PathBuf, crate::Error> {
        let mut path = self.root.clone();
        path.push(type_id);

        fs::create_dir_all(&path)?;

        Ok(path)
    }
}

/// Used by things there is only one of.
pub struct SharedCacheKey(String);

impl SharedCacheKey {
    pub fn new(name: &str) -> Self {
        SharedCacheKey(format!("{name}.json"))
    }
}

impl CacheKey for SharedCacheKey {
    fn as_path(&self) -> String {
        self.0.clone()
    }
}

// Please dump all impls here, so we keep the rest of the code base clean.

impl Cacheable for Session {
    type CacheKey = SessionKey;

    fn cache_key(&self) -> Self::CacheKey {
        SessionKey::for_server(&self.api_url)
    }

    fn type_id() -> &'static str {
        "session"
    }
}

impl CacheKey for SessionKey {
    fn as_path(&self) -> String {
        format!("session-{}.json", self.as_str())
    }
}

impl Cacheable for Canvas {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> Self::CacheKey {
        SharedCacheKey::new(Self::type_id())
    }

    fn type_id() -> &'static str {
        "canvas"
    }
}

impl Cacheable for ConsoleOutput {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> Self::CacheKey {
        SharedCacheKey::new(Self::type_id())
    }

    fn type_id() -> &'static str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(name: &str) -> CacheDir {
        let root = std::env::temp_dir().join("sqlmate-tests").join("cache").join(name);
        let _making_sure_it_is_empty = fs::remove_dir_all(&root);

        CacheDir::at(root)
    }

    #[test]
    fn session_round_trips_through_the_cache() {
        let cache = test_cache("session");
        let session = Session::logged_in("http://localhost:8080", "secret-token".to_string());

        cache.write(&session).unwrap();
        let read: Session = cache.read(&session.cache_key()).unwrap();

        assert_eq!(read.token(), Some("secret-token"));
        assert_eq!(read.api_url, "http://localhost:8080");
    }

    #[test]
    fn missing_entries_are_none() {
        let cache = test_cache("missing");

        let canvas: Option<Canvas> = cache
            .read_optional(&SharedCacheKey::new(Canvas::type_id()))
            .unwrap();

        assert!(canvas.is_none());
    }

    #[test]
    fn removed_entries_are_gone() {
        let cache = test_cache("removed");
        let canvas = Canvas::default();

        cache.write(&canvas).unwrap();
        cache.remove::<Canvas, _>(&canvas.cache_key()).unwrap();
        // twice is fine
        cache.remove::<Canvas, _>(&canvas.cache_key()).unwrap();

        let read: Option<Canvas> = cache.read_optional(&canvas.cache_key()).unwrap();
        assert!(read.is_none());
    }
}
