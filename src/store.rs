use std::collections::HashMap;
use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "io error: {err}"),
            StoreError::JsonEncode(err) => write!(f, "failed to encode record: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Outcome of a keyed read. Reads never fail: a missing or unreadable
/// record degrades to the caller-supplied fallback, but the variant
/// keeps "no record" and "corrupted record" distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// A well-formed record was read.
    Stored(T),
    /// No record exists under the key; carries the fallback.
    Missing(T),
    /// A record exists but could not be read or decoded; carries the fallback.
    Recovered(T),
}

impl<T> Loaded<T> {
    pub fn into_value(self) -> T {
        match self {
            Loaded::Stored(value) | Loaded::Missing(value) | Loaded::Recovered(value) => value,
        }
    }

    pub fn was_recovered(&self) -> bool {
        matches!(self, Loaded::Recovered(_))
    }
}

pub trait StoreBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, payload: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key under the state directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StoreBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn write(&mut self, key: &str, payload: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::Io)?;
        fs::write(self.key_path(key), payload).map_err(StoreError::Io)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }
}

/// HashMap-backed store, for tests and other throwaway state.
#[derive(Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl StoreBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, payload: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed JSON get/set over an injected backend.
pub struct Store {
    backend: Box<dyn StoreBackend>,
}

impl Store {
    pub fn open(dir: PathBuf) -> Self {
        Self::with_backend(Box::new(FileBackend::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::default()))
    }

    pub fn with_backend(backend: Box<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> Loaded<T> {
        match self.backend.read(key) {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(value) => Loaded::Stored(value),
                Err(_) => Loaded::Recovered(fallback),
            },
            Ok(None) => Loaded::Missing(fallback),
            Err(_) => Loaded::Recovered(fallback),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_string(value).map_err(StoreError::JsonEncode)?;
        self.backend.write(key, &payload)
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)
    }
}

pub fn resolve_state_dir(cli_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir;
    }

    if let Some(dir) = env::var_os("FOCUS_NIGHT_STATE_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    default_state_dir()
}

fn default_state_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(path) = env::var_os("LOCALAPPDATA") {
            return PathBuf::from(path).join("focus_night");
        }
    }

    if let Some(path) = env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(path).join("focus_night");
    }

    if let Some(path) = env::var_os("HOME") {
        return PathBuf::from(path)
            .join(".local")
            .join("state")
            .join("focus_night");
    }

    PathBuf::from(".focus_night")
}
