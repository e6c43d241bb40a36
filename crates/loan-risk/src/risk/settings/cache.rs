use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::{RiskPolicy, DEFAULT_MAXIMUM_DTI, DEFAULT_MINIMUM_FICO, DEFAULT_THRESHOLD};

/// Fixed key of the settings fallback entry.
pub const SETTINGS_CACHE_KEY: &str = "risk-settings";

/// Device-local key/value byte store backing the settings fallback.
pub trait FallbackStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store, mostly for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryFallbackStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryFallbackStore {
    pub fn entry(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl FallbackStore for MemoryFallbackStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        check_key(key)?;
        Ok(self.entry(key))
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        check_key(key)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One `<key>.json` file per entry under a directory.
#[derive(Debug, Clone)]
pub struct FileFallbackStore {
    root: PathBuf,
}

impl FileFallbackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl FallbackStore for FileFallbackStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        check_key(key)?;
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        check_key(key)?;
        fs::create_dir_all(&self.root)?;

        // Rename is atomic on the same filesystem, so readers never see a torn entry.
        let target = self.path_for(key);
        let staging = self.root.join(format!(".{key}.json.tmp"));
        fs::write(&staging, value)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }
}

fn check_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct CachedPolicyOut<'a> {
    #[serde(flatten)]
    policy: &'a RiskPolicy,
    saved_at: DateTime<Utc>,
}

/// Entries written by older dashboards may miss fields; each missing field
/// takes its default independently.
#[derive(Debug, Deserialize)]
struct CachedPolicyIn {
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    min_fico: Option<u16>,
    #[serde(default)]
    max_dti: Option<f64>,
}

pub(crate) fn encode_policy(policy: &RiskPolicy, saved_at: DateTime<Utc>) -> Vec<u8> {
    let entry = CachedPolicyOut { policy, saved_at };
    // Plain numbers and a timestamp; serialization cannot fail.
    serde_json::to_vec(&entry).unwrap_or_default()
}

/// `None` when the entry is not JSON or holds an out-of-range policy.
pub(crate) fn decode_policy(bytes: &[u8]) -> Option<RiskPolicy> {
    let entry: CachedPolicyIn = serde_json::from_slice(bytes).ok()?;
    let policy = RiskPolicy {
        default_probability_threshold: entry.threshold.unwrap_or(DEFAULT_THRESHOLD),
        minimum_fico: entry.min_fico.unwrap_or(DEFAULT_MINIMUM_FICO),
        maximum_dti: entry.max_dti.unwrap_or(DEFAULT_MAXIMUM_DTI),
    };
    policy.validate().ok().map(|_| policy)
}
