//! Bundled `PreferenceStore` implementations.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::PreferenceError;
use crate::platform::PreferenceStore;

/// In-process preferences. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<(String, String), bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, namespace: &str, key: &str, default: bool) -> Result<bool, PreferenceError> {
        Ok(self
            .values
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .copied()
            .unwrap_or(default))
    }

    fn put_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}

/// One JSON file per namespace inside a directory.
pub struct FilePreferences {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the namespace files.
    write_lock: Mutex<()>,
}

impl FilePreferences {
    /// Use `dir` for namespace files, creating it if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, PreferenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn namespace_path(&self, namespace: &str) -> Result<PathBuf, PreferenceError> {
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || namespace == "."
            || namespace == ".."
        {
            return Err(PreferenceError::Storage(format!(
                "Invalid namespace: {:?}",
                namespace
            )));
        }
        Ok(self.dir.join(format!("{}.json", namespace)))
    }

    fn read_namespace(&self, path: &Path) -> Result<BTreeMap<String, bool>, PreferenceError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, namespace: &str, key: &str, default: bool) -> Result<bool, PreferenceError> {
        let path = self.namespace_path(namespace)?;
        let values = self.read_namespace(&path)?;
        Ok(values.get(key).copied().unwrap_or(default))
    }

    fn put_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), PreferenceError> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.write_lock.lock();

        let mut values = self.read_namespace(&path)?;
        values.insert(key.to_string(), value);

        let json = serde_json::to_string_pretty(&values)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Stored preference {}/{} = {}", namespace, key, value);
        Ok(())
    }
}
