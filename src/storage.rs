use crate::errors::Result;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 会话令牌在持久化存储中的键
pub const TOKEN_KEY: &str = "token";

/// Durable string key/value storage, the local-storage of this client.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// JSON object persisted to a single file. The whole file is rewritten on
/// every change.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return BTreeMap::new(),
        };
        match serde_json::from_str(&text) {
            Ok(map) => map,
            Err(e) => {
                warn!("Ignoring unreadable storage file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        debug!("Wrote {} storage entries to {}", map.len(), self.path.display());
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_all().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_all();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_all();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}
