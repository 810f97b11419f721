//! 异步键值存储
//!
//! 设置与统计都通过同一个键值接口持久化。`MemoryStore` 用于测试与临时会话，
//! `JsonFileStore` 把所有键保存在一个 JSON 对象文件里。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::translation::error::{LocalizerError, LocalizerResult};

/// 键值存储接口
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> LocalizerResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> LocalizerResult<()>;
    async fn remove(&self, key: &str) -> LocalizerResult<()>;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> LocalizerResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> LocalizerResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> LocalizerResult<()> {
        (**self).remove(key).await
    }
}

/// 内存存储，记录写入次数，可模拟写入失败
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功写入（set / remove）的次数
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// 同步读取，便于检查
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.lock().ok().and_then(|values| values.get(key).cloned())
    }

    fn lock(&self) -> LocalizerResult<std::sync::MutexGuard<'_, HashMap<String, Value>>> {
        self.values
            .lock()
            .map_err(|_| LocalizerError::InternalError("内存存储锁已中毒".to_string()))
    }

    fn check_writable(&self) -> LocalizerResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(LocalizerError::StorageError("模拟写入失败".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> LocalizerResult<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> LocalizerResult<()> {
        self.check_writable()?;
        self.lock()?.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn remove(&self, key: &str) -> LocalizerResult<()> {
        self.check_writable()?;
        self.lock()?.remove(key);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> LocalizerResult<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(LocalizerError::from(e).with_context(self.path.display()));
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(LocalizerError::SerializationError(format!(
                "{} 不是 JSON 对象",
                self.path.display()
            ))),
        }
    }

    /// 先写临时文件再重命名
    async fn write_all(&self, map: Map<String, Value>) -> LocalizerResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> LocalizerResult<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> LocalizerResult<()> {
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(map).await
    }

    async fn remove(&self, key: &str) -> LocalizerResult<()> {
        let mut map = self.read_all().await?;
        if map.remove(key).is_some() {
            self.write_all(map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_counts_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.get("debugMode").await.unwrap(), None);

        store.set("debugMode", json!(true)).await.unwrap();
        store.remove("debugMode").await.unwrap();
        assert_eq!(store.write_count(), 2);

        store.set_fail_writes(true);
        assert!(store.set("debugMode", json!(true)).await.is_err());
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_json_file_store_persists_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("termStats").await.unwrap(), None);

        store.set("termStats", json!({"terms": {}})).await.unwrap();
        store.set("debugMode", json!(false)).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("debugMode").await.unwrap(), Some(json!(false)));
        assert!(reopened.get("termStats").await.unwrap().is_some());

        reopened.remove("termStats").await.unwrap();
        assert_eq!(store.get("termStats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get("debugMode").await.is_err());
    }
}
