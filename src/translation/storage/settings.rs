//! 用户设置（调试模式开关）

use serde_json::Value;

use super::kv::KeyValueStore;
use crate::translation::config::constants::SETTINGS_DEBUG_KEY;
use crate::translation::error::LocalizerResult;

/// 持久化的用户设置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub debug_mode: bool,
}

impl Settings {
    /// 读取设置；缺失或读取失败时为 false
    pub async fn load<S: KeyValueStore>(store: &S) -> Self {
        let debug_mode = match store.get(SETTINGS_DEBUG_KEY).await {
            Ok(Some(Value::Bool(flag))) => flag,
            Ok(_) => false,
            Err(e) => {
                tracing::warn!("读取设置失败，使用默认值: {}", e);
                false
            }
        };

        Self { debug_mode }
    }

    pub async fn save<S: KeyValueStore>(&self, store: &S) -> LocalizerResult<()> {
        store
            .set(SETTINGS_DEBUG_KEY, Value::Bool(self.debug_mode))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::storage::kv::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_or_malformed_flag_defaults_to_false() {
        let store = MemoryStore::new();
        assert!(!Settings::load(&store).await.debug_mode);

        store.set(SETTINGS_DEBUG_KEY, json!("yes")).await.unwrap();
        assert!(!Settings::load(&store).await.debug_mode);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        Settings { debug_mode: true }.save(&store).await.unwrap();
        assert!(Settings::load(&store).await.debug_mode);
    }
}
