//! 存储模块
//!
//! 提供键值持久化、用户设置与术语统计。

pub mod kv;
pub mod settings;
pub mod stats;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore};
pub use settings::Settings;
pub use stats::{StatsAggregator, TermStat, TermStatistics};
