//! 本地化模块
//!
//! 把管理界面中的英文文本按术语词典改写为日文：
//! - **dictionary**: 术语词典的解析与加载
//! - **matcher**: 匹配顺序与匹配辅助判断
//! - **rewriter**: 单个文本片段的改写
//! - **pipeline**: 文档遍历、变更处理与导航观察
//! - **storage**: 设置与术语统计的持久化
//! - **core**: 引擎与事件循环
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use admin_localizer::network::Session;
//! use admin_localizer::translation::{LocalizerConfig, LocalizerEngine, MemoryStore};
//!
//! # async fn example(document: markup5ever_rcdom::Handle) -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new()?;
//! let mut engine =
//!     LocalizerEngine::initialize(LocalizerConfig::default(), &session, MemoryStore::new()).await?;
//! engine.localize_document(&document);
//! engine.flush_stats().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod dictionary;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod rewriter;
pub mod storage;

pub use config::{ConfigManager, LocalizerConfig};
pub use core::{HostEvent, LocalizerEngine, LocalizerService};
pub use dictionary::{load_dictionary, parse_dictionary_text, TermDictionary};
pub use error::{LocalizerError, LocalizerResult};
pub use matcher::{MatchOptions, MatchOrder, MatchPolicy};
pub use rewriter::{classify, rewrite, Rewrite, RewriteOutcome};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, Settings, StatsAggregator, TermStatistics};
