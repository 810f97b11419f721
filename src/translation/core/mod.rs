//! 本地化系统核心模块
//!
//! 整合词典、匹配顺序、文档遍历、导航观察与统计，为宿主提供单一入口。
//!
//! ## 架构设计
//!
//! - **引擎层** (`engine.rs`): 持有全部运行状态，同步处理遍历与变更
//! - **服务层** (`service.rs`): 单任务事件循环，驱动统计写入与导航后的重新遍历
//!
//! ## 模块依赖关系
//!
//! ```text
//! LocalizerService (service.rs)
//!     └── LocalizerEngine (engine.rs)
//!             ├── TermDictionary / MatchOrder (dictionary.rs, matcher.rs)
//!             ├── TreeWalker (pipeline/walker.rs)
//!             ├── NavigationObserver (pipeline/navigation.rs)
//!             └── StatsAggregator (storage/stats.rs)
//! ```

pub mod engine;
pub mod service;

/// 本地化引擎
pub use engine::LocalizerEngine;

/// 事件循环与宿主事件
pub use service::{HostEvent, HostHandle, LocalizerService};
