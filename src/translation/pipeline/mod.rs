//! 文档处理管道模块
//!
//! 提供文档遍历、变更处理与导航观察

pub mod navigation;
pub mod walker;

// 重新导出主要类型
pub use navigation::{NavigationChange, NavigationEvent, NavigationKind, NavigationObserver};
pub use walker::{MutationRecord, NodeCache, TextProcessor, TreeWalker, WalkReport};
