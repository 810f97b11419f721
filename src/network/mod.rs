//! # 网络模块
//!
//! 负责取得外部资源（术语词典）：
//!
//! - `session` - HTTP 会话管理、本地文件读取

pub mod session;

// Re-export commonly used items for convenience
pub use session::Session;
