//! # Admin Localizer
//!
//! 按术语词典把 Web 管理界面中的英文文本改写为日文，并统计术语使用情况。
//!
//! ## 模块组织
//!
//! - `parsers` - 表格文本与 HTML 文档的解析和序列化
//! - `network` - 词典等资源的获取
//! - `translation` - 词典、匹配、改写、遍历、统计与引擎
//! - `env` - 环境变量定义

pub mod env;
pub mod network;
pub mod parsers;
pub mod translation;

pub use translation::{LocalizerConfig, LocalizerEngine, LocalizerError, LocalizerResult};
