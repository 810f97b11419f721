//! # 解析器模块
//!
//! - `csv` - 术语表与统计导出使用的逗号分隔文本
//! - `html` - HTML文档解析、DOM操作与序列化

pub mod csv;
pub mod html;

pub use html::{html_to_dom, serialize_document};
