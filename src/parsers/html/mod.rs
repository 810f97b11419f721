//! HTML解析和处理模块
//!
//! - `dom`: 文档解析与基础节点操作
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{find_nodes, get_node_name, get_parent_node, html_to_dom, text_of};
pub use serializer::serialize_document;
