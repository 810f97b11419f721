//! 本地化模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

/// 本地化错误类型
#[derive(Error, Debug, Clone)]
pub enum LocalizerError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 词典加载错误
    #[error("词典加载失败: {0}")]
    DictionaryLoad(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 存储错误
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl LocalizerError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            LocalizerError::NetworkError(_) => true,
            LocalizerError::StorageError(_) => true,
            LocalizerError::DictionaryLoad(_) => true,
            LocalizerError::ConfigError(_) => false,
            LocalizerError::ParseError(_) => false,
            LocalizerError::SerializationError(_) => false,
            LocalizerError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LocalizerError::ConfigError(_) => ErrorSeverity::Critical,
            LocalizerError::NetworkError(_) => ErrorSeverity::Error,
            LocalizerError::DictionaryLoad(_) => ErrorSeverity::Critical,
            LocalizerError::ParseError(_) => ErrorSeverity::Error,
            // 统计数据只用于诊断
            LocalizerError::StorageError(_) => ErrorSeverity::Warning,
            LocalizerError::SerializationError(_) => ErrorSeverity::Warning,
            LocalizerError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            LocalizerError::ConfigError(_) => ErrorCategory::Configuration,
            LocalizerError::NetworkError(_) => ErrorCategory::Network,
            LocalizerError::DictionaryLoad(_) => ErrorCategory::Dictionary,
            LocalizerError::ParseError(_) => ErrorCategory::Parsing,
            LocalizerError::StorageError(_) => ErrorCategory::Storage,
            LocalizerError::SerializationError(_) => ErrorCategory::Serialization,
            LocalizerError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = format!("{} (上下文: {})", self.message(), context);

        match &mut self {
            LocalizerError::ConfigError(ref mut msg)
            | LocalizerError::NetworkError(ref mut msg)
            | LocalizerError::DictionaryLoad(ref mut msg)
            | LocalizerError::ParseError(ref mut msg)
            | LocalizerError::StorageError(ref mut msg)
            | LocalizerError::SerializationError(ref mut msg)
            | LocalizerError::InternalError(ref mut msg) => *msg = new_msg,
        }

        self
    }

    fn message(&self) -> &str {
        match self {
            LocalizerError::ConfigError(msg)
            | LocalizerError::NetworkError(msg)
            | LocalizerError::DictionaryLoad(msg)
            | LocalizerError::ParseError(msg)
            | LocalizerError::StorageError(msg)
            | LocalizerError::SerializationError(msg)
            | LocalizerError::InternalError(msg) => msg,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Dictionary,
    Parsing,
    Storage,
    Serialization,
    Internal,
}

impl From<std::io::Error> for LocalizerError {
    fn from(error: std::io::Error) -> Self {
        LocalizerError::StorageError(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for LocalizerError {
    fn from(error: serde_json::Error) -> Self {
        LocalizerError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for LocalizerError {
    fn from(error: toml::de::Error) -> Self {
        LocalizerError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for LocalizerError {
    fn from(error: config::ConfigError) -> Self {
        LocalizerError::ConfigError(error.to_string())
    }
}

impl From<reqwest::Error> for LocalizerError {
    fn from(error: reqwest::Error) -> Self {
        LocalizerError::NetworkError(error.to_string())
    }
}

impl From<regex::Error> for LocalizerError {
    fn from(error: regex::Error) -> Self {
        LocalizerError::ConfigError(format!("正则表达式无效: {}", error))
    }
}

/// 结果类型别名
pub type LocalizerResult<T> = Result<T, LocalizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let error = LocalizerError::DictionaryLoad("404".to_string());
        assert_eq!(error.category(), ErrorCategory::Dictionary);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(error.is_retryable());

        let error = LocalizerError::StorageError("disk full".to_string());
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_severity_ordering() {
        // 统计写入失败是最轻的级别
        let storage = LocalizerError::StorageError("disk full".to_string()).severity();
        let network = LocalizerError::NetworkError("timeout".to_string()).severity();
        let config = LocalizerError::ConfigError("bad".to_string()).severity();
        assert!(storage < network && network < config);
    }

    #[test]
    fn test_with_context_keeps_variant() {
        let error = LocalizerError::NetworkError("timeout".to_string())
            .with_context("terms.csv");

        match &error {
            LocalizerError::NetworkError(msg) => {
                assert!(msg.contains("timeout"));
                assert!(msg.contains("terms.csv"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: LocalizerError = io.into();
        assert_eq!(error.category(), ErrorCategory::Storage);
    }
}
