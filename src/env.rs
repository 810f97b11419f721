//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，用于覆盖本地化配置

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 只解析已设置的变量：未设置返回 None，不回退到默认值
    fn lookup_with<F>(lookup: F) -> Option<EnvResult<T>>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(Self::NAME).map(|value| Self::parse(&value))
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "LOCALIZER_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 本地化相关环境变量
pub mod localizer {
    use super::*;

    /// 术语词典位置（文件路径或URL）
    pub struct Dictionary;
    impl EnvVar<String> for Dictionary {
        const NAME: &'static str = "LOCALIZER_DICTIONARY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Term dictionary location (path, file:// or http(s):// URL)";

        fn parse(value: &str) -> EnvResult<String> {
            let location = value.trim();
            if location.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Dictionary location cannot be empty".to_string(),
                });
            }
            Ok(location.to_string())
        }
    }

    /// 统计数据文件
    pub struct StatsPath;
    impl EnvVar<String> for StatsPath {
        const NAME: &'static str = "LOCALIZER_STATS_PATH";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Path of the JSON key-value store holding settings and statistics";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(shellexpand::tilde(path).into_owned())
        }
    }

    /// 忽略大小写匹配
    pub struct CaseInsensitive;
    impl EnvVar<bool> for CaseInsensitive {
        const NAME: &'static str = "LOCALIZER_CASE_INSENSITIVE";
        const DEFAULT: Option<bool> = None;
        const DESCRIPTION: &'static str = "Compare source terms case-insensitively";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 匹配策略
    pub struct MatchPolicy;
    impl EnvVar<String> for MatchPolicy {
        const NAME: &'static str = "LOCALIZER_MATCH_POLICY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Match policy: exact (whole fragment) or substring";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                "exact" => Ok("exact".to_string()),
                "substring" => Ok("substring".to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid policy '{}'. Use: exact, substring", value),
                }),
            }
        }
    }

    /// 统计写入防抖窗口
    pub struct FlushDebounce;
    impl EnvVar<Duration> for FlushDebounce {
        const NAME: &'static str = "LOCALIZER_FLUSH_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Statistics flush debounce window in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 1, 60_000)
        }
    }

    /// 导航后的稳定等待时间
    pub struct SettleDelay;
    impl EnvVar<Duration> for SettleDelay {
        const NAME: &'static str = "LOCALIZER_SETTLE_DELAY_MS";
        const DEFAULT: Option<Duration> = None;
        const DESCRIPTION: &'static str = "Delay before re-scanning the document after navigation";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 60_000)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", millis, min),
        });
    }

    if millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", millis, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str(&format!(
        "- `{}`: {} (default: info)\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        localizer::Dictionary::NAME,
        localizer::Dictionary::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        localizer::StatsPath::NAME,
        localizer::StatsPath::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: false)\n",
        localizer::CaseInsensitive::NAME,
        localizer::CaseInsensitive::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: exact)\n",
        localizer::MatchPolicy::NAME,
        localizer::MatchPolicy::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: 1000)\n",
        localizer::FlushDebounce::NAME,
        localizer::FlushDebounce::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: 500)\n",
        localizer::SettleDelay::NAME,
        localizer::SettleDelay::DESCRIPTION
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(localizer::CaseInsensitive::parse("true").unwrap());
        assert!(localizer::CaseInsensitive::parse("1").unwrap());
        assert!(localizer::CaseInsensitive::parse("YES").unwrap());

        assert!(!localizer::CaseInsensitive::parse("off").unwrap());
        assert!(!localizer::CaseInsensitive::parse("0").unwrap());

        assert!(localizer::CaseInsensitive::parse("maybe").is_err());
    }

    #[test]
    fn test_match_policy_parsing() {
        assert_eq!(localizer::MatchPolicy::parse(" Exact ").unwrap(), "exact");
        assert_eq!(localizer::MatchPolicy::parse("substring").unwrap(), "substring");
        assert!(localizer::MatchPolicy::parse("fuzzy").is_err());
    }

    #[test]
    fn test_millis_validation() {
        assert_eq!(
            localizer::FlushDebounce::parse("250").unwrap(),
            Duration::from_millis(250)
        );
        assert!(localizer::FlushDebounce::parse("0").is_err());
        assert!(localizer::FlushDebounce::parse("abc").is_err());
        assert_eq!(
            localizer::SettleDelay::parse("0").unwrap(),
            Duration::from_millis(0)
        );
        assert!(localizer::SettleDelay::parse("600000").is_err());
    }

    #[test]
    fn test_dictionary_location_rejects_blank() {
        assert!(localizer::Dictionary::parse("   ").is_err());
        assert_eq!(
            localizer::Dictionary::parse(" terms.csv ").unwrap(),
            "terms.csv"
        );
    }

    #[test]
    fn test_env_docs_lists_variables() {
        let docs = generate_env_docs();
        assert!(docs.contains("LOCALIZER_DICTIONARY"));
        assert!(docs.contains("LOCALIZER_FLUSH_DEBOUNCE_MS"));
    }
}
