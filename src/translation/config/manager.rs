//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{localizer, EnvError, EnvResult, EnvVar};
use crate::translation::error::{LocalizerError, LocalizerResult};
use crate::translation::matcher::{MatchOptions, MatchPolicy};

/// 本地化配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalizerConfig {
    // 资源配置
    pub dictionary: String,
    pub stats_path: String,

    // 匹配配置
    pub match_policy: MatchPolicy,
    pub case_insensitive: bool,
    pub skip_if_translated: bool,

    // 统计配置
    pub flush_debounce_ms: u64,
    pub snippet_max_chars: usize,

    // 遍历与导航
    pub settle_delay_ms: u64,
    pub skip_elements: Vec<String>,
    pub admin_url_patterns: Vec<String>,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            dictionary: constants::DEFAULT_DICTIONARY.to_string(),
            stats_path: constants::DEFAULT_STATS_PATH.to_string(),

            match_policy: MatchPolicy::Exact,
            case_insensitive: false,
            skip_if_translated: true,

            flush_debounce_ms: constants::DEFAULT_FLUSH_DEBOUNCE.as_millis() as u64,
            snippet_max_chars: constants::DEFAULT_SNIPPET_MAX_CHARS,

            settle_delay_ms: constants::DEFAULT_SETTLE_DELAY.as_millis() as u64,
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            admin_url_patterns: constants::ADMIN_URL_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LocalizerConfig {
    /// 创建指定词典位置的默认配置
    pub fn with_dictionary(dictionary: &str) -> Self {
        Self {
            dictionary: dictionary.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> LocalizerResult<()> {
        if self.dictionary.trim().is_empty() {
            return Err(LocalizerError::ConfigError("词典位置不能为空".to_string()));
        }

        if self.flush_debounce_ms == 0 {
            return Err(LocalizerError::ConfigError("防抖窗口必须大于0".to_string()));
        }

        if self.snippet_max_chars == 0 {
            return Err(LocalizerError::ConfigError("片段长度必须大于0".to_string()));
        }

        for pattern in &self.admin_url_patterns {
            Regex::new(pattern)
                .map_err(|e| LocalizerError::from(e).with_context(pattern))?;
        }

        Ok(())
    }

    /// 应用环境变量覆盖，返回被拒绝的变量
    pub fn apply_env_overrides(&mut self) -> Vec<EnvError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// 按给定的查找函数应用覆盖
    ///
    /// 只有已设置的变量才覆盖文件中的值；无效值记录警告后忽略，不影响其余变量。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<EnvError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();

        if let Some(dictionary) = accept(localizer::Dictionary::lookup_with(&lookup), &mut rejected) {
            self.dictionary = dictionary;
            tracing::info!("环境变量覆盖词典位置: {}", self.dictionary);
        }

        if let Some(stats_path) = accept(localizer::StatsPath::lookup_with(&lookup), &mut rejected) {
            self.stats_path = stats_path;
        }

        if let Some(case_insensitive) =
            accept(localizer::CaseInsensitive::lookup_with(&lookup), &mut rejected)
        {
            self.case_insensitive = case_insensitive;
        }

        if let Some(policy) = accept(localizer::MatchPolicy::lookup_with(&lookup), &mut rejected) {
            self.match_policy = match policy.as_str() {
                "substring" => MatchPolicy::Substring,
                _ => MatchPolicy::Exact,
            };
        }

        if let Some(debounce) = accept(localizer::FlushDebounce::lookup_with(&lookup), &mut rejected)
        {
            self.flush_debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(delay) = accept(localizer::SettleDelay::lookup_with(&lookup), &mut rejected) {
            self.settle_delay_ms = delay.as_millis() as u64;
        }

        rejected
    }

    /// 匹配选项
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            skip_if_translated: self.skip_if_translated,
            case_insensitive: self.case_insensitive,
            policy: self.match_policy,
        }
    }

    pub fn flush_debounce(&self) -> Duration {
        Duration::from_millis(self.flush_debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// 展开后的统计文件路径
    pub fn expanded_stats_path(&self) -> String {
        shellexpand::tilde(&self.stats_path).into_owned()
    }
}

fn accept<T>(value: Option<EnvResult<T>>, rejected: &mut Vec<EnvError>) -> Option<T> {
    match value? {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("忽略无效的环境变量: {}", e);
            rejected.push(e);
            None
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: LocalizerConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> LocalizerResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> LocalizerResult<Self> {
        Self::load_dotenv();
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &LocalizerConfig {
        &self.config
    }

    pub fn into_config(self) -> LocalizerConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> LocalizerResult<LocalizerConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(LocalizerConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> LocalizerResult<LocalizerConfig> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .build()
            .map_err(|e| LocalizerError::from(e).with_context(path))?;

        settings
            .try_deserialize::<LocalizerConfig>()
            .map_err(|e| LocalizerError::from(e).with_context(path))
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> LocalizerResult<()> {
        let content = toml::to_string_pretty(&LocalizerConfig::default())
            .map_err(|e| LocalizerError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LocalizerError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
