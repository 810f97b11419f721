//! 本地化配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, LocalizerConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 词典
    pub const DEFAULT_DICTIONARY: &str = "translation_terms.csv";

    // 持久化键
    pub const SETTINGS_DEBUG_KEY: &str = "debugMode";
    pub const STATS_KEY: &str = "termStats";
    pub const DEFAULT_STATS_PATH: &str = "~/.config/admin-localizer/storage.json";

    // 统计相关
    pub const UNMATCHED_KEY_PREFIX: &str = "__unmatched__:";
    pub const DEFAULT_SNIPPET_MAX_CHARS: usize = 120;
    pub const DEFAULT_FLUSH_DEBOUNCE: Duration = Duration::from_millis(1000);

    // 导航
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

    // 候选文本检测：至少包含一个3个字母以上的英文单词
    pub const MIN_ENGLISH_WORD_LEN: usize = 3;

    // 跳过的容器元素（不渲染文本）
    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "textarea"];

    // 管理界面 URL 模式
    pub const ADMIN_URL_PATTERNS: &[&str] = &[
        r"^https://webflow\.com/dashboard",
        r"^https://[a-z0-9-]+\.design\.webflow\.com/",
        r"^https://webflow\.com/design/",
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "localizer.toml",
        ".localizer.toml",
        "~/.config/admin-localizer/config.toml",
        "/etc/admin-localizer/config.toml",
    ];
}

/// 加载配置，失败时回退到默认值
pub fn load_localizer_config() -> LocalizerConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            LocalizerConfig::default()
        }
    }
}
