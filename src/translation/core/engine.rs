//! 本地化引擎核心实现
//!
//! 引擎是整个本地化流程的唯一长期实例，持有术语词典、匹配顺序、文档遍历器、
//! 导航观察器、统计聚合器以及调试开关。启动时构建一次，显式传递给各组件，
//! 导航时只重置与页面相关的状态。
//!
//! ## 工作流程
//! 1. 读取设置与已有统计（失败时使用默认值）
//! 2. 加载术语词典（失败则中止初始化）
//! 3. 按长术语优先生成匹配顺序
//! 4. 对初始文档做一次完整遍历
//! 5. 之后处理每批变更记录与导航通知
//!
//! ## 使用示例
//! ```rust,no_run
//! use admin_localizer::network::Session;
//! use admin_localizer::translation::core::LocalizerEngine;
//! use admin_localizer::translation::config::LocalizerConfig;
//! use admin_localizer::translation::storage::MemoryStore;
//!
//! # async fn example(document: markup5ever_rcdom::Handle) -> Result<(), Box<dyn std::error::Error>> {
//! let config = LocalizerConfig::with_dictionary("translation_terms.csv");
//! let session = Session::new()?;
//! let mut engine = LocalizerEngine::initialize(config, &session, MemoryStore::new()).await?;
//! let report = engine.localize_document(&document);
//! println!("替换了 {} 个文本节点", report.rewritten);
//! # Ok(())
//! # }
//! ```

use markup5ever_rcdom::Handle;
use tokio::time::Instant;

use crate::network::Session;
use crate::translation::{
    config::LocalizerConfig,
    dictionary::{load_dictionary, TermDictionary},
    error::LocalizerResult,
    matcher::{MatchOptions, MatchOrder},
    pipeline::{
        MutationRecord, NavigationChange, NavigationEvent, NavigationObserver, TextProcessor,
        TreeWalker, WalkReport,
    },
    rewriter::{classify, rewrite, Rewrite, RewriteOutcome},
    storage::{KeyValueStore, Settings, StatsAggregator, TermStatistics},
};

/// 本地化引擎
///
/// ## 状态归属
/// - 词典与匹配顺序：构建后只读，重新初始化时整体替换
/// - 节点缓存：由遍历器持有，导航时清空
/// - 统计：内存中即时更新，按防抖窗口写入存储
pub struct LocalizerEngine<S: KeyValueStore> {
    config: LocalizerConfig,
    dictionary: TermDictionary,
    order: MatchOrder,
    options: MatchOptions,
    walker: TreeWalker,
    navigation: NavigationObserver,
    stats: StatsAggregator,
    store: S,
    debug: bool,
    rescan_at: Option<Instant>,
    totals: WalkReport,
}

impl<S: KeyValueStore> LocalizerEngine<S> {
    /// 初始化引擎
    ///
    /// # 参数
    /// - `config`: 本地化配置
    /// - `session`: 用于获取词典资源的会话
    /// - `store`: 设置与统计所在的键值存储
    ///
    /// # 错误
    /// - `LocalizerError::ConfigError`: 配置无效
    /// - `LocalizerError::DictionaryLoad`: 词典获取失败或没有任何有效术语；
    ///   此时不会以空词典继续运行
    pub async fn initialize(
        config: LocalizerConfig,
        session: &Session,
        store: S,
    ) -> LocalizerResult<Self> {
        config.validate()?;

        let dictionary = match load_dictionary(session, &config.dictionary).await {
            Ok(dictionary) => dictionary,
            Err(e) => {
                tracing::error!("词典加载失败，停止初始化: {}", e);
                return Err(e);
            }
        };

        Self::with_dictionary(config, dictionary, store).await
    }

    /// 使用已加载的词典构建引擎
    pub async fn with_dictionary(
        config: LocalizerConfig,
        dictionary: TermDictionary,
        store: S,
    ) -> LocalizerResult<Self> {
        config.validate()?;

        let settings = Settings::load(&store).await;
        let stats =
            StatsAggregator::load(&store, config.flush_debounce(), config.snippet_max_chars).await;
        let navigation = NavigationObserver::new(&config.admin_url_patterns)?;
        let order = MatchOrder::from_dictionary(&dictionary);

        tracing::info!(
            "本地化引擎就绪: {} 个术语, 策略 {:?}, 调试模式 {}",
            dictionary.len(),
            config.match_policy,
            settings.debug_mode
        );

        Ok(Self {
            options: config.match_options(),
            walker: TreeWalker::new(config.skip_elements.iter().cloned()),
            config,
            dictionary,
            order,
            navigation,
            stats,
            store,
            debug: settings.debug_mode,
            rescan_at: None,
            totals: WalkReport::default(),
        })
    }

    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    pub fn match_order(&self) -> &MatchOrder {
        &self.order
    }

    pub fn statistics(&self) -> &TermStatistics {
        self.stats.statistics()
    }

    pub fn aggregator(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn walker(&self) -> &TreeWalker {
        &self.walker
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// 累计遍历统计
    pub fn totals(&self) -> WalkReport {
        self.totals
    }

    /// 设置宿主页面的初始位置，返回是否处于管理界面
    pub fn set_location(&mut self, url: &str) -> LocalizerResult<bool> {
        self.navigation.set_location(url)
    }

    pub fn is_active(&self) -> bool {
        self.navigation.is_active()
    }

    /// 预览单个片段的改写结果（不修改统计）
    pub fn preview(&self, text: &str) -> Option<Rewrite> {
        rewrite(text, &self.order, &self.options)
    }

    /// 对整个文档做一次完整遍历
    pub fn localize_document(&mut self, root: &Handle) -> WalkReport {
        if !self.navigation.is_active() {
            tracing::debug!("当前页面不在管理界面内，跳过遍历");
            return WalkReport::default();
        }

        let now = Instant::now();
        let mut processor = FragmentProcessor {
            dictionary: &self.dictionary,
            order: &self.order,
            options: &self.options,
            stats: &mut self.stats,
            debug: self.debug,
            now,
        };
        let report = self.walker.process_tree(root, &mut processor);

        tracing::info!(
            "文档遍历完成: 访问 {} 个文本节点, 替换 {} 个, 未匹配 {} 个",
            report.visited,
            report.rewritten,
            report.unmatched
        );
        self.totals += report;
        report
    }

    /// 处理一批变更记录
    pub fn handle_mutations(&mut self, root: &Handle, records: &[MutationRecord]) -> WalkReport {
        if records.is_empty() || !self.navigation.is_active() {
            return WalkReport::default();
        }

        let now = Instant::now();
        let mut processor = FragmentProcessor {
            dictionary: &self.dictionary,
            order: &self.order,
            options: &self.options,
            stats: &mut self.stats,
            debug: self.debug,
            now,
        };
        let report = self.walker.process_mutations(root, records, &mut processor);

        tracing::debug!(
            "处理 {} 条变更记录: 替换 {} 个, 缓存命中 {} 个",
            records.len(),
            report.rewritten,
            report.unchanged_cached
        );
        self.totals += report;
        report
    }

    /// 处理导航通知
    ///
    /// 进入新的逻辑页面时丢弃节点缓存；若新页面仍在管理界面内，则在稳定等待后
    /// 重新遍历，返回安排的重新遍历时间。
    ///
    /// # 错误
    /// - `LocalizerError::ParseError`: 导航URL无法解析
    pub fn handle_navigation(&mut self, event: &NavigationEvent) -> LocalizerResult<Option<Instant>> {
        match self.navigation.observe(event)? {
            NavigationChange::Unchanged => Ok(self.rescan_at),
            NavigationChange::Entered(url) => {
                self.walker.reset();
                let at = Instant::now() + self.config.settle_delay();
                self.rescan_at = Some(at);
                tracing::info!("导航到 {}，{:?} 后重新遍历", url, self.config.settle_delay());
                Ok(Some(at))
            }
            NavigationChange::Left(url) => {
                self.walker.reset();
                self.rescan_at = None;
                tracing::info!("离开管理界面: {}", url);
                Ok(None)
            }
        }
    }

    pub fn rescan_deadline(&self) -> Option<Instant> {
        self.rescan_at
    }

    /// 到期则执行导航后的重新遍历
    pub fn run_due_rescan(&mut self, now: Instant, root: &Handle) -> Option<WalkReport> {
        match self.rescan_at {
            Some(at) if at <= now => {
                self.rescan_at = None;
                Some(self.localize_document(root))
            }
            _ => None,
        }
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        self.stats.flush_deadline()
    }

    /// 到期则写入统计
    pub async fn flush_if_due(&mut self, now: Instant) -> bool {
        self.stats.flush_if_due(now, &self.store).await
    }

    /// 立即写入未保存的统计
    pub async fn flush_stats(&mut self) {
        self.stats.flush(&self.store).await;
    }

    /// 清空统计
    pub async fn reset_stats(&mut self) -> LocalizerResult<()> {
        self.stats.reset(&self.store).await
    }
}

/// 单次遍历期间的片段处理器：改写并记录统计
struct FragmentProcessor<'a> {
    dictionary: &'a TermDictionary,
    order: &'a MatchOrder,
    options: &'a MatchOptions,
    stats: &'a mut StatsAggregator,
    debug: bool,
    now: Instant,
}

impl TextProcessor for FragmentProcessor<'_> {
    fn process(&mut self, fragment: &str) -> RewriteOutcome {
        let outcome = classify(fragment, self.order, self.options);

        match &outcome {
            RewriteOutcome::Rewritten(rewrite) => {
                for (source, count) in &rewrite.term_counts {
                    let target = self.dictionary.get(source).unwrap_or_default();
                    self.stats.record_match(source, target, *count, self.now);
                }
                if self.debug {
                    tracing::info!("替换: {:?} -> {:?}", fragment, rewrite.text);
                } else {
                    tracing::debug!("替换: {:?} -> {:?}", fragment, rewrite.text);
                }
            }
            RewriteOutcome::Unmatched => {
                let key = self.stats.record_unmatched(fragment, self.now);
                if self.debug {
                    tracing::info!("未匹配: {}", key);
                }
            }
            RewriteOutcome::Skipped => {}
        }

        outcome
    }
}
