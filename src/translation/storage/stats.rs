//! 术语使用统计
//!
//! 每次命中或发现未匹配候选时立即更新内存中的计数；持久化采用防抖：
//! 第一次变更时安排一次写入，窗口内的后续变更合并进同一次写入。
//! 写入失败只记录日志，不影响流程。

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::kv::KeyValueStore;
use crate::parsers::csv::write_row;
use crate::translation::config::constants::{
    DEFAULT_FLUSH_DEBOUNCE, DEFAULT_SNIPPET_MAX_CHARS, STATS_KEY, UNMATCHED_KEY_PREFIX,
};
use crate::translation::error::LocalizerResult;

/// 单个术语的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermStat {
    pub target_term: String,
    pub match_count: u64,
}

/// 术语统计表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermStatistics {
    #[serde(default)]
    pub terms: BTreeMap<String, TermStat>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl TermStatistics {
    pub fn record_match(&mut self, source: &str, target: &str, count: u64) {
        let entry = self.terms.entry(source.to_string()).or_default();
        entry.target_term = target.to_string();
        entry.match_count += count;
    }

    /// 记录未匹配片段，返回使用的键
    pub fn record_unmatched(&mut self, fragment: &str, max_chars: usize) -> String {
        let key = unmatched_key(fragment, max_chars);
        self.terms.entry(key.clone()).or_default().match_count += 1;
        key
    }

    pub fn match_count(&self, source: &str) -> u64 {
        self.terms.get(source).map_or(0, |stat| stat.match_count)
    }

    /// 已匹配术语（不含未匹配片段）
    pub fn matched(&self) -> impl Iterator<Item = (&str, &TermStat)> {
        self.terms
            .iter()
            .filter(|(key, _)| !key.starts_with(UNMATCHED_KEY_PREFIX))
            .map(|(key, stat)| (key.as_str(), stat))
    }

    /// 未匹配片段及出现次数
    pub fn unmatched(&self) -> impl Iterator<Item = (&str, u64)> {
        self.terms.iter().filter_map(|(key, stat)| {
            key.strip_prefix(UNMATCHED_KEY_PREFIX)
                .map(|snippet| (snippet, stat.match_count))
        })
    }

    pub fn total_matches(&self) -> u64 {
        self.matched().map(|(_, stat)| stat.match_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// 导出为表格文本：kind,source,target,count
    pub fn to_csv(&self) -> String {
        let mut rows = vec![write_row(&["kind", "source", "target", "count"])];

        let mut matched: Vec<_> = self.matched().collect();
        matched.sort_by(|a, b| b.1.match_count.cmp(&a.1.match_count).then(a.0.cmp(b.0)));
        for (source, stat) in matched {
            rows.push(write_row(&[
                "matched",
                source,
                stat.target_term.as_str(),
                stat.match_count.to_string().as_str(),
            ]));
        }

        for (snippet, count) in self.unmatched() {
            rows.push(write_row(&["unmatched", snippet, "", count.to_string().as_str()]));
        }

        let mut csv = rows.join("\n");
        csv.push('\n');
        csv
    }
}

/// 未匹配片段的键：前缀 + 去除首尾空白后的前 N 个字符
pub fn unmatched_key(fragment: &str, max_chars: usize) -> String {
    let snippet: String = fragment.trim().chars().take(max_chars).collect();
    format!("{}{}", UNMATCHED_KEY_PREFIX, snippet)
}

/// 统计聚合器
#[derive(Debug)]
pub struct StatsAggregator {
    stats: TermStatistics,
    debounce: Duration,
    snippet_max_chars: usize,
    flush_deadline: Option<Instant>,
    dirty: bool,
    flushes: u64,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(
            TermStatistics::default(),
            DEFAULT_FLUSH_DEBOUNCE,
            DEFAULT_SNIPPET_MAX_CHARS,
        )
    }
}

impl StatsAggregator {
    pub fn new(stats: TermStatistics, debounce: Duration, snippet_max_chars: usize) -> Self {
        Self {
            stats,
            debounce,
            snippet_max_chars,
            flush_deadline: None,
            dirty: false,
            flushes: 0,
        }
    }

    /// 从存储读取已有统计；失败时从空表开始
    pub async fn load<S: KeyValueStore>(
        store: &S,
        debounce: Duration,
        snippet_max_chars: usize,
    ) -> Self {
        let stats: TermStatistics = match store.get(STATS_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("统计数据格式无效，重新开始: {}", e);
                TermStatistics::default()
            }),
            Ok(None) => TermStatistics::default(),
            Err(e) => {
                tracing::warn!("读取统计数据失败: {}", e);
                TermStatistics::default()
            }
        };

        Self::new(stats, debounce, snippet_max_chars)
    }

    pub fn statistics(&self) -> &TermStatistics {
        &self.stats
    }

    pub fn record_match(&mut self, source: &str, target: &str, count: u64, now: Instant) {
        self.stats.record_match(source, target, count);
        self.mark_dirty(now);
    }

    pub fn record_unmatched(&mut self, fragment: &str, now: Instant) -> String {
        let key = self.stats.record_unmatched(fragment, self.snippet_max_chars);
        self.mark_dirty(now);
        key
    }

    fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        // 窗口内的后续更新不推迟已安排的写入
        if self.flush_deadline.is_none() {
            self.flush_deadline = Some(now + self.debounce);
        }
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        self.flush_deadline
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 已执行的写入次数（含失败）
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// 到期则写入，返回是否执行了写入
    pub async fn flush_if_due<S: KeyValueStore>(&mut self, now: Instant, store: &S) -> bool {
        match self.flush_deadline {
            Some(deadline) if deadline <= now => {
                self.flush(store).await;
                true
            }
            _ => false,
        }
    }

    /// 立即写入未保存的变更
    pub async fn flush<S: KeyValueStore>(&mut self, store: &S) {
        self.flush_deadline = None;
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.flushes += 1;
        self.stats.last_updated = Some(Utc::now());

        if let Err(e) = self.persist(store).await {
            tracing::warn!("统计数据写入失败（已忽略）: {}", e);
        }
    }

    async fn persist<S: KeyValueStore>(&self, store: &S) -> LocalizerResult<()> {
        let value = serde_json::to_value(&self.stats)?;
        store.set(STATS_KEY, value).await
    }

    /// 清空统计并删除持久化数据
    pub async fn reset<S: KeyValueStore>(&mut self, store: &S) -> LocalizerResult<()> {
        self.stats = TermStatistics::default();
        self.dirty = false;
        self.flush_deadline = None;
        store.remove(STATS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::storage::kv::MemoryStore;

    #[test]
    fn test_unmatched_snippets_are_bounded() {
        let long = format!("  {}  ", "a".repeat(300));
        let key = unmatched_key(&long, 120);
        assert_eq!(key.len(), UNMATCHED_KEY_PREFIX.len() + 120);
        assert!(!key.ends_with(' '));
    }

    #[test]
    fn test_matched_and_unmatched_are_separated() {
        let mut stats = TermStatistics::default();
        stats.record_match("Save", "保存", 2);
        stats.record_match("Save", "保存", 1);
        stats.record_unmatched("Publish changes", 120);
        stats.record_unmatched(" Publish changes ", 120);

        assert_eq!(stats.match_count("Save"), 3);
        assert_eq!(stats.total_matches(), 3);
        let unmatched: Vec<_> = stats.unmatched().collect();
        assert_eq!(unmatched, vec![("Publish changes", 2)]);
    }

    #[test]
    fn test_csv_export() {
        let mut stats = TermStatistics::default();
        stats.record_match("Save", "保存", 1);
        stats.record_match("Save, Draft", "下書き", 4);
        stats.record_unmatched("Team \"alpha\"", 120);

        let csv = stats.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "kind,source,target,count");
        assert_eq!(lines[1], "matched,\"Save, Draft\",下書き,4");
        assert_eq!(lines[2], "matched,Save,保存,1");
        assert_eq!(lines[3], "unmatched,\"Team \"\"alpha\"\"\",,1");
    }

    #[test]
    fn test_serialized_field_names() {
        let mut stats = TermStatistics::default();
        stats.record_match("Save", "保存", 1);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["terms"]["Save"]["targetTerm"], "保存");
        assert_eq!(value["terms"]["Save"]["matchCount"], 1);
        assert!(value.get("lastUpdated").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_coalesce_into_one_write() {
        let store = MemoryStore::new();
        let mut aggregator = StatsAggregator::default();
        let start = Instant::now();

        for i in 0..5u64 {
            let now = start + Duration::from_millis(i * 100);
            aggregator.record_match("Save", "保存", 1, now);
            assert!(!aggregator.flush_if_due(now, &store).await);
        }
        assert_eq!(aggregator.flush_deadline(), Some(start + Duration::from_millis(1000)));

        assert!(aggregator.flush_if_due(start + Duration::from_millis(1000), &store).await);
        assert_eq!(store.write_count(), 1);

        let persisted: TermStatistics =
            serde_json::from_value(store.snapshot(STATS_KEY).unwrap()).unwrap();
        assert_eq!(persisted.match_count("Save"), 5);
        assert!(persisted.last_updated.is_some());

        // 没有新的变更时不再写入
        aggregator.flush(&store).await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let mut aggregator = StatsAggregator::default();
        let now = Instant::now();

        aggregator.record_match("Save", "保存", 1, now);
        aggregator.flush(&store).await;

        assert_eq!(aggregator.flush_count(), 1);
        assert!(!aggregator.is_dirty());
        assert_eq!(aggregator.statistics().match_count("Save"), 1);
    }

    #[tokio::test]
    async fn test_load_and_reset() {
        let store = MemoryStore::new();
        let mut stats = TermStatistics::default();
        stats.record_match("Open", "開く", 7);
        store
            .set(STATS_KEY, serde_json::to_value(&stats).unwrap())
            .await
            .unwrap();

        let mut aggregator =
            StatsAggregator::load(&store, DEFAULT_FLUSH_DEBOUNCE, DEFAULT_SNIPPET_MAX_CHARS).await;
        assert_eq!(aggregator.statistics().match_count("Open"), 7);

        aggregator.reset(&store).await.unwrap();
        assert!(aggregator.statistics().is_empty());
        assert_eq!(store.snapshot(STATS_KEY), None);
    }
}
