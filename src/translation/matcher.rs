//! 术语匹配器
//!
//! 决定匹配顺序（长术语优先）与相等策略（整段精确匹配或子串替换、大小写敏感性、
//! 已翻译检测）。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::translation::config::constants::MIN_ENGLISH_WORD_LEN;
use crate::translation::dictionary::TermDictionary;

/// 匹配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// 去除首尾空白后与源术语整段相等，每个片段至多替换一次
    #[default]
    Exact,
    /// 旧策略：替换片段中出现的所有源术语
    Substring,
}

/// 匹配选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// 片段含有日文字符时跳过
    pub skip_if_translated: bool,
    pub case_insensitive: bool,
    pub policy: MatchPolicy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            skip_if_translated: true,
            case_insensitive: false,
            policy: MatchPolicy::Exact,
        }
    }
}

/// 按匹配顺序排列的术语
#[derive(Debug)]
pub struct OrderedTerm {
    pub source: String,
    pub target: String,
    folded: String,
    pattern: OnceLock<Option<Regex>>,
}

impl OrderedTerm {
    fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            folded: source.to_lowercase(),
            pattern: OnceLock::new(),
        }
    }

    /// 忽略大小写的子串模式
    pub fn case_insensitive_pattern(&self) -> Option<&Regex> {
        self.pattern
            .get_or_init(|| {
                Regex::new(&format!("(?i){}", regex::escape(&self.source)))
                    .map_err(|e| tracing::warn!("术语模式编译失败 {:?}: {}", self.source, e))
                    .ok()
            })
            .as_ref()
    }
}

/// 匹配顺序：词典的一个排列，源术语按字符数降序，等长时保持词典顺序
#[derive(Debug, Default)]
pub struct MatchOrder {
    terms: Vec<OrderedTerm>,
}

impl MatchOrder {
    pub fn from_dictionary(dictionary: &TermDictionary) -> Self {
        let mut terms: Vec<OrderedTerm> = dictionary
            .iter()
            .map(|(source, target)| OrderedTerm::new(source, target))
            .collect();
        // sort_by 是稳定排序
        terms.sort_by(|a, b| b.source.chars().count().cmp(&a.source.chars().count()));

        Self { terms }
    }

    pub fn terms(&self) -> &[OrderedTerm] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// 第一个与文本整段相等的术语
    pub fn find_exact(&self, text: &str, case_insensitive: bool) -> Option<&OrderedTerm> {
        if case_insensitive {
            let folded = text.to_lowercase();
            self.terms.iter().find(|term| term.folded == folded)
        } else {
            self.terms.iter().find(|term| term.source == text)
        }
    }
}

/// 平假名、片假名、CJK统一汉字
fn is_japanese_char(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}')
}

/// 含有任意日文字符即视为已翻译
pub fn is_already_translated(text: &str) -> bool {
    text.chars().any(is_japanese_char)
}

fn english_word_regex() -> &'static Regex {
    static ENGLISH_WORD: OnceLock<Regex> = OnceLock::new();
    ENGLISH_WORD.get_or_init(|| {
        // ASCII 单词边界
        let pattern = format!(r"(?-u:\b)[A-Za-z]{{{},}}(?-u:\b)", MIN_ENGLISH_WORD_LEN);
        Regex::new(&pattern).expect("static pattern")
    })
}

/// 未匹配候选判定：含有3个字母以上的英文单词且未翻译
pub fn contains_english_text(text: &str) -> bool {
    english_word_regex().is_match(text) && !is_already_translated(text)
}

/// 统计不重叠出现次数
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
