//! 文本改写器
//!
//! 对单个文本片段应用匹配器，给出新文本及各术语的命中次数；无变化时返回 `None`。
//! 纯函数，统计记录由下游负责。

use std::collections::BTreeMap;

use crate::translation::matcher::{
    contains_english_text, count_occurrences, is_already_translated, MatchOptions, MatchOrder,
    MatchPolicy,
};

/// 改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// 源术语 -> 命中次数
    pub term_counts: BTreeMap<String, u64>,
}

/// 片段的处理结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten(Rewrite),
    /// 看起来含有英文但没有匹配任何术语
    Unmatched,
    Skipped,
}

/// 改写单个片段
pub fn rewrite(fragment: &str, order: &MatchOrder, options: &MatchOptions) -> Option<Rewrite> {
    if fragment.trim().is_empty() {
        return None;
    }
    if options.skip_if_translated && is_already_translated(fragment) {
        return None;
    }

    match options.policy {
        MatchPolicy::Exact => rewrite_exact(fragment, order, options.case_insensitive),
        MatchPolicy::Substring => rewrite_substring(fragment, order, options.case_insensitive),
    }
}

/// 改写并分类，供遍历器与统计使用
pub fn classify(fragment: &str, order: &MatchOrder, options: &MatchOptions) -> RewriteOutcome {
    match rewrite(fragment, order, options) {
        Some(rewrite) => RewriteOutcome::Rewritten(rewrite),
        None if contains_english_text(fragment) => RewriteOutcome::Unmatched,
        None => RewriteOutcome::Skipped,
    }
}

fn rewrite_exact(fragment: &str, order: &MatchOrder, case_insensitive: bool) -> Option<Rewrite> {
    let trimmed = fragment.trim();
    let term = order.find_exact(trimmed, case_insensitive)?;

    let start = fragment.len() - fragment.trim_start().len();
    let end = start + trimmed.len();

    let mut text = String::with_capacity(fragment.len() - trimmed.len() + term.target.len());
    text.push_str(&fragment[..start]);
    text.push_str(&term.target);
    text.push_str(&fragment[end..]);

    let mut term_counts = BTreeMap::new();
    term_counts.insert(term.source.clone(), 1);

    Some(Rewrite { text, term_counts })
}

fn rewrite_substring(
    fragment: &str,
    order: &MatchOrder,
    case_insensitive: bool,
) -> Option<Rewrite> {
    let mut text = fragment.to_string();
    let mut term_counts = BTreeMap::new();

    for term in order.terms() {
        let count = if case_insensitive {
            let Some(pattern) = term.case_insensitive_pattern() else {
                continue;
            };
            let count = pattern.find_iter(&text).count();
            if count > 0 {
                text = pattern
                    .replace_all(&text, regex::NoExpand(&term.target))
                    .into_owned();
            }
            count
        } else {
            let count = count_occurrences(&text, &term.source);
            if count > 0 {
                text = text.replace(&term.source, &term.target);
            }
            count
        };

        if count > 0 {
            *term_counts.entry(term.source.clone()).or_insert(0) += count as u64;
        }
    }

    if term_counts.is_empty() {
        None
    } else {
        Some(Rewrite { text, term_counts })
    }
}
