//! 术语词典
//!
//! 有序的 (源术语, 目标术语) 对，源术语唯一，由表格文本资源构建，构建后只读。

use std::collections::HashMap;

use crate::network::Session;
use crate::parsers::csv::{parse_row, split_rows};
use crate::translation::error::{LocalizerError, LocalizerResult};

/// 术语词典
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDictionary {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入术语对，空术语被拒绝
    ///
    /// 重复的源术语覆盖目标术语，但保留首次出现的位置。
    pub fn insert(&mut self, source: &str, target: &str) -> bool {
        let source = source.trim();
        let target = target.trim();
        if source.is_empty() || target.is_empty() {
            return false;
        }

        match self.index.get(source) {
            Some(&position) => self.entries[position].1 = target.to_string(),
            None => {
                self.index.insert(source.to_string(), self.entries.len());
                self.entries.push((source.to_string(), target.to_string()));
            }
        }
        true
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.index
            .get(source)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TermDictionary {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut dictionary = TermDictionary::new();
        for (source, target) in iter {
            dictionary.insert(source, target);
        }
        dictionary
    }
}

/// 解析词典文本
///
/// 第一行是表头；少于两个字段或源/目标为空的行被静默跳过。
pub fn parse_dictionary_text(text: &str) -> TermDictionary {
    let mut dictionary = TermDictionary::new();
    let mut skipped = 0usize;

    for row in split_rows(text).skip(1) {
        if row.is_empty() {
            continue;
        }

        let fields = parse_row(row);
        if fields.len() < 2 || !dictionary.insert(&fields[0], &fields[1]) {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!("词典解析跳过 {} 个无效行", skipped);
    }

    dictionary
}

/// 加载术语词典
///
/// 取得失败或结果为空均视为加载失败，由调用方决定如何处理。
pub async fn load_dictionary(session: &Session, resource: &str) -> LocalizerResult<TermDictionary> {
    let text = session
        .fetch_text(resource)
        .await
        .map_err(|e| LocalizerError::DictionaryLoad(e.to_string()))?;

    let dictionary = parse_dictionary_text(&text);
    if dictionary.is_empty() {
        return Err(LocalizerError::DictionaryLoad(format!(
            "{} 中没有有效的术语",
            resource
        )));
    }

    tracing::info!("已加载 {} 个术语: {}", dictionary.len(), resource);
    Ok(dictionary)
}
