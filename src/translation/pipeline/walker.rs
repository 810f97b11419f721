//! 文档遍历器 / 变更监视器
//!
//! 保证文档中现有的以及之后出现的每个文本节点都恰好按需交给改写器处理：
//!
//! - **初始遍历**：深度优先，只访问文本节点，跳过直接容器为不渲染元素的文本
//! - **增量处理**：对每批变更记录收集受影响的文本节点（新插入的子树完整遍历），
//!   去重后每个节点处理一次
//! - **节点缓存**：已处理且文本未变化的节点被跳过；缓存只持有弱引用

use std::collections::{HashMap, HashSet};
use std::ops::AddAssign;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node, NodeData};

use crate::parsers::html::dom::{get_node_name, get_parent_node, is_attached, set_text, text_of};
use crate::translation::config::constants;
use crate::translation::rewriter::RewriteOutcome;

/// 宿主观察到的结构变更
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 子节点列表变化
    ChildList {
        added: Vec<Handle>,
        removed: Vec<Handle>,
    },
    /// 文本内容变化
    CharacterData { target: Handle },
}

impl MutationRecord {
    pub fn added(nodes: Vec<Handle>) -> Self {
        MutationRecord::ChildList {
            added: nodes,
            removed: Vec::new(),
        }
    }

    pub fn character_data(target: Handle) -> Self {
        MutationRecord::CharacterData { target }
    }
}

/// 片段处理器，由引擎实现（改写 + 统计）
pub trait TextProcessor {
    fn process(&mut self, fragment: &str) -> RewriteOutcome;
}

impl<F> TextProcessor for F
where
    F: FnMut(&str) -> RewriteOutcome,
{
    fn process(&mut self, fragment: &str) -> RewriteOutcome {
        self(fragment)
    }
}

/// 一次遍历的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkReport {
    pub visited: usize,
    pub rewritten: usize,
    pub unchanged_cached: usize,
    pub unmatched: usize,
    pub skipped_containers: usize,
    pub detached: usize,
}

impl AddAssign for WalkReport {
    fn add_assign(&mut self, other: Self) {
        self.visited += other.visited;
        self.rewritten += other.rewritten;
        self.unchanged_cached += other.unchanged_cached;
        self.unmatched += other.unmatched;
        self.skipped_containers += other.skipped_containers;
        self.detached += other.detached;
    }
}

struct NodeRecord {
    node: Weak<Node>,
    last_text: String,
}

/// 节点处理记录，以节点地址为键、弱引用为值，不延长节点寿命
#[derive(Default)]
pub struct NodeCache {
    records: HashMap<usize, NodeRecord>,
}

impl NodeCache {
    fn key(node: &Handle) -> usize {
        Rc::as_ptr(node) as usize
    }

    /// 节点已处理且文本与上次一致
    pub fn is_current(&self, node: &Handle, text: &str) -> bool {
        match self.records.get(&Self::key(node)) {
            Some(record) => {
                record
                    .node
                    .upgrade()
                    .is_some_and(|cached| Rc::ptr_eq(&cached, node))
                    && record.last_text == text
            }
            None => false,
        }
    }

    pub fn remember(&mut self, node: &Handle, text: String) {
        self.records.insert(
            Self::key(node),
            NodeRecord {
                node: Rc::downgrade(node),
                last_text: text,
            },
        );
    }

    pub fn forget(&mut self, node: &Handle) {
        self.records.remove(&Self::key(node));
    }

    /// 清除已被释放的节点，返回清除数量
    pub fn prune(&mut self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, record| record.node.strong_count() > 0);
        before - self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 文档遍历器
pub struct TreeWalker {
    skip_elements: HashSet<String>,
    cache: NodeCache,
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new(constants::SKIP_ELEMENTS.iter().map(|s| s.to_string()))
    }
}

impl TreeWalker {
    pub fn new<I: IntoIterator<Item = String>>(skip_elements: I) -> Self {
        Self {
            skip_elements: skip_elements
                .into_iter()
                .map(|tag| tag.to_lowercase())
                .collect(),
            cache: NodeCache::default(),
        }
    }

    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// 导航后丢弃全部节点记录
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// 初始遍历
    pub fn process_tree<P: TextProcessor>(&mut self, root: &Handle, processor: &mut P) -> WalkReport {
        let mut report = WalkReport::default();
        let mut nodes = Vec::new();
        collect_text_nodes(root, &mut nodes);

        for node in &nodes {
            self.process_text_node(node, processor, &mut report);
        }

        self.cache.prune();
        report
    }

    /// 处理一批变更记录
    pub fn process_mutations<P: TextProcessor>(
        &mut self,
        root: &Handle,
        records: &[MutationRecord],
        processor: &mut P,
    ) -> WalkReport {
        let mut report = WalkReport::default();
        let mut pending = PendingNodes::default();

        for record in records {
            match record {
                MutationRecord::ChildList { added, removed } => {
                    for node in removed {
                        let mut gone = Vec::new();
                        collect_text_nodes(node, &mut gone);
                        for text_node in &gone {
                            self.cache.forget(text_node);
                        }
                    }
                    for node in added {
                        let mut found = Vec::new();
                        collect_text_nodes(node, &mut found);
                        pending.extend(found);
                    }
                }
                MutationRecord::CharacterData { target } => {
                    if matches!(target.data, NodeData::Text { .. }) {
                        pending.push(target.clone());
                    }
                }
            }
        }

        for node in pending.into_nodes() {
            if !is_attached(&node, root) {
                report.detached += 1;
                continue;
            }
            self.process_text_node(&node, processor, &mut report);
        }

        let pruned = self.cache.prune();
        if pruned > 0 {
            tracing::debug!("节点缓存清除 {} 条失效记录", pruned);
        }
        report
    }

    fn process_text_node<P: TextProcessor>(
        &mut self,
        node: &Handle,
        processor: &mut P,
        report: &mut WalkReport,
    ) {
        if self.in_skipped_container(node) {
            report.skipped_containers += 1;
            return;
        }

        let Some(text) = text_of(node) else {
            return;
        };
        report.visited += 1;

        if self.cache.is_current(node, &text) {
            report.unchanged_cached += 1;
            return;
        }

        match processor.process(&text) {
            RewriteOutcome::Rewritten(rewrite) => {
                set_text(node, &rewrite.text);
                self.cache.remember(node, rewrite.text);
                report.rewritten += 1;
            }
            RewriteOutcome::Unmatched => {
                self.cache.remember(node, text);
                report.unmatched += 1;
            }
            RewriteOutcome::Skipped => {
                self.cache.remember(node, text);
            }
        }
    }

    fn in_skipped_container(&self, node: &Handle) -> bool {
        get_parent_node(node)
            .as_ref()
            .and_then(|parent| get_node_name(parent).map(str::to_lowercase))
            .is_some_and(|tag| self.skip_elements.contains(&tag))
    }
}

/// 保持遍历顺序的去重集合
#[derive(Default)]
struct PendingNodes {
    seen: HashSet<usize>,
    nodes: Vec<Handle>,
}

impl PendingNodes {
    fn push(&mut self, node: Handle) {
        if self.seen.insert(Rc::as_ptr(&node) as usize) {
            self.nodes.push(node);
        }
    }

    fn extend(&mut self, nodes: Vec<Handle>) {
        for node in nodes {
            self.push(node);
        }
    }

    fn into_nodes(self) -> Vec<Handle> {
        self.nodes
    }
}

/// 深度优先收集文本节点（含节点自身）
fn collect_text_nodes(node: &Handle, out: &mut Vec<Handle>) {
    if let NodeData::Text { .. } = node.data {
        out.push(node.clone());
        return;
    }

    for child in node.children.borrow().iter() {
        collect_text_nodes(child, out);
    }
}
