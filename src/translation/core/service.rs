//! 本地化服务事件循环
//!
//! 宿主（浏览器桥接层或测试）通过通道投递变更记录与导航通知，服务在单个任务中
//! 依次处理，同时驱动两个定时器：
//!
//! - **统计写入**：第一次变更后经过防抖窗口写入一次
//! - **重新遍历**：导航进入新的管理页面后，等待页面稳定再完整遍历
//!
//! 所有状态都由同一个任务持有，事件之间不会交错执行。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use admin_localizer::translation::core::{HostEvent, LocalizerService};
//! # use admin_localizer::translation::core::LocalizerEngine;
//! # use admin_localizer::translation::storage::MemoryStore;
//!
//! # async fn example(engine: LocalizerEngine<MemoryStore>, document: markup5ever_rcdom::Handle) {
//! let (service, handle) = LocalizerService::new(engine, document);
//! let task = tokio::task::spawn_local(service.run());
//!
//! handle.send(HostEvent::Shutdown).ok();
//! let engine = task.await.unwrap().unwrap();
//! # }
//! ```

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use super::engine::LocalizerEngine;
use crate::translation::error::LocalizerResult;
use crate::translation::pipeline::{MutationRecord, NavigationEvent};
use crate::translation::storage::KeyValueStore;

/// 宿主投递的事件
#[derive(Debug)]
pub enum HostEvent {
    /// 一批文档变更记录
    Mutations(Vec<MutationRecord>),
    /// 单页应用导航
    Navigated(NavigationEvent),
    /// 停止服务（写入未保存的统计）
    Shutdown,
}

/// 事件发送端
pub type HostHandle = mpsc::UnboundedSender<HostEvent>;

/// 本地化服务
pub struct LocalizerService<S: KeyValueStore> {
    engine: LocalizerEngine<S>,
    document: Handle,
    events: mpsc::UnboundedReceiver<HostEvent>,
}

impl<S: KeyValueStore> LocalizerService<S> {
    /// 创建服务及其事件发送端
    pub fn new(engine: LocalizerEngine<S>, document: Handle) -> (Self, HostHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                document,
                events: rx,
            },
            tx,
        )
    }

    pub fn engine(&self) -> &LocalizerEngine<S> {
        &self.engine
    }

    /// 运行事件循环直到收到停止事件或所有发送端关闭
    ///
    /// 启动时先完整遍历一次文档。返回引擎以便调用方读取最终统计。
    ///
    /// # 错误
    /// 导航URL无法解析时只记录警告；目前不会返回错误，保留 `Result` 以便
    /// 宿主统一处理。
    pub async fn run(mut self) -> LocalizerResult<LocalizerEngine<S>> {
        self.engine.localize_document(&self.document);

        loop {
            let flush_at = self.engine.flush_deadline();
            let rescan_at = self.engine.rescan_deadline();

            tokio::select! {
                biased;

                event = self.events.recv() => match event {
                    Some(HostEvent::Mutations(records)) => {
                        self.engine.handle_mutations(&self.document, &records);
                    }
                    Some(HostEvent::Navigated(event)) => {
                        if let Err(e) = self.engine.handle_navigation(&event) {
                            tracing::warn!("忽略导航事件: {}", e);
                        }
                    }
                    Some(HostEvent::Shutdown) | None => break,
                },

                _ = wait_until(rescan_at) => {
                    self.engine.run_due_rescan(Instant::now(), &self.document);
                }

                _ = wait_until(flush_at) => {
                    self.engine.flush_if_due(Instant::now()).await;
                }
            }
        }

        self.engine.flush_stats().await;
        tracing::info!(
            "本地化服务停止: 共替换 {} 个文本节点",
            self.engine.totals().rewritten
        );
        Ok(self.engine)
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{append_child, create_element, create_text, find_nodes, html_to_dom, text_of};
    use crate::translation::config::LocalizerConfig;
    use crate::translation::dictionary::TermDictionary;
    use crate::translation::storage::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    async fn engine(store: Arc<MemoryStore>) -> LocalizerEngine<Arc<MemoryStore>> {
        let dictionary: TermDictionary = [("Save", "保存")].into_iter().collect();
        LocalizerEngine::with_dictionary(LocalizerConfig::default(), dictionary, store)
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_mutations_is_written_once() {
        let store = Arc::new(MemoryStore::new());
        let dom = html_to_dom(b"<html><body></body></html>", "utf-8").unwrap();
        let body = find_nodes(&dom.document, "body").remove(0);
        let (service, handle) = LocalizerService::new(engine(store.clone()).await, dom.document.clone());

        let local = tokio::task::LocalSet::new();
        let engine = local
            .run_until(async move {
                let task = tokio::task::spawn_local(service.run());

                for _ in 0..5 {
                    let button = create_element("button");
                    append_child(&button, &create_text("Save"));
                    append_child(&body, &button);
                    handle.send(HostEvent::Mutations(vec![MutationRecord::added(vec![button])])).unwrap();
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }

                tokio::time::sleep(Duration::from_millis(1500)).await;
                assert_eq!(store.write_count(), 1);

                handle.send(HostEvent::Shutdown).unwrap();
                task.await.unwrap().unwrap()
            })
            .await;

        assert_eq!(engine.statistics().match_count("Save"), 5);
        assert_eq!(engine.aggregator().flush_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_statistics() {
        let store = Arc::new(MemoryStore::new());
        let dom = html_to_dom(b"<html><body><p>Save</p></body></html>", "utf-8").unwrap();
        let (service, handle) = LocalizerService::new(engine(store.clone()).await, dom.document.clone());

        handle.send(HostEvent::Shutdown).unwrap();
        let engine = service.run().await.unwrap();

        assert_eq!(engine.statistics().match_count("Save"), 1);
        assert_eq!(store.write_count(), 1);
        let paragraph = find_nodes(&dom.document, "p").remove(0);
        assert_eq!(text_of(&paragraph.children.borrow()[0]).as_deref(), Some("保存"));
    }

    #[tokio::test]
    async fn test_closed_channel_stops_service() {
        let store = Arc::new(MemoryStore::new());
        let dom = html_to_dom(b"<html><body></body></html>", "utf-8").unwrap();
        let (service, handle) = LocalizerService::new(engine(store.clone()).await, dom.document.clone());

        drop(handle);
        let engine = service.run().await.unwrap();
        assert!(engine.statistics().is_empty());
        assert_eq!(store.write_count(), 0);
    }
}
