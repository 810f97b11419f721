//! 单页应用导航观察器
//!
//! 宿主把 history 的 push / replace 与前进后退通知转交给观察器，观察器判断是否进入了
//! 新的逻辑页面，以及新页面是否仍属于管理界面。

use regex::Regex;
use url::Url;

use crate::translation::error::{LocalizerError, LocalizerResult};

/// 导航来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// 程序化跳转（pushState）
    Push,
    /// 程序化替换（replaceState）
    Replace,
    /// 前进 / 后退（popstate）
    Pop,
}

/// 宿主投递的导航事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    /// 绝对URL，或相对于当前页面的URL
    pub url: String,
}

impl NavigationEvent {
    pub fn new(kind: NavigationKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// 导航判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationChange {
    /// 同一页面（仅片段不同或URL未变）
    Unchanged,
    /// 进入管理界面内的新页面
    Entered(Url),
    /// 离开管理界面
    Left(Url),
}

/// 导航观察器
pub struct NavigationObserver {
    current: Option<Url>,
    admin_patterns: Vec<Regex>,
}

impl NavigationObserver {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> LocalizerResult<Self> {
        let admin_patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref())
                    .map_err(|e| LocalizerError::from(e).with_context(pattern.as_ref()))
            })
            .collect::<LocalizerResult<Vec<_>>>()?;

        Ok(Self {
            current: None,
            admin_patterns,
        })
    }

    pub fn current(&self) -> Option<&Url> {
        self.current.as_ref()
    }

    /// 设置初始位置，返回是否处于管理界面
    pub fn set_location(&mut self, url: &str) -> LocalizerResult<bool> {
        let url = self.resolve(url)?;
        let admin = self.is_admin_surface(&url);
        self.current = Some(url);
        Ok(admin)
    }

    /// 当前位置是否允许本地化；位置未知时视为允许
    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .map_or(true, |url| self.is_admin_surface(url))
    }

    pub fn is_admin_surface(&self, url: &Url) -> bool {
        self.admin_patterns
            .iter()
            .any(|pattern| pattern.is_match(url.as_str()))
    }

    /// 处理一次导航通知
    pub fn observe(&mut self, event: &NavigationEvent) -> LocalizerResult<NavigationChange> {
        let next = self.resolve(&event.url)?;

        if let Some(current) = &self.current {
            if same_screen(current, &next) {
                self.current = Some(next);
                return Ok(NavigationChange::Unchanged);
            }
        }

        tracing::debug!("导航 {:?}: {}", event.kind, next);
        let admin = self.is_admin_surface(&next);
        self.current = Some(next.clone());

        if admin {
            Ok(NavigationChange::Entered(next))
        } else {
            Ok(NavigationChange::Left(next))
        }
    }

    fn resolve(&self, url: &str) -> LocalizerResult<Url> {
        let parsed = match &self.current {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|e| LocalizerError::ParseError(format!("无效的导航URL {}: {}", url, e)))
    }
}

fn same_screen(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
