// 集成测试公共模块
//
// 提供测试用的词典、页面以及 DOM 辅助函数

use std::path::{Path, PathBuf};

use admin_localizer::parsers::html::dom::{find_nodes, html_to_dom, text_of};
use admin_localizer::translation::TermDictionary;
use markup5ever_rcdom::{Handle, RcDom};

/// 测试词典（含表头、带引号的字段与无效行）
pub const DICTIONARY_CSV: &str = "\
source,target\r
Save,保存\r
Save Draft,下書き保存\r
Publish,公開\r
\"Settings, General\",一般設定\r
Members,\r
,空\r
\r
Workspace\r
Sites,サイト\r
";

/// 模拟的管理界面页面
pub const ADMIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Dashboard</title><style>.Save { color: red }</style></head>
<body>
  <nav><a href="/sites">Sites</a><a href="/settings">Settings, General</a></nav>
  <main>
    <button id="draft">Save Draft</button>
    <button id="save">  Save  </button>
    <p>Publish changes</p>
    <p>公開済み</p>
    <script>var label = "Save";</script>
    <textarea>Save</textarea>
  </main>
</body>
</html>"#;

pub const ADMIN_URL: &str = "https://webflow.com/dashboard";

pub fn dictionary() -> TermDictionary {
    admin_localizer::translation::parse_dictionary_text(DICTIONARY_CSV)
}

/// 把测试词典写入目录，返回文件路径
pub fn write_dictionary(dir: &Path) -> PathBuf {
    let path = dir.join("translation_terms.csv");
    std::fs::write(&path, DICTIONARY_CSV).expect("写入测试词典失败");
    path
}

pub fn parse(html: &str) -> RcDom {
    html_to_dom(html.as_bytes(), "utf-8").expect("解析测试页面失败")
}

/// 指定元素的第一个子文本节点
pub fn first_text(root: &Handle, tag: &str) -> Handle {
    find_nodes(root, tag)
        .into_iter()
        .filter_map(|node| node.children.borrow().first().cloned())
        .next()
        .expect("元素没有子节点")
}

/// 指定元素下所有直接子文本的内容
pub fn texts(root: &Handle, tag: &str) -> Vec<String> {
    find_nodes(root, tag)
        .iter()
        .flat_map(|node| {
            node.children
                .borrow()
                .iter()
                .filter_map(text_of)
                .collect::<Vec<_>>()
        })
        .collect()
}
