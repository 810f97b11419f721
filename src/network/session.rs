use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::translation::error::{LocalizerError, LocalizerResult};

const DEFAULT_USER_AGENT: &str = concat!("admin-localizer/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 资源位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Remote(Url),
    Local(PathBuf),
}

impl Resource {
    /// 解析资源标识：http(s) URL、file URL 或本地路径
    pub fn parse(identifier: &str) -> LocalizerResult<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(LocalizerError::ConfigError("资源标识不能为空".to_string()));
        }

        match Url::parse(identifier) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                Ok(Resource::Remote(url))
            }
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Resource::Local)
                .map_err(|_| LocalizerError::ConfigError(format!("无效的文件URL: {}", url))),
            // Windows 盘符会被当作 scheme
            Ok(url) if url.scheme().len() > 1 => Err(LocalizerError::ConfigError(format!(
                "不支持的协议: {}",
                url.scheme()
            ))),
            _ => Ok(Resource::Local(PathBuf::from(
                shellexpand::tilde(identifier).into_owned(),
            ))),
        }
    }
}

/// 资源获取会话
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    pub fn new() -> LocalizerResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    /// 读取文本资源，不做任何重试
    pub async fn fetch_text(&self, identifier: &str) -> LocalizerResult<String> {
        match Resource::parse(identifier)? {
            Resource::Remote(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| LocalizerError::from(e).with_context(&url))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LocalizerError::NetworkError(format!(
                        "{} 返回状态码 {}",
                        url, status
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| LocalizerError::from(e).with_context(&url))
            }
            Resource::Local(path) => tokio::fs::read_to_string(&path).await.map_err(|e| {
                LocalizerError::NetworkError(format!("读取 {} 失败: {}", path.display(), e))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_parsing() {
        assert!(matches!(
            Resource::parse("https://example.com/terms.csv").unwrap(),
            Resource::Remote(_)
        ));
        assert_eq!(
            Resource::parse("terms.csv").unwrap(),
            Resource::Local(PathBuf::from("terms.csv"))
        );
        assert_eq!(
            Resource::parse("file:///tmp/terms.csv").unwrap(),
            Resource::Local(PathBuf::from("/tmp/terms.csv"))
        );
        assert!(Resource::parse("ftp://example.com/terms.csv").is_err());
        assert!(Resource::parse("  ").is_err());
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.csv");
        std::fs::write(&path, "en,ja\nSave,保存\n").unwrap();

        let session = Session::new().unwrap();
        let text = session.fetch_text(path.to_str().unwrap()).await.unwrap();
        assert!(text.contains("保存"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_fails() {
        let session = Session::new().unwrap();
        let error = session
            .fetch_text("/nonexistent/admin-localizer/terms.csv")
            .await
            .unwrap_err();
        assert!(matches!(error, LocalizerError::NetworkError(_)));
    }
}
