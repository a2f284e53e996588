//! 全文抓取：GET 页面并转为 Markdown 风格文本
//!
//! 不做域名或协议预检；任何失败（网络、超时、非 2xx、读取失败）都返回 None，由调用方降级为“无正文”。
//! 对 HTML 响应使用 html2text 渲染（保留标题、列表、链接），失败时回退为去标签文本。
//! 本层不重试。

use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use reqwest::Client;

use crate::config::FetchSection;

/// 全文抓取 trait：按 URL 取正文，失败返回 None
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// 基于 reqwest 的抓取实现；超时与最大字符数由配置决定
pub struct HttpPageFetcher {
    client: Client,
    max_page_chars: usize,
    render_width: usize,
}

/// 简易去除 HTML 标签（html2text 失败时的回退）
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 判断内容是否像 HTML
pub fn looks_like_html(s: &str) -> bool {
    let s = s.trim_start();
    let head: String = s.chars().take(15).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
        || (s.len() > 20 && s.contains('<') && (s.contains("</") || s.contains("<meta") || s.contains("<head") || s.contains("<title")))
}

/// HTML 转 Markdown 风格文本（去除 script/style 与布局标记）
pub fn html_to_markdown(html: &str, width: usize) -> String {
    match from_read(html.as_bytes(), width.max(20)) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => strip_html_tags(html),
    }
}

/// 超过上限时截断并追加 ...[truncated]；max_chars 为 0 表示不限
pub fn truncate_chars(body: String, max_chars: usize) -> String {
    if max_chars == 0 || body.chars().count() <= max_chars {
        return body;
    }
    body.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
}

impl HttpPageFetcher {
    pub fn new(settings: &FetchSection) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_page_chars: settings.max_page_chars,
            render_width: settings.render_width,
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let mut body = resp
            .text()
            .await
            .map_err(|e| format!("Read body: {}", e))?;

        // 去除 BOM，避免 HTML 检测失败
        if let Some(stripped) = body.strip_prefix('\u{FEFF}') {
            body = stripped.to_string();
        }

        let body = if looks_like_html(&body) {
            html_to_markdown(&body, self.render_width)
        } else {
            body
        };

        Ok(truncate_chars(body, self.max_page_chars))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "page fetch failed, body unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_markdown_keeps_structure() {
        let html = r#"<html><head><title>t</title><style>body{color:red}</style></head>
<body><h1>Deepseek R1</h1><ul><li>first</li><li>second</li></ul>
<p>See <a href="https://arxiv.org/abs/2501.12948">the paper</a>.</p></body></html>"#;
        let text = html_to_markdown(html, 120);
        assert!(text.contains("# Deepseek R1"));
        assert!(text.contains("first"));
        assert!(text.contains("second"));
        assert!(text.contains("https://arxiv.org/abs/2501.12948"));
        assert!(!text.contains("color:red"));
        assert!(!text.contains("<h1>"));
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(looks_like_html("  <html lang=\"en\"><body>x</body></html>"));
        assert!(!looks_like_html("plain text body"));
        assert!(!looks_like_html("{\"json\": true}"));
    }

    #[test]
    fn test_strip_html_tags_collapses_whitespace() {
        assert_eq!(strip_html_tags("<p>a\n\n  b</p> <br/>c"), "a b c");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef".to_string(), 0), "abcdef");
        assert_eq!(truncate_chars("abc".to_string(), 3), "abc");
        assert_eq!(truncate_chars("abcdef".to_string(), 3), "abc\n...[truncated]");
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_none() {
        let fetcher = HttpPageFetcher::new(&FetchSection {
            timeout_secs: 2,
            ..FetchSection::default()
        });
        // 端口 1 在本机通常无人监听，连接立即被拒绝
        assert!(fetcher.fetch("http://127.0.0.1:1/").await.is_none());
        assert!(fetcher.fetch("not a url").await.is_none());
    }
}
