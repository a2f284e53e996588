//! DuckDuckGo HTML 搜索后端（无需凭据）
//!
//! 请求 html.duckduckgo.com 的无脚本版本并用 scraper 解析结果块；
//! 无凭据可言，所以 202 / 400 / 403 / 418 / 429 这些拦截页都视为限流。跳转链接（/l/?uddg=...）解码为真实目标地址。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SearchSection;
use crate::core::ResearchError;
use crate::search::{RawHit, SearchProvider};

const PROVIDER: &str = "duckduckgo";

pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
    region: String,
}

impl DuckDuckGoProvider {
    pub fn new(settings: &SearchSection, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: settings.duckduckgo_endpoint.clone(),
            region: settings.locale.region.clone(),
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, ResearchError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("q", query), ("kl", self.region.as_str())],
        )
        .map_err(|e| ResearchError::Config(format!("invalid duckduckgo endpoint: {e}")))?;

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(PROVIDER, e))?;

        let status = resp.status().as_u16();
        if is_throttle_status(status) {
            return Err(ResearchError::RateLimited(PROVIDER.to_string()));
        }
        if !resp.status().is_success() {
            return Err(ResearchError::from_status(PROVIDER, status));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| ResearchError::from_reqwest(PROVIDER, e))?;

        let mut hits = parse_results(&html)?;
        hits.truncate(max_results);
        Ok(hits)
    }
}

/// DuckDuckGo 的反爬 / 限流响应：202 带验证页面，其余为直接拒绝
fn is_throttle_status(status: u16) -> bool {
    matches!(status, 202 | 400 | 403 | 418 | 429)
}

fn selector(css: &str) -> Result<Selector, ResearchError> {
    Selector::parse(css).map_err(|e| ResearchError::Malformed {
        provider: PROVIDER.to_string(),
        detail: format!("bad selector {css}: {e}"),
    })
}

fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 将结果链接归一化：补全协议，解码 DuckDuckGo 跳转参数 uddg
pub fn normalize_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if is_redirect {
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    Some(absolute)
}

/// 解析结果页；没有结果块时返回空列表而不是错误
pub fn parse_results(html: &str) -> Result<Vec<RawHit>, ResearchError> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for block in document.select(&result_sel) {
        if block.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(link) = block.select(&title_sel).next() else {
            continue;
        };
        let url = link.value().attr("href").and_then(normalize_href);
        let title = element_text(link);
        let snippet = block.select(&snippet_sel).next().and_then(element_text);
        if title.is_none() && url.is_none() {
            continue;
        }
        hits.push(RawHit {
            title,
            url,
            snippet,
        });
    }
    Ok(hits)
}
