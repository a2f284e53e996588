//! Google 搜索后端（经 SerpApi）
//!
//! 构造时必须提供 SERPAPI_API_KEY；区域参数（location / hl / gl / google_domain）来自 [search.locale]。
//! 响应无法解析或没有 organic_results 时返回空列表。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{SearchSection, SERPAPI_KEY_VAR};
use crate::core::ResearchError;
use crate::search::{RawHit, SearchProvider};

const PROVIDER: &str = "serpapi";

pub struct SerpApiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    location: String,
    language: String,
    country: String,
    google_domain: String,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

impl SerpApiProvider {
    /// 缺少 api_key 时立即失败，不创建客户端
    pub fn new(settings: &SearchSection, api_key: Option<&str>) -> Result<Self, ResearchError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ResearchError::MissingCredential(SERPAPI_KEY_VAR))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();

        let locale = &settings.locale;
        Ok(Self {
            client,
            endpoint: settings.serpapi_endpoint.clone(),
            api_key: api_key.to_string(),
            location: locale.location.clone(),
            language: locale.language.clone(),
            country: locale.country.clone(),
            google_domain: locale.google_domain.clone(),
        })
    }
}

/// 解析 SerpApi JSON；格式不对时按空结果处理
pub fn parse_organic_results(body: &str) -> Vec<RawHit> {
    match serde_json::from_str::<SerpApiResponse>(body) {
        Ok(resp) => resp
            .organic_results
            .into_iter()
            .map(|r| RawHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(provider = PROVIDER, error = %e, "malformed search response, treating as empty");
            Vec::new()
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, ResearchError> {
        let num = max_results.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("num", num.as_str()),
                ("location", self.location.as_str()),
                ("hl", self.language.as_str()),
                ("gl", self.country.as_str()),
                ("google_domain", self.google_domain.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResearchError::from_status(PROVIDER, status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ResearchError::from_reqwest(PROVIDER, e))?;

        let mut hits = parse_organic_results(&body);
        hits.truncate(max_results);
        Ok(hits)
    }
}
