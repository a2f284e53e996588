//! 工具箱：duckduckgo_search、google_search、mistral_ocr 与注册表 / 执行器
//!
//! 依赖凭据的工具只有在凭据存在时才注册；缺失时记录 warn，该能力对上层不可见。

pub mod executor;
pub mod ocr;
pub mod registry;
pub mod web_search;

use std::sync::Arc;

pub use executor::ToolExecutor;
pub use ocr::OcrTool;
pub use registry::{Tool, ToolRegistry};
pub use web_search::WebSearchTool;

use crate::config::{AppConfig, Credentials, ProviderKind};
use crate::core::{BackoffPolicy, ResearchError};
use crate::fetch::HttpPageFetcher;
use crate::ocr::MistralOcr;
use crate::search::{DuckDuckGoProvider, SearchExecutor, SearchProvider, SerpApiProvider};

/// 按后端类型构造 SearchProvider；SerpApi 缺少凭据时返回 MissingCredential
pub fn create_provider(
    kind: ProviderKind,
    cfg: &AppConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn SearchProvider>, ResearchError> {
    let provider: Arc<dyn SearchProvider> = match kind {
        ProviderKind::DuckDuckGo => Arc::new(DuckDuckGoProvider::new(
            &cfg.search,
            &cfg.fetch.user_agent,
        )),
        ProviderKind::SerpApi => Arc::new(SerpApiProvider::new(
            &cfg.search,
            credentials.serpapi_api_key.as_deref(),
        )?),
    };
    Ok(provider)
}

/// 组装带全文抓取与退避策略的搜索执行器
pub fn create_search_executor(
    kind: ProviderKind,
    cfg: &AppConfig,
    credentials: &Credentials,
) -> Result<SearchExecutor, ResearchError> {
    let provider = create_provider(kind, cfg, credentials)?;
    let fetcher = Arc::new(HttpPageFetcher::new(&cfg.fetch));
    Ok(SearchExecutor::new(
        provider,
        fetcher,
        BackoffPolicy::from(&cfg.backoff),
    ))
}

/// 根据配置与凭据构建注册表：duckduckgo_search 总是可用，其余视凭据而定
pub fn build_registry(cfg: &AppConfig, credentials: &Credentials) -> ToolRegistry {
    let mut tools = ToolRegistry::new();

    let web_search = |name: &str, description: &str, executor: SearchExecutor| {
        WebSearchTool::new(
            name,
            description,
            executor,
            cfg.search.max_results,
            cfg.search.full_page,
        )
        .with_max_results_cap(cfg.search.max_results_cap)
    };

    match create_search_executor(ProviderKind::DuckDuckGo, cfg, credentials) {
        Ok(executor) => tools.register(web_search(
            "duckduckgo_search",
            "Search the web with DuckDuckGo and optionally fetch each result page as markdown. Use sparingly to avoid rate limits. Args: {\"query\": \"...\", \"max_results\": 3, \"full_page\": true}.",
            executor,
        )),
        Err(e) => tracing::warn!(tool = "duckduckgo_search", error = %e, "tool unavailable"),
    }

    match create_search_executor(ProviderKind::SerpApi, cfg, credentials) {
        Ok(executor) => tools.register(web_search(
            "google_search",
            "Search Google (via SerpApi) and optionally fetch each result page as markdown. Args: {\"query\": \"...\", \"max_results\": 3, \"full_page\": true}.",
            executor,
        )),
        Err(e) => tracing::warn!(tool = "google_search", error = %e, "tool unavailable"),
    }

    match MistralOcr::new(&cfg.ocr, credentials.mistral_api_key.as_deref()) {
        Ok(ocr) => tools.register(OcrTool::new(Arc::new(ocr))),
        Err(e) => tracing::warn!(tool = "mistral_ocr", error = %e, "tool unavailable"),
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_without_credentials() {
        let tools = build_registry(&AppConfig::default(), &Credentials::default());
        assert_eq!(tools.tool_names(), vec!["duckduckgo_search".to_string()]);
    }

    #[test]
    fn test_registry_with_credentials() {
        let creds = Credentials {
            serpapi_api_key: Some("serp".to_string()),
            mistral_api_key: Some("mistral".to_string()),
        };
        let tools = build_registry(&AppConfig::default(), &creds);
        assert_eq!(
            tools.tool_names(),
            vec![
                "duckduckgo_search".to_string(),
                "google_search".to_string(),
                "mistral_ocr".to_string(),
            ]
        );
    }

    #[test]
    fn test_serpapi_executor_requires_key() {
        let err = create_search_executor(
            ProviderKind::SerpApi,
            &AppConfig::default(),
            &Credentials::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ResearchError::MissingCredential(_)));
    }
}
