//! 搜索执行器
//!
//! 持有 SearchProvider、PageFetcher 与 BackoffPolicy：
//! - run_once：调用一次后端，保留前 max_results 条，按排名顺序逐条抓取全文（不并发）
//! - search：run_once 遇到可重试失败时，按策略随机等待后再试一次；仍失败则降级为空结果。
//!   确定性失败（非限流的 4xx、响应无法解析）不重试，同样降级为空结果；只有配置类失败返回 Err

use std::sync::Arc;

use crate::core::{BackoffPolicy, ResearchError, RetryDecision, RetryState};
use crate::fetch::PageFetcher;
use crate::search::{SearchProvider, SearchRequest, SearchResponse, SearchResult};

pub struct SearchExecutor {
    provider: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    backoff: BackoffPolicy,
}

impl SearchExecutor {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            provider,
            fetcher,
            backoff,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// 单次尝试：不重试，后端错误原样返回
    pub async fn run_once(&self, request: &SearchRequest) -> Result<SearchResponse, ResearchError> {
        request.validate()?;

        let hits = self
            .provider
            .search(request.query.trim(), request.max_results)
            .await?;

        let mut results = Vec::with_capacity(hits.len().min(request.max_results));
        for hit in hits.into_iter().take(request.max_results) {
            let body = match (&hit.url, request.full_page) {
                (Some(url), true) => self.fetcher.fetch(url).await,
                _ => None,
            };
            results.push(SearchResult::from_hit(hit, body));
        }
        Ok(results)
    }

    /// 带退避的搜索：至多一轮随机退避；凭据 / 参数 / 配置类错误直接返回 Err
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ResearchError> {
        let provider = self.provider.name().to_string();
        tracing::info!(
            provider = %provider,
            query = %request.query,
            max_results = request.max_results,
            full_page = request.full_page,
            "search started"
        );

        let mut state = RetryState::default();
        let mut rng = self.backoff.rng();
        loop {
            let err = match self.run_once(request).await {
                Ok(results) => {
                    let with_body = results.iter().filter(|r| r.body.is_some()).count();
                    tracing::info!(
                        provider = %provider,
                        results = results.len(),
                        with_body,
                        retries = state.attempt,
                        "search finished"
                    );
                    return Ok(results);
                }
                Err(err) => err,
            };

            match self.backoff.decide(&err, &mut state, &mut rng) {
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        provider = %provider,
                        error = %err,
                        kind = ?err.kind(),
                        attempt = state.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "search failed, backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        provider = %provider,
                        error = %err,
                        kind = ?err.kind(),
                        retries = state.attempt,
                        "search failed, returning empty results"
                    );
                    return Ok(Vec::new());
                }
                RetryDecision::Fail => {
                    tracing::error!(provider = %provider, error = %err, "search failed");
                    return Err(err);
                }
            }
        }
    }
}
