//! 搜索数据模型：请求、原始命中、归一化结果

use serde::{Deserialize, Serialize};

use crate::core::ResearchError;

/// 一次搜索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    /// 是否抓取每条结果的全文
    pub full_page: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 3,
            full_page: true,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_full_page(mut self, full_page: bool) -> Self {
        self.full_page = full_page;
        self
    }

    /// 空查询或 max_results 为 0 时在发起任何网络请求前拒绝
    pub fn validate(&self) -> Result<(), ResearchError> {
        if self.query.trim().is_empty() {
            return Err(ResearchError::InvalidArgument(
                "query must not be empty".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(ResearchError::InvalidArgument(
                "max_results must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 后端返回的原始命中（尚未抓取全文）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

/// 归一化的单条结果；没有 url 就一定没有 body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub body: Option<String>,
}

impl SearchResult {
    pub fn from_hit(hit: RawHit, body: Option<String>) -> Self {
        let body = if hit.url.is_some() { body } else { None };
        Self {
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
            body,
        }
    }
}

/// 按后端排名排序的结果序列，不去重
pub type SearchResponse = Vec<SearchResult>;

/// 工具输出的外层结构：{"results": [...]}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub results: SearchResponse,
}
