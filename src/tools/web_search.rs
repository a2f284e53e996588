//! Web 搜索工具：把 SearchExecutor 暴露为 JSON 参数的工具
//!
//! 参数：{"query": "...", "max_results": 3, "full_page": true}；输出 {"results": [...]}。
//! 同一实现按后端注册为 duckduckgo_search 或 google_search。

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::ResearchError;
use crate::search::{SearchEnvelope, SearchExecutor, SearchRequest};
use crate::tools::Tool;

pub struct WebSearchTool {
    name: String,
    description: String,
    executor: SearchExecutor,
    default_max_results: usize,
    max_results_cap: usize,
    default_full_page: bool,
}

impl WebSearchTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        executor: SearchExecutor,
        default_max_results: usize,
        default_full_page: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            executor,
            default_max_results,
            max_results_cap: default_max_results,
            default_full_page,
        }
    }

    /// 参数 max_results 超过上限时截断（上限不低于默认值）
    pub fn with_max_results_cap(mut self, cap: usize) -> Self {
        self.max_results_cap = cap.max(self.default_max_results);
        self
    }

    /// 从 JSON 参数构造请求；缺省字段取配置默认值
    pub fn parse_request(&self, args: &Value) -> Result<SearchRequest, ResearchError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if query.is_empty() {
            return Err(ResearchError::InvalidArgument("Missing query".to_string()));
        }
        let max_results = match args.get("max_results") {
            None | Some(Value::Null) => self.default_max_results,
            Some(v) => v.as_u64().map(|n| n as usize).ok_or_else(|| {
                ResearchError::InvalidArgument("max_results must be a positive integer".to_string())
            })?,
        };
        if max_results > self.max_results_cap {
            tracing::debug!(
                tool = %self.name,
                requested = max_results,
                cap = self.max_results_cap,
                "max_results clamped"
            );
        }
        let max_results = max_results.min(self.max_results_cap);
        let full_page = args
            .get("full_page")
            .and_then(|v| v.as_bool())
            .unwrap_or(self.default_full_page);

        let request = SearchRequest::new(query)
            .with_max_results(max_results)
            .with_full_page(full_page);
        request.validate()?;
        Ok(request)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn capability(&self) -> &str {
        "web search"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Free-text search query"},
                "max_results": {"type": "integer", "minimum": 1, "maximum": self.max_results_cap,
                    "default": self.default_max_results},
                "full_page": {"type": "boolean", "default": self.default_full_page,
                    "description": "Fetch each result page and convert it to markdown"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ResearchError> {
        let request = self.parse_request(&args)?;
        let results = self.executor.search(&request).await?;
        serde_json::to_string(&SearchEnvelope { results }).map_err(|e| ResearchError::Malformed {
            provider: self.executor.provider_name().to_string(),
            detail: e.to_string(),
        })
    }
}
