//! 文档 OCR 适配器（Mistral OCR）
//!
//! 输入公开可访问的文档 URL，返回按页序拼接的 Markdown 文本（页间以空行分隔）。
//! 构造时必须提供 MISTRAL_API_KEY，缺失即报配置错误、不发起任何请求；远端失败直接上抛，本层不重试。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::{OcrSection, MISTRAL_KEY_VAR};
use crate::core::ResearchError;

const PROVIDER: &str = "mistral-ocr";

/// 页间分隔符
pub const PAGE_SEPARATOR: &str = "\n\n";

/// OCR trait：文档 URL -> 拼接后的全文
#[async_trait]
pub trait DocumentOcr: Send + Sync {
    async fn extract_text(&self, document_url: &str) -> Result<String, ResearchError>;
}

pub struct MistralOcr {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    include_image_base64: bool,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    markdown: String,
}

impl MistralOcr {
    pub fn new(settings: &OcrSection, api_key: Option<&str>) -> Result<Self, ResearchError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ResearchError::MissingCredential(MISTRAL_KEY_VAR))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();

        Ok(Self {
            client,
            endpoint: format!("{}/v1/ocr", settings.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            include_image_base64: settings.include_image_base64,
        })
    }
}

/// 按 index 排序（缺失 index 的页保持原位次）后用空行拼接
fn join_pages(mut pages: Vec<OcrPage>) -> String {
    pages.sort_by_key(|p| p.index.unwrap_or(usize::MAX));
    pages
        .into_iter()
        .map(|p| p.markdown)
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

#[async_trait]
impl DocumentOcr for MistralOcr {
    async fn extract_text(&self, document_url: &str) -> Result<String, ResearchError> {
        let document_url = document_url.trim();
        if document_url.is_empty() {
            return Err(ResearchError::InvalidArgument(
                "document_url must not be empty".to_string(),
            ));
        }
        tracing::info!(url = %document_url, model = %self.model, "ocr started");

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "document": {
                    "type": "document_url",
                    "document_url": document_url,
                },
                "include_image_base64": self.include_image_base64,
            }))
            .send()
            .await
            .map_err(|e| ResearchError::from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResearchError::from_status(PROVIDER, status.as_u16()));
        }

        let body: OcrResponse = resp
            .json()
            .await
            .map_err(|e| ResearchError::Malformed {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            })?;

        let pages = body.pages.len();
        let text = join_pages(body.pages);
        tracing::info!(url = %document_url, pages, chars = text.len(), "ocr finished");
        Ok(text)
    }
}
