//! OCR 工具：参数 {"document_url": "https://..."}，输出 {"ocr_text": "..."}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::ResearchError;
use crate::ocr::DocumentOcr;
use crate::tools::Tool;

pub struct OcrTool {
    ocr: Arc<dyn DocumentOcr>,
}

impl OcrTool {
    pub fn new(ocr: Arc<dyn DocumentOcr>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl Tool for OcrTool {
    fn name(&self) -> &str {
        "mistral_ocr"
    }

    fn description(&self) -> &str {
        "Run OCR on a publicly accessible document (e.g. a PDF) and return its text as markdown. Args: {\"document_url\": \"https://...\"}."
    }

    fn capability(&self) -> &str {
        "document reading"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "document_url": {"type": "string", "description": "Public URL of the document"}
            },
            "required": ["document_url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ResearchError> {
        let url = args
            .get("document_url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim();
        if url.is_empty() {
            return Err(ResearchError::InvalidArgument("Missing document_url".to_string()));
        }
        let text = self.ocr.extract_text(url).await?;
        Ok(json!({ "ocr_text": text }).to_string())
    }
}
