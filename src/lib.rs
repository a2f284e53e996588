//! Scout - 研究助手工具层
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）与凭据
//! - **core**: 错误分类、退避策略
//! - **fetch**: 全文抓取与 HTML 转 Markdown
//! - **search**: 搜索后端（DuckDuckGo / SerpApi）与带退避的执行器
//! - **ocr**: 文档 OCR（Mistral）
//! - **tools**: 工具注册表与执行器（供上层 Agent 调用）
//! - **observability**: 日志初始化

pub mod config;
pub mod core;
pub mod fetch;
pub mod observability;
pub mod ocr;
pub mod search;
pub mod tools;

pub use crate::core::{BackoffPolicy, FailureKind, ResearchError};
pub use search::{SearchExecutor, SearchRequest, SearchResponse, SearchResult};
