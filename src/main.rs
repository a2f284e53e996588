//! Scout 命令行
//!
//! 入口：初始化日志、加载并校验配置、读取凭据，然后执行 search / ocr / tools 子命令。
//! 结果以 JSON 输出到 stdout；失败时只在 stderr 打印礼貌提示并以非零码退出。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use scout::config::{load_config, Credentials, ProviderKind};
use scout::ocr::{DocumentOcr, MistralOcr};
use scout::search::{SearchEnvelope, SearchRequest};
use scout::tools::{build_registry, create_search_executor};
use scout::{observability, ResearchError};

#[derive(Parser)]
#[command(name = "scout", version, about = "Web search, page fetch and document OCR for research agents")]
struct Cli {
    /// 额外的 TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 搜索并（默认）抓取每条结果的全文
    Search {
        query: String,
        #[arg(long)]
        max_results: Option<usize>,
        /// 只返回标题 / 链接 / 摘要
        #[arg(long)]
        no_full_page: bool,
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
    },
    /// 对公开可访问的文档做 OCR
    Ocr { document_url: String },
    /// 列出可用工具及其参数 schema
    Tools,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Duckduckgo,
    Serpapi,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Duckduckgo => ProviderKind::DuckDuckGo,
            ProviderArg::Serpapi => ProviderKind::SerpApi,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    observability::init();
    let cli = Cli::parse();

    let cfg = load_config(cli.config.clone()).context("Failed to load configuration")?;
    cfg.validate().context("Invalid configuration")?;
    let credentials = Credentials::from_env();

    let outcome: Result<String, (String, ResearchError)> = match cli.command {
        Command::Search {
            query,
            max_results,
            no_full_page,
            provider,
        } => {
            let kind = provider.map(ProviderKind::from).unwrap_or(cfg.search.provider);
            let request = SearchRequest::new(query)
                .with_max_results(max_results.unwrap_or(cfg.search.max_results))
                .with_full_page(cfg.search.full_page && !no_full_page);
            let result = match create_search_executor(kind, &cfg, &credentials) {
                Ok(executor) => executor.search(&request).await,
                Err(e) => Err(e),
            };
            result
                .map(|results| pretty(&SearchEnvelope { results }))
                .map_err(|e| ("web search".to_string(), e))
        }
        Command::Ocr { document_url } => {
            let ocr = MistralOcr::new(&cfg.ocr, credentials.mistral_api_key.as_deref());
            let result = match ocr {
                Ok(ocr) => ocr.extract_text(&document_url).await,
                Err(e) => Err(e),
            };
            result
                .map(|text| pretty(&json!({ "ocr_text": text })))
                .map_err(|e| ("document reading".to_string(), e))
        }
        Command::Tools => {
            let registry = build_registry(&cfg, &credentials);
            Ok(registry.to_schema_json())
        }
    };

    match outcome {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err((capability, err)) => {
            tracing::error!(error = %err, kind = ?err.kind(), "command failed");
            eprintln!("{}", err.user_notice(&capability));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
