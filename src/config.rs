//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SCOUT__*` 覆盖（双下划线表示嵌套，如 `SCOUT__SEARCH__MAX_RESULTS=5`）。
//! 凭据单独由 [`Credentials::from_env`] 读取（支持 `.env`），不写入配置文件。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::ResearchError;

/// 浏览器 UA，避免被站点识别为爬虫
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const SERPAPI_KEY_VAR: &str = "SERPAPI_API_KEY";
pub const MISTRAL_KEY_VAR: &str = "MISTRAL_API_KEY";

/// 单次退避等待的上限（秒）
pub const MAX_BACKOFF_DELAY_SECS: f64 = 3600.0;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchSection,
    pub fetch: FetchSection,
    pub backoff: BackoffSection,
    pub ocr: OcrSection,
    pub tools: ToolsSection,
}

/// 搜索后端
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    DuckDuckGo,
    SerpApi,
}

/// [search] 段：默认后端、结果数、是否抓取全文、区域参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub provider: ProviderKind,
    pub max_results: usize,
    /// 工具参数 max_results 的上限；全文抓取逐条串行，过大会超出工具超时
    pub max_results_cap: usize,
    pub full_page: bool,
    pub timeout_secs: u64,
    pub duckduckgo_endpoint: String,
    pub serpapi_endpoint: String,
    pub locale: LocaleSection,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            provider: ProviderKind::DuckDuckGo,
            max_results: 3,
            max_results_cap: 10,
            full_page: true,
            timeout_secs: 15,
            duckduckgo_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            serpapi_endpoint: "https://serpapi.com/search.json".to_string(),
            locale: LocaleSection::default(),
        }
    }
}

/// [search.locale] 段：DuckDuckGo 用 region，Google(SerpApi) 用其余字段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocaleSection {
    /// DuckDuckGo kl 参数，wt-wt 表示不限区域
    pub region: String,
    pub location: String,
    /// hl
    pub language: String,
    /// gl
    pub country: String,
    pub google_domain: String,
}

impl Default for LocaleSection {
    fn default() -> Self {
        Self {
            region: "wt-wt".to_string(),
            location: "Melbourne, Australia".to_string(),
            language: "en".to_string(),
            country: "au".to_string(),
            google_domain: "google.com.au".to_string(),
        }
    }
}

/// [fetch] 段：全文抓取的超时、最大字符数（0 表示不截断）、渲染宽度、UA
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub max_page_chars: usize,
    pub render_width: usize,
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_page_chars: 20_000,
            render_width: 120,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// [backoff] 段：搜索限流后的随机退避
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffSection {
    pub max_retries: u32,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub seed: Option<u64>,
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            max_retries: 1,
            min_delay_secs: 10.0,
            max_delay_secs: 30.0,
            seed: None,
        }
    }
}

/// [ocr] 段：Mistral OCR 端点、模型与是否返回内嵌图片
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    pub base_url: String,
    pub model: String,
    pub include_image_base64: bool,
    pub timeout_secs: u64,
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.mistral.ai".to_string(),
            model: "mistral-ocr-latest".to_string(),
            include_image_base64: true,
            timeout_secs: 120,
        }
    }
}

/// [tools] 段：单次工具调用超时（秒），需覆盖一次退避等待
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 180,
        }
    }
}

impl AppConfig {
    /// 启动时做一次校验，之后各适配器不再重复检查
    pub fn validate(&self) -> Result<(), ResearchError> {
        if self.search.max_results == 0 {
            return Err(ResearchError::Config(
                "search.max_results must be positive".to_string(),
            ));
        }
        if self.search.max_results > self.search.max_results_cap {
            return Err(ResearchError::Config(format!(
                "search.max_results ({}) exceeds search.max_results_cap ({})",
                self.search.max_results, self.search.max_results_cap
            )));
        }
        if self.search.duckduckgo_endpoint.trim().is_empty()
            || self.search.serpapi_endpoint.trim().is_empty()
        {
            return Err(ResearchError::Config(
                "search endpoints must not be empty".to_string(),
            ));
        }
        if self.ocr.base_url.trim().is_empty() || self.ocr.model.trim().is_empty() {
            return Err(ResearchError::Config(
                "ocr.base_url and ocr.model must not be empty".to_string(),
            ));
        }
        let b = &self.backoff;
        if !(b.min_delay_secs.is_finite() && b.max_delay_secs.is_finite())
            || b.min_delay_secs < 0.0
            || b.max_delay_secs < 0.0
        {
            return Err(ResearchError::Config(
                "backoff delays must be non-negative".to_string(),
            ));
        }
        if b.max_delay_secs > MAX_BACKOFF_DELAY_SECS {
            return Err(ResearchError::Config(format!(
                "backoff delays must not exceed {MAX_BACKOFF_DELAY_SECS} seconds"
            )));
        }
        if b.min_delay_secs > b.max_delay_secs {
            return Err(ResearchError::Config(format!(
                "backoff.min_delay_secs ({}) exceeds backoff.max_delay_secs ({})",
                b.min_delay_secs, b.max_delay_secs
            )));
        }
        Ok(())
    }
}

/// 外部能力凭据；缺失时由各适配器在构造时报错
#[derive(Clone, Default)]
pub struct Credentials {
    pub serpapi_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("serpapi_api_key", &self.serpapi_api_key.as_ref().map(|_| "***"))
            .field("mistral_api_key", &self.mistral_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    /// 先加载 .env（若存在），再读环境变量；空字符串视为未设置
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            serpapi_api_key: non_empty_var(SERPAPI_KEY_VAR),
            mistral_api_key: non_empty_var(MISTRAL_KEY_VAR),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 从 config 目录加载配置，环境变量 SCOUT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SCOUT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SCOUT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.search.max_results, 3);
        assert!(cfg.search.full_page);
        assert_eq!(cfg.backoff.max_retries, 1);
        assert_eq!(cfg.ocr.model, "mistral-ocr-latest");
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let mut cfg = AppConfig::default();
        cfg.backoff.min_delay_secs = 40.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_results() {
        let mut cfg = AppConfig::default();
        cfg.search.max_results = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_results_above_cap() {
        let mut cfg = AppConfig::default();
        cfg.search.max_results = cfg.search.max_results_cap + 1;
        assert!(matches!(cfg.validate(), Err(ResearchError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_huge_backoff_delay() {
        let mut cfg = AppConfig::default();
        cfg.backoff.max_delay_secs = 1e20;
        assert!(matches!(cfg.validate(), Err(ResearchError::Config(_))));

        cfg.backoff.min_delay_secs = 1e20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[search]
provider = "serpapi"
max_results = 5

[search.locale]
country = "us"

[backoff]
min_delay_secs = 1.0
max_delay_secs = 2.0
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.search.provider, ProviderKind::SerpApi);
        assert_eq!(cfg.search.max_results, 5);
        assert_eq!(cfg.search.locale.country, "us");
        assert_eq!(cfg.search.locale.language, "en");
        assert_eq!(cfg.backoff.max_delay_secs, 2.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            serpapi_api_key: Some("secret-serp".to_string()),
            mistral_api_key: None,
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("secret-serp"));
        assert!(shown.contains("***"));
    }
}
