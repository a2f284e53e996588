//! 工具层错误类型与失败分类
//!
//! 与 BackoffPolicy 配合：根据 FailureKind 决定退避重试（Transient）、降级为空结果（Fatal）或立即失败（Configuration）。

use thiserror::Error;

/// 外部能力调用中可能出现的错误（凭据、参数、限流、网络、响应格式、工具等）
#[derive(Error, Debug)]
pub enum ResearchError {
    /// 缺少凭据（字段为环境变量名）
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{provider} rejected the credential (HTTP {status})")]
    Unauthorized { provider: String, status: u16 },

    #[error("{0} is rate limiting requests")]
    RateLimited(String),

    #[error("{provider} responded with HTTP {status}")]
    Http { provider: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response from {provider}: {detail}")]
    Malformed { provider: String, detail: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),
}

/// 失败类别：调用方据此分支，而不是捕获泛化错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 限流、网络抖动、5xx：可退避后重试一次
    Transient,
    /// 凭据缺失 / 无效、配置或参数错误：重试无意义
    Configuration,
    /// 其它确定性失败（4xx、响应格式错误、未知工具）
    Fatal,
}

impl ResearchError {
    /// 按 HTTP 状态码归类（provider 为日志与提示中使用的名称）
    pub fn from_status(provider: &str, status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized {
                provider: provider.to_string(),
                status,
            },
            429 => Self::RateLimited(provider.to_string()),
            _ => Self::Http {
                provider: provider.to_string(),
                status,
            },
        }
    }

    /// 将 reqwest 传输错误归类；带状态码的错误交给 from_status
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(provider, status.as_u16());
        }
        if err.is_decode() {
            return Self::Malformed {
                provider: provider.to_string(),
                detail: err.to_string(),
            };
        }
        Self::Network(format!("{provider}: {err}"))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited(_) | Self::Network(_) | Self::ToolTimeout(_) => FailureKind::Transient,
            Self::Http { status, .. } if *status >= 500 => FailureKind::Transient,
            Self::MissingCredential(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Unauthorized { .. } => FailureKind::Configuration,
            Self::Http { .. } | Self::Malformed { .. } | Self::UnknownTool(_) => FailureKind::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// 面向终端用户的礼貌提示：只说明能力暂不可用，不暴露原始错误文本
    pub fn user_notice(&self, capability: &str) -> String {
        match self.kind() {
            FailureKind::Transient => format!(
                "Sorry, {capability} is temporarily unavailable right now. Please try again in a little while."
            ),
            FailureKind::Configuration => format!(
                "Sorry, I'm unable to use {capability} at the moment because it isn't set up correctly."
            ),
            FailureKind::Fatal => format!(
                "Sorry, I wasn't able to get a usable answer from {capability} this time."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ResearchError::from_status("duckduckgo", 429),
            ResearchError::RateLimited(_)
        ));
        assert!(matches!(
            ResearchError::from_status("serpapi", 401),
            ResearchError::Unauthorized { status: 401, .. }
        ));
        assert_eq!(
            ResearchError::from_status("serpapi", 503).kind(),
            FailureKind::Transient
        );
        assert_eq!(
            ResearchError::from_status("serpapi", 404).kind(),
            FailureKind::Fatal
        );
    }

    #[test]
    fn test_credential_errors_are_configuration() {
        let err = ResearchError::MissingCredential("MISTRAL_API_KEY");
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert!(!err.is_transient());
        assert!(err.to_string().contains("MISTRAL_API_KEY"));
    }

    #[test]
    fn test_user_notice_hides_raw_error() {
        let err = ResearchError::Network("connection reset by peer at 10.0.0.1".to_string());
        let notice = err.user_notice("web search");
        assert!(notice.contains("web search"));
        assert!(!notice.contains("10.0.0.1"));
        assert!(!notice.contains("reset"));
    }
}
