//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args) 在超时内调用 registry.execute，
//! 超时转为 ToolTimeout；每次调用输出结构化审计日志（JSON）。
//! respond() 面向上层 Agent：失败时只返回礼貌提示，不暴露原始错误。

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::ResearchError;
use crate::tools::{Tool, ToolRegistry};

/// 工具执行器：对每次调用施加超时并记录审计日志
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；超时返回 ToolTimeout，工具错误原样返回；输出 JSON 审计日志
    pub async fn execute(
        &self,
        tool_name: &str,
        args: serde_json::Value,
    ) -> Result<String, ResearchError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, self.registry.execute(tool_name, args)).await;

        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(_)) => "error",
            Err(_) => "timeout",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": outcome == "ok",
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        match result {
            Ok(inner) => inner,
            Err(_) => Err(ResearchError::ToolTimeout(tool_name.to_string())),
        }
    }

    /// 执行并总是返回可直接交给用户的文本：成功为工具输出，失败为礼貌提示
    pub async fn respond(&self, tool_name: &str, args: serde_json::Value) -> String {
        match self.execute(tool_name, args).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(tool = %tool_name, error = %err, kind = ?err.kind(), "tool failed");
                let capability = self
                    .registry
                    .get(tool_name)
                    .map(|t| t.capability().to_string())
                    .unwrap_or_else(|| tool_name.to_string());
                err.user_notice(&capability)
            }
        }
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        async fn execute(&self, _args: Value) -> Result<String, ResearchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("late".to_string())
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn capability(&self) -> &str {
            "document reading"
        }

        async fn execute(&self, _args: Value) -> Result<String, ResearchError> {
            Err(ResearchError::Http {
                provider: "upstream".to_string(),
                status: 418,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool);
        let executor = ToolExecutor::new(registry, 5);
        let err = executor.execute("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ResearchError::ToolTimeout(name) if name == "slow"));
    }

    #[tokio::test]
    async fn test_respond_turns_error_into_notice() {
        let mut registry = ToolRegistry::new();
        registry.register(BrokenTool);
        let executor = ToolExecutor::new(registry, 5);
        let text = executor.respond("broken", json!({})).await;
        assert!(text.contains("document reading"));
        assert!(!text.contains("418"));
        assert!(!text.contains("upstream"));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = json!({ "query": "x".repeat(500) });
        let preview = args_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 203);
    }
}
