//! 搜索后端抽象
//!
//! DuckDuckGo 与 SerpApi(Google) 都实现 SearchProvider；调用方只依赖 trait，切换后端无需改动。

use async_trait::async_trait;

use crate::core::ResearchError;
use crate::search::RawHit;

/// 搜索后端 trait：按排名返回至多 max_results 条原始命中
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 后端名称（日志与用户提示中使用）
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>, ResearchError>;
}
