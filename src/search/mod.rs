//! 搜索层：数据模型、后端抽象（DuckDuckGo / SerpApi）与带退避的执行器

pub mod duckduckgo;
pub mod executor;
pub mod provider;
pub mod serpapi;
pub mod types;

pub use duckduckgo::DuckDuckGoProvider;
pub use executor::SearchExecutor;
pub use provider::SearchProvider;
pub use serpapi::SerpApiProvider;
pub use types::{RawHit, SearchEnvelope, SearchRequest, SearchResponse, SearchResult};
