//! webai - 웹 검색 기반 로컬 LLM 질의응답
//!
//! SearXNG로 검색하고, 상위 페이지의 본문을 readability 방식으로 추출한 뒤,
//! Ollama 모델이 그 본문만으로 답하도록 스트리밍합니다.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generator;
pub mod progress;
pub mod scraper;
pub mod search;

// Re-exports
pub use self::config::Config;
pub use self::corpus::{per_item_allowance, truncate_texts, CHARS_PER_TOKEN};
pub use self::error::WebAiError;
pub use self::generator::{
    build_prompt, stream_answer, AnswerGenerator, AnswerSummary, FragmentStream, GenerateChunk,
    OllamaGenerator,
};
pub use self::progress::Spinner;
pub use self::scraper::{FetchEvent, ScrapedContent, WebScraper};
pub use self::search::{rank_urls, SearchClient, SearchResult};
