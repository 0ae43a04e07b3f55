//! 설정 모듈
//!
//! 기본값 → 환경변수 → CLI 옵션 순서로 덮어씁니다.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

// ============================================================================
// Defaults
// ============================================================================

/// SearXNG 기본 엔드포인트
pub const DEFAULT_SEARCH_URL: &str = "http://localhost";

/// Ollama 기본 엔드포인트
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// 기본 모델
pub const DEFAULT_MODEL: &str = "tinyllama";

/// 검색 결과 상한
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// 본문 전체 토큰 예산
pub const DEFAULT_TOKEN_BUDGET: usize = 500;

/// 생성 컨텍스트 크기 (num_ctx)
pub const DEFAULT_NUM_CTX: u32 = 16000;

/// 페이지 요청 타임아웃 (초)
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Config
// ============================================================================

/// 실행 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 검색 서비스 URL
    pub search_url: String,
    /// 생성 엔드포인트 기본 URL
    pub ollama_url: String,
    /// 모델 식별자
    pub model: String,
    /// 검색 결과 상한
    pub max_results: usize,
    /// 토큰 예산
    pub token_budget: usize,
    /// 생성 컨텍스트 크기
    pub num_ctx: u32,
    /// 동시 페이지 요청 수 (1 = 순차)
    pub fetch_concurrency: usize,
    /// 페이지 요청 타임아웃
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            token_budget: DEFAULT_TOKEN_BUDGET,
            num_ctx: DEFAULT_NUM_CTX,
            fetch_concurrency: 1,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// 환경변수를 반영한 설정
    ///
    /// - `WEBAI_SEARCH_URL`
    /// - `WEBAI_OLLAMA_URL` > `OLLAMA_HOST`
    /// - `WEBAI_MODEL`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_value("WEBAI_SEARCH_URL") {
            tracing::debug!("Using search URL from WEBAI_SEARCH_URL");
            config.search_url = url;
        }

        if let Some(url) = env_value("WEBAI_OLLAMA_URL").or_else(|| env_value("OLLAMA_HOST")) {
            config.ollama_url = normalize_ollama_host(&url);
        }

        if let Some(model) = env_value("WEBAI_MODEL") {
            config.model = model;
        }

        config
    }

    /// 엔드포인트 URL 및 수치 검증
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.search_url)
            .with_context(|| format!("잘못된 검색 URL: {}", self.search_url))?;
        Url::parse(&self.ollama_url)
            .with_context(|| format!("잘못된 Ollama URL: {}", self.ollama_url))?;

        if self.max_results == 0 {
            anyhow::bail!("max_results는 1 이상이어야 합니다");
        }
        if self.fetch_concurrency == 0 {
            anyhow::bail!("concurrency는 1 이상이어야 합니다");
        }

        Ok(())
    }
}

/// 비어 있지 않은 환경변수 값
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `OLLAMA_HOST`는 스킴 없이 `host:port`로 설정되는 경우가 많음
fn normalize_ollama_host(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", value.trim_end_matches('/'))
    }
}

// ============================================================================
// Tests
// ============================================================================
