//! 검색 모듈 - SearXNG JSON API 클라이언트
//!
//! 질의를 로컬 검색 서비스에 보내고, 점수순 정렬 + PDF 제외 + 상한 적용한
//! URL 목록을 돌려줍니다. 검색 실패는 치명적 오류입니다.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::WebAiError;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과 한 건
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub score: f64,
}

/// 응답 JSON의 결과 항목 (`score`는 없거나 null일 수 있음)
#[derive(Debug, Deserialize)]
struct RawResult {
    url: String,
    #[serde(default)]
    score: Option<f64>,
}

impl From<RawResult> for SearchResult {
    fn from(raw: RawResult) -> Self {
        Self {
            url: raw.url,
            score: raw.score.unwrap_or(0.0),
        }
    }
}

/// 검색 서비스 응답 본문
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

// ============================================================================
// SearchClient
// ============================================================================

/// SearXNG 검색 클라이언트
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl SearchClient {
    /// 새 클라이언트 생성
    pub fn new(endpoint: impl Into<String>, max_results: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("webai/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_results,
        })
    }

    /// 질의 검색 후 상위 URL 반환
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        tracing::debug!("Searching {} for {:?}", self.endpoint, query);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebAiError::SearchStatus { status }.into());
        }

        let body: SearchResponse = response.json().await.map_err(WebAiError::SearchDecode)?;

        tracing::debug!("Search returned {} results", body.results.len());

        let results = body.results.into_iter().map(SearchResult::from).collect();

        Ok(rank_urls(results, self.max_results))
    }

    /// 연결 실패만 "서비스 미실행"으로 분류
    fn classify_send_error(&self, error: reqwest::Error) -> anyhow::Error {
        if error.is_connect() {
            let host = url::Url::parse(&self.endpoint)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_else(|| self.endpoint.clone());
            WebAiError::SearchUnreachable { host, source: error }.into()
        } else {
            anyhow::Error::new(error).context("검색 요청 실패")
        }
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// 점수 내림차순 정렬, PDF 제외, 상한 적용
///
/// 동점은 서비스가 준 순서를 유지합니다.
pub fn rank_urls(mut results: Vec<SearchResult>, max_results: usize) -> Vec<String> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    results
        .into_iter()
        .filter(|r| !is_pdf_url(&r.url))
        .take(max_results)
        .map(|r| r.url)
        .collect()
}

/// URL이 `.pdf`로 끝나는지 (쿼리스트링/프래그먼트 제외한 경로 포함)
pub fn is_pdf_url(raw: &str) -> bool {
    if raw.to_ascii_lowercase().ends_with(".pdf") {
        return true;
    }

    url::Url::parse(raw)
        .map(|u| u.path().to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
