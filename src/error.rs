//! 치명적 오류 타입
//!
//! 프로세스를 종료시키는 오류만 여기에 정의합니다.
//! 개별 URL 수집 실패는 오류가 아니라 건너뛰기 대상입니다.

use thiserror::Error;

/// 파이프라인 중단 오류 (종료 코드 1)
#[derive(Debug, Error)]
pub enum WebAiError {
    /// 빈 질의
    #[error("Query cannot be empty.")]
    EmptyQuery,

    /// 검색 서비스 연결 실패
    #[error("Failed to connect to the service. Is {host} running?")]
    SearchUnreachable {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    /// 검색 서비스가 2xx 이외의 상태 반환
    #[error("Search service returned HTTP {status}")]
    SearchStatus { status: reqwest::StatusCode },

    /// 검색 결과 JSON 파싱 실패
    #[error("Failed to parse search results: {0}")]
    SearchDecode(#[source] reqwest::Error),
}

impl WebAiError {
    /// 사용법 안내가 필요한 오류인지
    pub fn wants_usage(&self) -> bool {
        matches!(self, Self::EmptyQuery)
    }
}
