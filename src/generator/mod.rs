//! 답변 생성 모듈 - Ollama 스트리밍 생성
//!
//! 질의와 출처 본문으로 프롬프트를 만들고, 생성 엔드포인트의 응답 조각을
//! 도착 순서대로 즉시 출력합니다. 완료는 `done` 플래그로만 판단합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let generator = OllamaGenerator::new("http://localhost:11434", "tinyllama", 16000)?;
//! let stream = generator.generate(&build_prompt(query, &texts)).await?;
//! stream_answer(stream, &mut std::io::stdout()).await?;
//! ```

pub mod stream;

use std::collections::VecDeque;
use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;

pub use self::stream::{ChunkDecoder, GenerateChunk};

/// 응답 조각 스트림 (한 번만 소비)
pub type FragmentStream = BoxStream<'static, Result<GenerateChunk>>;

// ============================================================================
// AnswerGenerator Trait
// ============================================================================

/// 생성 백엔드 트레이트
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// 프롬프트를 보내고 응답 조각 스트림을 반환
    async fn generate(&self, prompt: &str) -> Result<FragmentStream>;

    /// 백엔드 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Prompt
// ============================================================================

/// 프롬프트 구성
///
/// 각 텍스트는 이미 `Source: <url>` 머리말을 달고 있어야 합니다.
pub fn build_prompt(query: &str, texts: &[String]) -> String {
    format!(
        "{}. Summarize the information and provide an answer.\n\
         Use only the information in the following articles to answer the question: {}",
        query,
        texts.join("\n\n")
    )
}

// ============================================================================
// Ollama
// ============================================================================

/// `/api/generate` 요청 본문
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_ctx: u32,
}

/// Ollama 생성 클라이언트
#[derive(Debug)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    num_ctx: u32,
}

impl OllamaGenerator {
    /// 새 생성 클라이언트
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소 (예: `http://localhost:11434`)
    /// * `model` - 모델 식별자
    /// * `num_ctx` - 생성 컨텍스트 크기
    pub fn new(base_url: &str, model: impl Into<String>, num_ctx: u32) -> Result<Self> {
        let endpoint = url::Url::parse(base_url)
            .and_then(|u| u.join("/api/generate"))
            .with_context(|| format!("잘못된 Ollama URL: {}", base_url))?;

        // 생성은 오래 걸릴 수 있으므로 타임아웃 없음
        let client = reqwest::Client::builder()
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.into(),
            num_ctx,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<FragmentStream> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            options: GenerateOptions {
                num_ctx: self.num_ctx,
            },
        };

        tracing::debug!(
            "POST {} (model: {}, prompt: {} chars)",
            self.endpoint,
            self.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("생성 요청 실패")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error ({}): {}", status, body);
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(anyhow::Error::from))
            .boxed();

        Ok(decode_fragments(bytes))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// 디코딩 상태
struct DecodeState {
    bytes: BoxStream<'static, Result<Vec<u8>>>,
    decoder: ChunkDecoder,
    pending: VecDeque<GenerateChunk>,
    exhausted: bool,
}

/// 바이트 스트림 → 응답 조각 스트림
pub fn decode_fragments(bytes: BoxStream<'static, Result<Vec<u8>>>) -> FragmentStream {
    let state = DecodeState {
        bytes,
        decoder: ChunkDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.exhausted {
                return None;
            }

            let decoded = match state.bytes.next().await {
                Some(Ok(bytes)) => state.decoder.push(&bytes),
                Some(Err(e)) => Err(e.context("생성 스트림 읽기 실패")),
                None => {
                    state.exhausted = true;
                    state.decoder.finish().map(|last| last.into_iter().collect())
                }
            };

            match decoded {
                Ok(chunks) => state.pending.extend(chunks),
                Err(e) => {
                    state.exhausted = true;
                    state.pending.clear();
                    return Some((Err(e), state));
                }
            }
        }
    })
    .boxed()
}

// ============================================================================
// Consumer
// ============================================================================

/// 스트림 소비 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSummary {
    /// 받은 조각 수 (완료 조각 제외)
    pub fragments: usize,
    /// 출력한 문자 수
    pub chars: usize,
}

/// 응답 조각을 받는 즉시 출력
///
/// `done: true` 조각에서 멈추며, 그 전에 스트림이 끝나면 오류입니다.
pub async fn stream_answer<W: Write>(mut stream: FragmentStream, out: &mut W) -> Result<AnswerSummary> {
    let mut summary = AnswerSummary::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.done {
            writeln!(out).context("출력 실패")?;
            out.flush().context("출력 실패")?;
            tracing::debug!("Generation complete ({} fragments)", summary.fragments);
            return Ok(summary);
        }

        out.write_all(chunk.response.as_bytes())
            .context("출력 실패")?;
        out.flush().context("출력 실패")?;

        summary.fragments += 1;
        summary.chars += chunk.response.chars().count();
    }

    anyhow::bail!("생성 스트림이 완료 신호 없이 종료됨")
}

// ============================================================================
// Tests
// ============================================================================
