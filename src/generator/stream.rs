//! 스트리밍 응답 디코딩 - 줄 단위 JSON (NDJSON)
//!
//! 네트워크 조각은 줄 경계와 맞지 않으므로 완성된 줄만 파싱합니다.

use anyhow::{Context, Result};
use serde::Deserialize;

/// 생성 응답 조각
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateChunk {
    /// 응답 텍스트 조각
    #[serde(default)]
    pub response: String,
    /// 마지막 조각 여부
    #[serde(default)]
    pub done: bool,
}

/// 스트림 중간에 오는 오류 줄 (`{"error": "..."}`)
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    chunk: GenerateChunk,
}

/// 바이트 조각 → `GenerateChunk` 디코더
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    buffer: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 바이트를 추가하고 완성된 줄을 모두 디코딩
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(chunk) = decode_line(&line)? {
                chunks.push(chunk);
            }
        }

        Ok(chunks)
    }

    /// 스트림 종료 시 남은 (줄바꿈 없는) 줄 처리
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }
}

fn decode_line(line: &[u8]) -> Result<Option<GenerateChunk>> {
    let text = std::str::from_utf8(line).context("스트림 줄이 UTF-8이 아님")?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let parsed: StreamLine =
        serde_json::from_str(text).with_context(|| format!("스트림 줄 파싱 실패: {}", text))?;

    if let Some(error) = parsed.error {
        anyhow::bail!("generation endpoint error: {}", error);
    }

    Ok(Some(parsed.chunk))
}
