//! 웹 스크래퍼 모듈 - URL 본문 추출
//!
//! 페이지를 받아 readability 방식으로 본문만 남깁니다.
//! 개별 URL 실패는 건너뛰고 나머지를 계속 처리합니다.

pub mod readability;

use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};

use self::readability::Readability;

/// 스크랩된 콘텐츠
#[derive(Debug, Clone)]
pub struct ScrapedContent {
    /// 페이지 제목
    pub title: Option<String>,
    /// 본문 텍스트 (HTML 태그 제거됨)
    pub content: String,
    /// 원본 URL
    pub url: String,
}

impl ScrapedContent {
    /// 프롬프트에 들어갈 출처 블록
    pub fn to_source_block(&self) -> String {
        format!("Source: {}\n{}", self.url, self.content)
    }
}

/// URL별 처리 결과 알림
#[derive(Debug)]
pub enum FetchEvent<'a> {
    /// 본문 추출 성공
    Fetched { url: &'a str, chars: usize },
    /// 요청 또는 추출 실패 (건너뜀)
    Failed {
        url: &'a str,
        error: &'a anyhow::Error,
    },
}

/// 웹 스크래퍼
pub struct WebScraper {
    client: reqwest::Client,
    readability: Readability,
    concurrency: usize,
}

impl WebScraper {
    /// 새 스크래퍼 생성
    pub fn new(timeout: Duration, concurrency: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("webai/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self {
            client,
            readability: Readability::new().context("readability 초기화 실패")?,
            concurrency: concurrency.max(1),
        })
    }

    /// URL 목록 처리 (입력 순서 유지)
    ///
    /// 실패한 URL은 `report`로 알리고 결과에서 빠집니다.
    /// `concurrency`가 1보다 크면 그만큼 동시에 요청하지만 순서는 같습니다.
    pub async fn scrape_all<F>(&self, urls: &[String], mut report: F) -> Vec<ScrapedContent>
    where
        F: FnMut(FetchEvent<'_>),
    {
        let mut pending = stream::iter(urls.iter())
            .map(|url| async move { (url, self.scrape(url).await) })
            .buffered(self.concurrency);

        let mut texts = Vec::with_capacity(urls.len());

        while let Some((url, result)) = pending.next().await {
            match result {
                Ok(content) => {
                    report(FetchEvent::Fetched {
                        url,
                        chars: content.content.chars().count(),
                    });
                    texts.push(content);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", url, e);
                    report(FetchEvent::Failed { url, error: &e });
                }
            }
        }

        texts
    }

    /// URL에서 콘텐츠 추출
    pub async fn scrape(&self, url: &str) -> Result<ScrapedContent> {
        tracing::info!("Scraping: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP 요청 실패")?
            .error_for_status()
            .context("HTTP 오류 응답")?;

        let html = response.text().await.context("응답 본문 읽기 실패")?;

        self.parse_html(url, &html)
    }

    /// HTML 문자열에서 콘텐츠 추출
    pub fn parse_html(&self, url: &str, html: &str) -> Result<ScrapedContent> {
        let document = Html::parse_document(html);

        let title = self.extract_title(&document);
        let content = self.extract_content(&document);

        if content.is_empty() {
            anyhow::bail!("본문을 찾을 수 없음");
        }

        Ok(ScrapedContent {
            title,
            content,
            url: url.to_string(),
        })
    }

    /// 제목 추출
    fn extract_title(&self, document: &Html) -> Option<String> {
        for selector_str in ["title", "h1"] {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(element) = document.select(&selector).next() {
                    let title = element.text().collect::<String>().trim().to_string();
                    if !title.is_empty() {
                        return Some(title);
                    }
                }
            }
        }

        None
    }

    /// 본문 추출 (readability 실패 시 선택자 폴백)
    fn extract_content(&self, document: &Html) -> String {
        if let Some(text) = self.readability.extract(document) {
            return text;
        }

        tracing::debug!("Readability found no candidate, falling back to selectors");

        // 우선순위: article > main > body
        let selectors = ["article", "main", "[role=main]", ".content", "#content"];

        for selector_str in selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(element) = document.select(&selector).next() {
                    let text = self.readability.render(element);
                    if text.chars().count() > 100 {
                        return text;
                    }
                }
            }
        }

        // 폴백: 전체 body 텍스트
        if let Ok(selector) = Selector::parse("body") {
            if let Some(element) = document.select(&selector).next() {
                return self.readability.render(element);
            }
        }

        String::new()
    }
}
