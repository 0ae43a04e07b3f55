//! CLI 모듈
//!
//! webai 명령줄 정의와 질의 파이프라인 실행
//! (검색 → 수집 → 본문 추출 → 길이 제한 → 생성 스트리밍)

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::config::Config;
use crate::corpus::truncate_texts;
use crate::error::WebAiError;
use crate::generator::{build_prompt, stream_answer, AnswerGenerator, AnswerSummary, OllamaGenerator};
use crate::progress::Spinner;
use crate::scraper::{FetchEvent, WebScraper};
use crate::search::SearchClient;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "webai")]
#[command(version, about = "웹 검색 결과로 로컬 LLM에 질문하기", long_about = None)]
pub struct Cli {
    /// 질문 (여러 단어는 공백으로 연결)
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,

    /// SearXNG 엔드포인트 [env: WEBAI_SEARCH_URL]
    #[arg(long)]
    pub search_url: Option<String>,

    /// Ollama 서버 주소 [env: WEBAI_OLLAMA_URL, OLLAMA_HOST]
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// 모델 [env: WEBAI_MODEL]
    #[arg(short, long)]
    pub model: Option<String>,

    /// 사용할 검색 결과 수
    #[arg(long)]
    pub max_results: Option<usize>,

    /// 출처 본문 전체 토큰 예산
    #[arg(long)]
    pub token_budget: Option<usize>,

    /// 생성 컨텍스트 크기 (num_ctx)
    #[arg(long)]
    pub num_ctx: Option<u32>,

    /// 동시 페이지 요청 수 (1 = 순차)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// 페이지 요청 타임아웃 (초)
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// 디버그 로그 출력
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 질문 문자열 (비어 있으면 오류)
    pub fn query_text(&self) -> Result<String, WebAiError> {
        let query = self.query.join(" ");
        if query.trim().is_empty() {
            return Err(WebAiError::EmptyQuery);
        }
        Ok(query)
    }

    /// 환경변수 설정에 CLI 옵션 덮어쓰기
    pub fn config(&self) -> Config {
        self.apply(Config::from_env())
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(ref url) = self.search_url {
            config.search_url = url.clone();
        }
        if let Some(ref url) = self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(n) = self.max_results {
            config.max_results = n;
        }
        if let Some(n) = self.token_budget {
            config.token_budget = n;
        }
        if let Some(n) = self.num_ctx {
            config.num_ctx = n;
        }
        if let Some(n) = self.concurrency {
            config.fetch_concurrency = n;
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        config
    }
}

// ============================================================================
// CLI Runner
// ============================================================================

/// 파이프라인 실행 결과
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// 검색에서 얻은 URL 수
    pub urls: usize,
    /// 본문 추출에 성공한 출처 수
    pub sources: usize,
    /// 생성 결과 (출처가 없으면 `None`)
    pub answer: Option<AnswerSummary>,
}

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    // 빈 질의는 네트워크 호출 전에 거부
    let query = cli.query_text()?;

    let config = cli.config();
    config.validate()?;

    let generator = OllamaGenerator::new(&config.ollama_url, config.model.clone(), config.num_ctx)
        .context("생성 클라이언트 초기화 실패")?;

    let mut stdout = std::io::stdout();
    let report = answer_query(&query, &config, &generator, true, &mut stdout).await?;

    tracing::debug!(
        "Run finished: {} urls, {} sources, answer: {:?}",
        report.urls,
        report.sources,
        report.answer
    );

    Ok(())
}

/// 질의 하나에 대한 전체 파이프라인
///
/// 진행 상황과 답변은 `out`으로, 스피너는 `show_spinner`일 때 stdout으로 그립니다.
pub async fn answer_query<W: Write>(
    query: &str,
    config: &Config,
    generator: &dyn AnswerGenerator,
    show_spinner: bool,
    out: &mut W,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    // 1. 검색
    let search = SearchClient::new(config.search_url.clone(), config.max_results)?;
    let spinner = if show_spinner {
        Spinner::start("Searching on Web...")
    } else {
        Spinner::hidden("Searching on Web...")
    };
    let urls = search.search(query).await?;
    spinner.finish("Done! Searching complete.");

    report.urls = urls.len();
    if urls.is_empty() {
        writeln!(out, "{} No search results for \"{}\".", "[!]".yellow(), query)?;
        return Ok(report);
    }

    // 2. 수집 + 본문 추출
    let scraper = WebScraper::new(config.fetch_timeout, config.fetch_concurrency)?;
    let mut write_error = None;
    let scraped = scraper
        .scrape_all(&urls, |event| {
            let line = match event {
                FetchEvent::Fetched { url, chars } => {
                    format!("{} Fetching {} ({} chars)", "[OK]".green(), url, chars)
                }
                FetchEvent::Failed { url, error } => {
                    format!("{} Failed to fetch {}: {:#}", "[!]".red(), url, error)
                }
            };
            if let Err(e) = writeln!(out, "{}", line) {
                write_error.get_or_insert(e);
            }
        })
        .await;
    if let Some(e) = write_error {
        return Err(e).context("출력 실패");
    }

    report.sources = scraped.len();
    if scraped.is_empty() {
        writeln!(
            out,
            "{} No readable sources; skipping answer generation.",
            "[!]".yellow()
        )?;
        return Ok(report);
    }

    // 3. 길이 제한
    let texts = truncate_texts(
        scraped.iter().map(|s| s.to_source_block()).collect(),
        config.token_budget,
    );

    // 4. 생성 스트리밍
    writeln!(out, "Invoking ollama ({})...", generator.name())?;
    out.flush()?;

    let prompt = build_prompt(query, &texts);
    let stream = generator.generate(&prompt).await?;
    report.answer = Some(stream_answer(stream, out).await?);

    Ok(report)
}

/// 치명적 오류 출력 (빨간색 + 필요 시 사용법)
pub fn print_error(error: &anyhow::Error) {
    eprintln!("{}", format!("Error: {:#}", error).red());

    if let Some(e) = error.downcast_ref::<WebAiError>() {
        if e.wants_usage() {
            eprintln!("Usage: webai <query>");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid args")
    }

    #[test]
    fn test_query_joined_with_spaces() {
        let cli = parse(&["webai", "weather", "in", "Paris"]);
        assert_eq!(cli.query_text().expect("query"), "weather in Paris");
    }

    #[test]
    fn test_empty_query_rejected() {
        let cli = parse(&["webai"]);
        assert!(matches!(cli.query_text(), Err(WebAiError::EmptyQuery)));

        let cli = parse(&["webai", " "]);
        assert!(matches!(cli.query_text(), Err(WebAiError::EmptyQuery)));
    }

    #[test]
    fn test_options_before_query() {
        let cli = parse(&["webai", "--model", "llama3", "-c", "3", "what", "is", "rust"]);
        assert_eq!(cli.query_text().expect("query"), "what is rust");
        let config = cli.apply(Config::default());
        assert_eq!(config.model, "llama3");
        assert_eq!(config.fetch_concurrency, 3);
        assert_eq!(config.max_results, 5);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = parse(&[
            "webai",
            "--search-url",
            "http://searx.local:8080",
            "--token-budget",
            "1000",
            "--fetch-timeout",
            "5",
            "q",
        ]);
        let config = cli.apply(Config::default());
        assert_eq!(config.search_url, "http://searx.local:8080");
        assert_eq!(config.token_budget, 1000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_empty_query_makes_no_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;

        let mut cli = parse(&["webai"]);
        cli.search_url = Some(server.url());

        let err = run(cli).await.expect_err("empty query");
        assert!(matches!(
            err.downcast_ref::<WebAiError>(),
            Some(WebAiError::EmptyQuery)
        ));
        mock.assert_async().await;
    }
}
