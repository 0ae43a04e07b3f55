//! Readability 방식 본문 추출
//!
//! 문단 단위로 점수를 매겨 부모/조부모에 전파하고, 링크 밀도로 보정한 뒤
//! 최고 점수 요소(와 점수가 충분한 형제 요소)의 텍스트만 남깁니다.
//!
//! ref: https://github.com/mozilla/readability

use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// 항상 제거하는 태그
const STRIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "button", "template", "head",
];

/// 줄바꿈을 만드는 블록 태그
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section",
    "table", "td", "th", "tr", "ul",
];

/// 자식 중 이것이 없으면 div를 문단으로 취급
const DIV_TO_P_TAGS: &[&str] = &[
    "a", "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "section",
];

/// 문단으로 인정하는 최소 길이 (문자 수)
const MIN_PARAGRAPH_CHARS: usize = 25;

/// 형제 문단을 포함하는 최소 길이
const SIBLING_PARAGRAPH_CHARS: usize = 80;

/// 이보다 짧으면 class/id 제거 없이 다시 채점
const MIN_ARTICLE_CHARS: usize = 500;

// ============================================================================
// Readability
// ============================================================================

/// 본문 추출기
pub struct Readability {
    unlikely: Regex,
    maybe: Regex,
    positive: Regex,
    negative: Regex,
    anchor: Selector,
}

/// 채점 패스 옵션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// 태그 + class/id 패턴으로 제거
    StripUnlikely,
    /// 태그로만 제거
    KeepUnlikely,
}

/// 후보 요소와 누적 점수
struct Candidate<'a> {
    element: ElementRef<'a>,
    score: f64,
}

impl Readability {
    pub fn new() -> Result<Self> {
        Ok(Self {
            unlikely: Regex::new(
                r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
            )?,
            maybe: Regex::new(r"(?i)and|article|body|column|content|main|shadow")?,
            positive: Regex::new(
                r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story",
            )?,
            negative: Regex::new(
                r"(?i)hidden|^hid$|combx|comment|com-|contact|foot|footer|footnote|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
            )?,
            anchor: Selector::parse("a")
                .map_err(|e| anyhow::anyhow!("selector parse failed: {:?}", e))?,
        })
    }

    /// 본문 텍스트 추출, 점수를 받은 후보가 없으면 `None`
    ///
    /// 첫 패스 결과가 짧으면 class/id 제거 없이 다시 채점하고 더 긴 쪽을 씁니다.
    pub fn extract(&self, document: &Html) -> Option<String> {
        let first = self.extract_pass(document, Pass::StripUnlikely);
        if first
            .as_ref()
            .is_some_and(|t| t.chars().count() >= MIN_ARTICLE_CHARS)
        {
            return first;
        }

        tracing::debug!("Short or empty result, retrying without unlikely stripping");
        let second = self.extract_pass(document, Pass::KeepUnlikely);

        match (first, second) {
            (Some(a), Some(b)) if b.chars().count() > a.chars().count() => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    fn extract_pass(&self, document: &Html, pass: Pass) -> Option<String> {
        let mut candidates = Vec::new();
        self.score_tree(document.root_element(), pass, &mut candidates);

        for candidate in candidates.iter_mut() {
            candidate.score *= 1.0 - self.link_density(candidate.element, pass);
        }

        let top_index = candidates
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
            .map(|(i, _)| i)?;
        let top = candidates[top_index].element;
        let top_score = candidates[top_index].score;

        tracing::debug!(
            "Top candidate <{}> score {:.2} ({} candidates, {:?})",
            top.value().name(),
            top_score,
            candidates.len(),
            pass
        );

        let blocks = self.collect_with_siblings(top, top_score, &candidates, pass);
        let text = blocks
            .into_iter()
            .map(|el| self.render_pass(el, pass))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// 요소의 가시 텍스트 (블록 단위 줄바꿈)
    ///
    /// 태그로만 걸러내고 class/id 패턴은 보지 않습니다.
    pub fn render(&self, element: ElementRef<'_>) -> String {
        self.render_pass(element, Pass::KeepUnlikely)
    }

    fn render_pass(&self, element: ElementRef<'_>, pass: Pass) -> String {
        let mut lines = Vec::new();
        let mut current = String::new();
        self.render_into(element, pass, &mut lines, &mut current);
        flush_line(&mut lines, &mut current);
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------------

    fn score_tree<'a>(&self, element: ElementRef<'a>, pass: Pass, candidates: &mut Vec<Candidate<'a>>) {
        for child in element.children() {
            let Some(child_el) = ElementRef::wrap(child) else {
                continue;
            };
            if self.is_stripped(child_el, pass) {
                continue;
            }
            if self.is_paragraph(child_el) {
                self.score_paragraph(child_el, pass, candidates);
            }
            self.score_tree(child_el, pass, candidates);
        }
    }

    fn score_paragraph<'a>(
        &self,
        paragraph: ElementRef<'a>,
        pass: Pass,
        candidates: &mut Vec<Candidate<'a>>,
    ) {
        let text = self.visible_text(paragraph, pass);
        let length = text.chars().count();
        if length < MIN_PARAGRAPH_CHARS {
            return;
        }

        let commas = text.chars().filter(|c| matches!(c, ',' | '，')).count();
        let score = 1.0 + commas as f64 + ((length / 100) as f64).min(3.0);

        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            return;
        };
        let entry = self.candidate_entry(parent, candidates);
        candidates[entry].score += score;

        if let Some(grandparent) = parent.parent().and_then(ElementRef::wrap) {
            let entry = self.candidate_entry(grandparent, candidates);
            candidates[entry].score += score / 2.0;
        }
    }

    /// 후보 위치 반환 (없으면 초기 점수로 추가)
    fn candidate_entry<'a>(&self, element: ElementRef<'a>, candidates: &mut Vec<Candidate<'a>>) -> usize {
        if let Some(pos) = candidates.iter().position(|c| c.element == element) {
            return pos;
        }
        candidates.push(Candidate {
            element,
            score: tag_score(element.value().name()) + self.class_weight(element),
        });
        candidates.len() - 1
    }

    fn is_paragraph(&self, element: ElementRef<'_>) -> bool {
        match element.value().name() {
            "p" | "pre" | "td" => true,
            "div" => !element.children().filter_map(ElementRef::wrap).any(|c| {
                DIV_TO_P_TAGS.contains(&c.value().name())
            }),
            _ => false,
        }
    }

    fn class_weight(&self, element: ElementRef<'_>) -> f64 {
        let mut weight = 0.0;
        for attr in [element.value().attr("class"), element.value().id()]
            .into_iter()
            .flatten()
        {
            if self.negative.is_match(attr) {
                weight -= 25.0;
            }
            if self.positive.is_match(attr) {
                weight += 25.0;
            }
        }
        weight
    }

    /// 링크 텍스트 비율 (0.0 ~ 1.0)
    fn link_density(&self, element: ElementRef<'_>, pass: Pass) -> f64 {
        let total = self.visible_text(element, pass).chars().count();
        if total == 0 {
            return 0.0;
        }
        let linked: usize = element
            .select(&self.anchor)
            .map(|a| self.visible_text(a, pass).chars().count())
            .sum();
        (linked as f64 / total as f64).min(1.0)
    }

    /// 제거 대상 판정 (태그 또는 class/id 패턴)
    fn is_stripped(&self, element: ElementRef<'_>, pass: Pass) -> bool {
        let name = element.value().name();
        if STRIP_TAGS.contains(&name) {
            return true;
        }
        if pass == Pass::KeepUnlikely || matches!(name, "html" | "body" | "article" | "main") {
            return false;
        }

        let signature = format!(
            "{} {}",
            element.value().attr("class").unwrap_or(""),
            element.value().id().unwrap_or("")
        );
        self.unlikely.is_match(&signature) && !self.maybe.is_match(&signature)
    }

    // ------------------------------------------------------------------------
    // Sibling merge
    // ------------------------------------------------------------------------

    fn collect_with_siblings<'a>(
        &self,
        top: ElementRef<'a>,
        top_score: f64,
        candidates: &[Candidate<'a>],
        pass: Pass,
    ) -> Vec<ElementRef<'a>> {
        let Some(parent) = top.parent().and_then(ElementRef::wrap) else {
            return vec![top];
        };
        let threshold = (top_score * 0.2).max(10.0);

        parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| !self.is_stripped(*sibling, pass))
            .filter(|sibling| {
                if *sibling == top {
                    return true;
                }
                let scored = candidates
                    .iter()
                    .find(|c| c.element == *sibling)
                    .map(|c| c.score >= threshold)
                    .unwrap_or(false);
                scored || self.is_good_sibling_paragraph(*sibling, pass)
            })
            .collect()
    }

    fn is_good_sibling_paragraph(&self, sibling: ElementRef<'_>, pass: Pass) -> bool {
        if sibling.value().name() != "p" {
            return false;
        }
        let text = self.visible_text(sibling, pass);
        let length = text.chars().count();
        let density = self.link_density(sibling, pass);

        if length > SIBLING_PARAGRAPH_CHARS {
            density < 0.25
        } else {
            length > 0 && density == 0.0 && (text.contains(". ") || text.ends_with('.'))
        }
    }

    // ------------------------------------------------------------------------
    // Text rendering
    // ------------------------------------------------------------------------

    fn visible_text(&self, element: ElementRef<'_>, pass: Pass) -> String {
        self.render_pass(element, pass).replace('\n', " ")
    }

    /// 텍스트 노드는 그대로 이어 붙이고, 블록 경계에서만 줄을 나눔
    fn render_into(
        &self,
        element: ElementRef<'_>,
        pass: Pass,
        lines: &mut Vec<String>,
        current: &mut String,
    ) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => current.push_str(text),
                Node::Element(_) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_stripped(child_el, pass) {
                        continue;
                    }
                    let block = BLOCK_TAGS.contains(&child_el.value().name());
                    if block {
                        flush_line(lines, current);
                    }
                    self.render_into(child_el, pass, lines, current);
                    if block {
                        flush_line(lines, current);
                    }
                }
                _ => {}
            }
        }
    }
}

/// 태그별 초기 점수
fn tag_score(name: &str) -> f64 {
    match name {
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

/// 현재 줄의 공백을 정리해 확정
fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Option<String> {
        let readability = Readability::new().expect("readability");
        readability.extract(&Html::parse_document(html))
    }

    const NEWS_PAGE: &str = r#"
        <html>
          <head><title>Paris weather</title><style>body { color: red; }</style></head>
          <body>
            <nav><a href="/">Home</a> <a href="/news">News</a> <a href="/about">About us</a></nav>
            <div id="sidebar">
              <p>Subscribe to our newsletter, get deals, offers, and more in your inbox today.</p>
            </div>
            <div class="article-body">
              <h1>Rain expected in Paris</h1>
              <p>Forecasters expect rain across Paris on Tuesday, with temperatures around 14 degrees.</p>
              <p>The wet weather should clear by Thursday, bringing sunshine, light winds, and mild evenings.</p>
              <script>var tracking = "should never appear";</script>
            </div>
            <footer>Copyright 2024, all rights reserved, contact us for licensing details.</footer>
          </body>
        </html>
    "#;

    #[test]
    fn test_extracts_article_body() {
        let text = extract(NEWS_PAGE).expect("content");
        assert!(text.contains("Forecasters expect rain"));
        assert!(text.contains("wet weather should clear"));
        assert!(!text.contains("newsletter"));
        assert!(!text.contains("About us"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let text = extract(NEWS_PAGE).expect("content");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.iter().any(|l| l.starts_with("Forecasters")));
        assert!(lines.iter().any(|l| l.starts_with("The wet weather")));
        assert!(lines.iter().all(|l| l.trim() == *l && !l.contains("  ")));
    }

    #[test]
    fn test_prefers_dense_text_over_link_lists() {
        let html = r#"
            <html><body>
              <div class="links">
                <p><a href="/a">A very long link text that goes on, and on, and on for a while</a></p>
                <p><a href="/b">Another very long link text, with commas, that keeps going on</a></p>
              </div>
              <div class="story">
                <p>The council approved the new cycling plan, which adds fifty kilometres of lanes.</p>
                <p>Work starts in spring, and officials say most routes will open before winter.</p>
              </div>
            </body></html>
        "#;
        let text = extract(html).expect("content");
        assert!(text.contains("cycling plan"));
        assert!(!text.contains("link text"));
    }

    #[test]
    fn test_includes_good_sibling_paragraph() {
        let html = r#"
            <html><body>
              <div class="content">
                <div class="post">
                  <p>First paragraph of the post, with enough commas, words, and length to score.</p>
                  <p>Second paragraph of the post, also long enough, with more, commas, here.</p>
                </div>
                <p>A closing paragraph that sits outside the post container but still belongs to the story text.</p>
              </div>
            </body></html>
        "#;
        let text = extract(html).expect("content");
        assert!(text.contains("First paragraph"));
        assert!(text.contains("closing paragraph"));
    }

    #[test]
    fn test_no_paragraphs_returns_none() {
        let html = "<html><body><span>tiny</span></body></html>";
        assert!(extract(html).is_none());
    }

    #[test]
    fn test_render_skips_stripped_tags() {
        let readability = Readability::new().expect("readability");
        let document = Html::parse_document(
            "<html><body><p>Hello <b>world</b></p><script>x()</script><p>Bye</p></body></html>",
        );
        let text = readability.render(document.root_element());
        assert_eq!(text, "Hello world\nBye");
    }

    const SIDEBAR_LAYOUT: &str = r#"
        <html><body>
          <div class="layout has-sidebar">
            <div class="entry">
              <p>The museum reopened on Saturday after a two-year renovation that restored the original glass roof and galleries.</p>
              <p>Visitors queued for hours, and curators said the new lighting finally shows the collection the way it was meant to be seen.</p>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_unlikely_wrapper_retries_without_stripping() {
        let text = extract(SIDEBAR_LAYOUT).expect("content");
        assert!(text.contains("The museum reopened"));
        assert!(text.contains("Visitors queued for hours"));
    }

    #[test]
    fn test_render_ignores_class_patterns() {
        let readability = Readability::new().expect("readability");
        let document = Html::parse_document(
            r#"<html><body><div class="has-sidebar"><span>Wrapped text</span></div></body></html>"#,
        );
        assert_eq!(readability.render(document.root_element()), "Wrapped text");
    }

    #[test]
    fn test_inline_elements_do_not_split_words() {
        let html = r#"
            <html><body><article>
              <p><span class="dropcap">T</span>he quick brown fox jumps over the lazy dog, then see <a href="/x">here</a>.</p>
            </article></body></html>
        "#;
        let text = extract(html).expect("content");
        assert_eq!(
            text,
            "The quick brown fox jumps over the lazy dog, then see here."
        );
    }

    #[test]
    fn test_tag_score() {
        assert_eq!(tag_score("div"), 5.0);
        assert_eq!(tag_score("li"), -3.0);
        assert_eq!(tag_score("h2"), -5.0);
        assert_eq!(tag_score("span"), 0.0);
    }
}
