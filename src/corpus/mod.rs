//! 본문 코퍼스 - 토큰 예산에 맞춘 길이 제한
//!
//! 토큰 수는 "토큰당 평균 5문자"로 근사합니다.

/// 토큰당 문자 수 근사치
pub const CHARS_PER_TOKEN: usize = 5;

/// 항목당 허용 문자 수
///
/// 텍스트가 없으면 `None` (0으로 나누지 않음).
pub fn per_item_allowance(token_budget: usize, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let allowance = (token_budget as f64 / count as f64) * CHARS_PER_TOKEN as f64;
    Some(allowance.floor() as usize)
}

/// 각 텍스트를 허용 길이로 자르기
///
/// 단어 경계를 고려하지 않는 단순 앞부분 자르기입니다.
/// 출력 개수는 입력과 같고, 허용 길이 이내의 텍스트는 그대로입니다.
pub fn truncate_texts(texts: Vec<String>, token_budget: usize) -> Vec<String> {
    let Some(allowance) = per_item_allowance(token_budget, texts.len()) else {
        return texts;
    };

    tracing::debug!(
        "Truncating {} texts to {} chars each (budget {} tokens)",
        texts.len(),
        allowance,
        token_budget
    );

    texts
        .into_iter()
        .map(|text| clip_chars(text, allowance))
        .collect()
}

/// 문자 단위 자르기 (UTF-8 안전)
fn clip_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
    text
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_allowance() {
        assert_eq!(per_item_allowance(500, 1), Some(2500));
        assert_eq!(per_item_allowance(500, 2), Some(1250));
        // 500 / 3 * 5 = 833.33
        assert_eq!(per_item_allowance(500, 3), Some(833));
        assert_eq!(per_item_allowance(500, 0), None);
    }

    #[test]
    fn test_empty_input_no_division() {
        assert!(truncate_texts(Vec::new(), 500).is_empty());
    }

    #[test]
    fn test_clips_long_and_keeps_short() {
        let long = "x".repeat(3000);
        let texts = truncate_texts(strings(&[&long, "short"]), 500);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].chars().count(), 1250);
        assert_eq!(texts[1], "short");
    }

    #[test]
    fn test_exact_allowance_unchanged() {
        // budget 2 tokens, 1 text → 10 chars
        let texts = truncate_texts(strings(&["0123456789"]), 2);
        assert_eq!(texts, strings(&["0123456789"]));
        let texts = truncate_texts(strings(&["0123456789A"]), 2);
        assert_eq!(texts, strings(&["0123456789"]));
    }

    #[test]
    fn test_idempotent() {
        let input = strings(&[&"a".repeat(900), &"b".repeat(100), &"c".repeat(5000)]);
        let once = truncate_texts(input, 500);
        let twice = truncate_texts(once.clone(), 500);
        assert_eq!(once, twice);
        assert!(once.iter().all(|t| t.chars().count() <= 833));
    }

    #[test]
    fn test_multibyte_safe() {
        let texts = truncate_texts(strings(&["안녕하세요 세계"]), 1);
        assert_eq!(texts[0], "안녕하세요");
    }

    #[test]
    fn test_zero_budget_clips_to_empty() {
        let texts = truncate_texts(strings(&["abc", "def"]), 0);
        assert_eq!(texts, strings(&["", ""]));
    }
}
