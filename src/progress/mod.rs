//! 진행 표시 - 검색 중 스피너
//!
//! `Spinner::start`가 돌려준 핸들을 `finish`로 멈춥니다.
//! 오류로 빠져나가면 drop 시 지우고 끝냅니다.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// 스피너 프레임 (마지막 항목은 완료 시 표시)
const FRAMES: &[&str] = &["◐", "◓", "◑", "◒", "✔"];

/// 프레임 간격
const TICK: Duration = Duration::from_millis(100);

/// 스피너 핸들
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// stdout에 스피너 시작 (터미널이 아니면 그리지 않음)
    pub fn start(message: &str) -> Self {
        Self::with_target(message, ProgressDrawTarget::stdout())
    }

    /// 아무것도 그리지 않는 스피너 (테스트/파이프 출력용)
    pub fn hidden(message: &str) -> Self {
        Self::with_target(message, ProgressDrawTarget::hidden())
    }

    fn with_target(message: &str, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(FRAMES),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    /// 완료 메시지를 남기고 정지
    pub fn finish(self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_stops() {
        let spinner = Spinner::hidden("Searching on Web...");
        assert!(!spinner.bar.is_finished());
        let bar = spinner.bar.clone();
        spinner.finish("Done! Searching complete.");
        assert!(bar.is_finished());
    }

    #[test]
    fn test_drop_clears() {
        let bar = {
            let spinner = Spinner::hidden("Searching on Web...");
            spinner.bar.clone()
        };
        assert!(bar.is_finished());
    }
}
