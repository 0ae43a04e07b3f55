//! webai CLI 진입점

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = webai::cli::Cli::parse();

    // 로깅 초기화 (stdout은 답변 전용이므로 stderr로)
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(webai::cli::run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            webai::cli::print_error(&e);
            ExitCode::from(1)
        }
    }
}
