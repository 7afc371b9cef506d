use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use authapp::{cli::Cli, config::AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "authapp=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    // stdout carries command output; logs go to stderr
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let state = AppState::from_config(Arc::new(config)).await?;
    tracing::debug!(
        data_dir = %state.config.data_dir.display(),
        key_prefix = %state.config.key_prefix,
        "state ready"
    );

    let ok = authapp::cli::run(
        cli.command,
        &state.auth,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
