use std::sync::Arc;

use dgb_core::config::Config;
use dgb_github::{build_http_client, GitHubClient};

#[tokio::main]
async fn main() -> Result<(), dgb_core::Error> {
    dgb_core::logging::init("dgb")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        channel = %cfg.channel_id,
        github = %cfg.github_api_url,
        timeout_ms = cfg.http_timeout.as_millis() as u64,
        "configuration loaded"
    );

    let http = build_http_client(cfg.http_timeout)?;
    let github = Arc::new(GitHubClient::new(
        cfg.github_token.clone(),
        &cfg.github_api_url,
        http,
    )?);

    dgb_discord::router::run(cfg, github)
        .await
        .map_err(|e| dgb_core::Error::Gateway(format!("discord bot failed: {e:#}")))?;

    Ok(())
}
