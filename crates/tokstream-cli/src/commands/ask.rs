use super::stream::{report_outcome, stream_answer};
use anyhow::{Result, bail};
use std::io::IsTerminal;
use tokstream_application::SearchService;
use tokstream_infrastructure::AppConfig;

/// Streams one answer to stdout. Fails unless the answer completed.
pub async fn run(config: &AppConfig, query: &str) -> Result<()> {
    let service = SearchService::from_config(config);
    let styled = std::io::stdout().is_terminal();

    let session = stream_answer(&service, query, styled).await?;
    if !report_outcome(&session) {
        bail!("answer did not complete ({} tokens received)", session.token_count());
    }
    Ok(())
}
