use anyhow::Result;
use colored::Colorize;
use tokstream_infrastructure::AppConfig;
use tokstream_server::{AppState, SEARCH_PATH};

/// Runs the reference endpoint until Ctrl-C.
pub async fn run(config: &AppConfig) -> Result<()> {
    let bind = &config.server.bind;
    let state = AppState {
        token_delay: config.backend.token_delay(),
    };

    eprintln!(
        "{}",
        format!("Serving http://{bind}{SEARCH_PATH} (Ctrl-C to stop)").bright_green()
    );
    tokstream_server::serve(bind, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}
