//! Live rendering of a streamed answer.

use colored::Colorize;
use std::io::Write;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokstream_application::{SearchError, SearchService, StreamUpdate};
use tokstream_core::{SessionStatus, StreamSession};

/// Submits `query` and prints tokens as they arrive. Ctrl-C cancels the
/// stream and keeps what was printed.
pub async fn stream_answer(
    service: &SearchService,
    query: &str,
    styled: bool,
) -> Result<StreamSession, SearchError> {
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(update) = rx.recv().await {
            if let StreamUpdate::Token { token, .. } = update {
                if styled {
                    let _ = write!(stdout, "{}", token.bright_blue());
                } else {
                    let _ = write!(stdout, "{token}");
                }
                let _ = stdout.flush();
            }
        }
        let _ = writeln!(stdout);
    });

    let result = service.submit(query, Some(tx), cancel).await;
    interrupt.abort();
    let _ = printer.await;
    result
}

/// Prints why a session did not complete. Returns `true` if it did.
pub fn report_outcome(session: &StreamSession) -> bool {
    match (session.status(), session.failure()) {
        (SessionStatus::Complete, _) => true,
        (_, Some(failure)) if failure.is_cancelled() => {
            eprintln!("{}", format!("[{failure}]").yellow());
            false
        }
        (_, failure) => {
            let message = failure
                .map(ToString::to_string)
                .unwrap_or_else(|| "stream ended unexpectedly".to_string());
            eprintln!("{}", format!("Error: {message}").red());
            false
        }
    }
}
