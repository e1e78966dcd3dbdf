//! Stream a review and print events as they arrive.
//!
//! Run with:
//! ```bash
//! VOS_API_URL=http://localhost:8000 RUST_LOG=vos_review=debug \
//!     cargo run --example stream_review -- <document-id> <persona-id>...
//! ```
//!
//! Press Ctrl-C to cancel the review stream.

use tracing_subscriber::EnvFilter;
use vos_review::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(document_id) = args.next() else {
        anyhow::bail!("usage: stream_review <document-id> <persona-id>...");
    };
    let personas: Vec<String> = args.collect();
    if personas.is_empty() {
        anyhow::bail!("at least one persona id is required");
    }

    let client = ApiClient::from_env()?;
    tracing::info!(base_url = %client.config().base_url, %document_id, "Starting review");

    let handle = client.stream_review(
        &document_id,
        personas,
        |event| match event {
            ReviewEvent::Status {
                persona_name,
                status,
                ..
            } => println!("[{persona_name}] {status:?}"),
            ReviewEvent::Comment { comment } => {
                let anchor = comment.anchor();
                println!(
                    "[{}] lines {}-{}: {}",
                    comment.persona_name, anchor.start_line, anchor.end_line, comment.content
                );
            }
            ReviewEvent::Complete {
                review_id,
                total_comments,
            } => println!("Review {review_id} complete, {total_comments} comments"),
            ReviewEvent::Error { .. } => {}
        },
        |error| eprintln!("error: {error}"),
    );

    let cancel = handle.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling...");
            cancel.cancel();
        }
    });

    let report = handle.finished().await;
    println!(
        "Stream {}: {} events, {} error events, {} skipped lines",
        report.outcome, report.stats.events, report.stats.error_events, report.stats.skipped_lines
    );

    if let StreamOutcome::Failed(error) = report.outcome {
        return Err(error.into());
    }
    Ok(())
}
