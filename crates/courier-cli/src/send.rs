use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use courier::{BatchDispatcher, BatchResult, Codec, RemoteQueue};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

pub async fn single(
    queue: Arc<dyn RemoteQueue>,
    codec: Arc<dyn Codec>,
    body: &str,
) -> anyhow::Result<()> {
    let message_id = BatchDispatcher::new(queue, codec)
        .send(body)
        .await
        .context("failed to send message")?;

    println!("{message_id}");
    Ok(())
}

/// Sends every non-empty line of `file` (or stdin) through the batch
/// dispatcher and prints one JSON summary line per batch.
pub async fn batch(
    queue: Arc<dyn RemoteQueue>,
    codec: Arc<dyn Codec>,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let bodies = match file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            collect_lines(file).await
        }
        None => collect_lines(tokio::io::stdin()).await,
    }
    .context("failed to read message bodies")?;
    log::info!("sending {} messages", bodies.len());

    let results = BatchDispatcher::new(queue, codec).dispatch(&bodies).await;

    let mut failed = 0;
    for result in &results {
        if !result.is_complete() {
            failed += 1;
        }
        println!("{}", summary(result));
    }

    anyhow::ensure!(failed == 0, "{failed} of {} batches failed", results.len());
    Ok(())
}

/// Non-empty lines of `reader`, line endings stripped.
async fn collect_lines<R: AsyncRead + Unpin>(reader: R) -> std::io::Result<Vec<String>> {
    let mut lines = BufReader::new(reader).lines();

    let mut bodies = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if !line.is_empty() {
            bodies.push(line);
        }
    }

    Ok(bodies)
}

fn summary(result: &BatchResult) -> serde_json::Value {
    match &result.outcome {
        Ok(output) => serde_json::json!({
            "batch": result.index,
            "entries": result.entries,
            "sent": output.successful.len(),
            "failed": output
                .failed
                .iter()
                .map(|f| serde_json::json!({ "id": f.id, "code": f.code, "message": f.message }))
                .collect::<Vec<_>>(),
        }),
        Err(e) => serde_json::json!({
            "batch": result.index,
            "entries": result.entries,
            "error": e.to_string(),
        }),
    }
}
