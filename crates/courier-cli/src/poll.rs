use std::sync::Arc;

use anyhow::Context;
use courier::{handler_fn, Codec, Message, Poller, QueueConfig, RemoteQueue};
use tokio_util::sync::CancellationToken;

/// Prints every received message as one JSON line until Ctrl-C.
pub async fn run(
    queue: Arc<dyn RemoteQueue>,
    codec: Arc<dyn Codec>,
    config: &QueueConfig,
) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let poller = Poller::new(queue, codec, config.into());

    let polling = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { poller.run(handler_fn(print_message), shutdown).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    log::info!("shutting down, waiting for in-flight messages");
    shutdown.cancel();

    polling.await.context("poller task failed")
}

async fn print_message(message: Message) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&message)?);
    Ok(())
}
