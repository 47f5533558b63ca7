//! Inbound polling.
//!
//! The poller receives a page of messages, hands every message to the
//! handler on its own task and waits for the whole page before it asks the
//! queue for the next one. At most one page is in flight at any time.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::message::Message;
use crate::queue::{ReceiveOptions, ReceivedMessage, RemoteQueue};

/// What happened to one received page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub received: usize,
    /// Handled successfully and deleted from the queue
    pub deleted: usize,
    /// Left on the queue: decode, handler or delete failure
    pub failed: usize,
}

#[derive(Clone)]
pub struct Poller {
    queue: Arc<dyn RemoteQueue>,
    codec: Arc<dyn Codec>,
    options: ReceiveOptions,
}

impl Poller {
    pub fn new(queue: Arc<dyn RemoteQueue>, codec: Arc<dyn Codec>, options: ReceiveOptions) -> Self {
        Self {
            queue,
            codec,
            options,
        }
    }

    /// Polls until `shutdown` is cancelled.
    ///
    /// Receive failures are logged and the queue is polled again right away;
    /// the receive wait time is what keeps this from spinning. Cancelling
    /// interrupts a pending receive but never a page that is being handled.
    ///
    /// # Arguments
    ///
    /// * `handler` - Called once per received message, concurrently within a page
    /// * `shutdown` - Stops the loop once cancelled
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use courier::{handler_fn, Base64Url, Message, Poller, QueueConfig, SqsQueue};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # async fn example(config: QueueConfig) -> courier::Result<()> {
    /// let queue = Arc::new(SqsQueue::connect(&config).await?);
    /// let poller = Poller::new(queue, Arc::new(Base64Url), (&config).into());
    ///
    /// let handler = handler_fn(|message: Message| async move {
    ///     println!("{}", message.text()?);
    ///     Ok::<_, anyhow::Error>(())
    /// });
    /// poller.run(handler, CancellationToken::new()).await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<H: Handler>(&self, handler: H, shutdown: CancellationToken) {
        let handler = Arc::new(handler);
        log::info!(
            "polling for up to {} messages (wait {}s, visibility {}s)",
            self.options.max_messages,
            self.options.wait_seconds,
            self.options.visibility_seconds
        );

        while !shutdown.is_cancelled() {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.queue.receive(&self.options) => received,
            };

            match received {
                Ok(messages) if messages.is_empty() => log::trace!("no messages"),
                Ok(messages) => {
                    let summary = self.process(&handler, messages).await;
                    log::debug!("{summary:?}");
                }
                Err(e) => log::error!("{e}"),
            }
        }

        log::info!("poller stopped");
    }

    /// Runs a single receive and handles whatever it returned.
    ///
    /// # Returns
    ///
    /// How many messages the page held and how many of them were deleted or
    /// left on the queue. An empty page yields an all-zero summary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the receive call fails. Failures of single
    /// messages are counted in the summary instead.
    pub async fn poll_once<H: Handler>(&self, handler: Arc<H>) -> Result<PageSummary> {
        let messages = self.queue.receive(&self.options).await?;
        if messages.is_empty() {
            return Ok(PageSummary::default());
        }

        Ok(self.process(&handler, messages).await)
    }

    async fn process<H: Handler>(
        &self,
        handler: &Arc<H>,
        messages: Vec<ReceivedMessage>,
    ) -> PageSummary {
        let mut summary = PageSummary {
            received: messages.len(),
            ..Default::default()
        };
        log::info!("received {} messages", summary.received);

        let mut tasks = JoinSet::new();
        for message in messages {
            let queue = self.queue.clone();
            let codec = self.codec.clone();
            let handler = handler.clone();

            tasks.spawn(async move {
                let receipt_handle = message.receipt_handle.clone();
                match handle_message(queue.as_ref(), codec.as_ref(), handler.as_ref(), message)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("message {receipt_handle} not deleted: {e}");
                        false
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => summary.deleted += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    log::error!("message task did not complete: {e}");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// Decode, handle, then delete. Any failure leaves the message on the queue.
async fn handle_message<H: Handler>(
    queue: &dyn RemoteQueue,
    codec: &dyn Codec,
    handler: &H,
    received: ReceivedMessage,
) -> Result<()> {
    let message = Message::decode(received, codec)?;
    let receipt_handle = message.receipt_handle.clone();

    handler.handle(message).await.map_err(Error::Handler)?;
    queue.delete(&receipt_handle).await?;

    log::info!("deleted message from queue: {receipt_handle}");
    Ok(())
}
