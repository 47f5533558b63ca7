use std::future::Future;

use async_trait::async_trait;

use crate::message::Message;

/// Processes one received message.
///
/// Returning `Ok` acknowledges the message and it is deleted from the queue.
/// Returning an error leaves it on the queue, so it is delivered again once
/// its visibility timeout runs out.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, message: Message) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`Handler`].
///
/// ```
/// let handler = courier::handler_fn(|message: courier::Message| async move {
///     log::info!("{}", message.text()?);
///     Ok::<_, anyhow::Error>(())
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    HandlerFn(f)
}

#[derive(Clone)]
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, message: Message) -> anyhow::Result<()> {
        (self.0)(message).await
    }
}
