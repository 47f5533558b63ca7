//! # courier-core
//!
//! Batch sending and concurrent polling on top of AWS SQS.
//!
//! ## Features
//!
//! - **Batch Dispatch**: split any number of messages into batches that fit the
//!   queue's size and count limits and send them concurrently
//! - **Polling**: receive pages of messages, run a handler on every message
//!   concurrently and delete the ones that were handled
//! - **Codec**: message bodies travel base64 encoded by default
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use courier::{
//!     handler_fn, Base64Url, BatchDispatcher, ConfigOption, Credentials, Message, Poller,
//!     QueueConfig, SqsQueue,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = QueueConfig::from_options([
//!     ConfigOption::Queue {
//!         name: "orders".into(),
//!         region: "us-east-1".into(),
//!         credentials: Credentials::default(),
//!     },
//!     ConfigOption::WaitSeconds(20),
//! ])?;
//! let queue = Arc::new(SqsQueue::connect(&config).await?);
//!
//! let shutdown = CancellationToken::new();
//! let poller = Poller::new(queue.clone(), Arc::new(Base64Url), (&config).into());
//! let polling = tokio::spawn({
//!     let shutdown = shutdown.clone();
//!     async move {
//!         let handler = handler_fn(|message: Message| async move {
//!             println!("{}", message.text()?);
//!             Ok::<_, anyhow::Error>(())
//!         });
//!         poller.run(handler, shutdown).await
//!     }
//! });
//!
//! let dispatcher = BatchDispatcher::new(queue, Arc::new(Base64Url));
//! dispatcher.send(r#"{"id":1,"message":"Sending data"}"#).await?;
//! for result in dispatcher.dispatch(&[r#"{"id":1}"#, r#"{"id":2}"#]).await {
//!     println!("batch #{} complete: {}", result.index, result.is_complete());
//! }
//!
//! shutdown.cancel();
//! polling.await?;
//! # Ok(())
//! # }
//! ```

mod codec;
mod config;
mod dispatch;
mod error;
mod handler;
mod message;
mod poller;
mod queue;
mod sqs;

#[cfg(test)]
mod test_utils;

pub use codec::{Base64Url, Codec};
pub use config::{
    ConfigOption, Credentials, QueueConfig, DEFAULT_MAX_MESSAGES, DEFAULT_VISIBILITY_SECONDS,
    DEFAULT_WAIT_SECONDS,
};
pub use dispatch::{chunk, BatchDispatcher, BatchResult, MAX_BATCH_MESSAGE_COUNT, MAX_BATCH_SIZE_KB};
pub use error::{ConfigError, DecodeError, Error, Result};
pub use handler::{handler_fn, Handler, HandlerFn};
pub use message::Message;
pub use poller::{PageSummary, Poller};
pub use queue::{
    BatchEntry, BatchEntryFailure, BatchEntrySuccess, ReceiveOptions, ReceivedMessage,
    RemoteQueue, SendBatchOutput,
};
pub use sqs::{sdk_config, SqsQueue};
