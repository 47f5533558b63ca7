//! The remote queue seam.
//!
//! Everything above this trait (dispatcher, poller) is transport agnostic; the
//! SQS implementation lives in [`crate::sqs`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::QueueConfig;
use crate::error::Result;

/// One entry of a batch send. `id` only has to be unique within its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub id: String,
    pub body: String,
}

/// Per-entry outcome of a batch send that reached the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendBatchOutput {
    pub successful: Vec<BatchEntrySuccess>,
    pub failed: Vec<BatchEntryFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntrySuccess {
    pub id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntryFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

/// A message as delivered by the queue, body still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: Option<String>,
    pub body: String,
    pub receipt_handle: String,
    pub attributes: HashMap<String, String>,
}

/// Parameters of a single receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveOptions {
    pub max_messages: i32,
    pub visibility_seconds: i32,
    pub wait_seconds: i32,
}

impl From<&QueueConfig> for ReceiveOptions {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_messages: config.max_messages,
            visibility_seconds: config.visibility_seconds,
            wait_seconds: config.wait_seconds,
        }
    }
}

/// Operations the dispatcher and the poller need from a queue.
#[async_trait]
pub trait RemoteQueue: Send + Sync {
    /// Sends one already-encoded body and returns the queue's message id.
    async fn send(&self, body: String) -> Result<String>;

    async fn send_batch(&self, entries: Vec<BatchEntry>) -> Result<SendBatchOutput>;

    /// Receives up to `options.max_messages`, waiting at most
    /// `options.wait_seconds` for the first one to arrive.
    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<ReceivedMessage>>;

    async fn delete(&self, receipt_handle: &str) -> Result<()>;

    /// Removes every message currently on the queue.
    async fn purge(&self) -> Result<()>;
}
