use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::queue::{
    BatchEntry, BatchEntrySuccess, ReceiveOptions, ReceivedMessage, RemoteQueue, SendBatchOutput,
};

/// In-memory [`RemoteQueue`] that records every call.
///
/// Receives are served from scripted pages; once those run out every receive
/// returns an empty page and, if configured, cancels a shutdown token.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    sent: Vec<String>,
    batches: Vec<Vec<BatchEntry>>,
    pages: VecDeque<Result<Vec<ReceivedMessage>>>,
    deleted: Vec<String>,
    events: Vec<String>,
    receive_calls: usize,
    last_options: Option<ReceiveOptions>,
    poison: Option<String>,
    undeletable: HashSet<String>,
    shutdown_when_drained: Option<CancellationToken>,
    batch_gate: Option<Arc<Barrier>>,
}

impl MemoryQueue {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn push_page(&self, messages: Vec<ReceivedMessage>) {
        self.state().pages.push_back(Ok(messages));
    }

    pub fn push_receive_error(&self, message: &str) {
        self.state()
            .pages
            .push_back(Err(Error::transport("receive", message)));
    }

    /// Any batch containing a body equal to `body` fails as a whole.
    pub fn fail_batches_containing(&self, body: &str) {
        self.state().poison = Some(body.to_string());
    }

    pub fn fail_delete_of(&self, receipt_handle: &str) {
        self.state().undeletable.insert(receipt_handle.to_string());
    }

    /// Every batch request blocks until `batches` requests are in flight.
    pub fn hold_batches_until(&self, batches: usize) {
        self.state().batch_gate = Some(Arc::new(Barrier::new(batches)));
    }

    pub fn shutdown_when_drained(&self, token: CancellationToken) {
        self.state().shutdown_when_drained = Some(token);
    }

    /// Appends to the shared event log, so tests can interleave their own
    /// events with the queue's.
    pub fn record(&self, event: impl Into<String>) {
        self.state().events.push(event.into());
    }

    pub fn sent(&self) -> Vec<String> {
        self.state().sent.clone()
    }

    pub fn batches(&self) -> Vec<Vec<BatchEntry>> {
        self.state().batches.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state().deleted.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.state().receive_calls
    }

    pub fn last_options(&self) -> Option<ReceiveOptions> {
        self.state().last_options
    }
}

#[async_trait]
impl RemoteQueue for MemoryQueue {
    async fn send(&self, body: String) -> Result<String> {
        let mut state = self.state();
        state.sent.push(body);
        Ok(format!("id-{}", state.sent.len()))
    }

    async fn send_batch(&self, entries: Vec<BatchEntry>) -> Result<SendBatchOutput> {
        let gate = self.state().batch_gate.clone();
        match gate {
            Some(gate) => {
                gate.wait().await;
            }
            // let sibling batches interleave
            None => tokio::task::yield_now().await,
        }

        let mut state = self.state();
        if let Some(poison) = &state.poison {
            if entries.iter().any(|e| &e.body == poison) {
                return Err(Error::transport("send_batch", "rejected by test queue"));
            }
        }

        let successful = entries
            .iter()
            .map(|e| BatchEntrySuccess {
                id: e.id.clone(),
                message_id: format!("{}-{}", state.batches.len(), e.id),
            })
            .collect();
        state.batches.push(entries);

        Ok(SendBatchOutput {
            successful,
            failed: Vec::new(),
        })
    }

    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<ReceivedMessage>> {
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.receive_calls += 1;
        state.last_options = Some(*options);
        state.events.push("receive".into());

        match state.pages.pop_front() {
            Some(page) => page,
            None => {
                if let Some(token) = &state.shutdown_when_drained {
                    token.cancel();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        let mut state = self.state();
        if state.undeletable.contains(receipt_handle) {
            return Err(Error::transport("delete", "receipt handle is invalid"));
        }
        state.deleted.push(receipt_handle.to_string());
        state.events.push(format!("delete:{receipt_handle}"));
        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        self.state().pages.clear();
        Ok(())
    }
}

/// A received message whose body is `body` encoded with [`crate::Base64Url`].
pub fn encoded_message(receipt_handle: &str, body: &str) -> ReceivedMessage {
    use crate::codec::{Base64Url, Codec};

    ReceivedMessage {
        message_id: Some(format!("id-{receipt_handle}")),
        body: Base64Url.encode(body.as_bytes()),
        receipt_handle: receipt_handle.to_string(),
        attributes: Default::default(),
    }
}
