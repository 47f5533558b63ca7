//! Outbound batching.
//!
//! Bodies are grouped in input order into chunks that respect the queue's
//! batch limits, and every chunk is sent as one batch request on its own
//! task. A chunk is handed off as soon as it is full, so later chunks are
//! still being formed while earlier ones are in flight.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::queue::{BatchEntry, RemoteQueue, SendBatchOutput};

/// Byte budget of one batch, counted on the raw bodies in whole kilobytes.
///
/// Leaves room under the 256 KiB SQS request limit for base64 growth.
pub const MAX_BATCH_SIZE_KB: usize = 150;
pub const MAX_BATCH_MESSAGE_COUNT: usize = 10;

/// Outcome of sending one chunk.
#[derive(Debug)]
pub struct BatchResult {
    /// Position of the chunk among all chunks of the dispatch call
    pub index: usize,
    /// Number of messages in the chunk
    pub entries: usize,
    pub outcome: Result<SendBatchOutput>,
}

impl BatchResult {
    /// True when the request succeeded and the queue accepted every entry.
    pub fn is_complete(&self) -> bool {
        matches!(&self.outcome, Ok(output) if output.failed.is_empty())
    }
}

/// Accumulates bodies into chunks.
///
/// A body joins the current chunk while the chunk stays under the byte
/// budget and below the count limit. A body that is too big on its own still
/// forms a chunk by itself. Empty chunks are never produced.
#[derive(Debug, Default)]
struct Chunker<'a> {
    current: Vec<&'a str>,
    bytes: usize,
}

impl<'a> Chunker<'a> {
    /// Adds `body`, returning the previous chunk if it had to be closed.
    fn push(&mut self, body: &'a str) -> Option<Vec<&'a str>> {
        let len = body.len();
        let fits = (self.bytes + len) / 1000 < MAX_BATCH_SIZE_KB
            && self.current.len() < MAX_BATCH_MESSAGE_COUNT;

        let closed = if self.current.is_empty() || fits {
            None
        } else {
            self.bytes = 0;
            Some(std::mem::take(&mut self.current))
        };

        self.bytes += len;
        self.current.push(body);
        closed
    }

    fn finish(self) -> Option<Vec<&'a str>> {
        (!self.current.is_empty()).then_some(self.current)
    }
}

/// Splits `bodies` into the chunks [`BatchDispatcher::dispatch`] would send.
pub fn chunk<S: AsRef<str>>(bodies: &[S]) -> Vec<Vec<&str>> {
    let mut chunker = Chunker::default();
    let mut chunks = Vec::new();

    for body in bodies {
        chunks.extend(chunker.push(body.as_ref()));
    }
    chunks.extend(chunker.finish());

    chunks
}

/// Sends messages, one at a time or in batches, through a [`RemoteQueue`].
#[derive(Clone)]
pub struct BatchDispatcher {
    queue: Arc<dyn RemoteQueue>,
    codec: Arc<dyn Codec>,
}

impl BatchDispatcher {
    pub fn new(queue: Arc<dyn RemoteQueue>, codec: Arc<dyn Codec>) -> Self {
        Self { queue, codec }
    }

    /// Encodes and sends a single message, returning its queue message id.
    pub async fn send(&self, body: impl AsRef<str>) -> Result<String> {
        let encoded = self.codec.encode(body.as_ref().as_bytes());
        self.queue.send(encoded).await
    }

    /// Sends all `bodies` as concurrent batch requests.
    ///
    /// # Arguments
    ///
    /// * `bodies` - Raw message bodies, encoded with the dispatcher's codec before sending
    ///
    /// # Returns
    ///
    /// One [`BatchResult`] per chunk, ordered by chunk index. A failed chunk is
    /// reported in its result and never stops the other chunks. Empty input
    /// sends nothing and returns nothing.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example(dispatcher: courier::BatchDispatcher) {
    /// let bodies: Vec<String> = (0..25).map(|i| format!(r#"{{"id":{i}}}"#)).collect();
    ///
    /// for result in dispatcher.dispatch(&bodies).await {
    ///     if !result.is_complete() {
    ///         eprintln!("batch #{} failed: {:?}", result.index, result.outcome);
    ///     }
    /// }
    /// # }
    /// ```
    pub async fn dispatch<S: AsRef<str>>(&self, bodies: &[S]) -> Vec<BatchResult> {
        let mut tasks = JoinSet::new();
        let mut sizes = Vec::new();
        let mut chunker = Chunker::default();

        for body in bodies {
            if let Some(chunk) = chunker.push(body.as_ref()) {
                self.flush(&mut tasks, &mut sizes, chunk);
            }
        }
        if let Some(chunk) = chunker.finish() {
            self.flush(&mut tasks, &mut sizes, chunk);
        }

        let mut slots: Vec<Option<BatchResult>> = sizes.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    let index = result.index;
                    slots[index] = Some(result);
                }
                Err(e) => log::error!("batch send task did not complete: {e}"),
            }
        }

        slots
            .into_iter()
            .zip(sizes)
            .enumerate()
            .map(|(index, (slot, entries))| {
                slot.unwrap_or_else(|| BatchResult {
                    index,
                    entries,
                    outcome: Err(Error::transport("send_batch", "batch task did not complete")),
                })
            })
            .collect()
    }

    fn flush(&self, tasks: &mut JoinSet<BatchResult>, sizes: &mut Vec<usize>, chunk: Vec<&str>) {
        let index = sizes.len();
        let entries = chunk.len();
        sizes.push(entries);

        let bodies: Vec<String> = chunk.into_iter().map(str::to_owned).collect();
        let queue = self.queue.clone();
        let codec = self.codec.clone();

        log::debug!("sending batch #{index} with {entries} messages");
        tasks.spawn(async move {
            let entries = encode_entries(codec.as_ref(), &bodies);
            let outcome = queue.send_batch(entries).await;

            match &outcome {
                Ok(output) if !output.failed.is_empty() => log::warn!(
                    "batch #{index}: {} of {} messages rejected",
                    output.failed.len(),
                    bodies.len()
                ),
                Ok(_) => log::debug!("batch #{index} sent"),
                Err(e) => log::error!("batch #{index}: {e}"),
            }

            BatchResult {
                index,
                entries: bodies.len(),
                outcome,
            }
        });
    }
}

/// Builds batch entries with positional ids, unique within the batch.
fn encode_entries(codec: &dyn Codec, bodies: &[String]) -> Vec<BatchEntry> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| BatchEntry {
            id: format!("msg-{i}"),
            body: codec.encode(body.as_bytes()),
        })
        .collect()
}
