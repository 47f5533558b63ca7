//! AWS SQS implementation of [`RemoteQueue`].

use async_trait::async_trait;
use aws_sdk_sqs as sqs;
use sqs::error::DisplayErrorContext;
use sqs::types::{MessageSystemAttributeName, SendMessageBatchRequestEntry};

use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::queue::{
    BatchEntry, BatchEntryFailure, BatchEntrySuccess, ReceiveOptions, ReceivedMessage,
    RemoteQueue, SendBatchOutput,
};

/// Builds the AWS SDK config loader for `config`.
///
/// Static credentials are used when an access key is configured, otherwise
/// the SDK's default provider chain applies. An endpoint override points the
/// client at e.g. LocalStack.
pub fn sdk_config(config: &QueueConfig) -> aws_config::ConfigLoader {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    let credentials = &config.credentials;
    if !credentials.access_key_id.is_empty() {
        loader = loader.credentials_provider(sqs::config::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            credentials.session_token.clone().filter(|token| !token.is_empty()),
            None,
            "courier",
        ));
    }

    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    loader
}

/// Client for one SQS queue.
#[derive(Clone, Debug)]
pub struct SqsQueue {
    /// The SQS client instance
    pub client: sqs::Client,
    /// Resolved URL of the queue
    pub queue_url: String,
}

impl SqsQueue {
    /// Creates the client described by `config` and resolves the queue URL
    /// from its name.
    ///
    /// # Arguments
    ///
    /// * `config` - Queue name, region, credentials and optional endpoint override
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the queue does not exist or the
    /// `GetQueueUrl` call fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use courier::{ConfigOption, Credentials, QueueConfig, SqsQueue};
    ///
    /// # async fn example() -> courier::Result<()> {
    /// let config = QueueConfig::from_options([ConfigOption::Queue {
    ///     name: "orders".into(),
    ///     region: "us-east-1".into(),
    ///     credentials: Credentials::default(),
    /// }])?;
    /// let queue = SqsQueue::connect(&config).await?;
    /// println!("{}", queue.queue_url);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        let sdk_config = sdk_config(config).load().await;
        let client = sqs::Client::new(&sdk_config);

        let output = client
            .get_queue_url()
            .queue_name(&config.queue_name)
            .send()
            .await
            .map_err(|e| sdk_error("get_queue_url", e))?;

        let queue_url = output.queue_url.ok_or_else(|| {
            Error::transport("get_queue_url", format!("no url for {}", config.queue_name))
        })?;
        log::debug!("resolved queue {} to {queue_url}", config.queue_name);

        Ok(Self::from_client(client, queue_url))
    }

    pub fn from_client(client: sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl RemoteQueue for SqsQueue {
    async fn send(&self, body: String) -> Result<String> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| sdk_error("send_message", e))?;

        Ok(output.message_id.unwrap_or_default())
    }

    async fn send_batch(&self, entries: Vec<BatchEntry>) -> Result<SendBatchOutput> {
        let entries = entries
            .into_iter()
            .map(|entry| {
                SendMessageBatchRequestEntry::builder()
                    .id(entry.id)
                    .message_body(entry.body)
                    .build()
                    .map_err(|e| Error::transport("send_message_batch", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| sdk_error("send_message_batch", e))?;

        Ok(SendBatchOutput {
            successful: output
                .successful()
                .iter()
                .map(|entry| BatchEntrySuccess {
                    id: entry.id().to_string(),
                    message_id: entry.message_id().to_string(),
                })
                .collect(),
            failed: output
                .failed()
                .iter()
                .map(|entry| BatchEntryFailure {
                    id: entry.id().to_string(),
                    code: entry.code().to_string(),
                    message: entry.message().map(str::to_string),
                    sender_fault: entry.sender_fault(),
                })
                .collect(),
        })
    }

    async fn receive(&self, options: &ReceiveOptions) -> Result<Vec<ReceivedMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(options.max_messages)
            .visibility_timeout(options.visibility_seconds)
            .wait_time_seconds(options.wait_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::All)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| sdk_error("receive_message", e))?;

        Ok(output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(received_message)
            .collect())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| sdk_error("delete_message", e))?;

        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        self.client
            .purge_queue()
            .queue_url(&self.queue_url)
            .send()
            .await
            .map_err(|e| sdk_error("purge_queue", e))?;

        log::info!("purged {}", self.queue_url);
        Ok(())
    }
}

fn sdk_error(operation: &'static str, err: impl std::error::Error) -> Error {
    Error::transport(operation, DisplayErrorContext(&err).to_string())
}

/// Flattens an SDK message. Messages without a receipt handle cannot be
/// acknowledged and are skipped.
fn received_message(message: sqs::types::Message) -> Option<ReceivedMessage> {
    let Some(receipt_handle) = message.receipt_handle else {
        log::warn!("skipping message {:?} without receipt handle", message.message_id);
        return None;
    };

    let mut attributes: std::collections::HashMap<String, String> = message
        .attributes
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name.as_str().to_string(), value))
        .collect();

    for (name, value) in message.message_attributes.unwrap_or_default() {
        if let Some(text) = value.string_value() {
            attributes.insert(name, text.to_string());
        }
    }

    Some(ReceivedMessage {
        message_id: message.message_id,
        body: message.body.unwrap_or_default(),
        receipt_handle,
        attributes,
    })
}
