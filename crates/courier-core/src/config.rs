//! Queue client configuration.
//!
//! A [`QueueConfig`] is assembled once from an ordered list of [`ConfigOption`]s
//! and never changes afterwards. Each option is validated as it is applied and
//! the first invalid one aborts construction.

use crate::error::ConfigError;

pub const DEFAULT_MAX_MESSAGES: i32 = 10;
pub const DEFAULT_VISIBILITY_SECONDS: i32 = 10;
pub const DEFAULT_WAIT_SECONDS: i32 = 10;

/// Static AWS credentials for the queue.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

// Keep secrets out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// One configuration mutation.
#[derive(Debug, Clone)]
pub enum ConfigOption {
    /// Queue name, region, and credentials in one step.
    Queue {
        name: String,
        region: String,
        credentials: Credentials,
    },
    /// Override the service endpoint, e.g. a LocalStack URL.
    Endpoint(String),
    /// Messages returned per receive call, 1 to 10.
    MaxCountMessage(i32),
    /// Seconds a received message stays hidden from other consumers.
    VisibilitySeconds(i32),
    /// Long-poll duration of a receive call, 0 to 20.
    WaitSeconds(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub queue_name: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub credentials: Credentials,
    pub max_messages: i32,
    pub visibility_seconds: i32,
    pub wait_seconds: i32,
}

impl QueueConfig {
    /// Applies `options` in order on top of the defaults.
    ///
    /// A queue option is mandatory; without it construction fails with
    /// [`ConfigError::MissingField`].
    ///
    /// ```
    /// use courier::{ConfigOption, Credentials, QueueConfig};
    ///
    /// let config = QueueConfig::from_options([
    ///     ConfigOption::Queue {
    ///         name: "orders".into(),
    ///         region: "us-east-1".into(),
    ///         credentials: Credentials::default(),
    ///     },
    ///     ConfigOption::WaitSeconds(20),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(config.wait_seconds, 20);
    /// assert_eq!(config.max_messages, 10);
    /// ```
    pub fn from_options(
        options: impl IntoIterator<Item = ConfigOption>,
    ) -> Result<Self, ConfigError> {
        let mut config = QueueConfig {
            queue_name: String::new(),
            region: String::new(),
            endpoint_url: None,
            credentials: Credentials::default(),
            max_messages: DEFAULT_MAX_MESSAGES,
            visibility_seconds: DEFAULT_VISIBILITY_SECONDS,
            wait_seconds: DEFAULT_WAIT_SECONDS,
        };

        for option in options {
            config.apply(option)?;
        }

        if config.queue_name.is_empty() {
            return Err(ConfigError::MissingField("queue_name"));
        }
        if config.region.is_empty() {
            return Err(ConfigError::MissingField("region"));
        }

        Ok(config)
    }

    fn apply(&mut self, option: ConfigOption) -> Result<(), ConfigError> {
        match option {
            ConfigOption::Queue {
                name,
                region,
                credentials,
            } => {
                self.queue_name = name;
                self.region = region;
                self.credentials = credentials;
            }
            ConfigOption::Endpoint(url) => self.endpoint_url = Some(url),
            ConfigOption::MaxCountMessage(count) => {
                self.max_messages = in_range("max_messages", count, 1, 10)?
            }
            ConfigOption::VisibilitySeconds(seconds) => {
                // SQS caps visibility at 12 hours.
                self.visibility_seconds = in_range("visibility_seconds", seconds, 0, 43_200)?
            }
            ConfigOption::WaitSeconds(seconds) => {
                self.wait_seconds = in_range("wait_seconds", seconds, 0, 20)?
            }
        }

        Ok(())
    }
}

fn in_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<i32, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        })
    }
}
