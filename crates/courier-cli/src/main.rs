mod poll;
mod send;

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use courier::{Base64Url, ConfigOption, Credentials, QueueConfig, RemoteQueue, SqsQueue};

#[tokio::main]
pub async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = Cli::parse().run().await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "send, batch and poll messages on an AWS SQS queue", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    queue: QueueArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a single message
    Send { body: String },
    /// Send every non-empty line of a file (or stdin) in batches
    Batch {
        /// Reads from stdin if omitted
        file: Option<std::path::PathBuf>,
    },
    /// Poll the queue and print each message as JSON until interrupted
    Poll,
    /// Delete every message on the queue
    Purge,
}

#[derive(Args)]
struct QueueArgs {
    /// Name of the queue
    #[arg(long, env = "COURIER_QUEUE")]
    queue: String,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    /// Service endpoint override, e.g. http://localhost:4566 for LocalStack
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint: Option<String>,

    /// Falls back to the default AWS credential chain when omitted
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Messages per receive call (1-10)
    #[arg(long, default_value_t = courier::DEFAULT_MAX_MESSAGES)]
    max_messages: i32,

    /// Seconds a received message stays hidden from other consumers
    #[arg(long, default_value_t = courier::DEFAULT_VISIBILITY_SECONDS)]
    visibility: i32,

    /// Long-poll wait time in seconds (0-20)
    #[arg(long, default_value_t = courier::DEFAULT_WAIT_SECONDS)]
    wait: i32,
}

impl QueueArgs {
    fn config(&self) -> Result<QueueConfig, courier::ConfigError> {
        let mut options = vec![ConfigOption::Queue {
            name: self.queue.clone(),
            region: self.region.clone(),
            credentials: Credentials {
                access_key_id: self.access_key.clone().unwrap_or_default(),
                secret_access_key: self.secret_key.clone().unwrap_or_default(),
                session_token: self.session_token.clone(),
            },
        }];
        if let Some(endpoint) = &self.endpoint {
            options.push(ConfigOption::Endpoint(endpoint.clone()));
        }
        options.extend([
            ConfigOption::MaxCountMessage(self.max_messages),
            ConfigOption::VisibilitySeconds(self.visibility),
            ConfigOption::WaitSeconds(self.wait),
        ]);

        QueueConfig::from_options(options)
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.queue.config().context("invalid configuration")?;
        let codec = Arc::new(Base64Url);
        let queue = Arc::new(
            SqsQueue::connect(&config)
                .await
                .with_context(|| format!("failed to open queue {}", config.queue_name))?,
        );

        match self.command {
            Commands::Send { body } => send::single(queue, codec, &body).await,
            Commands::Batch { file } => send::batch(queue, codec, file.as_deref()).await,
            Commands::Poll => poll::run(queue, codec, &config).await,
            Commands::Purge => Ok(queue.purge().await?),
        }
    }
}
