use crate::api;
use crate::api::handlers::activation::ActivationConfig;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub base_url: String,
    pub token_ttl_seconds: i64,
    pub email_outbox_poll_seconds: u64,
    pub email_outbox_batch_size: usize,
    pub email_outbox_max_attempts: u32,
    pub email_outbox_backoff_base_seconds: u64,
    pub email_outbox_backoff_max_seconds: u64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let activation_config = ActivationConfig::new(args.base_url)
        .with_token_ttl_seconds(args.token_ttl_seconds);

    let email_config = api::email::EmailWorkerConfig::new()
        .with_poll_interval_seconds(args.email_outbox_poll_seconds)
        .with_batch_size(args.email_outbox_batch_size)
        .with_max_attempts(args.email_outbox_max_attempts)
        .with_backoff_base_seconds(args.email_outbox_backoff_base_seconds)
        .with_backoff_max_seconds(args.email_outbox_backoff_max_seconds);

    api::new(args.port, args.dsn, activation_config, email_config).await
}
