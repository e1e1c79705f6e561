use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_link_args(command);
    with_outbox_args(command)
}

fn with_link_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Public base URL used to build activation links")
                .env("AKTIVIGO_BASE_URL")
                .default_value("https://aktivigo.dev"),
        )
        .arg(
            Arg::new("activation-token-ttl-seconds")
                .long("activation-token-ttl-seconds")
                .help("Activation token TTL in seconds")
                .env("AKTIVIGO_ACTIVATION_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_outbox_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("email-outbox-poll-seconds")
                .long("email-outbox-poll-seconds")
                .help("Email outbox poll interval in seconds")
                .env("AKTIVIGO_EMAIL_OUTBOX_POLL_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("email-outbox-batch-size")
                .long("email-outbox-batch-size")
                .help("Email outbox batch size per poll")
                .env("AKTIVIGO_EMAIL_OUTBOX_BATCH_SIZE")
                .default_value("10")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("email-outbox-max-attempts")
                .long("email-outbox-max-attempts")
                .help("Max attempts before marking an email as failed")
                .env("AKTIVIGO_EMAIL_OUTBOX_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("email-outbox-backoff-base-seconds")
                .long("email-outbox-backoff-base-seconds")
                .help("Base delay for email outbox retry backoff")
                .env("AKTIVIGO_EMAIL_OUTBOX_BACKOFF_BASE_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("email-outbox-backoff-max-seconds")
                .long("email-outbox-backoff-max-seconds")
                .help("Max delay for email outbox retry backoff")
                .env("AKTIVIGO_EMAIL_OUTBOX_BACKOFF_MAX_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}
