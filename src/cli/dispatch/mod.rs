//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action executed by the binary.

use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .context("missing required argument: --base-url")?;
    let token_ttl_seconds = matches
        .get_one::<i64>("activation-token-ttl-seconds")
        .copied()
        .unwrap_or(604_800);

    Ok(Action::Server(Args {
        port,
        dsn,
        base_url,
        token_ttl_seconds,
        email_outbox_poll_seconds: matches
            .get_one::<u64>("email-outbox-poll-seconds")
            .copied()
            .unwrap_or(5),
        email_outbox_batch_size: matches
            .get_one::<usize>("email-outbox-batch-size")
            .copied()
            .unwrap_or(10),
        email_outbox_max_attempts: matches
            .get_one::<u32>("email-outbox-max-attempts")
            .copied()
            .unwrap_or(5),
        email_outbox_backoff_base_seconds: matches
            .get_one::<u64>("email-outbox-backoff-base-seconds")
            .copied()
            .unwrap_or(5),
        email_outbox_backoff_max_seconds: matches
            .get_one::<u64>("email-outbox-backoff-max-seconds")
            .copied()
            .unwrap_or(300),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{actions::Action, commands};

    #[test]
    fn dispatch_builds_server_action() {
        temp_env::with_vars(
            [
                (
                    "AKTIVIGO_DSN",
                    Some("postgres://user@localhost:5432/aktivigo"),
                ),
                ("AKTIVIGO_BASE_URL", Some("https://accounts.example.com")),
                ("AKTIVIGO_ACTIVATION_TOKEN_TTL_SECONDS", Some("3600")),
            ],
            || {
                let command = commands::new();
                let matches = command.get_matches_from(vec!["aktivigo"]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.base_url, "https://accounts.example.com");
                    assert_eq!(args.token_ttl_seconds, 3600);
                    assert_eq!(args.email_outbox_batch_size, 10);
                }
            },
        );
    }
}
