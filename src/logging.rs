use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::{TARGET_DEDUP, TARGET_VECTOR};

/// Console gets stage summaries, the daily log file gets every merge decision.
pub fn configure_logging() {
    // Tokenizer warnings are noise for every batch we embed
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::WARN && metadata.target().starts_with("tokenizers"))
    });

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{}=info,{}=warn,reqwest=warn",
            TARGET_DEDUP, TARGET_VECTOR
        ))
    });

    // Console log configuration, stdout is reserved for command output
    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(console_filter)
        .with_filter(custom_filter);

    // File log configuration
    let file_appender = rolling::daily("logs", "dedup.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(format!(
            "info,{}=debug,{}=info",
            TARGET_DEDUP, TARGET_VECTOR
        )));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .init();
}
