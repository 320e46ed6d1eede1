
//! Logging setup utilities for the application.
//!
//! This module configures logging to stderr using the `log4rs` crate.
//! It defines a function to initialize the logger with a consistent format
//! and log level.

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

/// Configure logger to write to stderr.
pub fn setup_logger() -> anyhow::Result<()> {
    let level = log::LevelFilter::Info;
    let pattern = "[{d(%Y-%m-%d %H:%M:%S)}] {h({l})}: {m}{n}";

    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .target(Target::Stderr)
        .build();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(Root::builder().appender("stderr").build(LevelFilter::Trace))
        .expect("Failed to configure logger.");

    log4rs::init_config(config).expect("Failed to initialize logger.");
    Ok(())
}
