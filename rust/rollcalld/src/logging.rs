//! Logging bootstrap.
//!
//! stdout carries IPC responses, so logs always go to stderr. `RUST_LOG` wins
//! over the configured level.

use env_logger::{Builder, Target};
use log::LevelFilter;

pub fn init(level: Option<&str>) {
    let default_level = level
        .and_then(|l| l.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let mut builder = Builder::new();
    builder.filter_level(default_level).target(Target::Stderr);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // Already initialized (tests) is not an error worth surfacing.
    let _ = builder.try_init();
}
