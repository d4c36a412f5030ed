//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system at `Info`
///
/// `RUST_LOG` overrides the level; calling it twice is harmless.
pub fn init() {
    init_with_level(LevelFilter::Info);
}

/// Initialize the logging system with a default level
pub fn init_with_level(level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .is_test(cfg!(test))
        .try_init();
}
