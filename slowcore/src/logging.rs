//! Logging setup shared by slow apps
//!
//! Everything logs through the `log` facade. `RUST_LOG` overrides the
//! default `info` filter, e.g. `RUST_LOG=sloweyes=debug`.

/// Install `env_logger` as the global logger. Safe to call more than once;
/// only the first call has any effect.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
