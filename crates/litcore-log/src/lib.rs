// Re-export logging functions for convenience.
pub use log::*;

/// Initializes logging for binaries and tests. Should be called before any
/// other logging calls. Safe to call more than once; later calls are no-ops.
pub fn init(filter: LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(filter)
        .is_test(cfg!(test))
        .try_init();
}
