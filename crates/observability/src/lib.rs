//! Process-wide logging setup shared by the binaries.

pub mod tracing;

/// Initialize JSON logging with `RUST_LOG`, falling back to `info`.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Same as [`init`], with the fallback level taken from configuration.
pub fn init_with_level(default_level: &str) {
    tracing::init(default_level);
}
