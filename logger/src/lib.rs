//! Logging setup shared by binaries and tests.
//!
//! Every function may be called repeatedly; only the first call installs
//! the logger, later calls are no-ops. This lets each test call
//! [`setup()`] without coordinating with the others.

use {
    env_logger::{Builder, Env, Target},
    std::io::Write,
};

const DEFAULT_FILTER: &str = "error";

/// Install a logger honoring `RUST_LOG`, falling back to errors only.
pub fn setup() {
    setup_with_default(DEFAULT_FILTER);
}

/// Install a logger honoring `RUST_LOG`, falling back to `filter`.
pub fn setup_with_default(filter: &str) {
    init(Builder::from_env(Env::default().default_filter_or(filter)));
}

/// Install a logger with `filter`, ignoring `RUST_LOG`.
pub fn setup_with(filter: &str) {
    let mut builder = Builder::new();
    builder.parse_filters(filter);
    init(builder);
}

fn init(mut builder: Builder) {
    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.module_path().unwrap_or_default(),
                record.args()
            )
        })
        .is_test(cfg!(test));
    // Already installed by an earlier call.
    let _ = builder.try_init();
}
