// tests/admission/main.rs

mod cleanup_tests;
mod leaky_bucket_tests;
mod sliding_window_tests;

// Re-export common test utilities
pub use fixtures::test_clock::TestClock;

// Install a subscriber once so RUST_LOG=admission_gate=debug shows library events
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
