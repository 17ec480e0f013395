#![deny(unsafe_code)]

//! Shared test utilities for the reposum workspace.
//!
//! Provides reusable fixtures, config builders, in-memory fakes for the
//! network-facing traits, and tracing helpers so that individual crate tests
//! stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! reposum-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod config_file;
pub mod fakes;
pub mod tracing_setup;

pub use config::TestConfigBuilder;
pub use config_file::TestConfigFile;
pub use fakes::{FakeLlm, FakeRepoSource, fake_summarizer};
pub use tracing_setup::init_test_tracing;
