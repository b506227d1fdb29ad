//! Shared fixtures for the `dagrun` integration tests.
//!
//! - [`builders`]: registries of scripted tasks over `serde_json::Value`.
//! - [`fake_work`]: the scripted work functions themselves.
//! - [`recorder`]: the dispatch log every fixture writes to.

pub mod builders;
pub mod fake_work;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

/// Engine events worth seeing when a test fails; everything else at `warn`.
const DEFAULT_TEST_FILTER: &str = "warn,dagrun=debug";

/// Upper bound for a single run in tests. Runs that stall are bugs.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `--nocapture`). `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(RUN_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("run did not finish within {RUN_TIMEOUT:?}"))
}
