//! Shared fixtures for assetdag's integration tests.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use assetdag::logging::LOG_ENV_VAR;
use tracing_subscriber::{fmt, EnvFilter};

pub use builders::{ConfigBuilder, TempProject};
pub use fake_executor::FakeExecutor;

/// Upper bound for a whole pipeline run in tests. Unoptimized builds of the
/// transform crates are slow, so this is generous.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(60);

static INIT: Once = Once::new();

/// Route tracing into the test harness's captured output.
///
/// Filtered by `ASSETDAG_LOG` (default `info`); shown only for failing tests
/// unless run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Await `f`, panicking if it outlives [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("test run exceeded {RUN_TIMEOUT:?}"),
    }
}
