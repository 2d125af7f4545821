//! Shared provider traits for dependency injection.
//!
//! This module contains common traits used across the codebase to enable
//! testability through dependency injection. Retry loops wait between
//! attempts through [`Sleeper`], so tests can observe backoff delays without
//! actually sleeping.

use std::time::Duration;

use async_trait::async_trait;

/// Trait for waiting between retry attempts.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reposeed::providers::{Sleeper, TokioSleeper};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let sleeper = TokioSleeper;
/// sleeper.sleep(Duration::from_millis(1)).await;
/// # }
/// ```
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Default sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
