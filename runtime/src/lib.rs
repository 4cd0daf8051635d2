//! # Booth Runtime
//!
//! Executes [`Effect`] descriptions produced by booking operations.
//!
//! Effects are best-effort: each task is spawned onto the tokio runtime, its
//! outcome is logged and counted, and nothing is retried or reported back to
//! the request that produced it. The runner keeps a count of in-flight tasks
//! so the server can drain them on shutdown and tests can wait for them.
//!
//! ## Example
//!
//! ```
//! use booth_core::Effect;
//! use booth_runtime::EffectRunner;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), booth_runtime::RuntimeError> {
//! let runner = EffectRunner::new();
//! runner.dispatch(Effect::task("mail.creation", async { Ok(()) }));
//! runner.wait_idle(Duration::from_secs(1)).await?;
//! assert_eq!(runner.pending(), 0);
//! # Ok(())
//! # }
//! ```

use booth_core::Effect;
use futures::future::{BoxFuture, join_all};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

pub mod metrics;

/// Errors from the effect runner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Effects were still running when the wait expired.
    #[error("timed out with {0} effects still running")]
    ShutdownTimeout(usize),
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Spawns and tracks background effects.
///
/// Cheap to clone; clones share the same pending counter.
#[derive(Clone, Debug, Default)]
pub struct EffectRunner {
    pending: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

impl EffectRunner {
    /// A runner with nothing in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spawned tasks that have not finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Starts `effect` in the background and returns immediately.
    ///
    /// Must be called from within a tokio runtime. After [`shutdown`](Self::shutdown)
    /// has begun, new effects are dropped with a warning.
    pub fn dispatch(&self, effect: Effect) {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!(effects = ?effect.labels(), "Runner shutting down, dropping effects");
            ::metrics::counter!("booth.effects.dropped").increment(1);
            return;
        }

        match effect {
            Effect::None => {},
            Effect::Task { label, future } => {
                let guard = self.track();
                tokio::spawn(
                    async move {
                        let _guard = guard;
                        finish(label, future.await);
                    }
                    .in_current_span(),
                );
            },
            Effect::Parallel(effects) => {
                for effect in effects {
                    self.dispatch(effect);
                }
            },
            Effect::Sequential(effects) => {
                let guard = self.track();
                tokio::spawn(
                    async move {
                        let _guard = guard;
                        run_sequence(effects.into_iter().collect()).await;
                    }
                    .in_current_span(),
                );
            },
        }
    }

    /// Runs `effect` to completion on the caller's task.
    ///
    /// Failures are logged and counted exactly as for [`dispatch`](Self::dispatch);
    /// the return value only tells the caller whether every task succeeded.
    pub async fn run(&self, effect: Effect) -> bool {
        let _guard = self.track();
        run_inline(effect).await
    }

    /// Waits until no effects are in flight.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ShutdownTimeout`] if effects are still running
    /// when `timeout` expires.
    pub async fn wait_idle(&self, timeout: Duration) -> Result<(), RuntimeError> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            let pending = self.pending();
            if pending == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(RuntimeError::ShutdownTimeout(pending));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Stops accepting effects and drains the ones in flight.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ShutdownTimeout`] if the timeout expires before all
    /// pending effects complete.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), RuntimeError> {
        tracing::info!(pending_effects = self.pending(), "Draining background effects");
        self.shutdown.store(true, Ordering::Release);

        match self.wait_idle(timeout).await {
            Ok(()) => {
                tracing::info!("All effects completed, shutdown successful");
                Ok(())
            },
            Err(err) => {
                tracing::error!(error = %err, "Shutdown timeout");
                Err(err)
            },
        }
    }

    fn track(&self) -> AtomicCounterGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        AtomicCounterGuard(Arc::clone(&self.pending))
    }
}

fn finish(label: &'static str, outcome: Result<(), booth_core::EffectError>) -> bool {
    ::metrics::counter!("booth.effects.executed", "label" => label).increment(1);
    match outcome {
        Ok(()) => {
            tracing::debug!(effect = label, "Effect completed");
            true
        },
        Err(error) => {
            ::metrics::counter!("booth.effects.failed", "label" => label).increment(1);
            tracing::warn!(effect = label, %error, "Effect failed");
            false
        },
    }
}

fn run_inline(effect: Effect) -> BoxFuture<'static, bool> {
    Box::pin(async move {
        match effect {
            Effect::None => true,
            Effect::Task { label, future } => finish(label, future.await),
            Effect::Parallel(effects) => join_all(effects.into_iter().map(run_inline))
                .await
                .into_iter()
                .all(|ok| ok),
            Effect::Sequential(effects) => run_sequence(effects.into_iter().collect()).await,
        }
    })
}

async fn run_sequence(effects: Vec<Effect>) -> bool {
    let total = effects.len();
    for (idx, effect) in effects.into_iter().enumerate() {
        if !run_inline(effect).await {
            if idx + 1 < total {
                tracing::debug!(skipped = total - idx - 1, "Sequence stopped after failure");
            }
            return false;
        }
    }
    true
}
