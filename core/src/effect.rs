//! Side effect descriptions.
//!
//! Booking operations decide *what* should happen after a state change and
//! return it as an [`Effect`] value. The runtime decides *how*: effects are
//! spawned in the background, failures are logged and counted, nothing is
//! retried and nothing flows back to the caller.

use crate::error::{MailError, StoreError};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Failure of a background effect. Only ever logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// Mail provider call failed.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Store write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Boxed task future.
pub type EffectFuture = BoxFuture<'static, Result<(), EffectError>>;

/// Child effects of a composite.
pub type Effects = Vec<Effect>;

/// A description of best-effort work to run after an operation.
pub enum Effect {
    /// Nothing to do.
    None,

    /// One unit of work, identified by a label for logs and metrics.
    Task {
        /// Stable label, e.g. `mail.creation`.
        label: &'static str,
        /// The work.
        future: EffectFuture,
    },

    /// Run children concurrently.
    Parallel(Effects),

    /// Run children in order, stopping at the first failure.
    Sequential(Effects),
}

impl Effect {
    /// Wraps a future as a labelled task.
    pub fn task<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<(), EffectError>> + Send + 'static,
    {
        Self::Task {
            label,
            future: Box::pin(future),
        }
    }

    /// Runs `effects` concurrently. `None`s are dropped and a single survivor is unwrapped.
    pub fn merge(effects: impl IntoIterator<Item = Self>) -> Self {
        Self::collapse(effects, Self::Parallel)
    }

    /// Runs `effects` in order. `None`s are dropped and a single survivor is unwrapped.
    pub fn chain(effects: impl IntoIterator<Item = Self>) -> Self {
        Self::collapse(effects, Self::Sequential)
    }

    fn collapse(effects: impl IntoIterator<Item = Self>, wrap: fn(Effects) -> Self) -> Self {
        let mut children: Effects = effects.into_iter().filter(|e| !e.is_none()).collect();
        match children.len() {
            0 => Self::None,
            1 => children.pop().unwrap_or(Self::None),
            _ => wrap(children),
        }
    }

    /// `true` for [`Effect::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Labels of every task, depth first.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::None => {},
            Self::Task { label, .. } => out.push(*label),
            Self::Parallel(children) | Self::Sequential(children) => {
                for child in children {
                    child.collect_labels(out);
                }
            },
        }
    }
}

// Manual Debug implementation since Future doesn't implement Debug
impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "Effect::None"),
            Self::Task { label, .. } => f.debug_struct("Effect::Task").field("label", label).finish(),
            Self::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Self::Sequential(effects) => f.debug_tuple("Effect::Sequential").field(effects).finish(),
        }
    }
}
