//! Log sink for store lifecycle and failure events
//!
//! The store never installs a global subscriber. Events are emitted through
//! `tracing` macros scoped to the sink's dispatcher, so the host decides where
//! they go (or that they go nowhere).

use std::fmt;
use tracing::{Dispatch, Subscriber};

#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
}

impl LogSink {
    /// A sink that drops every event
    pub fn discard() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Forward to the subscriber that is the default when this is called
    pub fn current() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(|dispatch| dispatch.clone()),
        }
    }

    /// Send events to a specific subscriber
    pub fn new<S>(subscriber: S) -> Self
    where
        S: Subscriber + Send + Sync + 'static,
    {
        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Run `f` with this sink as the default dispatcher
    pub fn emit<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::discard()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

impl From<Dispatch> for LogSink {
    fn from(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }
}
