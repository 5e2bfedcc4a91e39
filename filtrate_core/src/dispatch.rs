//! Validate and sanitize entry points
//!
//! The [`Dispatcher`] resolves a filter and its options, then invokes the
//! filter's operation. Every operation comes in two modes:
//!
//! * immediate: the outcome is returned to the caller;
//! * deferred: the call is queued and its outcome delivered to a completion
//!   callback when the queue is drained with [`Dispatcher::run_pending`].
//!
//! Deferred calls run in the order they were scheduled, never before the
//! scheduling call returns, and at most once. There is no cancellation: a
//! dispatcher drains whatever is still queued when it is dropped. The drain is
//! skipped when the dispatcher is dropped during a panic, so calls still
//! queued at that point never complete.

use std::{cell::RefCell, collections::VecDeque, fmt, sync::Arc};

use serde_json::Value;
use tracing::debug;

use crate::{
    descriptor::{FilterDescriptor, INLINE_FILTER_NAME},
    options::{self, Overrides, ResolvedOptions},
    registry::Registry,
    Result,
};

/// Which filter to run: a registered name or an ad hoc descriptor that
/// bypasses registry lookup.
#[derive(Debug, Clone)]
pub enum FilterTarget {
    Named(String),
    Inline(Arc<FilterDescriptor>),
}

impl FilterTarget {
    fn label(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Inline(_) => INLINE_FILTER_NAME,
        }
    }
}

impl From<&str> for FilterTarget {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for FilterTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<&String> for FilterTarget {
    fn from(name: &String) -> Self {
        Self::Named(name.clone())
    }
}

impl From<FilterDescriptor> for FilterTarget {
    fn from(descriptor: FilterDescriptor) -> Self {
        Self::Inline(Arc::new(descriptor))
    }
}

impl From<Arc<FilterDescriptor>> for FilterTarget {
    fn from(descriptor: Arc<FilterDescriptor>) -> Self {
        Self::Inline(descriptor)
    }
}

type Job<'r> = Box<dyn FnOnce(&Dispatcher<'r>) + 'r>;

pub struct Dispatcher<'r> {
    registry: &'r Registry,
    queue: RefCell<VecDeque<Job<'r>>>,
}

impl<'r> Dispatcher<'r> {
    #[must_use]
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            queue: RefCell::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &'r Registry {
        self.registry
    }

    fn prepare(
        &self,
        target: &FilterTarget,
        overrides: Option<&Overrides>,
    ) -> Result<(Arc<FilterDescriptor>, ResolvedOptions)> {
        let descriptor = match target {
            FilterTarget::Named(name) => self.registry.lookup(name)?,
            FilterTarget::Inline(descriptor) => Arc::clone(descriptor),
        };
        let options = options::resolve(target.label(), descriptor.options(), overrides)?;
        Ok((descriptor, options))
    }

    /// Validate `value` against a filter.
    ///
    /// # Errors
    /// Lookup and option errors, or the filter's own failure as
    /// [`crate::Error::Validation`].
    pub fn validate<T: Into<FilterTarget>>(
        &self,
        value: &Value,
        target: T,
        overrides: Option<&Overrides>,
    ) -> Result<()> {
        let target = target.into();
        let (descriptor, options) = self.prepare(&target, overrides)?;
        debug!(filter = target.label(), "validating value");
        descriptor.validate(value, &options)?;
        Ok(())
    }

    /// Sanitize `value` with a filter. Filters without a sanitize operation
    /// return the value unchanged once it validates.
    ///
    /// # Errors
    /// Lookup and option errors, or the filter's own failure as
    /// [`crate::Error::Validation`].
    pub fn sanitize<T: Into<FilterTarget>>(
        &self,
        value: &Value,
        target: T,
        overrides: Option<&Overrides>,
    ) -> Result<Value> {
        let target = target.into();
        let (descriptor, options) = self.prepare(&target, overrides)?;
        debug!(filter = target.label(), "sanitizing value");
        Ok(descriptor.sanitize(value, &options)?)
    }

    /// Schedule a validation. `on_complete` receives the outcome and the
    /// original value.
    pub fn validate_deferred<T, F>(
        &self,
        value: Value,
        target: T,
        overrides: Option<Overrides>,
        on_complete: F,
    ) where
        T: Into<FilterTarget>,
        F: FnOnce(Result<()>, Value) + 'r,
    {
        let target = target.into();
        let job: Job<'r> = Box::new(move |dispatcher: &Dispatcher<'r>| {
            let outcome = dispatcher.validate(&value, target, overrides.as_ref());
            on_complete(outcome, value);
        });
        self.schedule(job);
    }

    /// Schedule a sanitization. `on_complete` receives the sanitized value
    /// (or the failure) and the original value.
    pub fn sanitize_deferred<T, F>(
        &self,
        value: Value,
        target: T,
        overrides: Option<Overrides>,
        on_complete: F,
    ) where
        T: Into<FilterTarget>,
        F: FnOnce(Result<Value>, Value) + 'r,
    {
        let target = target.into();
        let job: Job<'r> = Box::new(move |dispatcher: &Dispatcher<'r>| {
            let outcome = dispatcher.sanitize(&value, target, overrides.as_ref());
            on_complete(outcome, value);
        });
        self.schedule(job);
    }

    fn schedule(&self, job: Job<'r>) {
        self.queue.borrow_mut().push_back(job);
    }

    /// Number of scheduled calls not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run scheduled calls in FIFO order until the queue is empty, including
    /// calls scheduled while draining. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // the borrow must end before the job runs so it can schedule more
            let next = self.queue.borrow_mut().pop_front();
            let Some(job) = next else {
                break;
            };
            job(self);
            ran += 1;
        }
        ran
    }
}

impl Drop for Dispatcher<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            debug!(
                skipped = self.pending(),
                "dropped while panicking, deferred calls not run"
            );
            return;
        }
        let ran = self.run_pending();
        if ran > 0 {
            debug!(ran, "drained deferred calls on drop");
        }
    }
}

impl fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", self.registry)
            .field("pending", &self.pending())
            .finish()
    }
}
