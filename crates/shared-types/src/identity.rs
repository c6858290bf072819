//! # Caller Identity
//!
//! Resolves which partition issued the request currently being served.
//!
//! The dispatcher that decodes requests is the sole authority on identity.
//! Request payloads never carry an owner field; handlers ask a
//! [`CallerIdentity`] instead.

use crate::entities::PartitionId;
use crate::errors::IdentityError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::{self, ThreadId};

/// Source of the current caller's partition id.
pub trait CallerIdentity: Send + Sync {
    /// Returns the partition that issued the in-flight request.
    fn caller(&self) -> Result<PartitionId, IdentityError>;
}

/// Identity that always reports the same partition.
///
/// Used by single-client hosts and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedCaller(PartitionId);

impl FixedCaller {
    /// Creates an identity bound to `partition`.
    pub fn new(partition: PartitionId) -> Self {
        Self(partition)
    }
}

impl CallerIdentity for FixedCaller {
    fn caller(&self) -> Result<PartitionId, IdentityError> {
        if self.0 == PartitionId::NONE {
            return Err(IdentityError::ReservedIdentity(self.0.get()));
        }
        Ok(self.0)
    }
}

/// Identity recorded by the dispatcher for each worker thread.
///
/// The dispatcher calls [`DispatchedCaller::bind`] before handing a decoded
/// request to the service; the binding is cleared when the returned guard is
/// dropped. Bindings are per thread, so concurrent workers never observe each
/// other's caller. A nested bind shadows the outer one until its guard drops.
#[derive(Debug, Default)]
pub struct DispatchedCaller {
    bindings: Mutex<HashMap<ThreadId, PartitionId>>,
}

impl DispatchedCaller {
    /// Creates a dispatcher identity with no bound callers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `partition` to the current thread until the guard is dropped.
    pub fn bind(&self, partition: PartitionId) -> CallerBinding<'_> {
        let thread = thread::current().id();
        let previous = self.bindings.lock().insert(thread, partition);
        CallerBinding {
            owner: self,
            thread,
            previous,
        }
    }

    /// Number of threads currently serving a request.
    pub fn active_bindings(&self) -> usize {
        self.bindings.lock().len()
    }

    fn restore(&self, thread: ThreadId, previous: Option<PartitionId>) {
        let mut bindings = self.bindings.lock();
        match previous {
            Some(partition) => {
                bindings.insert(thread, partition);
            }
            None => {
                bindings.remove(&thread);
            }
        }
    }
}

impl CallerIdentity for DispatchedCaller {
    fn caller(&self) -> Result<PartitionId, IdentityError> {
        let partition = self
            .bindings
            .lock()
            .get(&thread::current().id())
            .copied()
            .ok_or(IdentityError::NoCaller)?;
        if partition == PartitionId::NONE {
            return Err(IdentityError::ReservedIdentity(partition.get()));
        }
        Ok(partition)
    }
}

/// Guard returned by [`DispatchedCaller::bind`].
#[must_use = "the caller is unbound as soon as the guard is dropped"]
pub struct CallerBinding<'a> {
    owner: &'a DispatchedCaller,
    thread: ThreadId,
    previous: Option<PartitionId>,
}

impl Drop for CallerBinding<'_> {
    fn drop(&mut self) {
        self.owner.restore(self.thread, self.previous);
    }
}

impl<T: CallerIdentity + ?Sized> CallerIdentity for std::sync::Arc<T> {
    fn caller(&self) -> Result<PartitionId, IdentityError> {
        (**self).caller()
    }
}
