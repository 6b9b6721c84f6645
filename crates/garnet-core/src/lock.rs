//! The global execution lock
//!
//! One coarse mutex serializes every touch of managed state; at most
//! one thread runs managed code at a time. The lock owns the
//! [`SharedState`] outright, so holding the guard *is* the permission
//! to mutate.
//!
//! The only suspension points are the explicit brackets around
//! blocking syscalls: [`ExecutionGuard::unlocked`] releases the lock
//! for the duration of a closure and reacquires it on every exit path,
//! panics included. The lock is plain process-local memory with no
//! state shared across processes, so after `fork(2)` the parent and
//! the child each reacquire their own independent copy.

use crate::state::SharedState;
use parking_lot::{Mutex, MutexGuard};

/// The giant lock wrapping the VM's shared state.
#[derive(Debug, Default)]
pub struct ExecutionLock {
    inner: Mutex<SharedState>,
}

impl ExecutionLock {
    /// Wrap freshly initialized state.
    pub fn new(state: SharedState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Acquire the lock, blocking until it is free.
    pub fn lock(&self) -> ExecutionGuard<'_> {
        ExecutionGuard {
            inner: self.inner.lock(),
        }
    }
}

/// Proof of holding the execution lock; derefs to the shared state.
#[derive(Debug)]
pub struct ExecutionGuard<'a> {
    inner: MutexGuard<'a, SharedState>,
}

impl ExecutionGuard<'_> {
    /// Release the lock for the duration of `f`, reacquiring it before
    /// returning. This is the one sanctioned way to block in a
    /// syscall: the closure must not touch managed state.
    pub fn unlocked<T>(&mut self, f: impl FnOnce() -> T) -> T {
        MutexGuard::unlocked(&mut self.inner, f)
    }
}

impl std::ops::Deref for ExecutionGuard<'_> {
    type Target = SharedState;

    fn deref(&self) -> &SharedState {
        &self.inner
    }
}

impl std::ops::DerefMut for ExecutionGuard<'_> {
    fn deref_mut(&mut self) -> &mut SharedState {
        &mut self.inner
    }
}
