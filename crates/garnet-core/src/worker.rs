//! Background compile worker collaborator
//!
//! The kernel coordinates with an optional background compilation
//! worker around process-control syscalls: forking pauses it, exec
//! shuts its threads down first (exec-family calls are unsafe with
//! multiple threads on some platforms), and a fork child restarts it
//! fresh. The worker itself lives elsewhere; this trait is the seam.

/// Lifecycle hooks the process-control primitives drive.
pub trait CompileWorker: Send + Sync {
    /// Stop picking up new work; in-flight work drains.
    fn pause(&self);

    /// Resume after a pause (fork parent).
    fn unpause(&self);

    /// Tear the worker threads down for good (before exec).
    fn shutdown(&self);

    /// Reinitialize in a fork child: the child inherits no worker
    /// threads, so start over from nothing.
    fn on_fork_child(&self);
}

/// A worker that does nothing, for VMs compiled without background
/// compilation and for tests.
#[derive(Debug, Default)]
pub struct NullCompileWorker;

impl CompileWorker for NullCompileWorker {
    fn pause(&self) {}
    fn unpause(&self) {}
    fn shutdown(&self) {}
    fn on_fork_child(&self) {}
}
