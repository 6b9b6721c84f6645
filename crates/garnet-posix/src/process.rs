//! fork, exec, wait, exit
//!
//! The syscalls are run through [`ExecutionGuard::unlocked`], so the
//! lock is released only for the call itself and reliably reacquired
//! on every exit path (the EINTR retry loop in [`wait_pid`] included).
//! fork is the one operation that ends with two independent lock
//! holders; the lock is process-local memory, so parent and child each
//! reacquire their own copy.

use garnet_core::lock::ExecutionGuard;
use garnet_core::worker::CompileWorker;
use std::convert::Infallible;
use std::ffi::CString;
use std::io;
use std::os::raw::c_char;
use std::ptr;

/// A syscall failed; carries the call name and the errno context.
#[derive(Debug, thiserror::Error)]
#[error("{call} failed: {source}")]
pub struct SystemCallError {
    /// The syscall that failed, e.g. `"fork(2)"`
    pub call: &'static str,
    /// The underlying OS error
    #[source]
    pub source: io::Error,
}

impl SystemCallError {
    fn last(call: &'static str) -> Self {
        Self {
            call,
            source: io::Error::last_os_error(),
        }
    }

    fn invalid(call: &'static str, message: &'static str) -> Self {
        Self {
            call,
            source: io::Error::new(io::ErrorKind::InvalidInput, message),
        }
    }

    /// The raw errno, if the failure came from the OS.
    pub fn errno(&self) -> Option<i32> {
        self.source.raw_os_error()
    }
}

/// How a waited-on child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// Normal exit with this code
    Exited(i32),
    /// Terminated some other way (signal, stop); not decoded here
    Unknown,
}

/// Outcome of a [`wait_pid`] call. The soft outcomes are sentinels,
/// deliberately not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReply {
    /// No such child to wait for (ECHILD)
    NoChild,
    /// `no_hang` was set and no child has changed state yet
    Pending,
    /// The requested child's status
    Status(WaitStatus),
    /// An any-child selector reaped this concrete pid
    Reaped(WaitStatus, i32),
}

/// Fork the process.
///
/// The compile worker is paused, the execution lock released around
/// `fork(2)`, and both resulting processes reacquire their own copy of
/// the lock. The child reinitializes process-local shared state and
/// restarts its worker from nothing; the parent unpauses its worker.
///
/// Returns the child's pid in the parent and 0 in the child.
pub fn fork(
    guard: &mut ExecutionGuard<'_>,
    worker: &dyn CompileWorker,
) -> Result<i32, SystemCallError> {
    worker.pause();

    let pid = guard.unlocked(|| unsafe { libc::fork() });

    if pid == 0 {
        guard.reinit();
        worker.on_fork_child();
    } else {
        worker.unpause();
    }

    if pid == -1 {
        return Err(SystemCallError::last("fork(2)"));
    }

    Ok(pid)
}

/// Replace the process image.
///
/// The compile worker is shut down first (exec-family calls are unsafe
/// with multiple threads on some platforms). Each argument is
/// duplicated into the argv vector; an empty `args` still produces an
/// argv of the program name followed by the terminating NUL pointer.
/// On success this never returns; on failure the errno is wrapped in a
/// [`SystemCallError`]. An argument with an embedded NUL byte is a
/// caller error and is rejected before the syscall.
pub fn exec(
    worker: &dyn CompileWorker,
    path: &str,
    args: &[String],
) -> Result<Infallible, SystemCallError> {
    worker.shutdown();

    let path_c = CString::new(path)
        .map_err(|_| SystemCallError::invalid("execvp(2)", "path contains a NUL byte"))?;

    let mut argv_owned: Vec<CString> = Vec::with_capacity(args.len().max(1));
    if args.is_empty() {
        argv_owned.push(path_c.clone());
    } else {
        for arg in args {
            argv_owned.push(CString::new(arg.as_str()).map_err(|_| {
                SystemCallError::invalid("execvp(2)", "argument contains a NUL byte")
            })?);
        }
    }

    // execvp requires a NULL as the last element
    let mut argv: Vec<*const c_char> = argv_owned.iter().map(|a| a.as_ptr()).collect();
    argv.push(ptr::null());

    unsafe { libc::execvp(path_c.as_ptr(), argv.as_ptr()) };

    // execvp returning at all means it failed
    Err(SystemCallError::last("execvp(2)"))
}

/// Wait for a child process.
///
/// Loops on `waitpid(2)`, releasing the execution lock only around the
/// syscall; EINTR retries. ECHILD is the [`WaitReply::NoChild`]
/// sentinel, not an error, and unrecognized errnos collapse to the
/// same sentinel. With `no_hang` set, an un-exited child yields
/// [`WaitReply::Pending`]. A normal exit decodes to its status; any
/// other termination is [`WaitStatus::Unknown`]. When `pid` selects
/// any child (0 or negative), the reply also names the reaped pid.
pub fn wait_pid(guard: &mut ExecutionGuard<'_>, pid: i32, no_hang: bool) -> WaitReply {
    let options = if no_hang { libc::WNOHANG } else { 0 };

    loop {
        let mut status: libc::c_int = 0;
        let reaped = guard.unlocked(|| unsafe { libc::waitpid(pid, &mut status, options) });

        if reaped == -1 {
            match io::Error::last_os_error().raw_os_error() {
                Some(libc::EINTR) => continue,
                Some(libc::ECHILD) => return WaitReply::NoChild,
                _ => return WaitReply::NoChild,
            }
        }

        if no_hang && reaped == 0 {
            return WaitReply::Pending;
        }

        let decoded = if libc::WIFEXITED(status) {
            WaitStatus::Exited(libc::WEXITSTATUS(status))
        } else {
            WaitStatus::Unknown
        };

        return if pid > 0 {
            WaitReply::Status(decoded)
        } else {
            WaitReply::Reaped(decoded, reaped)
        };
    }
}

/// Shut the whole VM down with `code`. Never returns.
pub fn exit(code: i32) -> ! {
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_call_error_carries_errno() {
        let err = SystemCallError {
            call: "fork(2)",
            source: io::Error::from_raw_os_error(libc::EAGAIN),
        };
        assert_eq!(err.errno(), Some(libc::EAGAIN));
        assert!(err.to_string().contains("fork(2)"));
    }

    #[test]
    fn test_exec_rejects_embedded_nul() {
        let worker = garnet_core::NullCompileWorker;
        let err = exec(&worker, "bad\0path", &[]).unwrap_err();
        assert_eq!(err.errno(), None);

        let err = exec(&worker, "/bin/echo", &["a\0b".to_string()]).unwrap_err();
        assert_eq!(err.errno(), None);
    }
}
