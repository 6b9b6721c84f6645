//! POSIX process control for the Garnet VM
//!
//! fork/exec/wait/exit primitives, each bracketed by the global
//! execution lock so the VM blocks in a syscall without holding the
//! lock, and coordinated with the background compile worker around
//! fork and exec.

#![warn(rust_2018_idioms)]

pub mod process;

pub use process::{exec, exit, fork, wait_pid, SystemCallError, WaitReply, WaitStatus};
