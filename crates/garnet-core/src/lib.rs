//! Garnet VM kernel core
//!
//! The privileged bridge between managed code and the VM's shared
//! structure:
//! - The live class/module graph and its open/create invariants
//! - Method-table mutation (define and attach) with specialization hints
//! - Dispatch caches (global and per-call-site) and per-name invalidation
//! - The privileged ancestor-chain method resolver
//! - The global execution lock that serializes all of the above
//!
//! Process control (fork/exec/wait/exit) builds on this crate from
//! `garnet-posix`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod kernel;
pub mod lock;
pub mod method;
pub mod module;
pub mod objects;
pub mod resolve;
pub mod scope;
pub mod state;
pub mod symbol;
pub mod value;
pub mod worker;

pub use cache::{CacheEntry, DispatchCaches, GlobalDispatchCache, InlineCache, InlineCacheRegistry};
pub use lock::{ExecutionGuard, ExecutionLock};
pub use method::{CompiledCode, Method, MethodEntry, Specialization, Visibility};
pub use module::{InstanceKind, ModuleGraph, ModuleId, ModuleKind};
pub use objects::{ObjectId, ObjectStore};
pub use scope::StaticScope;
pub use state::SharedState;
pub use symbol::{Interner, Symbol};
pub use value::Value;
pub use worker::{CompileWorker, NullCompileWorker};

/// Errors raised by kernel primitives.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A class was reopened with a different superclass
    #[error("superclass mismatch: given {given} but previously set to {existing}")]
    SuperclassMismatch {
        /// Display name of the superclass the caller asked for
        given: String,
        /// Display name of the superclass already in place
        existing: String,
    },

    /// A name was opened that is bound to something else entirely
    #[error("{name} is not a {expected}")]
    WrongConstantKind {
        /// The constant's name
        name: String,
        /// What the open expected the binding to be
        expected: &'static str,
    },
}

/// Result alias for kernel primitives.
pub type KernelResult<T> = Result<T, KernelError>;
