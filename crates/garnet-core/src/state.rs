//! Process-wide shared VM state
//!
//! All managed state the kernel touches lives in one [`SharedState`]
//! value, injected where it is needed rather than reached through
//! globals. Exactly one exists per process; the execution lock
//! (see [`crate::lock`]) owns it and serializes all access.

use crate::cache::DispatchCaches;
use crate::module::{ModuleGraph, ModuleId};
use crate::objects::{ObjectId, ObjectStore};
use crate::symbol::{Interner, Symbol};
use std::sync::Arc;

/// The shared, mutable heart of the VM.
#[derive(Debug)]
pub struct SharedState {
    /// Name interner
    pub interner: Interner,
    /// The live class/module graph
    pub graph: ModuleGraph,
    /// Object headers (class links, singleton classes)
    pub objects: ObjectStore,
    /// Dispatch caches; `Arc` so compile threads can hold a handle
    /// and read them while the execution lock is released
    pub caches: Arc<DispatchCaches>,
    global_serial: u64,
    fork_generation: u64,
}

impl SharedState {
    /// Create the state for a fresh VM: root object class only, empty
    /// caches, serials at zero.
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let graph = ModuleGraph::new(&mut interner);
        Self {
            interner,
            graph,
            objects: ObjectStore::new(),
            caches: Arc::new(DispatchCaches::new()),
            global_serial: 0,
            fork_generation: 0,
        }
    }

    /// Intern a name.
    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    /// Draw the next value from the monotonically increasing global
    /// serial. Stamped onto method redefinitions and exposed to
    /// managed code for staleness checks.
    pub fn next_serial(&mut self) -> u64 {
        self.global_serial += 1;
        self.global_serial
    }

    /// The generation this process is in: 0 in the original process,
    /// bumped once per fork in each child.
    pub fn fork_generation(&self) -> u64 {
        self.fork_generation
    }

    /// Reinitialize process-local state in a fork child. The class
    /// graph and caches carry over (the address space was duplicated);
    /// only the process identity changes.
    pub fn reinit(&mut self) {
        self.fork_generation += 1;
    }

    /// The receiver's singleton class, created lazily.
    pub fn metaclass_of(&mut self, object: ObjectId) -> ModuleId {
        self.objects.metaclass(&mut self.graph, object)
    }

    /// The receiver's concrete (non-singleton) class.
    pub fn object_class(&self, object: ObjectId) -> ModuleId {
        self.objects.class_of(object)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
