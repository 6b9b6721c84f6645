//! Dispatch caches and per-name invalidation
//!
//! Two cache layers sit in front of the ancestor-chain resolver: one
//! process-wide cache keyed by (receiver shape, name), and many
//! per-call-site inline caches embedded in compiled code. Both are
//! invalidated per name, never wholesale, so dispatch on unrelated
//! names can proceed concurrently with an invalidation (the one spot
//! where this matters is a background compile thread reading caches
//! while the execution lock is released around a syscall).
//!
//! Filling the caches is the dispatch engine's business; this module
//! owns the invalidation contract only.

use crate::method::Method;
use crate::module::ModuleId;
use crate::symbol::Symbol;
use crossbeam::atomic::AtomicCell;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

/// A cached resolution: the method and the module that defined it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Resolved method
    pub method: Arc<Method>,
    /// Module whose table the method was found in
    pub module: ModuleId,
}

/// Process-wide dispatch cache, (receiver shape, name) → resolution.
///
/// Entries are bucketed per name so clearing one name never touches
/// another.
#[derive(Debug, Default)]
pub struct GlobalDispatchCache {
    buckets: DashMap<Symbol, FxHashMap<ModuleId, CacheEntry>>,
}

impl GlobalDispatchCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached resolution.
    pub fn lookup(&self, shape: ModuleId, name: Symbol) -> Option<CacheEntry> {
        self.buckets.get(&name)?.get(&shape).cloned()
    }

    /// Record a resolution (external fill policy).
    pub fn fill(&self, shape: ModuleId, name: Symbol, entry: CacheEntry) {
        self.buckets.entry(name).or_default().insert(shape, entry);
    }

    /// Drop every entry for `name`. A no-op if none exist.
    pub fn clear(&self, name: Symbol) {
        self.buckets.remove(&name);
    }

    /// Number of cached resolutions for `name`.
    pub fn entries_for(&self, name: Symbol) -> usize {
        self.buckets.get(&name).map_or(0, |b| b.len())
    }
}

/// A per-call-site cache embedded in compiled code.
///
/// The shape check is a lock-free atomic read on the fast path; the
/// resolved method sits behind a lock and is only touched on hit
/// confirmation or refill.
#[derive(Debug)]
pub struct InlineCache {
    name: Symbol,
    shape: AtomicCell<Option<ModuleId>>,
    entry: Mutex<Option<CacheEntry>>,
}

impl InlineCache {
    /// Create an empty cache for calls to `name`.
    pub fn new(name: Symbol) -> Arc<Self> {
        Arc::new(Self {
            name,
            shape: AtomicCell::new(None),
            entry: Mutex::new(None),
        })
    }

    /// The name this call site dispatches.
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// The cached resolution, if still valid for `shape`.
    pub fn load(&self, shape: ModuleId) -> Option<CacheEntry> {
        if self.shape.load() != Some(shape) {
            return None;
        }
        self.entry.lock().clone()
    }

    /// Cache a resolution for `shape`.
    pub fn store(&self, shape: ModuleId, entry: CacheEntry) {
        *self.entry.lock() = Some(entry);
        self.shape.store(Some(shape));
    }

    /// Mark the cache stale; the next dispatch misses and re-resolves.
    pub fn invalidate(&self) {
        self.shape.store(None);
        *self.entry.lock() = None;
    }

    /// Whether the cache currently holds nothing.
    pub fn is_empty(&self) -> bool {
        self.shape.load().is_none()
    }
}

/// Registry of every inline cache in the program, keyed by name.
///
/// Holds weak references only: compiled code owns its caches, and a
/// cache whose code was thrown away is pruned on the next
/// invalidation of its name.
#[derive(Debug, Default)]
pub struct InlineCacheRegistry {
    sites: DashMap<Symbol, Vec<Weak<InlineCache>>>,
}

impl InlineCacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call site for invalidation tracking.
    pub fn register(&self, cache: &Arc<InlineCache>) {
        self.sites
            .entry(cache.name())
            .or_default()
            .push(Arc::downgrade(cache));
    }

    /// Mark stale every live cache for `name`, pruning dead sites.
    pub fn clear(&self, name: Symbol) {
        if let Some(mut sites) = self.sites.get_mut(&name) {
            sites.retain(|weak| match weak.upgrade() {
                Some(cache) => {
                    cache.invalidate();
                    true
                }
                None => false,
            });
        }
    }

    /// Number of tracked (possibly dead) sites for `name`.
    pub fn sites_for(&self, name: Symbol) -> usize {
        self.sites.get(&name).map_or(0, |s| s.len())
    }
}

/// The two cache layers, bundled so invalidation hits both.
#[derive(Debug, Default)]
pub struct DispatchCaches {
    /// Process-wide (shape, name) cache
    pub global: GlobalDispatchCache,
    /// Per-call-site caches
    pub inline: InlineCacheRegistry,
}

impl DispatchCaches {
    /// Create both layers empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every cached resolution for `name` in both layers.
    pub fn invalidate(&self, name: Symbol) {
        self.global.clear(name);
        self.inline.clear(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{CompiledCode, Method};
    use crate::module::ModuleGraph;
    use crate::symbol::Interner;

    fn entry(graph: &ModuleGraph, name: Symbol) -> CacheEntry {
        CacheEntry {
            method: Method::new(CompiledCode::new(name, 0, vec![])),
            module: graph.root(),
        }
    }

    #[test]
    fn test_global_cache_per_name_clear() {
        let mut interner = Interner::new();
        let graph = ModuleGraph::new(&mut interner);
        let size = interner.intern("size");
        let each = interner.intern("each");
        let cache = GlobalDispatchCache::new();

        cache.fill(graph.root(), size, entry(&graph, size));
        cache.fill(graph.root(), each, entry(&graph, each));

        cache.clear(size);
        assert!(cache.lookup(graph.root(), size).is_none());
        assert!(cache.lookup(graph.root(), each).is_some());

        // clearing an absent name is a no-op
        cache.clear(size);
    }

    #[test]
    fn test_inline_cache_shape_check() {
        let mut interner = Interner::new();
        let mut graph = ModuleGraph::new(&mut interner);
        let name = interner.intern("to_s");
        let other_shape = graph.new_class(graph.root());

        let ic = InlineCache::new(name);
        assert!(ic.is_empty());

        ic.store(graph.root(), entry(&graph, name));
        assert!(ic.load(graph.root()).is_some());
        assert!(ic.load(other_shape).is_none());

        ic.invalidate();
        assert!(ic.load(graph.root()).is_none());
    }

    #[test]
    fn test_registry_marks_stale_and_prunes() {
        let mut interner = Interner::new();
        let graph = ModuleGraph::new(&mut interner);
        let name = interner.intern("call");
        let registry = InlineCacheRegistry::new();

        let live = InlineCache::new(name);
        registry.register(&live);
        live.store(graph.root(), entry(&graph, name));

        {
            let dead = InlineCache::new(name);
            registry.register(&dead);
        }
        assert_eq!(registry.sites_for(name), 2);

        registry.clear(name);
        assert!(live.is_empty());
        assert_eq!(registry.sites_for(name), 1);
    }
}
