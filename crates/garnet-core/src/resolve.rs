//! Privileged ancestor-chain method lookup
//!
//! The read path behind `find_method`: walk from the receiver's lookup
//! origin (singleton class first if one exists) up the superclass
//! chain. This entry point is privileged, so visibility is not
//! checked; private methods are found like any other. Cache fill is
//! the dispatch engine's policy, not this walk's.

use crate::method::Method;
use crate::module::ModuleId;
use crate::objects::ObjectId;
use crate::state::SharedState;
use crate::symbol::Symbol;
use std::sync::Arc;

/// Resolve `name` on `receiver`, walking the full ancestor chain.
///
/// Returns the method and the module whose table defined it, or `None`
/// if no ancestor binds the name.
pub fn find_method(
    state: &SharedState,
    receiver: ObjectId,
    name: Symbol,
) -> Option<(Arc<Method>, ModuleId)> {
    let mut current = Some(state.objects.lookup_origin(receiver));
    while let Some(module) = current {
        if let Some(entry) = state.graph.method(module, name) {
            return Some((entry.method.clone(), module));
        }
        current = state.graph.superclass(module);
    }
    None
}
