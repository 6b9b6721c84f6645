//! Lexical scopes for class bodies and method definitions
//!
//! A [`StaticScope`] pins a point in the lexical nesting of `class` /
//! `module` bodies. Unqualified opens resolve against the scope's
//! module, and methods keep a reference to their defining scope so
//! constants named in the method body resolve later.

use crate::method::Visibility;
use crate::module::ModuleId;
use std::sync::Arc;

/// One link in the lexical scope chain.
#[derive(Debug)]
pub struct StaticScope {
    /// The module this scope is nested in
    module: ModuleId,
    /// Enclosing scope, `None` at top level
    parent: Option<Arc<StaticScope>>,
    /// Default visibility for methods defined under this scope
    visibility: Visibility,
}

impl StaticScope {
    /// Create a top-level scope for `module`.
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            parent: None,
            visibility: Visibility::Public,
        }
    }

    /// Create a scope for `module` nested inside `parent`.
    pub fn nested(module: ModuleId, parent: Arc<StaticScope>) -> Self {
        Self {
            module,
            parent: Some(parent),
            visibility: Visibility::Public,
        }
    }

    /// Replace the default visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// The module this scope is attached to.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<&Arc<StaticScope>> {
        self.parent.as_ref()
    }

    /// Default visibility for definitions under this scope.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The module a plain `def` inside this scope targets.
    pub fn for_method_definition(&self) -> ModuleId {
        self.module
    }
}
