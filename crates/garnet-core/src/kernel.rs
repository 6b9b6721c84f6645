//! The privileged kernel primitive surface
//!
//! These are the operations the VM exposes to managed code for
//! mutating the class/module graph and keeping dispatch caches
//! coherent: the machinery behind `class`/`module`/`def` statements
//! and the reflective primitives. Process control lives in the
//! companion posix crate.
//!
//! All of these take the shared state directly; callers hold the
//! execution lock (the guard derefs to [`SharedState`]), so no
//! operation here needs further locking.

use crate::method::{Method, MethodEntry, Specialization, Visibility};
use crate::module::ModuleId;
use crate::objects::ObjectId;
use crate::scope::StaticScope;
use crate::state::SharedState;
use crate::symbol::Symbol;
use crate::value::Value;
use crate::{KernelError, KernelResult};
use std::sync::Arc;

pub use crate::resolve::find_method;

/// Create or fetch the class `name` under the scope's module (the
/// root namespace when `scope` is absent).
///
/// See [`open_class_under`] for the superclass invariant.
pub fn open_class(
    state: &mut SharedState,
    name: Symbol,
    superclass: Option<ModuleId>,
    scope: Option<&StaticScope>,
) -> KernelResult<ModuleId> {
    let under = scope.map_or(state.graph.root(), |s| s.module());
    open_class_under(state, name, superclass, under)
}

/// Create or fetch the class `name` in the namespace `under`.
///
/// An existing binding is returned unchanged when no superclass is
/// given or the given superclass is identical to the current one; a
/// conflicting superclass is rejected without mutating anything. A new
/// class defaults its superclass to the root object class, is named
/// (bare under the root namespace, qualified elsewhere), bound into
/// `under`'s constant table, and appended to the superclass's subclass
/// registry.
pub fn open_class_under(
    state: &mut SharedState,
    name: Symbol,
    superclass: Option<ModuleId>,
    under: ModuleId,
) -> KernelResult<ModuleId> {
    if let Some(value) = state.graph.get_const(under, name) {
        let existing = match value {
            Value::Module(id) if state.graph.is_class(id) => id,
            _ => {
                return Err(KernelError::WrongConstantKind {
                    name: state.interner.resolve(name).to_string(),
                    expected: "class",
                })
            }
        };

        let Some(given) = superclass else {
            return Ok(existing);
        };
        let current = state.graph.superclass(existing);
        if current != Some(given) {
            return Err(KernelError::SuperclassMismatch {
                given: state.graph.display_name(given).to_string(),
                existing: current
                    .map(|id| state.graph.display_name(id).to_string())
                    .unwrap_or_else(|| "<root>".to_string()),
            });
        }
        return Ok(existing);
    }

    let superclass = superclass.unwrap_or(state.graph.root());
    let class = state.graph.new_class(superclass);
    let name_str = state.interner.resolve(name).to_string();
    state.graph.set_name(class, under, &name_str);
    state.graph.set_const(under, name, Value::Module(class));
    Ok(class)
}

/// Create or fetch the module `name` under the scope's module (the
/// root namespace when `scope` is absent).
pub fn open_module(
    state: &mut SharedState,
    name: Symbol,
    scope: Option<&StaticScope>,
) -> KernelResult<ModuleId> {
    let under = scope.map_or(state.graph.root(), |s| s.module());
    open_module_under(state, name, under)
}

/// Create or fetch the module `name` in the namespace `under`.
///
/// A name already bound to any module-like object (a class is a
/// module) is returned as-is; there is no superclass invariant.
pub fn open_module_under(
    state: &mut SharedState,
    name: Symbol,
    under: ModuleId,
) -> KernelResult<ModuleId> {
    if let Some(value) = state.graph.get_const(under, name) {
        return match value {
            Value::Module(id) => Ok(id),
            _ => Err(KernelError::WrongConstantKind {
                name: state.interner.resolve(name).to_string(),
                expected: "module",
            }),
        };
    }

    let module = state.graph.new_module();
    let name_str = state.interner.resolve(name).to_string();
    state.graph.set_name(module, under, &name_str);
    state.graph.set_const(under, name, Value::Module(module));
    Ok(module)
}

/// The receiver's singleton class, created lazily by the object store.
pub fn metaclass_of(state: &mut SharedState, receiver: ObjectId) -> ModuleId {
    state.metaclass_of(receiver)
}

/// The receiver's concrete (non-singleton) class.
pub fn object_class(state: &SharedState, receiver: ObjectId) -> ModuleId {
    state.object_class(receiver)
}

fn bind_method(
    state: &mut SharedState,
    target: ModuleId,
    name: Symbol,
    method: &Arc<Method>,
    scope: Arc<StaticScope>,
    visibility: Visibility,
    specialize: bool,
) {
    let serial = state.next_serial();
    {
        let mut meta = method.meta.lock();
        meta.scope = Some(scope);
        meta.serial = serial;
        if specialize {
            // hint only exists for representations the engine knows
            meta.specialization = state
                .graph
                .instance_kind(target)
                .and_then(Specialization::for_kind);
        }
    }
    state.graph.set_method(
        target,
        name,
        MethodEntry {
            method: method.clone(),
            visibility,
        },
    );
}

/// Bind `method` as `name` in the scope's definition module.
///
/// Stamps the defining scope and a fresh redefinition serial onto the
/// method, and, when the target is a concrete class, offers the method
/// for specialization against the class's instance representation.
/// Replaces any prior binding of `name` in that table; the caller must
/// follow a replacement with [`reset_method_cache`] to keep dispatch
/// coherent.
pub fn add_method(
    state: &mut SharedState,
    name: Symbol,
    method: Arc<Method>,
    scope: Arc<StaticScope>,
    visibility: Visibility,
) -> Arc<Method> {
    let target = scope.for_method_definition();
    let specialize = state.graph.is_class(target);
    bind_method(state, target, name, &method, scope, visibility, specialize);
    method
}

/// Bind `method` as `name` directly on `receiver`'s singleton class.
///
/// Identical binding semantics to [`add_method`] but never requests
/// specialization. The same cache-invalidation contract applies.
pub fn attach_method(
    state: &mut SharedState,
    name: Symbol,
    method: Arc<Method>,
    scope: Arc<StaticScope>,
    receiver: ObjectId,
) -> Arc<Method> {
    let target = state.metaclass_of(receiver);
    bind_method(
        state,
        target,
        name,
        &method,
        scope,
        Visibility::Public,
        false,
    );
    method
}

/// Clear every cached dispatch resolution for `name`: the global
/// cache's bucket and every inline cache in compiled code. Returns
/// `name` as acknowledgment.
pub fn reset_method_cache(state: &SharedState, name: Symbol) -> Symbol {
    state.caches.invalidate(name);
    name
}

/// Bump and return the global serial.
pub fn inc_global_serial(state: &mut SharedState) -> u64 {
    state.next_serial()
}

/// Write a diagnostic line to stderr.
pub fn write_error(message: &str) {
    eprintln!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::CompiledCode;

    fn method(state: &mut SharedState, name: &str) -> (Symbol, Arc<Method>) {
        let sym = state.intern(name);
        (sym, Method::new(CompiledCode::new(sym, 0, vec![])))
    }

    #[test]
    fn test_open_class_idempotent() {
        let mut state = SharedState::new();
        let name = state.intern("Foo");

        let first = open_class(&mut state, name, None, None).unwrap();
        let second = open_class(&mut state, name, None, None).unwrap();

        assert_eq!(first, second);
        assert_eq!(state.graph.display_name(first), "Foo");
        assert_eq!(state.graph.superclass(first), Some(state.graph.root()));
    }

    #[test]
    fn test_open_class_identical_superclass_ok() {
        let mut state = SharedState::new();
        let bar_sym = state.intern("Bar");
        let bar = open_class(&mut state, bar_sym, None, None).unwrap();
        let name = state.intern("Foo");

        let foo = open_class(&mut state, name, Some(bar), None).unwrap();
        let again = open_class(&mut state, name, Some(bar), None).unwrap();
        assert_eq!(foo, again);
    }

    #[test]
    fn test_superclass_mismatch_leaves_binding() {
        let mut state = SharedState::new();
        let bar_sym = state.intern("Bar");
        let baz_sym = state.intern("Baz");
        let bar = open_class(&mut state, bar_sym, None, None).unwrap();
        let baz = open_class(&mut state, baz_sym, None, None).unwrap();
        let name = state.intern("Foo");
        let foo = open_class(&mut state, name, Some(bar), None).unwrap();

        let err = open_class(&mut state, name, Some(baz), None).unwrap_err();
        match err {
            KernelError::SuperclassMismatch { given, existing } => {
                assert_eq!(given, "Baz");
                assert_eq!(existing, "Bar");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // prior state intact
        assert_eq!(state.graph.superclass(foo), Some(bar));
        let rebound = open_class(&mut state, name, None, None).unwrap();
        assert_eq!(rebound, foo);
    }

    #[test]
    fn test_open_class_wrong_constant_kind() {
        let mut state = SharedState::new();
        let name = state.intern("MAX");
        let root = state.graph.root();
        state.graph.set_const(root, name, Value::Int(42));

        let err = open_class(&mut state, name, None, None).unwrap_err();
        assert!(matches!(err, KernelError::WrongConstantKind { .. }));
        // binding untouched
        assert_eq!(state.graph.get_const(root, name), Some(Value::Int(42)));
    }

    #[test]
    fn test_open_module_idempotent_and_accepts_class() {
        let mut state = SharedState::new();
        let name = state.intern("Kernel");
        let first = open_module(&mut state, name, None).unwrap();
        let second = open_module(&mut state, name, None).unwrap();
        assert_eq!(first, second);

        // a class is a module; reopening it as a module yields it
        let cname = state.intern("Foo");
        let class = open_class(&mut state, cname, None, None).unwrap();
        assert_eq!(open_module(&mut state, cname, None).unwrap(), class);
    }

    #[test]
    fn test_nested_open_qualified_name() {
        let mut state = SharedState::new();
        let outer_sym = state.intern("Outer");
        let inner_sym = state.intern("Inner");
        let outer = open_module(&mut state, outer_sym, None).unwrap();
        let scope = StaticScope::new(outer);
        let inner = open_class(&mut state, inner_sym, None, Some(&scope)).unwrap();

        assert_eq!(state.graph.display_name(inner), "Outer::Inner");
        // bound under Outer, not under the root
        let inner_sym = state.intern("Inner");
        assert!(state.graph.get_const(outer, inner_sym).is_some());
        assert!(state.graph.get_const(state.graph.root(), inner_sym).is_none());
    }

    #[test]
    fn test_add_method_stamps_scope_serial_and_hint() {
        let mut state = SharedState::new();
        let foo_sym = state.intern("Foo");
        let class = open_class(&mut state, foo_sym, None, None).unwrap();
        let scope = Arc::new(StaticScope::new(class));
        let (name, m) = method(&mut state, "size");

        let bound = add_method(&mut state, name, m, scope.clone(), Visibility::Public);

        let meta = bound.meta.lock();
        assert!(meta.scope.is_some());
        assert!(meta.serial > 0);
        assert_eq!(meta.specialization, Some(Specialization::DirectFields));
        drop(meta);

        assert!(state.graph.method(class, name).is_some());
    }

    #[test]
    fn test_redefinition_serial_increases() {
        let mut state = SharedState::new();
        let foo_sym = state.intern("Foo");
        let class = open_class(&mut state, foo_sym, None, None).unwrap();
        let scope = Arc::new(StaticScope::new(class));
        let (name, first) = method(&mut state, "size");
        let (_, second) = method(&mut state, "size");

        add_method(&mut state, name, first.clone(), scope.clone(), Visibility::Public);
        add_method(&mut state, name, second.clone(), scope, Visibility::Public);

        assert!(second.serial() > first.serial());
        let entry = state.graph.method(class, name).unwrap();
        assert!(Arc::ptr_eq(&entry.method, &second));
    }

    #[test]
    fn test_add_method_on_module_skips_specialization() {
        let mut state = SharedState::new();
        let kernel_sym = state.intern("Kernel");
        let module = open_module(&mut state, kernel_sym, None).unwrap();
        let scope = Arc::new(StaticScope::new(module));
        let (name, m) = method(&mut state, "puts");

        let bound = add_method(&mut state, name, m, scope, Visibility::Private);
        assert_eq!(bound.meta.lock().specialization, None);

        let entry = state.graph.method(module, name).unwrap();
        assert_eq!(entry.visibility, Visibility::Private);
    }

    #[test]
    fn test_attach_method_targets_singleton() {
        let mut state = SharedState::new();
        let root = state.graph.root();
        let obj = state.objects.alloc(root);
        let scope = Arc::new(StaticScope::new(root));
        let (name, m) = method(&mut state, "special");

        let bound = attach_method(&mut state, name, m, scope, obj);

        let singleton = state.metaclass_of(obj);
        assert!(state.graph.method(singleton, name).is_some());
        // never lands in the concrete class's table
        assert!(state.graph.method(root, name).is_none());
        assert_eq!(bound.meta.lock().specialization, None);
    }

    #[test]
    fn test_reset_method_cache_returns_name() {
        let mut state = SharedState::new();
        let name = state.intern("size");
        assert_eq!(reset_method_cache(&state, name), name);
    }
}
