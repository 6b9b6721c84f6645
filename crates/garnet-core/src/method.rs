//! Compiled methods and method-table entries

use crate::module::InstanceKind;
use crate::scope::StaticScope;
use crate::symbol::Symbol;
use parking_lot::Mutex;
use std::sync::Arc;

/// Method visibility inside a method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Callable from anywhere
    #[default]
    Public,
    /// Callable only with an implicit receiver
    Private,
    /// Callable from instances of the defining class and subclasses
    Protected,
}

/// Fast-path hint matched to a class's instance representation.
///
/// Consumed by the execution engine when compiling call sites; a
/// method without a hint simply takes the generic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specialization {
    /// Receiver fields are at fixed slots
    DirectFields,
    /// Receiver is a packed byte buffer
    PackedBytes,
    /// Receiver is an element vector
    Elements,
}

impl Specialization {
    /// The hint for a given instance representation, if one exists.
    pub fn for_kind(kind: InstanceKind) -> Option<Specialization> {
        match kind {
            InstanceKind::Fields => Some(Specialization::DirectFields),
            InstanceKind::Bytes => Some(Specialization::PackedBytes),
            InstanceKind::Elements => Some(Specialization::Elements),
            InstanceKind::Opaque => None,
        }
    }
}

/// Immutable compiled body of a method.
#[derive(Debug)]
pub struct CompiledCode {
    /// Method name as written at the definition site
    pub name: Symbol,
    /// Declared argument count
    pub arity: usize,
    /// Bytecode, owned by the code object
    pub bytecode: Arc<[u8]>,
}

impl CompiledCode {
    /// Create a compiled body.
    pub fn new(name: Symbol, arity: usize, bytecode: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name,
            arity,
            bytecode: bytecode.into(),
        }
    }
}

/// Mutable metadata stamped onto a method when it is bound.
#[derive(Debug, Default)]
pub struct MethodMeta {
    /// Lexical scope the method was defined under
    pub scope: Option<Arc<StaticScope>>,
    /// Redefinition serial; only ever increases across rebinds
    pub serial: u64,
    /// Optional fast-path hint (see [`Specialization`])
    pub specialization: Option<Specialization>,
}

/// A method object: immutable code plus bind-time metadata.
///
/// The same method may be bound into several method tables (normal
/// definition plus `attach` onto singleton classes), so it is shared
/// via `Arc` and the metadata sits behind a lock.
#[derive(Debug)]
pub struct Method {
    /// The compiled body
    pub code: Arc<CompiledCode>,
    /// Bind-time metadata
    pub meta: Mutex<MethodMeta>,
}

impl Method {
    /// Wrap compiled code into an unbound method object.
    pub fn new(code: CompiledCode) -> Arc<Self> {
        Arc::new(Self {
            code: Arc::new(code),
            meta: Mutex::new(MethodMeta::default()),
        })
    }

    /// Current redefinition serial.
    pub fn serial(&self) -> u64 {
        self.meta.lock().serial
    }
}

/// One slot in a module's method table.
///
/// Redefinition replaces the whole entry; entries are never merged.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    /// The bound method
    pub method: Arc<Method>,
    /// Visibility recorded at bind time
    pub visibility: Visibility,
}
