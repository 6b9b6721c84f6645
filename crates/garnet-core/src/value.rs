//! Managed values as seen by the kernel
//!
//! The kernel only needs to distinguish the handful of shapes that can
//! sit in a constant table or act as a dispatch receiver; the full
//! boxed object representation lives with the object-model
//! collaborator.

use crate::module::ModuleId;
use crate::objects::ObjectId;
use crate::symbol::Symbol;

/// A managed value reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// The nil singleton
    Nil,
    /// Boolean
    Bool(bool),
    /// Small integer
    Int(i64),
    /// Interned symbol
    Symbol(Symbol),
    /// A class or module
    Module(ModuleId),
    /// A plain heap object
    Object(ObjectId),
}

impl Value {
    /// Whether this is the nil singleton.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The module/class id, if this value is one.
    pub fn as_module(&self) -> Option<ModuleId> {
        match self {
            Value::Module(id) => Some(*id),
            _ => None,
        }
    }
}
