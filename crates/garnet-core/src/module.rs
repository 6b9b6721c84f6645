//! The live class/module graph
//!
//! All modules and classes are owned by the [`ModuleGraph`] slab and
//! addressed by [`ModuleId`]. Ids are plain indices: holding one never
//! keeps anything alive or owned, which is exactly what the subclass
//! back-registry needs. Nothing is ever removed from the graph; a
//! module created here lives for the rest of the process.
//!
//! The graph itself enforces only structural bookkeeping (superclass
//! links, subclass registry, constant and method tables). The
//! create-or-fetch open semantics and their invariants live in
//! [`crate::kernel`].

use crate::method::MethodEntry;
use crate::objects::ObjectId;
use crate::symbol::{Interner, Symbol};
use crate::value::Value;
use rustc_hash::FxHashMap;

/// Index of a module or class in the graph (non-owning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Instance representation tag of a class.
///
/// Decides the memory layout of instances and thereby which
/// [`crate::method::Specialization`] hint applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    /// Fixed field slots (the default object layout)
    Fields,
    /// Packed byte storage (strings, byte arrays)
    Bytes,
    /// Variable-length element storage (arrays, tuples)
    Elements,
    /// Layout not visible to the engine
    Opaque,
}

/// What sort of namespace a graph entry is.
#[derive(Debug)]
pub enum ModuleKind {
    /// A plain module: namespace plus method table, no superclass
    Module,
    /// A class: exactly one superclass (`None` only for the root)
    Class {
        /// Superclass link; `None` only for the root object class
        superclass: Option<ModuleId>,
        /// Instance representation of this class
        instance_kind: InstanceKind,
        /// Non-owning back-references, in creation order, for
        /// reflective enumeration only
        subclasses: Vec<ModuleId>,
    },
    /// A singleton class holding per-object overrides
    Singleton {
        /// The object this singleton class is attached to
        attached: ObjectId,
        /// Lookup continues at the attached object's class
        superclass: ModuleId,
    },
}

/// A module or class: display name, kind, constant table, method table.
#[derive(Debug)]
pub struct ModuleData {
    /// Display name; `None` until bound under a namespace
    pub name: Option<String>,
    /// Module, class, or singleton
    pub kind: ModuleKind,
    constants: FxHashMap<Symbol, Value>,
    methods: FxHashMap<Symbol, MethodEntry>,
}

impl ModuleData {
    fn new(kind: ModuleKind) -> Self {
        Self {
            name: None,
            kind,
            constants: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }
}

/// Owner of every module and class in the process.
#[derive(Debug)]
pub struct ModuleGraph {
    modules: Vec<ModuleData>,
    root: ModuleId,
}

impl ModuleGraph {
    /// Create a graph holding only the root object class.
    pub fn new(interner: &mut Interner) -> Self {
        interner.intern("Object");
        let root_data = ModuleData {
            name: Some("Object".to_string()),
            kind: ModuleKind::Class {
                superclass: None,
                instance_kind: InstanceKind::Fields,
                subclasses: Vec::new(),
            },
            constants: FxHashMap::default(),
            methods: FxHashMap::default(),
        };
        Self {
            modules: vec![root_data],
            root: ModuleId(0),
        }
    }

    /// The root object class.
    pub fn root(&self) -> ModuleId {
        self.root
    }

    /// Borrow a graph entry.
    pub fn get(&self, id: ModuleId) -> &ModuleData {
        &self.modules[id.index()]
    }

    /// Mutably borrow a graph entry.
    pub fn get_mut(&mut self, id: ModuleId) -> &mut ModuleData {
        &mut self.modules[id.index()]
    }

    fn push(&mut self, data: ModuleData) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(data);
        id
    }

    /// Create a class under `superclass` and register it in the
    /// superclass's subclass registry. The instance representation is
    /// inherited from the superclass.
    pub fn new_class(&mut self, superclass: ModuleId) -> ModuleId {
        let instance_kind = self
            .instance_kind(superclass)
            .unwrap_or(InstanceKind::Fields);
        let id = self.push(ModuleData::new(ModuleKind::Class {
            superclass: Some(superclass),
            instance_kind,
            subclasses: Vec::new(),
        }));
        if let ModuleKind::Class { subclasses, .. } = &mut self.get_mut(superclass).kind {
            subclasses.push(id);
        }
        id
    }

    /// Create an anonymous module.
    pub fn new_module(&mut self) -> ModuleId {
        self.push(ModuleData::new(ModuleKind::Module))
    }

    /// Create the singleton class for `attached`; lookup falls through
    /// to `superclass` (the object's class). Singletons are not listed
    /// in any subclass registry.
    pub fn new_singleton(&mut self, attached: ObjectId, superclass: ModuleId) -> ModuleId {
        self.push(ModuleData::new(ModuleKind::Singleton {
            attached,
            superclass,
        }))
    }

    /// Whether `id` is a concrete (non-singleton) class.
    pub fn is_class(&self, id: ModuleId) -> bool {
        matches!(self.get(id).kind, ModuleKind::Class { .. })
    }

    /// Superclass link used by method lookup. `None` for plain modules
    /// and for the root class.
    pub fn superclass(&self, id: ModuleId) -> Option<ModuleId> {
        match &self.get(id).kind {
            ModuleKind::Module => None,
            ModuleKind::Class { superclass, .. } => *superclass,
            ModuleKind::Singleton { superclass, .. } => Some(*superclass),
        }
    }

    /// Subclass registry of a class, in creation order. Empty for
    /// non-classes.
    pub fn subclasses(&self, id: ModuleId) -> &[ModuleId] {
        match &self.get(id).kind {
            ModuleKind::Class { subclasses, .. } => subclasses,
            _ => &[],
        }
    }

    /// Instance representation of a class.
    pub fn instance_kind(&self, id: ModuleId) -> Option<InstanceKind> {
        match &self.get(id).kind {
            ModuleKind::Class { instance_kind, .. } => Some(*instance_kind),
            _ => None,
        }
    }

    /// Display name of a module, `"<anonymous>"` if unnamed.
    pub fn display_name(&self, id: ModuleId) -> &str {
        self.get(id).name.as_deref().unwrap_or("<anonymous>")
    }

    /// Give `id` its display name: bare under the root namespace,
    /// otherwise qualified with the enclosing module's name.
    pub fn set_name(&mut self, id: ModuleId, under: ModuleId, name: &str) {
        let display = if under == self.root {
            name.to_string()
        } else {
            format!("{}::{}", self.display_name(under), name)
        };
        self.get_mut(id).name = Some(display);
    }

    /// Look up a constant in `module`'s own table.
    pub fn get_const(&self, module: ModuleId, name: Symbol) -> Option<Value> {
        self.get(module).constants.get(&name).copied()
    }

    /// Bind a constant in `module`'s table, replacing any prior value.
    pub fn set_const(&mut self, module: ModuleId, name: Symbol, value: Value) {
        self.get_mut(module).constants.insert(name, value);
    }

    /// Look up a method in `module`'s own table (no ancestor walk).
    pub fn method(&self, module: ModuleId, name: Symbol) -> Option<&MethodEntry> {
        self.get(module).methods.get(&name)
    }

    /// Bind a method entry, replacing any prior binding of `name` in
    /// this exact table.
    pub fn set_method(&mut self, module: ModuleId, name: Symbol, entry: MethodEntry) {
        self.get_mut(module).methods.insert(name, entry);
    }
}
