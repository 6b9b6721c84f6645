//! Minimal object store standing in for the object-model collaborator
//!
//! The kernel needs just enough of an object model to answer "what is
//! this receiver's class" and to create singleton classes lazily. The
//! real heap (fields, layout, GC) belongs to the collaborating object
//! model and is out of scope here.

use crate::module::{ModuleGraph, ModuleId};

/// Index of a heap object in the store (non-owning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u32);

#[derive(Debug)]
struct ObjectData {
    /// The object's concrete class
    class: ModuleId,
    /// Singleton class, created on first metaclass access
    singleton: Option<ModuleId>,
}

/// Store of object headers: class link plus lazy singleton class.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Vec<ObjectData>,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an instance of `class`.
    pub fn alloc(&mut self, class: ModuleId) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectData {
            class,
            singleton: None,
        });
        id
    }

    /// The object's concrete (non-singleton) class.
    pub fn class_of(&self, id: ObjectId) -> ModuleId {
        self.objects[id.0 as usize].class
    }

    /// Where method lookup starts for this receiver: the singleton
    /// class if one exists, otherwise the concrete class.
    pub fn lookup_origin(&self, id: ObjectId) -> ModuleId {
        let data = &self.objects[id.0 as usize];
        data.singleton.unwrap_or(data.class)
    }

    /// The object's singleton class, created lazily on first access.
    pub fn metaclass(&mut self, graph: &mut ModuleGraph, id: ObjectId) -> ModuleId {
        let data = &self.objects[id.0 as usize];
        if let Some(singleton) = data.singleton {
            return singleton;
        }
        let singleton = graph.new_singleton(id, data.class);
        self.objects[id.0 as usize].singleton = Some(singleton);
        singleton
    }
}
