//! Interned method and constant names
//!
//! Every name the kernel touches (method names, constant names, class
//! names) is interned once and referred to by a small integer symbol,
//! so name comparison is O(1) and cache keys stay 4 bytes wide.

use rustc_hash::FxHashMap;
use std::num::NonZeroU32;

/// An interned name (32-bit index).
///
/// Symbols are cheap to copy and compare. Use [`Interner::resolve`] to
/// get the actual string back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(NonZeroU32);

impl Symbol {
    #[inline]
    fn from_raw(raw: u32) -> Self {
        // Add 1 because NonZeroU32 cannot be 0
        Symbol(NonZeroU32::new(raw + 1).unwrap())
    }

    #[inline]
    fn to_raw(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Name interner that deduplicates strings.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    /// Map from string to symbol index
    map: FxHashMap<String, Symbol>,

    /// Interned strings, indexed by symbol
    strings: Vec<String>,
}

impl Interner {
    /// Create a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning its symbol.
    ///
    /// If the name was already interned, the existing symbol is
    /// returned.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }

        let sym = Symbol::from_raw(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    /// Resolve a symbol back to its string.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.to_raw()]
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the interner holds no names.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
