// Interned identifier names
//
// A Name is a u32 index into the interner: Copy, O(1) equality and hashing.
// Resolving back to the string requires the interner that produced it.

use rustc_hash::FxHashMap;
use std::fmt;

/// An interned identifier. Equality is integer comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Deduplicating string-to-Name table.
#[derive(Default)]
pub struct Interner {
    strings: Vec<String>,
    indices: FxHashMap<String, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing Name if already present.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&idx) = self.indices.get(s) {
            return Name(idx);
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.indices.insert(s.to_string(), idx);
        Name(idx)
    }

    /// Look up a string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Name> {
        self.indices.get(s).map(|&idx| Name(idx))
    }

    /// Resolve a Name back to its string.
    /// Panics if the Name came from a different interner.
    pub fn resolve(&self, name: Name) -> &str {
        &self.strings[name.0 as usize]
    }
}
