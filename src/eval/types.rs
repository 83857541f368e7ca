// Type registry: primitives, editor aliases, and user-defined types
//
// The registry is global to a run and append-only. Variable names may
// shadow across scopes; type names may not be redefined.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{ErrorKind, InterpretError};
use crate::eval::value::{FloatWidth, IntWidth, PrimClass};
use crate::name::{Interner, Name};
use crate::parser::ast::{Expr, Stmt};

/// A registered type descriptor.
#[derive(Debug)]
pub enum TypeDef {
    Primitive(PrimClass),
    /// The local/stream `string` type (NUL-terminated).
    StringType,
    /// `typedef Target Name [len];`
    Alias {
        target: Name,
        array_len: Option<Expr>,
    },
    /// Struct or union; the body is the statement list evaluated per
    /// materialization.
    Struct {
        name: Name,
        is_union: bool,
        body: Rc<Vec<Stmt>>,
    },
    Enum {
        name: Name,
        width: IntWidth,
        signed: bool,
        members: Vec<(String, i64)>,
    },
}

pub struct TypeRegistry {
    map: FxHashMap<Name, Rc<TypeDef>>,
}

/// The built-in primitive table: canonical C-like names plus the editor
/// aliases templates use interchangeably.
const PRIMITIVES: &[(&str, PrimClass)] = &[
    ("char", PrimClass::Signed(IntWidth::W8)),
    ("byte", PrimClass::Signed(IntWidth::W8)),
    ("CHAR", PrimClass::Signed(IntWidth::W8)),
    ("BYTE", PrimClass::Signed(IntWidth::W8)),
    ("uchar", PrimClass::Unsigned(IntWidth::W8)),
    ("ubyte", PrimClass::Unsigned(IntWidth::W8)),
    ("UCHAR", PrimClass::Unsigned(IntWidth::W8)),
    ("UBYTE", PrimClass::Unsigned(IntWidth::W8)),
    ("short", PrimClass::Signed(IntWidth::W16)),
    ("int16", PrimClass::Signed(IntWidth::W16)),
    ("SHORT", PrimClass::Signed(IntWidth::W16)),
    ("INT16", PrimClass::Signed(IntWidth::W16)),
    ("ushort", PrimClass::Unsigned(IntWidth::W16)),
    ("uint16", PrimClass::Unsigned(IntWidth::W16)),
    ("USHORT", PrimClass::Unsigned(IntWidth::W16)),
    ("UINT16", PrimClass::Unsigned(IntWidth::W16)),
    ("WORD", PrimClass::Unsigned(IntWidth::W16)),
    ("int", PrimClass::Signed(IntWidth::W32)),
    ("int32", PrimClass::Signed(IntWidth::W32)),
    ("long", PrimClass::Signed(IntWidth::W32)),
    ("INT", PrimClass::Signed(IntWidth::W32)),
    ("INT32", PrimClass::Signed(IntWidth::W32)),
    ("LONG", PrimClass::Signed(IntWidth::W32)),
    ("uint", PrimClass::Unsigned(IntWidth::W32)),
    ("uint32", PrimClass::Unsigned(IntWidth::W32)),
    ("ulong", PrimClass::Unsigned(IntWidth::W32)),
    ("UINT", PrimClass::Unsigned(IntWidth::W32)),
    ("UINT32", PrimClass::Unsigned(IntWidth::W32)),
    ("ULONG", PrimClass::Unsigned(IntWidth::W32)),
    ("DWORD", PrimClass::Unsigned(IntWidth::W32)),
    ("int64", PrimClass::Signed(IntWidth::W64)),
    ("quad", PrimClass::Signed(IntWidth::W64)),
    ("QUAD", PrimClass::Signed(IntWidth::W64)),
    ("INT64", PrimClass::Signed(IntWidth::W64)),
    ("__int64", PrimClass::Signed(IntWidth::W64)),
    ("uint64", PrimClass::Unsigned(IntWidth::W64)),
    ("uquad", PrimClass::Unsigned(IntWidth::W64)),
    ("UQUAD", PrimClass::Unsigned(IntWidth::W64)),
    ("UINT64", PrimClass::Unsigned(IntWidth::W64)),
    ("QWORD", PrimClass::Unsigned(IntWidth::W64)),
    ("__uint64", PrimClass::Unsigned(IntWidth::W64)),
    ("float", PrimClass::Float(FloatWidth::W32)),
    ("FLOAT", PrimClass::Float(FloatWidth::W32)),
    ("double", PrimClass::Float(FloatWidth::W64)),
    ("DOUBLE", PrimClass::Float(FloatWidth::W64)),
];

impl TypeRegistry {
    pub fn with_builtins(interner: &mut Interner) -> Self {
        let mut map = FxHashMap::default();
        for &(name, class) in PRIMITIVES {
            map.insert(interner.intern(name), Rc::new(TypeDef::Primitive(class)));
        }
        map.insert(interner.intern("string"), Rc::new(TypeDef::StringType));
        Self { map }
    }

    /// Register a user type. Redefinition is an error; the registry is
    /// append-only within a run.
    pub fn define(
        &mut self,
        name: Name,
        def: TypeDef,
        interner: &Interner,
    ) -> Result<(), InterpretError> {
        if self.map.contains_key(&name) {
            return Err(InterpretError::new(
                ErrorKind::Redeclaration,
                format!("type '{}' is already defined", interner.resolve(name)),
            ));
        }
        self.map.insert(name, Rc::new(def));
        Ok(())
    }

    pub fn get(&self, name: Name) -> Option<Rc<TypeDef>> {
        self.map.get(&name).map(Rc::clone)
    }

    pub fn contains(&self, name: Name) -> bool {
        self.map.contains_key(&name)
    }

    /// Resolve a name through alias chains to a primitive class, if the
    /// final target is a primitive. Used for casts and bitfield storage.
    pub fn prim_class_of(&self, name: Name) -> Option<PrimClass> {
        let mut current = name;
        // Alias chains are finite because the registry rejects
        // redefinition, but guard against pathological depth anyway.
        for _ in 0..64 {
            match self.map.get(&current).map(Rc::as_ref) {
                Some(TypeDef::Primitive(class)) => return Some(*class),
                Some(TypeDef::Alias {
                    target,
                    array_len: None,
                }) => current = *target,
                _ => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let mut interner = Interner::new();
        let types = TypeRegistry::with_builtins(&mut interner);
        for name in ["char", "uint32", "DWORD", "QWORD", "double", "string"] {
            let key = interner.lookup(name).expect("name not interned");
            assert!(types.contains(key), "missing builtin {}", name);
        }
    }

    #[test]
    fn test_redefinition_rejected() {
        let mut interner = Interner::new();
        let mut types = TypeRegistry::with_builtins(&mut interner);
        let int_name = interner.intern("int");
        let err = types
            .define(
                int_name,
                TypeDef::Primitive(PrimClass::Signed(IntWidth::W8)),
                &interner,
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redeclaration);
    }

    #[test]
    fn test_alias_resolves_to_primitive() {
        let mut interner = Interner::new();
        let mut types = TypeRegistry::with_builtins(&mut interner);
        let uint_name = interner.intern("uint");
        let handle = interner.intern("HANDLE");
        types
            .define(
                handle,
                TypeDef::Alias {
                    target: uint_name,
                    array_len: None,
                },
                &interner,
            )
            .unwrap();
        assert_eq!(
            types.prim_class_of(handle),
            Some(PrimClass::Unsigned(IntWidth::W32))
        );
    }

    #[test]
    fn test_prim_class_of_struct_is_none() {
        let mut interner = Interner::new();
        let mut types = TypeRegistry::with_builtins(&mut interner);
        let s = interner.intern("Header");
        types
            .define(
                s,
                TypeDef::Struct {
                    name: s,
                    is_union: false,
                    body: Rc::new(Vec::new()),
                },
                &interner,
            )
            .unwrap();
        assert!(types.prim_class_of(s).is_none());
    }
}
