// Lexical scope stack for the interpreter
//
// Frames are pushed on block entry, loop bodies, switch bodies, function
// calls and composite bodies, and popped on every exit path. Each frame
// also snapshots the current fg/bg colors so SetForeColor/SetBackColor are
// scoped to the frame they were called in.

use rustc_hash::FxHashMap;

use crate::error::{ErrorKind, InterpretError};
use crate::eval::types::TypeRegistry;
use crate::eval::value::Cell;
use crate::name::{Interner, Name};

#[derive(Clone)]
pub struct Binding {
    pub cell: Cell,
    pub is_const: bool,
}

struct Frame {
    vars: FxHashMap<Name, Binding>,
    saved_fg: Option<u32>,
    saved_bg: Option<u32>,
}

impl Frame {
    fn new(saved_fg: Option<u32>, saved_bg: Option<u32>) -> Self {
        Self {
            vars: FxHashMap::default(),
            saved_fg,
            saved_bg,
        }
    }
}

pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(None, None)],
        }
    }

    /// Push a frame, snapshotting the colors in force at entry.
    pub fn push(&mut self, fg: Option<u32>, bg: Option<u32>) {
        self.frames.push(Frame::new(fg, bg));
    }

    /// Pop the innermost frame, returning the colors to restore.
    /// The global frame is never popped.
    pub fn pop(&mut self) -> (Option<u32>, Option<u32>) {
        if self.frames.len() > 1 {
            let frame = self.frames.pop().unwrap();
            (frame.saved_fg, frame.saved_bg)
        } else {
            (None, None)
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind a name in the innermost frame. Collisions with a type name or
    /// with a variable already bound in the same frame are rejected;
    /// shadowing an outer frame's variable is allowed.
    pub fn declare(
        &mut self,
        name: Name,
        cell: Cell,
        is_const: bool,
        types: &TypeRegistry,
        interner: &Interner,
    ) -> Result<(), InterpretError> {
        if types.contains(name) {
            return Err(InterpretError::new(
                ErrorKind::Redeclaration,
                format!(
                    "'{}' collides with a type name",
                    interner.resolve(name)
                ),
            ));
        }
        let frame = self.frames.last_mut().unwrap();
        if frame.vars.contains_key(&name) {
            return Err(InterpretError::new(
                ErrorKind::Redeclaration,
                format!(
                    "'{}' is already declared in this scope",
                    interner.resolve(name)
                ),
            ));
        }
        frame.vars.insert(name, Binding { cell, is_const });
        Ok(())
    }

    /// Resolve a name, innermost frame first.
    pub fn lookup(&self, name: Name) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(&name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::value::{cell, IntWidth, Value};

    fn setup() -> (Interner, TypeRegistry, ScopeStack) {
        let mut interner = Interner::new();
        let types = TypeRegistry::with_builtins(&mut interner);
        (interner, types, ScopeStack::new())
    }

    #[test]
    fn test_declare_and_lookup() {
        let (mut interner, types, mut scope) = setup();
        let x = interner.intern("x");
        scope
            .declare(x, cell(Value::signed(IntWidth::W32, 7)), false, &types, &interner)
            .unwrap();
        let binding = scope.lookup(x).unwrap();
        assert_eq!(binding.cell.borrow().to_i64().unwrap(), 7);
    }

    #[test]
    fn test_shadowing_across_frames() {
        let (mut interner, types, mut scope) = setup();
        let x = interner.intern("x");
        scope
            .declare(x, cell(Value::signed(IntWidth::W32, 1)), false, &types, &interner)
            .unwrap();
        scope.push(None, None);
        scope
            .declare(x, cell(Value::signed(IntWidth::W32, 2)), false, &types, &interner)
            .unwrap();
        assert_eq!(scope.lookup(x).unwrap().cell.borrow().to_i64().unwrap(), 2);
        scope.pop();
        assert_eq!(scope.lookup(x).unwrap().cell.borrow().to_i64().unwrap(), 1);
    }

    #[test]
    fn test_same_frame_redeclaration_fails() {
        let (mut interner, types, mut scope) = setup();
        let x = interner.intern("x");
        scope
            .declare(x, cell(Value::null()), false, &types, &interner)
            .unwrap();
        let err = scope
            .declare(x, cell(Value::null()), false, &types, &interner)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redeclaration);
    }

    #[test]
    fn test_type_name_collision_fails() {
        let (mut interner, types, mut scope) = setup();
        let int_name = interner.intern("int");
        let err = scope
            .declare(int_name, cell(Value::null()), false, &types, &interner)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redeclaration);
    }

    #[test]
    fn test_pop_restores_colors() {
        let (_, _, mut scope) = setup();
        scope.push(Some(0xFF), Some(0x10));
        assert_eq!(scope.pop(), (Some(0xFF), Some(0x10)));
    }

    #[test]
    fn test_global_frame_never_popped() {
        let (mut interner, types, mut scope) = setup();
        scope.pop();
        let x = interner.intern("x");
        scope
            .declare(x, cell(Value::null()), false, &types, &interner)
            .unwrap();
        assert!(scope.lookup(x).is_some());
    }
}
