// Tree-walking interpreter for the template language
//
// The interpreter fuses expression evaluation with stream layout: file-typed
// declarations read the stream at declaration time and accumulate the
// allocation ledger the entry forest is later folded from.

pub mod entry;
pub mod scope;
pub mod stream;
pub mod types;
pub mod value;

pub(crate) mod decl;
mod expr;
mod stmt;

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{ErrorKind, InterpretError};
use crate::name::{Interner, Name};
use crate::parser::ast::{Ast, Expr, FnDefData};
use crate::span::Span;
use scope::ScopeStack;
use stream::Stream;
use types::TypeRegistry;
use value::{Cell, Value};

/// Interpreter status, observable by the host after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    NoState,
    Running,
    Error,
}

/// Control flow signal from statement evaluation.
pub(crate) enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Value),
}

/// Native built-in handler: receives the interpreter and the call-site
/// argument nodes, and validates its own arity and argument types.
pub type BuiltinFn = fn(&mut Interpreter<'_>, &[Expr], Span) -> Result<Value, InterpretError>;

/// Composite currently being materialized; declarations inside its body
/// append fields here instead of the top-level ledger.
pub(crate) struct CompositeCtx {
    pub fields: Vec<(String, Cell)>,
    pub is_union: bool,
    pub start: u64,
    /// Farthest offset reached by any member; bounds the composite's span
    /// when the body seeks backward, and sizes unions.
    pub max_end: u64,
    /// Open bitfield storage unit, if the previous field was a bitfield.
    pub bits: Option<BitCtx>,
}

/// An open bitfield storage unit. The unit's bytes were read when it was
/// opened; subsequent bitfield fields extract bits without further reads.
pub(crate) struct BitCtx {
    pub unit_offset: u64,
    pub unit_bytes: u64,
    pub bits_used: u32,
    pub raw: u64,
}

/// Nested calls and composite materializations share one depth budget to
/// keep runaway recursion off the host stack.
const MAX_DEPTH: u32 = 256;

pub struct Interpreter<'a> {
    pub(crate) stream: &'a mut dyn Stream,
    pub(crate) interner: &'a mut Interner,
    pub(crate) types: TypeRegistry,
    pub(crate) scope: ScopeStack,
    user_fns: FxHashMap<Name, Rc<FnDefData>>,
    builtins: FxHashMap<Name, BuiltinFn>,
    pub(crate) ledger: Vec<(String, Cell)>,
    pub(crate) fg_color: Option<u32>,
    pub(crate) bg_color: Option<u32>,
    /// Text emitted by print built-ins, in emission order.
    pub(crate) output: Vec<String>,
    pub(crate) composites: Vec<CompositeCtx>,
    state: VmState,
    pub(crate) loop_depth: u32,
    pub(crate) switch_depth: u32,
    pub(crate) fn_depth: u32,
    depth: u32,
}

impl<'a> Interpreter<'a> {
    pub fn new(stream: &'a mut dyn Stream, interner: &'a mut Interner) -> Self {
        let types = TypeRegistry::with_builtins(interner);
        Self {
            stream,
            interner,
            types,
            scope: ScopeStack::new(),
            user_fns: FxHashMap::default(),
            builtins: FxHashMap::default(),
            ledger: Vec::new(),
            fg_color: None,
            bg_color: None,
            output: Vec::new(),
            composites: Vec::new(),
            state: VmState::NoState,
            loop_depth: 0,
            switch_depth: 0,
            fn_depth: 0,
            depth: 0,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Current stream cursor position.
    pub fn current_offset(&self) -> u64 {
        self.stream.offset()
    }

    /// Foreground color in force for subsequent declarations, if any.
    pub fn current_fg_color(&self) -> Option<u32> {
        self.fg_color
    }

    /// Background color in force for subsequent declarations, if any.
    pub fn current_bg_color(&self) -> Option<u32> {
        self.bg_color
    }

    pub fn register_builtin(&mut self, name: &str, handler: BuiltinFn) {
        let key = self.interner.intern(name);
        self.builtins.insert(key, handler);
    }

    /// Interpret the whole program. The first failure aborts the run and
    /// parks the interpreter in `Error`.
    pub fn run(&mut self, ast: &Ast) -> Result<(), InterpretError> {
        self.state = VmState::Running;
        for stmt in &ast.stmts {
            match self.exec_stmt(stmt) {
                Ok(ControlFlow::None) => {}
                Ok(_) => {
                    // exec_stmt rejects stray break/continue/return before
                    // they can reach the top level.
                    unreachable!("control flow escaped to top level")
                }
                Err(e) => {
                    self.state = VmState::Error;
                    debug!(error = %e, "interpretation failed");
                    return Err(e);
                }
            }
        }
        self.state = VmState::NoState;
        debug!(entries = self.ledger.len(), "interpretation finished");
        Ok(())
    }

    // ---- error helpers ----

    pub(crate) fn error(&self, kind: ErrorKind, message: impl Into<String>) -> InterpretError {
        InterpretError::new(kind, message).at_offset(self.stream.offset())
    }

    pub(crate) fn type_error(&self, message: impl Into<String>) -> InterpretError {
        self.error(ErrorKind::Type, message)
    }

    pub(crate) fn arity_error(&self, callee: &str, expected: &str, got: usize) -> InterpretError {
        self.error(
            ErrorKind::Arity,
            format!("{}: expected {} arguments, {} given", callee, expected, got),
        )
    }

    // ---- scope and color management ----

    pub(crate) fn push_scope(&mut self) {
        self.scope.push(self.fg_color, self.bg_color);
    }

    /// Pop the innermost frame and restore the colors in force at entry.
    pub(crate) fn pop_scope(&mut self) {
        let (fg, bg) = self.scope.pop();
        self.fg_color = fg;
        self.bg_color = bg;
    }

    // ---- stream discipline ----

    /// Run `f` and restore the stream offset on every exit path.
    pub(crate) fn with_no_seek<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.stream.offset();
        let result = f(self);
        self.stream.seek(saved);
        result
    }

    // ---- output ----

    pub(crate) fn print(&mut self, text: impl Into<String>) {
        self.output.push(text.into());
    }

    // ---- functions ----

    pub(crate) fn define_fn(&mut self, def: &FnDefData) -> Result<(), InterpretError> {
        if self.user_fns.contains_key(&def.name) {
            return Err(self.error(
                ErrorKind::Redeclaration,
                format!(
                    "function '{}' is already defined",
                    self.interner.resolve(def.name)
                ),
            ));
        }
        self.user_fns.insert(def.name, Rc::new(def.clone()));
        Ok(())
    }

    /// Dispatch a call: user-defined functions first, then built-ins.
    pub(crate) fn call_function(
        &mut self,
        callee: Name,
        args: &[Expr],
        span: Span,
    ) -> Result<Value, InterpretError> {
        if let Some(def) = self.user_fns.get(&callee).map(Rc::clone) {
            return self.call_user_fn(&def, args, span);
        }
        if let Some(&handler) = self.builtins.get(&callee) {
            return handler(self, args, span);
        }
        Err(self
            .error(
                ErrorKind::UndefinedName,
                format!("undefined function '{}'", self.interner.resolve(callee)),
            )
            .with_span(span))
    }

    fn call_user_fn(
        &mut self,
        def: &FnDefData,
        args: &[Expr],
        span: Span,
    ) -> Result<Value, InterpretError> {
        if args.len() != def.params.len() {
            return Err(self
                .arity_error(
                    self.interner.resolve(def.name),
                    &def.params.len().to_string(),
                    args.len(),
                )
                .with_span(span));
        }
        self.enter_depth()?;

        // Arguments evaluate left to right in the caller's scope.
        let mut actuals = Vec::with_capacity(args.len());
        for arg in args {
            match self.eval_value(arg) {
                Ok(v) => actuals.push(v),
                Err(e) => {
                    self.leave_depth();
                    return Err(e);
                }
            }
        }

        self.push_scope();
        let saved_loop = std::mem::take(&mut self.loop_depth);
        let saved_switch = std::mem::take(&mut self.switch_depth);
        self.fn_depth += 1;

        let result = self.run_fn_body(def, actuals);

        self.fn_depth -= 1;
        self.loop_depth = saved_loop;
        self.switch_depth = saved_switch;
        self.pop_scope();
        self.leave_depth();
        result
    }

    fn run_fn_body(
        &mut self,
        def: &FnDefData,
        actuals: Vec<Value>,
    ) -> Result<Value, InterpretError> {
        for (param, actual) in def.params.iter().zip(actuals) {
            let bound = self.coerce_to_declared(param.ty, actual)?;
            self.scope.declare(
                param.name,
                value::cell(bound),
                false,
                &self.types,
                self.interner,
            )?;
        }

        let mut returned = Value::null();
        for stmt in &def.body {
            match self.exec_stmt(stmt)? {
                ControlFlow::None => {}
                ControlFlow::Return(v) => {
                    returned = v;
                    break;
                }
                ControlFlow::Break | ControlFlow::Continue => {
                    unreachable!("loop control escaped the function body")
                }
            }
        }

        match def.ret {
            Some(ret_ty) => self.coerce_to_declared(ret_ty, returned),
            None => Ok(Value::null()),
        }
    }

    /// Convert a value to the shape of a declared type name, used for
    /// parameter and return conversion. Aliases resolve to their underlying
    /// primitive, so a typedef'd parameter coerces exactly like the
    /// primitive it names.
    fn coerce_to_declared(&mut self, ty: Name, v: Value) -> Result<Value, InterpretError> {
        if !self.types.contains(ty) {
            return Err(self.error(
                ErrorKind::UndefinedName,
                format!("undefined type '{}'", self.interner.resolve(ty)),
            ));
        }
        if self.types.prim_class_of(ty).is_none() {
            return Ok(v);
        }
        let mut slot = self.default_value_of(ty)?;
        value::assign_into(&mut slot, &v).map_err(|e| e.at_offset(self.stream.offset()))?;
        Ok(slot)
    }

    pub(crate) fn enter_depth(&mut self) -> Result<(), InterpretError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.type_error("nesting depth limit exceeded"));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_depth(&mut self) {
        self.depth -= 1;
    }
}
