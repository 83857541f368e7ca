// Tool built-ins
//
// FindAll is a stub: it prints a notice and yields null so templates that
// call it keep running.

use crate::error::InterpretError;
use crate::eval::value::Value;
use crate::eval::Interpreter;
use crate::parser::ast::Expr;
use crate::span::Span;

pub fn register(interp: &mut Interpreter<'_>) {
    interp.register_builtin("FindAll", builtin_find_all);
}

fn builtin_find_all(
    interp: &mut Interpreter<'_>,
    _args: &[Expr],
    _span: Span,
) -> Result<Value, InterpretError> {
    interp.print("FindAll(): not implemented\n");
    Ok(Value::null())
}
