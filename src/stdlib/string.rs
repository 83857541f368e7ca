// String built-ins

use crate::error::InterpretError;
use crate::eval::value::{IntWidth, Value, ValueKind};
use crate::eval::Interpreter;
use crate::parser::ast::Expr;
use crate::span::Span;

pub fn register(interp: &mut Interpreter<'_>) {
    interp.register_builtin("Strlen", builtin_strlen);
}

/// Byte length of a string, excluding the trailing NUL for NUL-terminated
/// strings.
fn builtin_strlen(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    if args.len() != 1 {
        return Err(interp.arity_error("Strlen", "1", args.len()).with_span(span));
    }
    let v = interp.eval_value(&args[0])?;
    match &v.kind {
        ValueKind::Str(s) => Ok(Value::signed(IntWidth::W64, s.length() as i64)),
        _ => Err(interp
            .type_error(format!("expected string, got '{}'", v.type_name))
            .with_span(args[0].span)),
    }
}
