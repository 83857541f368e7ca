// Math built-ins

use crate::error::InterpretError;
use crate::eval::value::{FloatWidth, Value};
use crate::eval::Interpreter;
use crate::parser::ast::Expr;
use crate::span::Span;

pub fn register(interp: &mut Interpreter<'_>) {
    interp.register_builtin("Ceil", builtin_ceil);
}

fn builtin_ceil(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    if args.len() != 1 {
        return Err(interp.arity_error("Ceil", "1", args.len()).with_span(span));
    }
    let v = interp.eval_value(&args[0])?;
    if !v.is_scalar() {
        return Err(interp
            .type_error(format!("expected scalar, got '{}'", v.type_name))
            .with_span(args[0].span));
    }
    Ok(Value::float(FloatWidth::W64, v.to_f64()?.ceil()))
}
