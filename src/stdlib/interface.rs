// Interface built-ins: Printf, Warning, color selection, test harness

use crate::error::{ErrorKind, InterpretError};
use crate::eval::value::{Value, ValueKind};
use crate::eval::Interpreter;
use crate::parser::ast::{Expr, ExprKind};
use crate::span::Span;

use super::{colors, format};

pub fn register(interp: &mut Interpreter<'_>) {
    interp.register_builtin("Printf", builtin_printf);
    interp.register_builtin("Warning", builtin_warning);
    interp.register_builtin("SetForeColor", builtin_set_fore_color);
    interp.register_builtin("SetBackColor", builtin_set_back_color);
    interp.register_builtin("__template_test__", builtin_test);
}

/// Evaluate Printf-style arguments and produce the formatted text.
fn format_call(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<String, InterpretError> {
    if args.is_empty() {
        return Err(interp.arity_error("Printf", "at least 1", 0).with_span(span));
    }
    let fmt_value = interp.eval_value(&args[0])?;
    let fmt = match &fmt_value.kind {
        ValueKind::Str(s) => s.to_display_string(),
        _ => {
            return Err(interp
                .type_error(format!(
                    "format argument must be a string, got '{}'",
                    fmt_value.type_name
                ))
                .with_span(args[0].span))
        }
    };
    let mut values = Vec::with_capacity(args.len() - 1);
    for arg in &args[1..] {
        values.push(interp.eval_value(arg)?);
    }
    format::format_string(&fmt, &values).map_err(|e| e.with_span_if_none(span))
}

fn builtin_printf(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    let text = format_call(interp, args, span)?;
    interp.print(text);
    Ok(Value::null())
}

fn builtin_warning(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    interp.print("WARNING: ");
    builtin_printf(interp, args, span)
}

/// The argument must be a bare color-name identifier at the call site, not
/// an evaluated expression. Unknown names select the invalid sentinel,
/// which reads as "no override".
fn color_argument(
    interp: &mut Interpreter<'_>,
    callee: &str,
    args: &[Expr],
    span: Span,
) -> Result<Option<u32>, InterpretError> {
    if args.len() != 1 {
        return Err(interp.arity_error(callee, "1", args.len()).with_span(span));
    }
    match &args[0].kind {
        ExprKind::Ident(name) => Ok(colors::lookup(interp.interner.resolve(*name))),
        _ => Err(interp
            .error(
                ErrorKind::Type,
                format!("{}: expected a color name identifier", callee),
            )
            .with_span(args[0].span)),
    }
}

fn builtin_set_fore_color(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    interp.fg_color = color_argument(interp, "SetForeColor", args, span)?;
    Ok(Value::null())
}

fn builtin_set_back_color(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    interp.bg_color = color_argument(interp, "SetBackColor", args, span)?;
    Ok(Value::null())
}

/// Test harness: evaluate the single argument and report its truthiness.
fn builtin_test(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    if args.len() != 1 {
        return Err(interp
            .arity_error("__template_test__", "1", args.len())
            .with_span(span));
    }
    let result = interp.eval_value(&args[0])?;
    if result.is_truthy() {
        interp.print("OK\n");
    } else {
        interp.print("FAIL\n");
    }
    Ok(result)
}
