// I/O built-ins: stream queries, seeking, endianness, speculative reads
//
// The Read* family never observably moves the cursor: every speculative
// read runs under the no-seek guard, which restores the offset on all exit
// paths.

use crate::error::InterpretError;
use crate::eval::decl::{decode_signed, decode_unsigned};
use crate::eval::stream::Endianness;
use crate::eval::value::{cell, IntWidth, StrData, Value, ValueKind};
use crate::eval::Interpreter;
use crate::parser::ast::Expr;
use crate::span::Span;

pub fn register(interp: &mut Interpreter<'_>) {
    interp.register_builtin("LittleEndian", builtin_little_endian);
    interp.register_builtin("BigEndian", builtin_big_endian);
    interp.register_builtin("FSeek", builtin_fseek);
    interp.register_builtin("FTell", builtin_ftell);
    interp.register_builtin("FileSize", builtin_file_size);
    interp.register_builtin("FEof", builtin_feof);
    interp.register_builtin("ReadInt", |i, a, s| {
        read_scalar(i, a, s, "ReadInt", IntWidth::W32, true)
    });
    interp.register_builtin("ReadUInt", |i, a, s| {
        read_scalar(i, a, s, "ReadUInt", IntWidth::W32, false)
    });
    interp.register_builtin("ReadShort", |i, a, s| {
        read_scalar(i, a, s, "ReadShort", IntWidth::W16, true)
    });
    interp.register_builtin("ReadUShort", |i, a, s| {
        read_scalar(i, a, s, "ReadUShort", IntWidth::W16, false)
    });
    interp.register_builtin("ReadInt64", |i, a, s| {
        read_scalar(i, a, s, "ReadInt64", IntWidth::W64, true)
    });
    interp.register_builtin("ReadUInt64", |i, a, s| {
        read_scalar(i, a, s, "ReadUInt64", IntWidth::W64, false)
    });
    interp.register_builtin("ReadQuad", |i, a, s| {
        read_scalar(i, a, s, "ReadQuad", IntWidth::W64, true)
    });
    interp.register_builtin("ReadUQuad", |i, a, s| {
        read_scalar(i, a, s, "ReadUQuad", IntWidth::W64, false)
    });
    interp.register_builtin("ReadBytes", builtin_read_bytes);
    interp.register_builtin("ReadString", builtin_read_string);
}

fn scalar_arg(interp: &mut Interpreter<'_>, arg: &Expr) -> Result<Value, InterpretError> {
    let v = interp.eval_value(arg)?;
    if !v.is_scalar() {
        return Err(interp
            .type_error(format!("expected scalar, got '{}'", v.type_name))
            .with_span(arg.span));
    }
    Ok(v)
}

fn check_arity(
    interp: &Interpreter<'_>,
    callee: &str,
    args: &[Expr],
    expected: usize,
    span: Span,
) -> Result<(), InterpretError> {
    if args.len() != expected {
        return Err(interp
            .arity_error(callee, &expected.to_string(), args.len())
            .with_span(span));
    }
    Ok(())
}

fn builtin_little_endian(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "LittleEndian", args, 0, span)?;
    interp.stream.set_endian(Endianness::Little);
    Ok(Value::null())
}

fn builtin_big_endian(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "BigEndian", args, 0, span)?;
    interp.stream.set_endian(Endianness::Big);
    Ok(Value::null())
}

/// Seek absolute. Returns 0 on success, -1 (cursor untouched) when the
/// position is at or past the end of the stream.
fn builtin_fseek(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "FSeek", args, 1, span)?;
    let pos = scalar_arg(interp, &args[0])?.to_u64()?;
    if pos >= interp.stream.size() {
        return Ok(Value::signed(IntWidth::W64, -1));
    }
    interp.stream.seek(pos);
    Ok(Value::signed(IntWidth::W64, 0))
}

fn builtin_ftell(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "FTell", args, 0, span)?;
    Ok(Value::unsigned(IntWidth::W64, interp.stream.offset()))
}

fn builtin_file_size(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "FileSize", args, 0, span)?;
    Ok(Value::unsigned(IntWidth::W64, interp.stream.size()))
}

fn builtin_feof(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "FEof", args, 0, span)?;
    Ok(Value::boolean(interp.stream.at_eof()))
}

/// Shared body of the ReadInt family: an optional absolute position, a
/// typed read, and a restored cursor in both forms.
fn read_scalar(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
    callee: &str,
    width: IntWidth,
    signed: bool,
) -> Result<Value, InterpretError> {
    if args.len() > 1 {
        return Err(interp
            .arity_error(callee, "0 or 1", args.len())
            .with_span(span));
    }
    let pos = match args.first() {
        Some(arg) => Some(scalar_arg(interp, arg)?.to_u64()?),
        None => None,
    };
    interp.with_no_seek(|interp| {
        if let Some(pos) = pos {
            interp.stream.seek(pos);
        }
        let endian = interp.stream.endian();
        let bytes = interp.stream.read(width.bytes())?;
        Ok(if signed {
            Value::signed(width, decode_signed(&bytes, endian))
        } else {
            Value::unsigned(width, decode_unsigned(&bytes, endian))
        })
    })
}

/// ReadBytes(buffer, pos, n): fill an array or string variable from an
/// absolute position, without observably moving the cursor.
fn builtin_read_bytes(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    check_arity(interp, "ReadBytes", args, 3, span)?;
    let buffer = interp.eval_expr(&args[0])?;
    {
        let b = buffer.borrow();
        if !matches!(b.kind, ValueKind::Array { .. } | ValueKind::Str(_)) {
            return Err(interp
                .type_error(format!("expected array or string, got '{}'", b.type_name))
                .with_span(args[0].span));
        }
    }
    let pos = scalar_arg(interp, &args[1])?.to_u64()?;
    let n = scalar_arg(interp, &args[2])?.to_u64()?;

    let bytes = interp.with_no_seek(|interp| {
        interp.stream.seek(pos);
        interp.stream.read(n)
    })?;

    let mut target = buffer.borrow_mut();
    match &mut target.kind {
        ValueKind::Str(s) => {
            s.bytes = bytes;
        }
        ValueKind::Array { items } => {
            *items = bytes
                .iter()
                .map(|&b| cell(Value::unsigned(IntWidth::W8, b as u64)))
                .collect();
        }
        _ => unreachable!("buffer kind checked above"),
    }
    Ok(Value::null())
}

/// ReadString(pos, maxlen?): a NUL-terminated (or length-capped) string at
/// an absolute position; the cursor is not observably moved.
fn builtin_read_string(
    interp: &mut Interpreter<'_>,
    args: &[Expr],
    span: Span,
) -> Result<Value, InterpretError> {
    if args.is_empty() || args.len() > 2 {
        return Err(interp
            .arity_error("ReadString", "1 or 2", args.len())
            .with_span(span));
    }
    let pos = scalar_arg(interp, &args[0])?.to_u64()?;
    let max_len = match args.get(1) {
        Some(arg) => scalar_arg(interp, arg)?.to_i64()?,
        None => -1,
    };

    let bytes = interp.with_no_seek(|interp| {
        interp.stream.seek(pos);
        interp.stream.read_string(max_len)
    })?;
    Ok(Value::new(
        ValueKind::Str(StrData::nul_terminated(bytes)),
        "string",
    ))
}
