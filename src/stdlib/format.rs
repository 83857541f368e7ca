// printf-style formatting for the Printf/Warning built-ins
//
// Supported conversions: %d %i %u %x %X %o %c %s %f %e %g %%, with the
// usual flag/width/precision modifiers. A specifier whose argument has the
// wrong kind fails with a Format error.

use crate::error::{ErrorKind, InterpretError};
use crate::eval::value::{IntWidth, StrPolicy, Value, ValueKind};

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    hash: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

fn format_error(message: impl Into<String>) -> InterpretError {
    InterpretError::new(ErrorKind::Format, message)
}

/// Integer view of an argument, or None for non-integer kinds.
fn int_of(v: &Value) -> Option<i64> {
    match &v.kind {
        ValueKind::Bool(b) => Some(*b as i64),
        ValueKind::Signed { value, .. } => Some(*value),
        ValueKind::Unsigned { value, .. } => Some(*value as i64),
        ValueKind::Enum { value, .. } => Some(*value),
        _ => None,
    }
}

/// Unsigned view for %u/%x/%X/%o: negative values convert through the
/// argument's own width, as C's unsigned conversions do.
fn uint_of(v: &Value) -> Option<u64> {
    fn mask(raw: u64, width: IntWidth) -> u64 {
        match width {
            IntWidth::W64 => raw,
            w => raw & ((1u64 << (w.bytes() * 8)) - 1),
        }
    }
    match &v.kind {
        ValueKind::Bool(b) => Some(*b as u64),
        ValueKind::Unsigned { value, .. } => Some(*value),
        ValueKind::Signed { width, value } => Some(mask(*value as u64, *width)),
        ValueKind::Enum { width, value, .. } => Some(mask(*value as u64, *width)),
        _ => None,
    }
}

fn float_of(v: &Value) -> Option<f64> {
    match &v.kind {
        ValueKind::Float { value, .. } => Some(*value),
        _ => int_of(v).map(|i| i as f64),
    }
}

pub fn format_string(fmt: &str, args: &[Value]) -> Result<String, InterpretError> {
    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.hash = true,
                _ => break,
            }
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            spec.width = Some(spec.width.unwrap_or(0) * 10 + d as usize);
            chars.next();
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                precision = precision * 10 + d as usize;
                chars.next();
            }
            spec.precision = Some(precision);
        }

        let conv = chars
            .next()
            .ok_or_else(|| format_error("format string ends inside a specifier"))?;
        let arg = args.get(next_arg).ok_or_else(|| {
            format_error(format!("no argument for specifier '%{}'", conv))
        })?;
        next_arg += 1;

        out.push_str(&render(spec, conv, arg)?);
    }
    Ok(out)
}

fn render(spec: Spec, conv: char, arg: &Value) -> Result<String, InterpretError> {
    let mismatch = |expected: &str| {
        format_error(format!(
            "specifier '%{}' expects {}, got '{}'",
            conv, expected, arg.type_name
        ))
    };
    match conv {
        'd' | 'i' => {
            let v = int_of(arg).ok_or_else(|| mismatch("an integer"))?;
            Ok(pad_number(spec, v < 0, &v.unsigned_abs().to_string(), ""))
        }
        'u' => {
            let v = uint_of(arg).ok_or_else(|| mismatch("an integer"))?;
            Ok(pad_number(spec, false, &v.to_string(), ""))
        }
        'x' | 'X' | 'o' => {
            let v = uint_of(arg).ok_or_else(|| mismatch("an integer"))?;
            let digits = match conv {
                'x' => format!("{:x}", v),
                'X' => format!("{:X}", v),
                _ => format!("{:o}", v),
            };
            let prefix = if spec.hash && v != 0 {
                match conv {
                    'x' => "0x",
                    'X' => "0X",
                    _ => "0",
                }
            } else {
                ""
            };
            Ok(pad_number(spec, false, &digits, prefix))
        }
        'c' => {
            let v = int_of(arg).ok_or_else(|| mismatch("an integer"))?;
            Ok(pad_text(spec, &((v as u8) as char).to_string()))
        }
        's' => match &arg.kind {
            ValueKind::Str(s) => {
                let visible = match s.policy {
                    StrPolicy::NulTerminated => &s.bytes[..s.length()],
                    StrPolicy::LengthBounded => &s.bytes[..],
                };
                let mut text = String::from_utf8_lossy(visible).into_owned();
                if let Some(precision) = spec.precision {
                    text.truncate(precision);
                }
                Ok(pad_text(spec, &text))
            }
            _ => Err(mismatch("a string")),
        },
        'f' => {
            let v = float_of(arg).ok_or_else(|| mismatch("a number"))?;
            let precision = spec.precision.unwrap_or(6);
            Ok(pad_number(
                spec,
                v.is_sign_negative(),
                &format!("{:.*}", precision, v.abs()),
                "",
            ))
        }
        'e' => {
            let v = float_of(arg).ok_or_else(|| mismatch("a number"))?;
            let precision = spec.precision.unwrap_or(6);
            Ok(pad_number(
                spec,
                v.is_sign_negative(),
                &exponential(v.abs(), precision),
                "",
            ))
        }
        'g' => {
            let v = float_of(arg).ok_or_else(|| mismatch("a number"))?;
            Ok(pad_number(
                spec,
                v.is_sign_negative(),
                &general(v.abs(), spec.precision.unwrap_or(6).max(1)),
                "",
            ))
        }
        other => Err(format_error(format!("unknown specifier '%{}'", other))),
    }
}

/// C `%e`: one digit, point, `precision` digits, `e±NN`.
fn exponential(v: f64, precision: usize) -> String {
    if v == 0.0 {
        return format!("{:.*}e+00", precision, 0.0);
    }
    let exp = v.abs().log10().floor() as i32;
    let mantissa = v / 10f64.powi(exp);
    // Rounding the mantissa can carry it to 10.0; renormalize.
    let rounded = format!("{:.*}", precision, mantissa);
    let (mantissa, exp) = if rounded.starts_with("10") {
        (format!("{:.*}", precision, mantissa / 10.0), exp + 1)
    } else {
        (rounded, exp)
    };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

/// C `%g`: `%e` for extreme exponents, `%f` otherwise, trailing zeros
/// stripped.
fn general(v: f64, precision: usize) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let exp = v.abs().log10().floor() as i32;
    if exp < -4 || exp >= precision as i32 {
        let text = exponential(v, precision.saturating_sub(1));
        match text.split_once('e') {
            Some((mantissa, exp_part)) => {
                format!("{}e{}", strip_zeros(mantissa), exp_part)
            }
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, v))
    }
}

fn strip_zeros(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Assemble sign + prefix + digits with width/zero/left-justify rules.
fn pad_number(spec: Spec, negative: bool, digits: &str, prefix: &str) -> String {
    let sign = if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    };

    // Integer precision zero-pads the digits themselves.
    let digits = match spec.precision {
        Some(p) if p > digits.len() && !digits.contains('.') => {
            format!("{}{}", "0".repeat(p - digits.len()), digits)
        }
        _ => digits.to_string(),
    };

    let body_len = sign.len() + prefix.len() + digits.len();
    let width = spec.width.unwrap_or(0);
    if width <= body_len {
        return format!("{}{}{}", sign, prefix, digits);
    }
    let fill = width - body_len;
    if spec.minus {
        format!("{}{}{}{}", sign, prefix, digits, " ".repeat(fill))
    } else if spec.zero {
        format!("{}{}{}{}", sign, prefix, "0".repeat(fill), digits)
    } else {
        format!("{}{}{}{}", " ".repeat(fill), sign, prefix, digits)
    }
}

fn pad_text(spec: Spec, text: &str) -> String {
    let width = spec.width.unwrap_or(0);
    if width <= text.chars().count() {
        return text.to_string();
    }
    let fill = width - text.chars().count();
    if spec.minus {
        format!("{}{}", text, " ".repeat(fill))
    } else {
        format!("{}{}", " ".repeat(fill), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::value::{FloatWidth, IntWidth};

    fn s32(v: i64) -> Value {
        Value::signed(IntWidth::W32, v)
    }

    #[test]
    fn test_basic_int_and_string() {
        let out =
            format_string("%d %s", &[s32(7), Value::string_literal("hi")]).unwrap();
        assert_eq!(out, "7 hi");
    }

    #[test]
    fn test_mismatch_fails_with_format_error() {
        let err = format_string("%d", &[Value::string_literal("hi")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
        let err = format_string("%s", &[s32(1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn test_missing_argument_fails() {
        let err = format_string("%d %d", &[s32(1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn test_percent_escape() {
        assert_eq!(format_string("100%%", &[]).unwrap(), "100%");
    }

    #[test]
    fn test_hex_octal_and_alternate_form() {
        assert_eq!(format_string("%x", &[s32(255)]).unwrap(), "ff");
        assert_eq!(format_string("%X", &[s32(255)]).unwrap(), "FF");
        assert_eq!(format_string("%#x", &[s32(255)]).unwrap(), "0xff");
        assert_eq!(format_string("%o", &[s32(8)]).unwrap(), "10");
    }

    #[test]
    fn test_width_and_zero_pad() {
        assert_eq!(format_string("%5d", &[s32(42)]).unwrap(), "   42");
        assert_eq!(format_string("%-5d|", &[s32(42)]).unwrap(), "42   |");
        assert_eq!(format_string("%05d", &[s32(42)]).unwrap(), "00042");
        assert_eq!(format_string("%05d", &[s32(-42)]).unwrap(), "-0042");
    }

    #[test]
    fn test_plus_flag() {
        assert_eq!(format_string("%+d", &[s32(42)]).unwrap(), "+42");
        assert_eq!(format_string("%+d", &[s32(-42)]).unwrap(), "-42");
    }

    #[test]
    fn test_float_precision() {
        let half = Value::float(FloatWidth::W64, 1.5);
        assert_eq!(format_string("%f", &[half.clone()]).unwrap(), "1.500000");
        assert_eq!(format_string("%.2f", &[half]).unwrap(), "1.50");
    }

    #[test]
    fn test_float_accepts_int() {
        assert_eq!(format_string("%.1f", &[s32(3)]).unwrap(), "3.0");
    }

    #[test]
    fn test_exponential() {
        let v = Value::float(FloatWidth::W64, 1234.5);
        assert_eq!(format_string("%.2e", &[v]).unwrap(), "1.23e+03");
        let small = Value::float(FloatWidth::W64, 0.00015);
        assert_eq!(format_string("%.1e", &[small]).unwrap(), "1.5e-04");
    }

    #[test]
    fn test_general() {
        assert_eq!(
            format_string("%g", &[Value::float(FloatWidth::W64, 0.5)]).unwrap(),
            "0.5"
        );
        assert_eq!(
            format_string("%g", &[Value::float(FloatWidth::W64, 1e8)]).unwrap(),
            "1e+08"
        );
        assert_eq!(
            format_string("%g", &[Value::float(FloatWidth::W64, 100.0)]).unwrap(),
            "100"
        );
    }

    #[test]
    fn test_char_conversion() {
        assert_eq!(format_string("%c", &[s32(65)]).unwrap(), "A");
    }

    #[test]
    fn test_string_precision_truncates() {
        let s = Value::string_literal("template");
        assert_eq!(format_string("%.4s", &[s]).unwrap(), "temp");
    }

    #[test]
    fn test_negative_int() {
        assert_eq!(format_string("%d", &[s32(-7)]).unwrap(), "-7");
    }

    #[test]
    fn test_hex_negative_masks_to_width() {
        assert_eq!(format_string("%x", &[s32(-1)]).unwrap(), "ffffffff");
    }

    #[test]
    fn test_unsigned_conversion() {
        let v = Value::unsigned(IntWidth::W32, 4000000000);
        assert_eq!(format_string("%u", &[v]).unwrap(), "4000000000");
    }
}
