// Expression evaluation
//
// eval_expr returns cells: place expressions (identifiers, member access,
// subscription) yield aliasing handles into the value tree, so assignment
// through them mutates the underlying variable; computed results are fresh
// cells.

use super::value::{cell, FloatWidth, IntWidth, ValueKind};
use super::*;
use crate::parser::ast::{AssignOp, BinOp, ExprKind};

impl<'a> Interpreter<'a> {
    /// Evaluate to a cell. Aliases for places, fresh for computed values.
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Cell, InterpretError> {
        match &expr.kind {
            ExprKind::IntLiteral(v) => Ok(cell(Value::int_literal(*v))),
            ExprKind::FloatLiteral(v) => Ok(cell(Value::float(FloatWidth::W64, *v))),
            ExprKind::StringLiteral(v) => Ok(cell(Value::string_literal(v))),
            ExprKind::CharLiteral(v) => {
                Ok(cell(Value::signed(IntWidth::W8, *v as i8 as i64)))
            }
            ExprKind::BoolLiteral(v) => Ok(cell(Value::boolean(*v))),

            ExprKind::Ident(name) => match self.scope.lookup(*name) {
                Some(binding) => Ok(binding.cell.clone()),
                None => Err(self
                    .error(
                        ErrorKind::UndefinedName,
                        format!("undefined variable '{}'", self.interner.resolve(*name)),
                    )
                    .with_span(expr.span)),
            },

            ExprKind::Call { callee, args } => {
                let result = self.call_function(*callee, args, expr.span)?;
                Ok(cell(result))
            }

            ExprKind::Binary { op, lhs, rhs } => {
                // Logical operators short-circuit.
                match op {
                    BinOp::LogAnd => {
                        let left = self.eval_value(lhs)?;
                        if !left.is_truthy() {
                            return Ok(cell(Value::boolean(false)));
                        }
                        let right = self.eval_value(rhs)?;
                        return Ok(cell(Value::boolean(right.is_truthy())));
                    }
                    BinOp::LogOr => {
                        let left = self.eval_value(lhs)?;
                        if left.is_truthy() {
                            return Ok(cell(Value::boolean(true)));
                        }
                        let right = self.eval_value(rhs)?;
                        return Ok(cell(Value::boolean(right.is_truthy())));
                    }
                    _ => {}
                }
                let left = self.eval_value(lhs)?;
                let right = self.eval_value(rhs)?;
                let result = value::binary_op(*op, &left, &right).map_err(|e| {
                    e.at_offset(self.stream.offset()).with_span_if_none(expr.span)
                })?;
                Ok(cell(result))
            }

            ExprKind::Unary { op, expr: inner } => {
                let operand = self.eval_value(inner)?;
                let result = value::unary_op(*op, &operand).map_err(|e| {
                    e.at_offset(self.stream.offset()).with_span_if_none(expr.span)
                })?;
                Ok(cell(result))
            }

            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval_value(cond)?.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            }

            ExprKind::Assign { op, lhs, rhs } => self.eval_assign(*op, lhs, rhs, expr.span),

            ExprKind::Index { expr: base, index } => {
                let base_cell = self.eval_expr(base)?;
                let idx = self.eval_index(index)?;
                let base_ref = base_cell.borrow();
                match &base_ref.kind {
                    ValueKind::Array { items } => items.get(idx).cloned().ok_or_else(|| {
                        self.error(
                            ErrorKind::Index,
                            format!("index {} out of bounds (length {})", idx, items.len()),
                        )
                        .with_span(expr.span)
                    }),
                    ValueKind::Str(s) => match s.bytes.get(idx) {
                        Some(&b) => Ok(cell(Value::signed(IntWidth::W8, b as i8 as i64))),
                        None => Err(self
                            .error(
                                ErrorKind::Index,
                                format!(
                                    "index {} out of bounds (length {})",
                                    idx,
                                    s.bytes.len()
                                ),
                            )
                            .with_span(expr.span)),
                    },
                    _ => Err(self
                        .type_error(format!("'{}' is not indexable", base_ref.type_name))
                        .with_span(expr.span)),
                }
            }

            ExprKind::Member { expr: base, member } => {
                let base_cell = self.eval_expr(base)?;
                let base_ref = base_cell.borrow();
                let member_str = self.interner.resolve(*member);
                match &base_ref.kind {
                    ValueKind::Composite { fields, .. } => fields
                        .iter()
                        .find(|(name, _)| name.as_str() == member_str)
                        .map(|(_, field)| field.clone())
                        .ok_or_else(|| {
                            self.error(
                                ErrorKind::UndefinedName,
                                format!(
                                    "'{}' has no member '{}'",
                                    base_ref.type_name, member_str
                                ),
                            )
                            .with_span(expr.span)
                        }),
                    _ => Err(self
                        .type_error(format!(
                            "member access on non-composite '{}'",
                            base_ref.type_name
                        ))
                        .with_span(expr.span)),
                }
            }

            ExprKind::Cast { ty, expr: inner } => {
                let class = self.types.prim_class_of(*ty).ok_or_else(|| {
                    self.type_error(format!(
                        "cannot cast to '{}'",
                        self.interner.resolve(*ty)
                    ))
                    .with_span(expr.span)
                })?;
                let operand = self.eval_value(inner)?;
                let result = value::cast_value(&operand, class).map_err(|e| {
                    e.at_offset(self.stream.offset()).with_span_if_none(expr.span)
                })?;
                Ok(cell(result))
            }
        }
    }

    /// Evaluate to a value snapshot (the common read path).
    pub(crate) fn eval_value(&mut self, expr: &Expr) -> Result<Value, InterpretError> {
        let result = self.eval_expr(expr)?;
        let value = result.borrow().clone();
        Ok(value)
    }

    fn eval_index(&mut self, index: &Expr) -> Result<usize, InterpretError> {
        let v = self.eval_value(index)?;
        if !v.is_scalar() {
            return Err(self.type_error("array index must be a scalar"));
        }
        let idx = v.to_i64()?;
        if idx < 0 {
            return Err(self.error(ErrorKind::Index, format!("negative index {}", idx)));
        }
        Ok(idx as usize)
    }

    /// Resolve an assignment target to its aliasing cell, rejecting
    /// non-places and const bindings.
    fn eval_place(&mut self, expr: &Expr) -> Result<Cell, InterpretError> {
        match &expr.kind {
            ExprKind::Ident(name) => match self.scope.lookup(*name) {
                Some(binding) => {
                    if binding.is_const {
                        let resolved = self.interner.resolve(*name);
                        Err(self
                            .type_error(format!("cannot assign to const '{}'", resolved))
                            .with_span(expr.span))
                    } else {
                        Ok(binding.cell.clone())
                    }
                }
                None => Err(self
                    .error(
                        ErrorKind::UndefinedName,
                        format!("undefined variable '{}'", self.interner.resolve(*name)),
                    )
                    .with_span(expr.span)),
            },
            ExprKind::Member { .. } => self.eval_expr(expr),
            ExprKind::Index { expr: base, .. } => {
                // String bytes are not assignable places; array elements are.
                let target = self.eval_expr(expr)?;
                let base_cell = self.eval_expr(base)?;
                if matches!(base_cell.borrow().kind, ValueKind::Str(_)) {
                    return Err(self
                        .type_error("cannot assign to a string element")
                        .with_span(expr.span));
                }
                Ok(target)
            }
            _ => Err(self
                .type_error("assignment target is not a variable, member, or element")
                .with_span(expr.span)),
        }
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<Cell, InterpretError> {
        let rhs_value = self.eval_value(rhs)?;
        let target = self.eval_place(lhs)?;

        let new_value = match op.binary_op() {
            None => rhs_value,
            Some(bin) => {
                let current = target.borrow().clone();
                value::binary_op(bin, &current, &rhs_value)
                    .map_err(|e| e.at_offset(self.stream.offset()).with_span_if_none(span))?
            }
        };

        // Assigning to a stream value mutates the in-memory snapshot only;
        // the stream itself is never written.
        value::assign_into(&mut target.borrow_mut(), &new_value)
            .map_err(|e| e.at_offset(self.stream.offset()).with_span_if_none(span))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::stream::SliceStream;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval_source(source: &str, data: &[u8]) -> Interpreter<'static> {
        // Tests drive the interpreter through leaked borrows for brevity.
        let interner = Box::leak(Box::new(Interner::new()));
        let stream = Box::leak(Box::new(SliceStream::new(Box::leak(
            data.to_vec().into_boxed_slice(),
        ))));
        let (tokens, lex_errors) = Lexer::new(source, interner).tokenize();
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
        let ast = Parser::new(tokens, interner).parse().expect("parse failed");
        let mut interp = Interpreter::new(stream, interner);
        crate::stdlib::register_all(&mut interp);
        interp.run(&ast).expect("run failed");
        interp
    }

    fn lookup_i64(interp: &mut Interpreter<'_>, name: &str) -> i64 {
        let key = interp.interner.lookup(name).expect("name not interned");
        let binding = interp.scope.lookup(key).expect("variable not found");
        let v = binding.cell.borrow().to_i64().unwrap();
        v
    }

    #[test]
    fn test_arithmetic_locals() {
        let mut interp = eval_source("local int x = 2 + 3 * 4;", &[]);
        assert_eq!(lookup_i64(&mut interp, "x"), 14);
    }

    #[test]
    fn test_compound_assign() {
        let mut interp = eval_source("local int x = 10; x += 5; x <<= 1;", &[]);
        assert_eq!(lookup_i64(&mut interp, "x"), 30);
    }

    #[test]
    fn test_ternary() {
        let mut interp = eval_source("local int x = 1 > 2 ? 10 : 20;", &[]);
        assert_eq!(lookup_i64(&mut interp, "x"), 20);
    }

    #[test]
    fn test_short_circuit_avoids_division_by_zero() {
        let mut interp = eval_source("local int x = 0 && (1 / 0); local int y = 1 || (1 / 0);", &[]);
        assert_eq!(lookup_i64(&mut interp, "x"), 0);
        assert_eq!(lookup_i64(&mut interp, "y"), 1);
    }

    #[test]
    fn test_member_aliasing_mutation() {
        let mut interp = eval_source(
            "struct P { uchar x; uchar y; } p; p.y = 9; local int v = p.y;",
            &[0x01, 0x02],
        );
        assert_eq!(lookup_i64(&mut interp, "v"), 9);
    }

    #[test]
    fn test_cast_expression() {
        let mut interp = eval_source("local int x = (int)3.9;", &[]);
        assert_eq!(lookup_i64(&mut interp, "x"), 3);
    }
}
