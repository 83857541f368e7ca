// Statement evaluation and control flow

use super::types::TypeDef;
use super::value::{cell, IntWidth, PrimClass, ValueKind};
use super::*;
use crate::parser::ast::{EnumDefData, ForData, Stmt, StmtKind, SwitchData};

impl<'a> Interpreter<'a> {
    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow, InterpretError> {
        match &stmt.kind {
            StmtKind::VarDecl(d) => {
                self.exec_var_decl(d)?;
                Ok(ControlFlow::None)
            }

            StmtKind::StructDef(d) => {
                self.types
                    .define(
                        d.name,
                        TypeDef::Struct {
                            name: d.name,
                            is_union: d.is_union,
                            body: std::rc::Rc::new(d.body.clone()),
                        },
                        self.interner,
                    )
                    .map_err(|e| e.with_span(stmt.span))?;
                Ok(ControlFlow::None)
            }

            StmtKind::EnumDef(d) => {
                self.exec_enum_def(d, stmt.span)?;
                Ok(ControlFlow::None)
            }

            StmtKind::Typedef(d) => {
                if !self.types.contains(d.target) {
                    return Err(self
                        .error(
                            ErrorKind::UndefinedName,
                            format!(
                                "undefined type '{}'",
                                self.interner.resolve(d.target)
                            ),
                        )
                        .with_span(stmt.span));
                }
                self.types
                    .define(
                        d.name,
                        TypeDef::Alias {
                            target: d.target,
                            array_len: d.array_len.clone(),
                        },
                        self.interner,
                    )
                    .map_err(|e| e.with_span(stmt.span))?;
                Ok(ControlFlow::None)
            }

            StmtKind::FnDef(d) => {
                self.define_fn(d).map_err(|e| e.with_span(stmt.span))?;
                Ok(ControlFlow::None)
            }

            StmtKind::If(d) => {
                if self.eval_value(&d.cond)?.is_truthy() {
                    self.exec_body_scoped(&d.then_body)
                } else if let Some(else_body) = &d.else_body {
                    self.exec_body_scoped(else_body)
                } else {
                    Ok(ControlFlow::None)
                }
            }

            StmtKind::While(d) => {
                loop {
                    if !self.eval_value(&d.cond)?.is_truthy() {
                        break;
                    }
                    self.loop_depth += 1;
                    let flow = self.exec_body_scoped(&d.body);
                    self.loop_depth -= 1;
                    match flow? {
                        ControlFlow::None | ControlFlow::Continue => {}
                        ControlFlow::Break => break,
                        ret @ ControlFlow::Return(_) => return Ok(ret),
                    }
                }
                Ok(ControlFlow::None)
            }

            StmtKind::DoWhile(d) => {
                loop {
                    self.loop_depth += 1;
                    let flow = self.exec_body_scoped(&d.body);
                    self.loop_depth -= 1;
                    match flow? {
                        ControlFlow::None | ControlFlow::Continue => {}
                        ControlFlow::Break => break,
                        ret @ ControlFlow::Return(_) => return Ok(ret),
                    }
                    if !self.eval_value(&d.cond)?.is_truthy() {
                        break;
                    }
                }
                Ok(ControlFlow::None)
            }

            StmtKind::For(d) => {
                // The init declaration lives in its own frame around the loop.
                self.push_scope();
                let result = self.exec_for(d);
                self.pop_scope();
                result
            }

            StmtKind::Switch(d) => self.exec_switch(d),

            StmtKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    Err(self
                        .type_error("'break' outside of a loop or switch")
                        .with_span(stmt.span))
                } else {
                    Ok(ControlFlow::Break)
                }
            }

            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    Err(self
                        .type_error("'continue' outside of a loop")
                        .with_span(stmt.span))
                } else {
                    Ok(ControlFlow::Continue)
                }
            }

            StmtKind::Return(expr) => {
                if self.fn_depth == 0 {
                    return Err(self
                        .type_error("'return' outside of a function")
                        .with_span(stmt.span));
                }
                let value = match expr {
                    Some(e) => self.eval_value(e)?,
                    None => Value::null(),
                };
                Ok(ControlFlow::Return(value))
            }

            StmtKind::Block(body) => self.exec_body_scoped(body),

            StmtKind::ExprStmt(expr) => {
                self.eval_expr(expr)?;
                Ok(ControlFlow::None)
            }
        }
    }

    /// Execute statements without a new frame, propagating control flow.
    pub(crate) fn exec_body(&mut self, body: &[Stmt]) -> Result<ControlFlow, InterpretError> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                ControlFlow::None => {}
                flow => return Ok(flow),
            }
        }
        Ok(ControlFlow::None)
    }

    /// Execute statements in a fresh frame, released on every exit path.
    pub(crate) fn exec_body_scoped(
        &mut self,
        body: &[Stmt],
    ) -> Result<ControlFlow, InterpretError> {
        self.push_scope();
        let result = self.exec_body(body);
        self.pop_scope();
        result
    }

    fn exec_for(&mut self, d: &ForData) -> Result<ControlFlow, InterpretError> {
        if let Some(init) = &d.init {
            self.exec_stmt(init)?;
        }
        loop {
            if let Some(cond) = &d.cond {
                if !self.eval_value(cond)?.is_truthy() {
                    break;
                }
            }
            self.loop_depth += 1;
            let flow = self.exec_body_scoped(&d.body);
            self.loop_depth -= 1;
            match flow? {
                ControlFlow::None | ControlFlow::Continue => {}
                ControlFlow::Break => break,
                ret @ ControlFlow::Return(_) => return Ok(ret),
            }
            if let Some(step) = &d.step {
                self.eval_expr(step)?;
            }
        }
        Ok(ControlFlow::None)
    }

    /// C switch semantics: execution starts at the first matching case (or
    /// `default` when none match) and falls through until `break`.
    fn exec_switch(&mut self, d: &SwitchData) -> Result<ControlFlow, InterpretError> {
        let scrutinee = self.eval_value(&d.scrutinee)?;

        let mut start = None;
        for (i, arm) in d.arms.iter().enumerate() {
            if let Some(label) = &arm.label {
                let label_value = self.eval_value(label)?;
                let equal = value::values_equal(&scrutinee, &label_value)
                    .map_err(|e| e.at_offset(self.stream.offset()).with_span_if_none(arm.span))?;
                if equal {
                    start = Some(i);
                    break;
                }
            }
        }
        if start.is_none() {
            start = d.arms.iter().position(|arm| arm.label.is_none());
        }
        let Some(start) = start else {
            return Ok(ControlFlow::None);
        };

        self.switch_depth += 1;
        self.push_scope();
        let mut result = Ok(ControlFlow::None);
        'arms: for arm in &d.arms[start..] {
            for stmt in &arm.body {
                match self.exec_stmt(stmt) {
                    Ok(ControlFlow::None) => {}
                    Ok(ControlFlow::Break) => break 'arms,
                    Ok(flow) => {
                        result = Ok(flow);
                        break 'arms;
                    }
                    Err(e) => {
                        result = Err(e);
                        break 'arms;
                    }
                }
            }
        }
        self.pop_scope();
        self.switch_depth -= 1;
        result
    }

    fn exec_enum_def(&mut self, d: &EnumDefData, span: Span) -> Result<(), InterpretError> {
        let (width, signed) = match d.underlying {
            Some(ty) => match self.types.prim_class_of(ty) {
                Some(PrimClass::Signed(w)) => (w, true),
                Some(PrimClass::Unsigned(w)) => (w, false),
                _ => {
                    return Err(self
                        .type_error(format!(
                            "enum underlying type '{}' is not an integer",
                            self.interner.resolve(ty)
                        ))
                        .with_span(span))
                }
            },
            None => (IntWidth::W32, true),
        };

        // Member values auto-increment from the previous member.
        let mut next = 0i64;
        let mut members = Vec::with_capacity(d.members.len());
        for member in &d.members {
            let value = match &member.value {
                Some(expr) => {
                    let v = self.eval_value(expr)?;
                    if !v.is_scalar() {
                        return Err(self
                            .type_error("enum member value must be a scalar")
                            .with_span(member.span));
                    }
                    v.to_i64()?
                }
                None => next,
            };
            next = value.wrapping_add(1);
            members.push((self.interner.resolve(member.name).to_string(), value));
        }

        self.types
            .define(
                d.name,
                TypeDef::Enum {
                    name: d.name,
                    width,
                    signed,
                    members: members.clone(),
                },
                self.interner,
            )
            .map_err(|e| e.with_span(span))?;

        // Members double as constants in the surrounding scope.
        let enum_type_name = self.interner.resolve(d.name).to_string();
        for (member, (member_name, value)) in d.members.iter().zip(&members) {
            let constant = Value::new(
                ValueKind::Enum {
                    width,
                    signed,
                    value: *value,
                    variant: Some(member_name.clone()),
                },
                enum_type_name.clone(),
            );
            self.scope
                .declare(member.name, cell(constant), true, &self.types, self.interner)
                .map_err(|e| e.with_span(member.span))?;
        }
        Ok(())
    }
}
