// Declaration execution: the read-on-declare protocol
//
// File-typed declarations materialize their value by reading the stream at
// the current cursor: primitives with one typed read, composites by running
// their body statements in a fresh frame, arrays by repeating the element
// materialization. Local declarations never touch the stream.

use std::rc::Rc;

use tracing::trace;

use super::stream::Endianness;
use super::types::TypeDef;
use super::value::{cell, FloatWidth, IntWidth, Origin, PrimClass, StrData, ValueKind};
use super::*;
use crate::parser::ast::{Declarator, Storage, VarDeclData};

/// Decode little/big-endian bytes into an unsigned 64-bit value.
pub(crate) fn decode_unsigned(bytes: &[u8], endian: Endianness) -> u64 {
    let mut v = 0u64;
    match endian {
        Endianness::Little => {
            for (i, &b) in bytes.iter().enumerate() {
                v |= (b as u64) << (i * 8);
            }
        }
        Endianness::Big => {
            for &b in bytes {
                v = (v << 8) | b as u64;
            }
        }
    }
    v
}

/// Decode bytes as a sign-extended integer of the given byte width.
pub(crate) fn decode_signed(bytes: &[u8], endian: Endianness) -> i64 {
    let raw = decode_unsigned(bytes, endian);
    sign_extend(raw, bytes.len() as u32 * 8)
}

pub(crate) fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

impl<'a> Interpreter<'a> {
    pub(crate) fn exec_var_decl(&mut self, d: &VarDeclData) -> Result<(), InterpretError> {
        for declarator in &d.declarators {
            match d.storage {
                Storage::Local | Storage::Const => {
                    self.declare_local(d.ty, declarator, d.storage == Storage::Const)?
                }
                Storage::File => self.declare_file(d.ty, declarator)?,
            }
        }
        Ok(())
    }

    // ---- local declarations ----

    fn declare_local(
        &mut self,
        ty: Name,
        declarator: &Declarator,
        is_const: bool,
    ) -> Result<(), InterpretError> {
        if declarator.bit_width.is_some() {
            return Err(self
                .type_error("bitfields are only valid on stream declarations")
                .with_span(declarator.span));
        }

        let mut value = match &declarator.array_len {
            Some(len_expr) => {
                let n = self.eval_array_len(len_expr)?;
                self.default_array_of(ty, n)?
            }
            None => self.default_value_of(ty)?,
        };
        value.type_name = self.interner.resolve(ty).to_string();

        if let Some(init) = &declarator.init {
            let init_value = self.eval_value(init)?;
            value::assign_into(&mut value, &init_value)
                .map_err(|e| e.at_offset(self.stream.offset()).with_span_if_none(declarator.span))?;
        }

        self.scope
            .declare(declarator.name, cell(value), is_const, &self.types, self.interner)
            .map_err(|e| e.with_span(declarator.span))
    }

    /// Zero/default value of a named type, for locals and parameters.
    pub(crate) fn default_value_of(&mut self, ty: Name) -> Result<Value, InterpretError> {
        let def = self.types.get(ty).ok_or_else(|| {
            self.error(
                ErrorKind::UndefinedName,
                format!("undefined type '{}'", self.interner.resolve(ty)),
            )
        })?;
        match &*def {
            TypeDef::Primitive(class) => Ok(match class {
                PrimClass::Signed(w) => Value::signed(*w, 0),
                PrimClass::Unsigned(w) => Value::unsigned(*w, 0),
                PrimClass::Float(w) => Value::float(*w, 0.0),
            }),
            TypeDef::StringType => Ok(Value::new(
                ValueKind::Str(StrData::nul_terminated(Vec::new())),
                "string",
            )),
            TypeDef::Enum { width, signed, .. } => Ok(Value::new(
                ValueKind::Enum {
                    width: *width,
                    signed: *signed,
                    value: 0,
                    variant: None,
                },
                self.interner.resolve(ty).to_string(),
            )),
            TypeDef::Alias { target, array_len } => match array_len.clone() {
                Some(len_expr) => {
                    let n = self.eval_array_len(&len_expr)?;
                    self.default_array_of(*target, n)
                }
                None => self.default_value_of(*target),
            },
            TypeDef::Struct { .. } => Err(self.type_error(format!(
                "cannot create a local of composite type '{}'",
                self.interner.resolve(ty)
            ))),
        }
    }

    fn default_array_of(&mut self, elem_ty: Name, n: u64) -> Result<Value, InterpretError> {
        // char arrays are strings in this dialect.
        if self.is_char_type(elem_ty) {
            return Ok(Value::new(
                ValueKind::Str(StrData::length_bounded(vec![0; n as usize])),
                self.interner.resolve(elem_ty).to_string(),
            ));
        }
        let mut items = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let mut elem = self.default_value_of(elem_ty)?;
            elem.type_name = self.interner.resolve(elem_ty).to_string();
            items.push(cell(elem));
        }
        Ok(Value::new(
            ValueKind::Array { items },
            self.interner.resolve(elem_ty).to_string(),
        ))
    }

    // ---- file declarations ----

    fn declare_file(&mut self, ty: Name, declarator: &Declarator) -> Result<(), InterpretError> {
        if declarator.init.is_some() {
            return Err(self
                .type_error(format!(
                    "'{}' reads from the stream and cannot take an initializer",
                    self.interner.resolve(declarator.name)
                ))
                .with_span(declarator.span));
        }

        if let Some(width_expr) = &declarator.bit_width {
            if declarator.array_len.is_some() {
                return Err(self
                    .type_error("a declaration cannot be both an array and a bitfield")
                    .with_span(declarator.span));
            }
            let width_expr = width_expr.clone();
            return self.declare_bitfield(ty, declarator, &width_expr);
        }

        // A non-bitfield declaration closes any open storage unit.
        if let Some(ctx) = self.composites.last_mut() {
            ctx.bits = None;
        }

        let len = match &declarator.array_len {
            Some(len_expr) => Some(self.eval_array_len(len_expr)?),
            None => None,
        };

        trace!(
            name = self.interner.resolve(declarator.name),
            ty = self.interner.resolve(ty),
            offset = self.stream.offset(),
            "materializing declaration"
        );

        let value_cell = self.materialize(ty, len)?;
        value_cell.borrow_mut().type_name = self.interner.resolve(ty).to_string();
        self.bind_declared(declarator.name, value_cell, declarator.span)
    }

    /// Bind a materialized value: inside a composite body it becomes a
    /// field (and a scope binding for later field expressions); at the top
    /// level it is appended to the allocation ledger.
    fn bind_declared(
        &mut self,
        name: Name,
        value_cell: Cell,
        span: Span,
    ) -> Result<(), InterpretError> {
        let name_str = self.interner.resolve(name).to_string();
        if let Some(ctx) = self.composites.last_mut() {
            ctx.fields.push((name_str, value_cell.clone()));
            let is_union = ctx.is_union;
            let union_start = ctx.start;
            self.scope
                .declare(name, value_cell, false, &self.types, self.interner)
                .map_err(|e| e.with_span(span))?;
            // Track the farthest offset any member reached; a backward
            // seek in the body must not shrink the composite's span.
            let end = self.stream.offset();
            if let Some(ctx) = self.composites.last_mut() {
                if end > ctx.max_end {
                    ctx.max_end = end;
                }
            }
            // Union members all decode from the union's start; the widest
            // member decides where the cursor ends up.
            if is_union {
                self.stream.seek(union_start);
            }
        } else {
            self.scope
                .declare(name, value_cell.clone(), false, &self.types, self.interner)
                .map_err(|e| e.with_span(span))?;
            if self.fn_depth == 0 {
                self.ledger.push((name_str, value_cell));
            }
        }
        Ok(())
    }

    // ---- materialization ----

    pub(crate) fn materialize(
        &mut self,
        ty: Name,
        len: Option<u64>,
    ) -> Result<Cell, InterpretError> {
        match len {
            Some(n) => self.materialize_array(ty, n),
            None => self.materialize_one(ty),
        }
    }

    fn materialize_one(&mut self, ty: Name) -> Result<Cell, InterpretError> {
        let def = self.types.get(ty).ok_or_else(|| {
            self.error(
                ErrorKind::UndefinedName,
                format!("undefined type '{}'", self.interner.resolve(ty)),
            )
        })?;
        match &*def {
            TypeDef::Primitive(class) => {
                let v = self.read_primitive(*class, ty)?;
                Ok(cell(v))
            }
            TypeDef::StringType => {
                let start = self.stream.offset();
                let bytes = self.stream.read_string(-1)?;
                let size = bytes.len() as u64 + 1;
                let mut v = Value::new(ValueKind::Str(StrData::nul_terminated(bytes)), "string");
                self.stamp(&mut v, start, size);
                Ok(cell(v))
            }
            TypeDef::Alias { target, array_len } => match array_len.clone() {
                Some(len_expr) => {
                    let n = self.eval_array_len(&len_expr)?;
                    self.materialize_array(*target, n)
                }
                None => self.materialize_one(*target),
            },
            TypeDef::Struct { is_union, body, .. } => {
                let body = Rc::clone(body);
                self.materialize_composite(ty, *is_union, &body)
            }
            TypeDef::Enum {
                width,
                signed,
                members,
                ..
            } => {
                let v = self.read_enum(ty, *width, *signed, members.clone())?;
                Ok(cell(v))
            }
        }
    }

    fn materialize_array(&mut self, elem_ty: Name, n: u64) -> Result<Cell, InterpretError> {
        let start = self.stream.offset();

        // char[n] reads as a length-bounded string, not an element list.
        if self.is_char_type(elem_ty) {
            let bytes = self.stream.read(n)?;
            let mut v = Value::new(
                ValueKind::Str(StrData::length_bounded(bytes)),
                self.interner.resolve(elem_ty).to_string(),
            );
            self.stamp(&mut v, start, n);
            return Ok(cell(v));
        }

        let mut items = Vec::with_capacity(n.min(1024) as usize);
        // Elements whose bodies seek backward can leave the cursor before
        // the array start; the span comes from the element extents.
        let mut end = start;
        for _ in 0..n {
            let item = self.materialize_one(elem_ty)?;
            {
                let elem = item.borrow();
                if let Origin::Stream { offset } = elem.origin {
                    end = end.max(offset + elem.size);
                }
            }
            items.push(item);
        }
        let end = end.max(self.stream.offset()).max(start);
        let size = end - start;
        let mut v = Value::new(
            ValueKind::Array { items },
            self.interner.resolve(elem_ty).to_string(),
        );
        self.stamp(&mut v, start, size);
        Ok(cell(v))
    }

    fn materialize_composite(
        &mut self,
        ty: Name,
        is_union: bool,
        body: &[crate::parser::ast::Stmt],
    ) -> Result<Cell, InterpretError> {
        self.enter_depth()?;
        let start = self.stream.offset();

        // The body runs in a fresh frame with its own loop/fn context so
        // stray break/return inside the body are rejected, not leaked to
        // an enclosing loop or call.
        let saved_loop = std::mem::take(&mut self.loop_depth);
        let saved_switch = std::mem::take(&mut self.switch_depth);
        let saved_fn = std::mem::take(&mut self.fn_depth);
        self.push_scope();
        self.composites.push(CompositeCtx {
            fields: Vec::new(),
            is_union,
            start,
            max_end: start,
            bits: None,
        });

        let mut result = Ok(());
        for stmt in body {
            match self.exec_stmt(stmt) {
                Ok(ControlFlow::None) => {}
                Ok(_) => unreachable!("control flow escaped composite body"),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        let ctx = self.composites.pop().unwrap();
        self.pop_scope();
        self.loop_depth = saved_loop;
        self.switch_depth = saved_switch;
        self.fn_depth = saved_fn;
        self.leave_depth();
        result?;

        // The span covers the farthest member end even when a backward
        // seek left the cursor before it, or before the start.
        let end = ctx.max_end.max(self.stream.offset()).max(start);
        if is_union {
            self.stream.seek(end);
        }
        let size = end - start;

        let mut v = Value::new(
            ValueKind::Composite {
                fields: ctx.fields,
                is_union,
            },
            self.interner.resolve(ty).to_string(),
        );
        self.stamp(&mut v, start, size);
        Ok(cell(v))
    }

    fn read_primitive(&mut self, class: PrimClass, ty: Name) -> Result<Value, InterpretError> {
        let start = self.stream.offset();
        let endian = self.stream.endian();
        let width = match class {
            PrimClass::Signed(w) | PrimClass::Unsigned(w) => w.bytes(),
            PrimClass::Float(w) => w.bytes(),
        };
        let bytes = self.stream.read(width)?;

        let kind = match class {
            PrimClass::Unsigned(w) => ValueKind::Unsigned {
                width: w,
                value: decode_unsigned(&bytes, endian),
            },
            PrimClass::Signed(w) => ValueKind::Signed {
                width: w,
                value: decode_signed(&bytes, endian),
            },
            PrimClass::Float(FloatWidth::W32) => ValueKind::Float {
                width: FloatWidth::W32,
                value: f32::from_bits(decode_unsigned(&bytes, endian) as u32) as f64,
            },
            PrimClass::Float(FloatWidth::W64) => ValueKind::Float {
                width: FloatWidth::W64,
                value: f64::from_bits(decode_unsigned(&bytes, endian)),
            },
        };

        let mut v = Value::new(kind, self.interner.resolve(ty).to_string());
        self.stamp(&mut v, start, width);
        Ok(v)
    }

    fn read_enum(
        &mut self,
        ty: Name,
        width: IntWidth,
        signed: bool,
        members: Vec<(String, i64)>,
    ) -> Result<Value, InterpretError> {
        let start = self.stream.offset();
        let endian = self.stream.endian();
        let bytes = self.stream.read(width.bytes())?;
        let value = if signed {
            decode_signed(&bytes, endian)
        } else {
            decode_unsigned(&bytes, endian) as i64
        };
        let variant = members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.clone());

        let mut v = Value::new(
            ValueKind::Enum {
                width,
                signed,
                value,
                variant,
            },
            self.interner.resolve(ty).to_string(),
        );
        self.stamp(&mut v, start, width.bytes());
        Ok(v)
    }

    /// Bitfield member: consecutive bitfields of one storage width pack
    /// into a single unit read once; bit order follows the endianness in
    /// force when the unit was opened.
    fn declare_bitfield(
        &mut self,
        ty: Name,
        declarator: &Declarator,
        width_expr: &Expr,
    ) -> Result<(), InterpretError> {
        if self.composites.is_empty() {
            return Err(self
                .type_error("bitfields are only valid inside a struct or union")
                .with_span(declarator.span));
        }
        let (storage, signed) = match self.types.prim_class_of(ty) {
            Some(PrimClass::Signed(w)) => (w, true),
            Some(PrimClass::Unsigned(w)) => (w, false),
            _ => {
                return Err(self
                    .type_error(format!(
                        "bitfield storage type '{}' is not an integer",
                        self.interner.resolve(ty)
                    ))
                    .with_span(declarator.span))
            }
        };

        let width_value = self.eval_value(width_expr)?;
        if !width_value.is_scalar() {
            return Err(self
                .type_error("bitfield width must be a scalar")
                .with_span(declarator.span));
        }
        let bits = width_value.to_i64()?;
        let unit_bits = storage.bits();
        if bits < 1 || bits as u32 > unit_bits {
            return Err(self
                .type_error(format!(
                    "bitfield width {} does not fit {} ({} bits)",
                    bits,
                    self.interner.resolve(ty),
                    unit_bits
                ))
                .with_span(declarator.span));
        }
        let bits = bits as u32;

        let endian = self.stream.endian();
        let need_new_unit = match self.composites.last().and_then(|ctx| ctx.bits.as_ref()) {
            None => true,
            Some(unit) => {
                unit.unit_bytes != storage.bytes() || unit.bits_used + bits > unit_bits
            }
        };
        if need_new_unit {
            let unit_offset = self.stream.offset();
            let bytes = self.stream.read(storage.bytes())?;
            let raw = decode_unsigned(&bytes, endian);
            self.composites.last_mut().unwrap().bits = Some(BitCtx {
                unit_offset,
                unit_bytes: storage.bytes(),
                bits_used: 0,
                raw,
            });
        }

        let ctx = self.composites.last_mut().unwrap();
        let unit = ctx.bits.as_mut().unwrap();
        // Little-endian packs from the least significant bit up, big-endian
        // from the most significant bit down.
        let shift = match endian {
            Endianness::Little => unit.bits_used,
            Endianness::Big => unit_bits - unit.bits_used - bits,
        };
        let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
        let raw_field = (unit.raw >> shift) & mask;
        unit.bits_used += bits;
        let unit_offset = unit.unit_offset;

        let kind = if signed {
            ValueKind::Signed {
                width: storage,
                value: sign_extend(raw_field, bits),
            }
        } else {
            ValueKind::Unsigned {
                width: storage,
                value: raw_field,
            }
        };
        let mut v = Value::new(kind, self.interner.resolve(ty).to_string());
        self.stamp(&mut v, unit_offset, storage.bytes());
        self.bind_declared(declarator.name, cell(v), declarator.span)
    }

    /// Attach stream origin, span size, endianness and the colors current
    /// at this declaration.
    fn stamp(&self, value: &mut Value, offset: u64, size: u64) {
        value.origin = Origin::Stream { offset };
        value.size = size;
        value.endian = self.stream.endian();
        value.fg_color = self.fg_color;
        value.bg_color = self.bg_color;
    }

    fn is_char_type(&self, ty: Name) -> bool {
        matches!(
            self.types.prim_class_of(ty),
            Some(PrimClass::Signed(IntWidth::W8))
        )
    }

    pub(crate) fn eval_array_len(&mut self, expr: &Expr) -> Result<u64, InterpretError> {
        let v = self.eval_value(expr)?;
        if !v.is_scalar() {
            return Err(self
                .type_error("array length must be a scalar")
                .with_span(expr.span));
        }
        let n = v.to_i64()?;
        if n < 0 {
            return Err(self
                .type_error(format!("array length must be non-negative, got {}", n))
                .with_span(expr.span));
        }
        Ok(n as u64)
    }
}
