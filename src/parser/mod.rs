// Recursive-descent parser for the template language

pub mod ast;

use crate::error::ParseError;
use crate::lexer::token::{Token, TokenKind};
use crate::name::{Interner, Name};
use crate::span::Span;
use ast::*;

/// Built-in scalar type names recognized in cast expressions.
/// Casts are only meaningful for numeric primitives; user types are read,
/// not cast to.
fn is_cast_type_name(s: &str) -> bool {
    matches!(
        s,
        "char"
            | "byte"
            | "CHAR"
            | "BYTE"
            | "uchar"
            | "ubyte"
            | "UCHAR"
            | "UBYTE"
            | "short"
            | "int16"
            | "SHORT"
            | "INT16"
            | "ushort"
            | "uint16"
            | "USHORT"
            | "UINT16"
            | "WORD"
            | "int"
            | "int32"
            | "long"
            | "INT"
            | "INT32"
            | "LONG"
            | "uint"
            | "uint32"
            | "ulong"
            | "UINT"
            | "UINT32"
            | "ULONG"
            | "DWORD"
            | "int64"
            | "quad"
            | "QUAD"
            | "INT64"
            | "__int64"
            | "uint64"
            | "uquad"
            | "UQUAD"
            | "UINT64"
            | "QWORD"
            | "__uint64"
            | "float"
            | "FLOAT"
            | "double"
            | "DOUBLE"
    )
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    interner: &'a mut Interner,
    errors: Vec<ParseError>,
    anon_counter: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, interner: &'a mut Interner) -> Self {
        Self {
            tokens,
            pos: 0,
            interner,
            errors: Vec::new(),
            anon_counter: 0,
        }
    }

    /// Parse a complete statement list, collecting errors and synchronizing
    /// at statement boundaries after each failure.
    pub fn parse(mut self) -> Result<Ast, Vec<ParseError>> {
        let mut stmts = Vec::new();
        while !self.at_eof() {
            match self.parse_stmt() {
                Ok(mut parsed) => stmts.append(&mut parsed),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }
        if self.errors.is_empty() {
            Ok(Ast { stmts })
        } else {
            Err(self.errors)
        }
    }

    // ---- token helpers ----

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Span, ParseError> {
        if self.peek() == &kind {
            Ok(self.advance().span)
        } else {
            Err(ParseError::new(
                format!("expected {}, found {}", kind, self.peek()),
                self.peek_span(),
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Name, ParseError> {
        match *self.peek() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::new(
                format!("expected {}, found {}", what, self.peek()),
                self.peek_span(),
            )),
        }
    }

    /// Skip ahead to the next likely statement boundary after an error.
    fn synchronize(&mut self) {
        while !self.at_eof() {
            if matches!(self.advance().kind, TokenKind::Semicolon | TokenKind::RBrace) {
                return;
            }
        }
    }

    fn fresh_anon_name(&mut self, kind: &str) -> Name {
        let n = self.anon_counter;
        self.anon_counter += 1;
        self.interner.intern(&format!("__anon_{}_{}", kind, n))
    }

    // ---- statements ----

    /// Parse one source-level statement. Definitions with trailing
    /// declarators expand into multiple statements, hence the Vec.
    fn parse_stmt(&mut self) -> Result<Vec<Stmt>, ParseError> {
        match self.peek() {
            TokenKind::KwLocal | TokenKind::KwConst => {
                let storage = if matches!(self.peek(), TokenKind::KwConst) {
                    Storage::Const
                } else {
                    Storage::Local
                };
                let start = self.advance().span;
                let ty = self.expect_ident("type name")?;
                let decl = self.parse_var_decl(ty, storage, start)?;
                Ok(vec![decl])
            }
            TokenKind::KwStruct | TokenKind::KwUnion => self.parse_struct_def(),
            TokenKind::KwEnum => self.parse_enum_def(),
            TokenKind::KwTypedef => self.parse_typedef(),
            TokenKind::KwVoid => {
                let start = self.peek_span();
                self.advance();
                let name = self.expect_ident("function name")?;
                Ok(vec![self.parse_fn_def(None, name, start)?])
            }
            TokenKind::KwIf => Ok(vec![self.parse_if()?]),
            TokenKind::KwWhile => Ok(vec![self.parse_while()?]),
            TokenKind::KwDo => Ok(vec![self.parse_do_while()?]),
            TokenKind::KwFor => Ok(vec![self.parse_for()?]),
            TokenKind::KwSwitch => Ok(vec![self.parse_switch()?]),
            TokenKind::KwBreak => {
                let span = self.advance().span;
                self.expect(TokenKind::Semicolon)?;
                Ok(vec![Stmt {
                    kind: StmtKind::Break,
                    span,
                }])
            }
            TokenKind::KwContinue => {
                let span = self.advance().span;
                self.expect(TokenKind::Semicolon)?;
                Ok(vec![Stmt {
                    kind: StmtKind::Continue,
                    span,
                }])
            }
            TokenKind::KwReturn => {
                let span = self.advance().span;
                let value = if matches!(self.peek(), TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(vec![Stmt {
                    kind: StmtKind::Return(value),
                    span: span.merge(end),
                }])
            }
            TokenKind::LBrace => {
                let start = self.peek_span();
                let body = self.parse_block()?;
                Ok(vec![Stmt {
                    kind: StmtKind::Block(body),
                    span: start.merge(self.prev_span()),
                }])
            }
            TokenKind::Ident(name) => {
                let name = *name;
                // `Type name ...` is a declaration or a function definition;
                // anything else is an expression statement.
                if let TokenKind::Ident(second) = *self.peek_at(1) {
                    let start = self.peek_span();
                    if matches!(self.peek_at(2), TokenKind::LParen) {
                        self.advance();
                        self.advance();
                        return Ok(vec![self.parse_fn_def(Some(name), second, start)?]);
                    }
                    self.advance();
                    return Ok(vec![self.parse_var_decl(name, Storage::File, start)?]);
                }
                let stmt = self.parse_expr_stmt()?;
                Ok(vec![stmt])
            }
            _ => {
                let stmt = self.parse_expr_stmt()?;
                Ok(vec![stmt])
            }
        }
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        let span = expr.span;
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt {
            kind: StmtKind::ExprStmt(expr),
            span,
        })
    }

    /// Parse declarators after the type name has been consumed.
    fn parse_var_decl(
        &mut self,
        ty: Name,
        storage: Storage,
        start: Span,
    ) -> Result<Stmt, ParseError> {
        let mut declarators = Vec::new();
        loop {
            let name_span = self.peek_span();
            let name = self.expect_ident("variable name")?;
            let mut array_len = None;
            let mut bit_width = None;
            let mut init = None;

            if self.eat(&TokenKind::LBracket) {
                array_len = Some(self.parse_expr()?);
                self.expect(TokenKind::RBracket)?;
            }
            if self.eat(&TokenKind::Colon) {
                bit_width = Some(self.parse_expr()?);
            }
            if self.eat(&TokenKind::Eq) {
                init = Some(self.parse_assign_expr()?);
            }

            declarators.push(Declarator {
                name,
                array_len,
                bit_width,
                init,
                span: name_span.merge(self.prev_span()),
            });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt {
            kind: StmtKind::VarDecl(Box::new(VarDeclData {
                ty,
                storage,
                declarators,
            })),
            span: start.merge(end),
        })
    }

    /// `struct [Name] { body } [declarators] ;` — also handles `union`.
    /// A trailing declarator list expands to a definition plus a declaration.
    fn parse_struct_def(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let start = self.peek_span();
        let is_union = matches!(self.peek(), TokenKind::KwUnion);
        self.advance();

        let name = match *self.peek() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            _ => self.fresh_anon_name(if is_union { "union" } else { "struct" }),
        };

        let body = self.parse_block()?;
        let def_span = start.merge(self.prev_span());
        let def = Stmt {
            kind: StmtKind::StructDef(Box::new(StructDefData {
                name,
                is_union,
                body,
            })),
            span: def_span,
        };

        if self.eat(&TokenKind::Semicolon) {
            return Ok(vec![def]);
        }
        let decl = self.parse_var_decl(name, Storage::File, def_span)?;
        Ok(vec![def, decl])
    }

    /// `enum [<type>] [Name] { A [= expr], ... } [declarators] ;`
    fn parse_enum_def(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let start = self.advance().span;

        let underlying = if self.eat(&TokenKind::Less) {
            let ty = self.expect_ident("underlying type")?;
            self.expect(TokenKind::Greater)?;
            Some(ty)
        } else {
            None
        };

        let name = match *self.peek() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            _ => self.fresh_anon_name("enum"),
        };

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            let member_span = self.peek_span();
            let member_name = self.expect_ident("enum member")?;
            let value = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                value,
                span: member_span.merge(self.prev_span()),
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        let def_span = start.merge(self.prev_span());
        let def = Stmt {
            kind: StmtKind::EnumDef(Box::new(EnumDefData {
                name,
                underlying,
                members,
            })),
            span: def_span,
        };

        if self.eat(&TokenKind::Semicolon) {
            return Ok(vec![def]);
        }
        let decl = self.parse_var_decl(name, Storage::File, def_span)?;
        Ok(vec![def, decl])
    }

    /// `typedef Target Name [len] ;` or `typedef struct/union/enum ... Name ;`
    fn parse_typedef(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let start = self.advance().span;

        match self.peek() {
            TokenKind::KwStruct | TokenKind::KwUnion => {
                let is_union = matches!(self.peek(), TokenKind::KwUnion);
                self.advance();
                let tag = match *self.peek() {
                    TokenKind::Ident(name) => {
                        self.advance();
                        name
                    }
                    _ => self.fresh_anon_name(if is_union { "union" } else { "struct" }),
                };
                let body = self.parse_block()?;
                let alias = self.expect_ident("typedef name")?;
                let end = self.expect(TokenKind::Semicolon)?;
                let span = start.merge(end);
                Ok(vec![
                    Stmt {
                        kind: StmtKind::StructDef(Box::new(StructDefData {
                            name: tag,
                            is_union,
                            body,
                        })),
                        span,
                    },
                    Stmt {
                        kind: StmtKind::Typedef(Box::new(TypedefData {
                            target: tag,
                            name: alias,
                            array_len: None,
                        })),
                        span,
                    },
                ])
            }
            _ => {
                let target = self.expect_ident("type name")?;
                let alias = self.expect_ident("typedef name")?;
                let array_len = if self.eat(&TokenKind::LBracket) {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    Some(len)
                } else {
                    None
                };
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(vec![Stmt {
                    kind: StmtKind::Typedef(Box::new(TypedefData {
                        target,
                        name: alias,
                        array_len,
                    })),
                    span: start.merge(end),
                }])
            }
        }
    }

    /// Parameter list and body; return type and name already consumed.
    fn parse_fn_def(
        &mut self,
        ret: Option<Name>,
        name: Name,
        start: Span,
    ) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek(), TokenKind::RParen) {
            if matches!(self.peek(), TokenKind::KwVoid)
                && matches!(self.peek_at(1), TokenKind::RParen)
            {
                self.advance();
            } else {
                loop {
                    let param_span = self.peek_span();
                    let ty = self.expect_ident("parameter type")?;
                    let param_name = self.expect_ident("parameter name")?;
                    params.push(Param {
                        ty,
                        name: param_name,
                        span: param_span.merge(self.prev_span()),
                    });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt {
            kind: StmtKind::FnDef(Box::new(FnDefData {
                ret,
                name,
                params,
                body,
            })),
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            let mut parsed = self.parse_stmt()?;
            stmts.append(&mut parsed);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    /// A single statement or a braced block, as loop/branch body.
    fn parse_stmt_or_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if matches!(self.peek(), TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_stmt()
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let then_body = self.parse_stmt_or_block()?;
        let else_body = if self.eat(&TokenKind::KwElse) {
            Some(self.parse_stmt_or_block()?)
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If(Box::new(IfData {
                cond,
                then_body,
                else_body,
            })),
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_stmt_or_block()?;
        Ok(Stmt {
            kind: StmtKind::While(Box::new(WhileData { cond, body })),
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_do_while(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        let body = self.parse_stmt_or_block()?;
        self.expect(TokenKind::KwWhile)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt {
            kind: StmtKind::DoWhile(Box::new(DoWhileData { body, cond })),
            span: start.merge(end),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen)?;

        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else if matches!(self.peek(), TokenKind::KwLocal | TokenKind::KwConst) {
            let mut stmts = self.parse_stmt()?;
            debug_assert_eq!(stmts.len(), 1);
            Some(Box::new(stmts.remove(0)))
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span;
            self.expect(TokenKind::Semicolon)?;
            Some(Box::new(Stmt {
                kind: StmtKind::ExprStmt(expr),
                span,
            }))
        };

        let cond = if matches!(self.peek(), TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let step = if matches!(self.peek(), TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_stmt_or_block()?;
        Ok(Stmt {
            kind: StmtKind::For(Box::new(ForData {
                init,
                cond,
                step,
                body,
            })),
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen)?;
        let scrutinee = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace | TokenKind::Eof) {
            let arm_span = self.peek_span();
            let label = match self.peek() {
                TokenKind::KwCase => {
                    self.advance();
                    let expr = self.parse_expr()?;
                    self.expect(TokenKind::Colon)?;
                    Some(expr)
                }
                TokenKind::KwDefault => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    None
                }
                other => {
                    return Err(ParseError::new(
                        format!("expected 'case' or 'default', found {}", other),
                        self.peek_span(),
                    ))
                }
            };
            let mut body = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace | TokenKind::Eof
            ) {
                let mut parsed = self.parse_stmt()?;
                body.append(&mut parsed);
            }
            arms.push(SwitchArm {
                label,
                body,
                span: arm_span.merge(self.prev_span()),
            });
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt {
            kind: StmtKind::Switch(Box::new(SwitchData { scrutinee, arms })),
            span: start.merge(self.prev_span()),
        })
    }

    // ---- expressions ----

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assign_expr()
    }

    /// Assignment is right-associative and lowest-precedence.
    fn parse_assign_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_ternary()?;
        let op = match self.peek() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            TokenKind::AmpEq => AssignOp::BitAnd,
            TokenKind::PipeEq => AssignOp::BitOr,
            TokenKind::CaretEq => AssignOp::BitXor,
            TokenKind::LShiftEq => AssignOp::Shl,
            TokenKind::RShiftEq => AssignOp::Shr,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_assign_expr()?;
        let span = lhs.span.merge(rhs.span);
        Ok(Expr {
            kind: ExprKind::Assign {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(0)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.parse_assign_expr()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_assign_expr()?;
        let span = cond.span.merge(else_expr.span);
        Ok(Expr {
            kind: ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        })
    }

    fn binary_op_for(kind: &TokenKind) -> Option<(BinOp, u8)> {
        // Precedence levels follow C, higher binds tighter.
        let pair = match kind {
            TokenKind::PipePipe => (BinOp::LogOr, 1),
            TokenKind::AmpAmp => (BinOp::LogAnd, 2),
            TokenKind::Pipe => (BinOp::BitOr, 3),
            TokenKind::Caret => (BinOp::BitXor, 4),
            TokenKind::Ampersand => (BinOp::BitAnd, 5),
            TokenKind::EqEq => (BinOp::Eq, 6),
            TokenKind::BangEq => (BinOp::Ne, 6),
            TokenKind::Less => (BinOp::Lt, 7),
            TokenKind::Greater => (BinOp::Gt, 7),
            TokenKind::LessEq => (BinOp::Le, 7),
            TokenKind::GreaterEq => (BinOp::Ge, 7),
            TokenKind::LShift => (BinOp::Shl, 8),
            TokenKind::RShift => (BinOp::Shr, 8),
            TokenKind::Plus => (BinOp::Add, 9),
            TokenKind::Minus => (BinOp::Sub, 9),
            TokenKind::Star => (BinOp::Mul, 10),
            TokenKind::Slash => (BinOp::Div, 10),
            TokenKind::Percent => (BinOp::Mod, 10),
            _ => return None,
        };
        Some(pair)
    }

    /// Precedence-climbing binary expression parser.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, prec)) = Self::binary_op_for(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
                span,
            });
        }

        // Cast: `(type)expr` where `type` is a built-in scalar name.
        if matches!(self.peek(), TokenKind::LParen) {
            if let TokenKind::Ident(name) = *self.peek_at(1) {
                if matches!(self.peek_at(2), TokenKind::RParen)
                    && is_cast_type_name(self.interner.resolve(name))
                {
                    let start = self.advance().span; // (
                    self.advance(); // type
                    self.advance(); // )
                    let expr = self.parse_unary()?;
                    let span = start.merge(expr.span);
                    return Ok(Expr {
                        kind: ExprKind::Cast {
                            ty: name,
                            expr: Box::new(expr),
                        },
                        span,
                    });
                }
            }
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(TokenKind::RBracket)?;
                    let span = expr.span.merge(end);
                    expr = Expr {
                        kind: ExprKind::Index {
                            expr: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_ident("member name")?;
                    let span = expr.span.merge(self.prev_span());
                    expr = Expr {
                        kind: ExprKind::Member {
                            expr: Box::new(expr),
                            member,
                        },
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::IntLiteral(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::IntLiteral(v),
                    span,
                })
            }
            TokenKind::FloatLiteral(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::FloatLiteral(v),
                    span,
                })
            }
            TokenKind::StringLiteral(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::StringLiteral(v),
                    span,
                })
            }
            TokenKind::CharLiteral(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::CharLiteral(v),
                    span,
                })
            }
            TokenKind::BoolLiteral(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::BoolLiteral(v),
                    span,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !matches!(self.peek(), TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assign_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen)?;
                    return Ok(Expr {
                        kind: ExprKind::Call { callee: name, args },
                        span: span.merge(end),
                    });
                }
                Ok(Expr {
                    kind: ExprKind::Ident(name),
                    span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(ParseError::new(
                format!("expected expression, found {}", other),
                span,
            )),
        }
    }
}
