// AST node definitions for the template language

use crate::name::Name;
use crate::span::Span;

/// Top-level AST: a list of statements.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub stmts: Vec<Stmt>,
}

/// A statement with source span.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Storage class of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Reads from the byte stream at declaration time.
    File,
    /// In-memory binding only, no stream read, no entry.
    Local,
    /// Local binding that rejects later assignment.
    Const,
}

/// One declared name within a declaration statement.
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: Name,
    pub array_len: Option<Expr>,
    pub bit_width: Option<Expr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VarDeclData {
    pub ty: Name,
    pub storage: Storage,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone)]
pub struct StructDefData {
    pub name: Name,
    pub is_union: bool,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Name,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDefData {
    pub name: Name,
    /// Underlying integer type from `enum <type> Name`, defaulting to int.
    pub underlying: Option<Name>,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone)]
pub struct TypedefData {
    pub target: Name,
    pub name: Name,
    pub array_len: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Name,
    pub name: Name,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FnDefData {
    /// None for `void` functions.
    pub ret: Option<Name>,
    pub name: Name,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct IfData {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileData {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DoWhileData {
    pub body: Vec<Stmt>,
    pub cond: Expr,
}

#[derive(Debug, Clone)]
pub struct ForData {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// One `case expr:` or `default:` arm, with the statements up to the next label.
#[derive(Debug, Clone)]
pub struct SwitchArm {
    /// None for `default`.
    pub label: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchData {
    pub scrutinee: Expr,
    pub arms: Vec<SwitchArm>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl(Box<VarDeclData>),
    StructDef(Box<StructDefData>),
    EnumDef(Box<EnumDefData>),
    Typedef(Box<TypedefData>),
    FnDef(Box<FnDefData>),
    If(Box<IfData>),
    While(Box<WhileData>),
    DoWhile(Box<DoWhileData>),
    For(Box<ForData>),
    Switch(Box<SwitchData>),
    Break,
    Continue,
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    ExprStmt(Expr),
}

/// Expression with source span.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(u64),
    FloatLiteral(f64),
    StringLiteral(String),
    CharLiteral(u8),
    BoolLiteral(bool),

    Ident(Name),

    Call {
        callee: Name,
        args: Vec<Expr>,
    },

    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },

    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    Assign {
        op: AssignOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Array subscription: `expr[index]`
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },

    /// Member access: `expr.member`
    Member {
        expr: Box<Expr>,
        member: Name,
    },

    /// C-style cast to a built-in scalar type: `(type)expr`
    Cast {
        ty: Name,
        expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    /// The underlying binary operator of a compound assignment.
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
            AssignOp::BitAnd => Some(BinOp::BitAnd),
            AssignOp::BitOr => Some(BinOp::BitOr),
            AssignOp::BitXor => Some(BinOp::BitXor),
            AssignOp::Shl => Some(BinOp::Shl),
            AssignOp::Shr => Some(BinOp::Shr),
        }
    }
}
