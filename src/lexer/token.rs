// Token definitions for the template language

use crate::name::Name;
use crate::span::Span;

/// A single token produced by the lexer.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token types in the template dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLiteral(u64),
    FloatLiteral(f64),
    StringLiteral(String),
    CharLiteral(u8),
    BoolLiteral(bool),

    Ident(Name),

    // Keywords - storage and definitions
    KwLocal,
    KwConst,
    KwStruct,
    KwUnion,
    KwEnum,
    KwTypedef,
    KwVoid,

    // Keywords - control flow
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwDo,
    KwSwitch,
    KwCase,
    KwDefault,
    KwBreak,
    KwContinue,
    KwReturn,

    // Arithmetic operators
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Bitwise operators
    Ampersand, // &
    Pipe,      // |
    Caret,     // ^
    Tilde,     // ~
    LShift,    // <<
    RShift,    // >>

    // Logical operators
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !

    // Comparison operators
    EqEq,      // ==
    BangEq,    // !=
    Less,      // <
    Greater,   // >
    LessEq,    // <=
    GreaterEq, // >=

    // Assignment operators
    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    AmpEq,     // &=
    PipeEq,    // |=
    CaretEq,   // ^=
    LShiftEq,  // <<=
    RShiftEq,  // >>=

    // Punctuation
    Dot,       // .
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Question,  // ?

    // Brackets
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::IntLiteral(v) => write!(f, "integer '{}'", v),
            TokenKind::FloatLiteral(v) => write!(f, "float '{}'", v),
            TokenKind::StringLiteral(v) => write!(f, "string \"{}\"", v),
            TokenKind::CharLiteral(v) => write!(f, "char '{}'", *v as char),
            TokenKind::BoolLiteral(v) => write!(f, "'{}'", v),
            TokenKind::Ident(_) => write!(f, "identifier"),
            TokenKind::KwLocal => write!(f, "'local'"),
            TokenKind::KwConst => write!(f, "'const'"),
            TokenKind::KwStruct => write!(f, "'struct'"),
            TokenKind::KwUnion => write!(f, "'union'"),
            TokenKind::KwEnum => write!(f, "'enum'"),
            TokenKind::KwTypedef => write!(f, "'typedef'"),
            TokenKind::KwVoid => write!(f, "'void'"),
            TokenKind::KwIf => write!(f, "'if'"),
            TokenKind::KwElse => write!(f, "'else'"),
            TokenKind::KwWhile => write!(f, "'while'"),
            TokenKind::KwFor => write!(f, "'for'"),
            TokenKind::KwDo => write!(f, "'do'"),
            TokenKind::KwSwitch => write!(f, "'switch'"),
            TokenKind::KwCase => write!(f, "'case'"),
            TokenKind::KwDefault => write!(f, "'default'"),
            TokenKind::KwBreak => write!(f, "'break'"),
            TokenKind::KwContinue => write!(f, "'continue'"),
            TokenKind::KwReturn => write!(f, "'return'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Ampersand => write!(f, "'&'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::LShift => write!(f, "'<<'"),
            TokenKind::RShift => write!(f, "'>>'"),
            TokenKind::AmpAmp => write!(f, "'&&'"),
            TokenKind::PipePipe => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::BangEq => write!(f, "'!='"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::LessEq => write!(f, "'<='"),
            TokenKind::GreaterEq => write!(f, "'>='"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::PlusEq => write!(f, "'+='"),
            TokenKind::MinusEq => write!(f, "'-='"),
            TokenKind::StarEq => write!(f, "'*='"),
            TokenKind::SlashEq => write!(f, "'/='"),
            TokenKind::PercentEq => write!(f, "'%='"),
            TokenKind::AmpEq => write!(f, "'&='"),
            TokenKind::PipeEq => write!(f, "'|='"),
            TokenKind::CaretEq => write!(f, "'^='"),
            TokenKind::LShiftEq => write!(f, "'<<='"),
            TokenKind::RShiftEq => write!(f, "'>>='"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Question => write!(f, "'?'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

impl TokenKind {
    /// Map an identifier string to its keyword token, if it is one.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "local" => Some(TokenKind::KwLocal),
            "const" => Some(TokenKind::KwConst),
            "struct" => Some(TokenKind::KwStruct),
            "union" => Some(TokenKind::KwUnion),
            "enum" => Some(TokenKind::KwEnum),
            "typedef" => Some(TokenKind::KwTypedef),
            "void" => Some(TokenKind::KwVoid),
            "if" => Some(TokenKind::KwIf),
            "else" => Some(TokenKind::KwElse),
            "while" => Some(TokenKind::KwWhile),
            "for" => Some(TokenKind::KwFor),
            "do" => Some(TokenKind::KwDo),
            "switch" => Some(TokenKind::KwSwitch),
            "case" => Some(TokenKind::KwCase),
            "default" => Some(TokenKind::KwDefault),
            "break" => Some(TokenKind::KwBreak),
            "continue" => Some(TokenKind::KwContinue),
            "return" => Some(TokenKind::KwReturn),
            "true" => Some(TokenKind::BoolLiteral(true)),
            "false" => Some(TokenKind::BoolLiteral(false)),
            _ => None,
        }
    }
}
