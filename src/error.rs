// Error types for the template language

use crate::span::Span;
use std::fmt;

/// Lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lex error: {}", self.message)
    }
}

impl std::error::Error for LexError {}

/// Parse error with source location.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Classification of interpretation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source, surfaced by the frontend.
    Syntax,
    /// Operand or argument of the wrong kind.
    Type,
    /// Wrong argument count to a function.
    Arity,
    UndefinedName,
    Redeclaration,
    /// Division by zero, or overflow on a checked narrowing cast.
    Arithmetic,
    Index,
    /// Short read or read past end of stream.
    Eof,
    /// Printf specifier/value mismatch.
    Format,
    NotImplemented,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Type => "type error",
            ErrorKind::Arity => "arity error",
            ErrorKind::UndefinedName => "undefined name",
            ErrorKind::Redeclaration => "redeclaration",
            ErrorKind::Arithmetic => "arithmetic error",
            ErrorKind::Index => "index error",
            ErrorKind::Eof => "end of stream",
            ErrorKind::Format => "format error",
            ErrorKind::NotImplemented => "not implemented",
        }
    }
}

/// Interpretation error: kind, message, and the stream offset at the
/// failure point when one is meaningful.
#[derive(Debug, Clone)]
pub struct InterpretError {
    pub kind: ErrorKind,
    pub message: String,
    pub offset: Option<u64>,
    pub span: Option<Span>,
}

impl InterpretError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
            span: None,
        }
    }

    pub fn at_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set the span only if none was recorded closer to the failure.
    pub fn with_span_if_none(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " (stream offset {:#x})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for InterpretError {}

/// Top-level error type for the engine surface.
#[derive(Debug)]
pub enum Error {
    Lex(Vec<LexError>),
    Parse(Vec<ParseError>),
    Interpret(InterpretError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(errors) => {
                for e in errors {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            Error::Parse(errors) => {
                for e in errors {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            Error::Interpret(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}
