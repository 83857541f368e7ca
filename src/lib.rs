// Binary template language parser and interpreter library
//
// A template is a C-like program executed against a byte stream: file-typed
// declarations read the stream as they execute and accumulate an ordered
// ledger of values, which folds into a tree of annotated entries describing
// the stream's structure.

pub mod error;
pub mod eval;
pub mod lexer;
pub mod name;
pub mod parser;
pub mod span;
pub mod stdlib;

pub use error::{Error, ErrorKind, InterpretError, LexError, ParseError};
pub use eval::entry::{Entry, EntryValue};
pub use eval::stream::{with_restored_offset, Endianness, SliceStream, Stream};
pub use eval::value::{Value, ValueKind};
pub use eval::{Interpreter, VmState};
pub use parser::ast::Ast;

use error::ErrorKind as Kind;
use eval::entry;
use eval::value::Cell;
use lexer::Lexer;
use name::Interner;
use parser::Parser;
use tracing::debug;

/// Host embedding surface: accumulate template source with [`parse`],
/// execute it against a stream with [`read_io`], and emit the entry forest
/// with [`create_template`].
///
/// [`parse`]: TemplateEngine::parse
/// [`read_io`]: TemplateEngine::read_io
/// [`create_template`]: TemplateEngine::create_template
pub struct TemplateEngine {
    interner: Interner,
    ast: Ast,
    state: VmState,
    ledger: Vec<(String, Cell)>,
    output: Vec<String>,
    last_error: Option<InterpretError>,
    print_hook: Option<Box<dyn FnMut(&str)>>,
    entry_hook: Option<Box<dyn FnMut(&Entry)>>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            ast: Ast::default(),
            state: VmState::NoState,
            ledger: Vec::new(),
            output: Vec::new(),
            last_error: None,
            print_hook: None,
            entry_hook: None,
        }
    }

    /// Lex and parse template source, accumulating statements onto any
    /// previously parsed program. Failure parks the engine in `Error`.
    pub fn parse(&mut self, source: &str) -> Result<(), Error> {
        debug!(bytes = source.len(), "parsing template source");
        let (tokens, lex_errors) = Lexer::new(source, &mut self.interner).tokenize();
        if !lex_errors.is_empty() {
            self.state = VmState::Error;
            self.last_error = Some(InterpretError::new(Kind::Syntax, lex_errors[0].to_string()));
            return Err(Error::Lex(lex_errors));
        }
        match Parser::new(tokens, &mut self.interner).parse() {
            Ok(ast) => {
                self.ast.stmts.extend(ast.stmts);
                Ok(())
            }
            Err(errors) => {
                self.state = VmState::Error;
                self.last_error =
                    Some(InterpretError::new(Kind::Syntax, errors[0].to_string()));
                Err(Error::Parse(errors))
            }
        }
    }

    /// Interpret the accumulated program against a stream. Any previous
    /// ledger is discarded first; on failure the engine is left in `Error`
    /// and the next [`create_template`](TemplateEngine::create_template)
    /// emits an empty forest.
    pub fn read_io(&mut self, stream: &mut dyn Stream) -> Result<(), InterpretError> {
        self.ledger.clear();
        self.output.clear();

        let mut interp = Interpreter::new(stream, &mut self.interner);
        stdlib::register_all(&mut interp);
        let result = interp.run(&self.ast);
        self.state = interp.state();
        self.ledger = std::mem::take(&mut interp.ledger);
        self.output = std::mem::take(&mut interp.output);
        drop(interp);

        if let Some(hook) = &mut self.print_hook {
            for chunk in &self.output {
                hook(chunk);
            }
        }

        match result {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Fold the current ledger into the entry forest, in declaration order.
    /// After a failed run the ledger is cleared and the forest is empty.
    pub fn create_template(&mut self) -> Vec<Entry> {
        if self.state != VmState::NoState {
            self.ledger.clear();
            return Vec::new();
        }
        let forest = entry::build_forest(&self.ledger);
        if let Some(hook) = &mut self.entry_hook {
            for root in &forest {
                visit_entries(root, hook);
            }
        }
        debug!(roots = forest.len(), "entry forest built");
        forest
    }

    /// Parse, interpret, and fold in one step.
    pub fn run(&mut self, source: &str, stream: &mut dyn Stream) -> Result<Vec<Entry>, Error> {
        self.parse(source)?;
        self.read_io(stream).map_err(Error::Interpret)?;
        Ok(self.create_template())
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Everything printed by the last run, concatenated.
    pub fn output(&self) -> String {
        self.output.concat()
    }

    pub fn last_error(&self) -> Option<&InterpretError> {
        self.last_error.as_ref()
    }

    /// Redirect print output. The hook receives each printed chunk after a
    /// run completes, in emission order.
    pub fn set_print_hook(&mut self, hook: impl FnMut(&str) + 'static) {
        self.print_hook = Some(Box::new(hook));
    }

    /// Observe each entry (children first) as the forest is built.
    pub fn set_entry_hook(&mut self, hook: impl FnMut(&Entry) + 'static) {
        self.entry_hook = Some(Box::new(hook));
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn visit_entries(entry: &Entry, hook: &mut Box<dyn FnMut(&Entry)>) {
    for child in &entry.children {
        visit_entries(child, hook);
    }
    hook(entry);
}
