//! Compiles Jack source to stack machine instructions in a single pass.
//!
//! The pipeline is a hand-written tokenizer feeding a recursive-descent
//! engine that emits instructions while it parses; there is no intermediate
//! tree.  One call compiles one class.

pub mod diagnostics;
pub mod engine;
pub mod lexer;
pub mod symbol_table;
pub mod trace;

pub use lexer::Span;

use engine::{CompilationEngine, ParseError, SemanticError, UndefinedNameError};
use lexer::{LexError, Tokenizer};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq, Eq)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    UndefinedName(UndefinedNameError),
    Semantic(SemanticError),
}

impl CompileError {
    pub fn span(&self) -> &Span {
        match self {
            CompileError::Lex(err) => err.span(),
            CompileError::Parse(err) => err.span(),
            CompileError::UndefinedName(err) => err.span(),
            CompileError::Semantic(err) => err.span(),
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex(err) => err.fmt(f),
            CompileError::Parse(err) => err.fmt(f),
            CompileError::UndefinedName(err) => err.fmt(f),
            CompileError::Semantic(err) => err.fmt(f),
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Lex(err)
    }
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError::Parse(err)
    }
}

impl From<UndefinedNameError> for CompileError {
    fn from(err: UndefinedNameError) -> Self {
        CompileError::UndefinedName(err)
    }
}

impl From<SemanticError> for CompileError {
    fn from(err: SemanticError) -> Self {
        CompileError::Semantic(err)
    }
}

/// Compiles one class to instructions.
pub fn compile(source: &str) -> Result<Vec<jack_vm::Instruction>, CompileError> {
    let mut instructions = Vec::new();
    let mut engine = CompilationEngine::new(Tokenizer::new(source), &mut instructions);
    engine.compile_class()?;
    Ok(instructions)
}

/// Compiles one class, also returning the markup trace of the grammar walk.
pub fn compile_with_trace(
    source: &str,
) -> Result<(Vec<jack_vm::Instruction>, String), CompileError> {
    let mut instructions = Vec::new();
    let mut engine = CompilationEngine::new(Tokenizer::new(source), &mut instructions);
    engine.compile_class()?;
    let trace = engine.into_trace().to_markup();
    Ok((instructions, trace))
}
