//! Jack compiler library.
//!
//! Compiles Jack source (`.jack`) into stack VM code (`.vm`). The pipeline
//! inside is tokenizer -> recursive-descent compilation engine -> typed VM
//! writer; no syntax tree is materialized, the engine emits VM commands as
//! it descends.

pub mod engine;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

pub use engine::CompilationEngine;
pub use symbol_table::{Kind, Symbol, SymbolTable};
pub use tokenizer::{Keyword, Token, TokenKind, Tokenizer};
pub use vm_writer::{Command, Segment, VmWriter};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for compilation. Every source-level variant carries the
/// 1-based line it was detected on; compilation stops at the first error.
#[derive(Debug)]
pub enum CompileError {
    /// Unterminated string or comment, or a disallowed character
    Lex { line: usize, msg: String },
    /// Unexpected token type or value
    Syntax { line: usize, msg: String },
    /// Reference to an undeclared identifier
    Symbol { line: usize, name: String },
    /// Integer literal outside 0..=32767
    Overflow { line: usize, value: String },
    /// A formatting error while emitting VM code
    Fmt(std::fmt::Error),
    /// Cannot read or write a file
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex { line, msg } => write!(f, "line {line}: {msg}"),
            CompileError::Syntax { line, msg } => write!(f, "line {line}: {msg}"),
            CompileError::Symbol { line, name } => {
                write!(f, "line {line}: undeclared identifier '{name}'")
            }
            CompileError::Overflow { line, value } => {
                write!(f, "line {line}: integer literal '{value}' exceeds 32767")
            }
            CompileError::Fmt(e) => write!(f, "emission error: {e}"),
            CompileError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::fmt::Error> for CompileError {
    fn from(e: std::fmt::Error) -> Self {
        CompileError::Fmt(e)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

/// Compile one class's source text into VM code.
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    CompilationEngine::new(source)?.compile()
}

/// Compile `Foo.jack` into a sibling `Foo.vm`, returning the output path.
pub fn compile_file(path: &Path) -> Result<PathBuf, CompileError> {
    let source = fs::read_to_string(path)?;
    let vm = compile_source(&source)?;
    let out = path.with_extension("vm");
    fs::write(&out, vm)?;
    Ok(out)
}

/// Compile a `.jack` file, or every `.jack` file directly inside a
/// directory, each into its sibling `.vm`.
pub fn compile_path(path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if !path.is_dir() {
        return Ok(vec![compile_file(path)?]);
    }
    let mut sources = Vec::new();
    for entry in fs::read_dir(path)? {
        let file = entry?.path();
        if file.extension().is_some_and(|e| e == "jack") && file.is_file() {
            sources.push(file);
        }
    }
    sources.sort();
    let mut outputs = Vec::new();
    for file in &sources {
        outputs.push(compile_file(file)?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_source_end_to_end() {
        let vm = compile_source("class Foo { function int bar() { return 42; } }").unwrap();
        assert_eq!(vm, "function Foo.bar 0\npush constant 42\nreturn\n");
    }

    #[test]
    fn test_errors_name_their_line() {
        let err = compile_source("class Foo {\n  junk\n}").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }
}
