//! VM-to-Hack translator.
//!
//! Takes stack VM programs (`.vm`) and produces Hack assembly (`.asm`)
//! that realizes them under the standard memory contract: SP at RAM[0]
//! growing upward, LCL/ARG/THIS/THAT base pointers at RAM[1..=4], and the
//! full calling convention (return address plus saved pointers on the
//! stack, ARG and LCL repositioned per call).
//!
//! A translation unit is either a single file (output beside it, no
//! bootstrap) or a directory of `.vm` files concatenated into
//! `Dir/Dir.asm` behind a bootstrap that sets SP to 256 and calls
//! `Sys.init`.

pub mod codegen;
pub mod parser;

pub use codegen::CodeWriter;
pub use parser::{ArithmeticOp, Segment, VmCommand};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for translation operations.
#[derive(Debug)]
pub enum TranslateError {
    /// Unknown command, bad segment, or bad index, with its source line
    Parse { line: usize, msg: String },
    /// A formatting error while emitting assembly
    Fmt(std::fmt::Error),
    /// Cannot read or write a file
    Io(std::io::Error),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::Parse { line, msg } => write!(f, "line {line}: {msg}"),
            TranslateError::Fmt(e) => write!(f, "emission error: {e}"),
            TranslateError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<std::fmt::Error> for TranslateError {
    fn from(e: std::fmt::Error) -> Self {
        TranslateError::Fmt(e)
    }
}

impl From<std::io::Error> for TranslateError {
    fn from(e: std::io::Error) -> Self {
        TranslateError::Io(e)
    }
}

/// Translate one file's commands through a shared writer. The file stem
/// scopes `static` symbols and pre-function labels; the writer's label
/// counters keep running across calls.
pub fn translate_source(
    file_stem: &str,
    source: &str,
    writer: &mut CodeWriter,
) -> Result<(), TranslateError> {
    writer.set_file_scope(file_stem);
    for (i, raw) in source.lines().enumerate() {
        if let Some(command) = parser::parse_line(raw, i + 1)? {
            writer.write_command(&command)?;
        }
    }
    Ok(())
}

/// Translate a single `Foo.vm` into `Foo.asm` beside it. No bootstrap:
/// single-file units are test fixtures driven by an external harness.
pub fn translate_file(path: &Path) -> Result<PathBuf, TranslateError> {
    let stem = file_stem(path)?;
    let source = fs::read_to_string(path)?;

    let mut writer = CodeWriter::new();
    translate_source(&stem, &source, &mut writer)?;

    let out = path.with_extension("asm");
    fs::write(&out, writer.finish())?;
    Ok(out)
}

/// Translate every `.vm` file in a directory into `Dir/Dir.asm`, bootstrap
/// first. Files are processed in name order so output is deterministic.
pub fn translate_dir(path: &Path) -> Result<PathBuf, TranslateError> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(path)? {
        let file = entry?.path();
        if file.extension().is_some_and(|e| e == "vm") && file.is_file() {
            sources.push(file);
        }
    }
    sources.sort();

    let mut writer = CodeWriter::new();
    writer.write_bootstrap()?;
    for file in &sources {
        let stem = file_stem(file)?;
        let source = fs::read_to_string(file)?;
        translate_source(&stem, &source, &mut writer)?;
    }

    let dir_name = file_stem(path)?;
    let out = path.join(format!("{dir_name}.asm"));
    fs::write(&out, writer.finish())?;
    Ok(out)
}

fn file_stem(path: &Path) -> Result<String, TranslateError> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            TranslateError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot derive a name from '{}'", path.display()),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_source_streams_commands() {
        let mut writer = CodeWriter::new();
        translate_source("Main", "push constant 7\npush constant 8\nadd\n", &mut writer).unwrap();
        let asm = writer.finish();
        assert!(asm.contains("// push constant 7"));
        assert!(asm.contains("// push constant 8"));
        assert!(asm.contains("// add"));
    }

    #[test]
    fn test_parse_error_is_line_qualified() {
        let mut writer = CodeWriter::new();
        let err = translate_source("Main", "push constant 7\nbogus cmd\n", &mut writer)
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_static_symbols_carry_the_file_stem() {
        let mut writer = CodeWriter::new();
        translate_source("Counter", "push static 0\n", &mut writer).unwrap();
        assert!(writer.finish().contains("@Counter.0"));
    }
}
