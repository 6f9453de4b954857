//! Line-level parsing of Hack assembly.
//!
//! Parsing works on a stripped program: comments and blank lines are gone,
//! and every surviving line carries its original 1-based line number so
//! errors can point back into the source file.

use crate::AsmError;

/// The operand of an A-instruction: a literal address or a symbolic name
/// resolved against the symbol table in a later pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrValue {
    Literal(u16),
    Symbol(String),
}

/// One real Hack instruction. Label pseudo-instructions never reach this
/// type; they are consumed while addresses are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    A(AddrValue),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

/// A source line that survived stripping: trimmed text plus where it was.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub text: String,
    pub line: usize,
}

/// Drop `//` comments and blank lines, keeping 1-based line numbers.
pub fn strip(source: &str) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = raw.split("//").next().unwrap_or("").trim();
            if text.is_empty() {
                None
            } else {
                Some(SourceLine {
                    text: text.to_string(),
                    line: i + 1,
                })
            }
        })
        .collect()
}

/// If the line is a `(NAME)` label pseudo-instruction, return the name.
pub fn label_name(line: &SourceLine) -> Result<Option<&str>, AsmError> {
    let text = line.text.as_str();
    if !text.starts_with('(') {
        return Ok(None);
    }
    let name = text
        .strip_suffix(')')
        .and_then(|t| t.strip_prefix('('))
        .ok_or_else(|| AsmError::Parse {
            line: line.line,
            msg: format!("malformed label '{text}'"),
        })?;
    if name.is_empty() || !is_symbol(name) {
        return Err(AsmError::Parse {
            line: line.line,
            msg: format!("invalid label name '{name}'"),
        });
    }
    Ok(Some(name))
}

/// Parse one stripped, non-label line into an instruction.
pub fn parse_instruction(line: &SourceLine) -> Result<Instruction, AsmError> {
    let text = line.text.as_str();
    if let Some(rest) = text.strip_prefix('@') {
        return parse_a(rest, line.line);
    }
    parse_c(text, line.line)
}

fn parse_a(operand: &str, line: usize) -> Result<Instruction, AsmError> {
    if operand.is_empty() {
        return Err(AsmError::Parse {
            line,
            msg: "A-instruction with no operand".to_string(),
        });
    }
    if operand.chars().all(|c| c.is_ascii_digit()) {
        let value: u32 = operand.parse().map_err(|_| AsmError::Overflow {
            line,
            value: operand.to_string(),
        })?;
        if value > 0x7fff {
            return Err(AsmError::Overflow {
                line,
                value: operand.to_string(),
            });
        }
        return Ok(Instruction::A(AddrValue::Literal(value as u16)));
    }
    if !is_symbol(operand) {
        return Err(AsmError::Parse {
            line,
            msg: format!("invalid symbol '@{operand}'"),
        });
    }
    Ok(Instruction::A(AddrValue::Symbol(operand.to_string())))
}

/// C-instruction shape: `[DEST=]COMP[;JUMP]`. The mnemonics themselves are
/// validated against the code tables at encode time.
fn parse_c(text: &str, line: usize) -> Result<Instruction, AsmError> {
    let (dest, rest) = match text.split_once('=') {
        Some((d, r)) => (d.trim(), r),
        None => ("", text),
    };
    let (comp, jump) = match rest.split_once(';') {
        Some((c, j)) => (c.trim(), j.trim()),
        None => (rest.trim(), ""),
    };
    if comp.is_empty() {
        return Err(AsmError::Parse {
            line,
            msg: format!("malformed instruction '{text}'"),
        });
    }
    Ok(Instruction::C {
        dest: dest.to_string(),
        comp: comp.to_string(),
        jump: jump.to_string(),
    })
}

/// Hack symbols: letters, digits, `_`, `.`, `$`, `:`, not starting with a
/// digit.
fn is_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => return false,
        Some(c) if !is_symbol_char(c) => return false,
        None => return false,
        _ => {}
    }
    chars.all(is_symbol_char)
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sl(text: &str) -> SourceLine {
        SourceLine {
            text: text.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_strip_removes_comments_and_blanks() {
        let lines = strip("// header\n\n@2\nD=A  // inline\n\n(LOOP)\n");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["@2", "D=A", "(LOOP)"]);
        assert_eq!(lines[0].line, 3);
        assert_eq!(lines[1].line, 4);
        assert_eq!(lines[2].line, 6);
    }

    #[test]
    fn test_label_name() {
        assert_eq!(label_name(&sl("(LOOP)")).unwrap(), Some("LOOP"));
        assert_eq!(label_name(&sl("(sys.init$if_end0)")).unwrap(), Some("sys.init$if_end0"));
        assert_eq!(label_name(&sl("@LOOP")).unwrap(), None);
        assert!(label_name(&sl("(LOOP")).is_err());
        assert!(label_name(&sl("()")).is_err());
    }

    #[test]
    fn test_parse_a_literal() {
        assert_eq!(
            parse_instruction(&sl("@123")).unwrap(),
            Instruction::A(AddrValue::Literal(123))
        );
        assert_eq!(
            parse_instruction(&sl("@32767")).unwrap(),
            Instruction::A(AddrValue::Literal(32767))
        );
    }

    #[test]
    fn test_parse_a_overflow() {
        assert!(matches!(
            parse_instruction(&sl("@32768")),
            Err(AsmError::Overflow { .. })
        ));
        assert!(matches!(
            parse_instruction(&sl("@123456")),
            Err(AsmError::Overflow { .. })
        ));
    }

    #[test]
    fn test_parse_a_symbol() {
        assert_eq!(
            parse_instruction(&sl("@sum")).unwrap(),
            Instruction::A(AddrValue::Symbol("sum".to_string()))
        );
        assert!(parse_instruction(&sl("@")).is_err());
        assert!(parse_instruction(&sl("@a b")).is_err());
    }

    #[test]
    fn test_parse_c_forms() {
        assert_eq!(
            parse_instruction(&sl("D=A")).unwrap(),
            Instruction::C {
                dest: "D".to_string(),
                comp: "A".to_string(),
                jump: String::new(),
            }
        );
        assert_eq!(
            parse_instruction(&sl("0;JMP")).unwrap(),
            Instruction::C {
                dest: String::new(),
                comp: "0".to_string(),
                jump: "JMP".to_string(),
            }
        );
        assert_eq!(
            parse_instruction(&sl("MD=M-1;JEQ")).unwrap(),
            Instruction::C {
                dest: "MD".to_string(),
                comp: "M-1".to_string(),
                jump: "JEQ".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_c_missing_comp() {
        assert!(parse_instruction(&sl("D=")).is_err());
        assert!(parse_instruction(&sl("=A")).is_ok()); // empty dest field is null dest
    }
}
