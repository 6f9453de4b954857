//! Parsing of VM commands.
//!
//! One command per line, space-separated tokens, `//` comments. Parsing and
//! re-printing a canonical program through [`VmCommand`]'s `Display` yields
//! the identical stream, which the tests lean on.

use std::fmt;
use std::str::FromStr;

use crate::TranslateError;

/// A VM memory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl FromStr for Segment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "constant" => Ok(Segment::Constant),
            "argument" => Ok(Segment::Argument),
            "local" => Ok(Segment::Local),
            "static" => Ok(Segment::Static),
            "this" => Ok(Segment::This),
            "that" => Ok(Segment::That),
            "pointer" => Ok(Segment::Pointer),
            "temp" => Ok(Segment::Temp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        f.write_str(name)
    }
}

/// The nine arithmetic and logical stack operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl FromStr for ArithmeticOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "add" => Ok(ArithmeticOp::Add),
            "sub" => Ok(ArithmeticOp::Sub),
            "neg" => Ok(ArithmeticOp::Neg),
            "eq" => Ok(ArithmeticOp::Eq),
            "gt" => Ok(ArithmeticOp::Gt),
            "lt" => Ok(ArithmeticOp::Lt),
            "and" => Ok(ArithmeticOp::And),
            "or" => Ok(ArithmeticOp::Or),
            "not" => Ok(ArithmeticOp::Not),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Sub => "sub",
            ArithmeticOp::Neg => "neg",
            ArithmeticOp::Eq => "eq",
            ArithmeticOp::Gt => "gt",
            ArithmeticOp::Lt => "lt",
            ArithmeticOp::And => "and",
            ArithmeticOp::Or => "or",
            ArithmeticOp::Not => "not",
        };
        f.write_str(name)
    }
}

/// One VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(ArithmeticOp),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl fmt::Display for VmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmCommand::Push(segment, index) => write!(f, "push {segment} {index}"),
            VmCommand::Pop(segment, index) => write!(f, "pop {segment} {index}"),
            VmCommand::Arithmetic(op) => write!(f, "{op}"),
            VmCommand::Label(name) => write!(f, "label {name}"),
            VmCommand::Goto(name) => write!(f, "goto {name}"),
            VmCommand::IfGoto(name) => write!(f, "if-goto {name}"),
            VmCommand::Function(name, n_locals) => write!(f, "function {name} {n_locals}"),
            VmCommand::Call(name, n_args) => write!(f, "call {name} {n_args}"),
            VmCommand::Return => write!(f, "return"),
        }
    }
}

fn err(line: usize, msg: impl Into<String>) -> TranslateError {
    TranslateError::Parse {
        line,
        msg: msg.into(),
    }
}

fn parse_index(token: &str, line: usize) -> Result<u16, TranslateError> {
    token
        .parse::<u16>()
        .map_err(|_| err(line, format!("invalid index '{token}'")))
}

fn parse_name(token: &str, line: usize) -> Result<String, TranslateError> {
    let ok = !token.is_empty()
        && !token.starts_with(|c: char| c.is_ascii_digit())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '$' | '-'));
    if !ok {
        return Err(err(line, format!("invalid name '{token}'")));
    }
    Ok(token.to_string())
}

/// Validate a push/pop target. Direct segments have fixed extents; constant
/// values must fit an A-instruction.
fn check_target(
    segment: Segment,
    index: u16,
    is_pop: bool,
    line: usize,
) -> Result<(), TranslateError> {
    match segment {
        Segment::Constant if is_pop => Err(err(line, "cannot pop to the constant segment")),
        Segment::Constant if index > 0x7fff => {
            Err(err(line, format!("constant {index} exceeds 32767")))
        }
        Segment::Pointer if index > 1 => {
            Err(err(line, format!("pointer index {index} out of range")))
        }
        Segment::Temp if index > 7 => Err(err(line, format!("temp index {index} out of range"))),
        _ => Ok(()),
    }
}

/// Parse one source line. Comments and blank lines yield `None`.
pub fn parse_line(raw: &str, line: usize) -> Result<Option<VmCommand>, TranslateError> {
    let text = raw.split("//").next().unwrap_or("").trim();
    if text.is_empty() {
        return Ok(None);
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let command = match (tokens[0], tokens.len()) {
        ("push", 3) => {
            let segment: Segment = tokens[1]
                .parse()
                .map_err(|_| err(line, format!("unknown segment '{}'", tokens[1])))?;
            let index = parse_index(tokens[2], line)?;
            check_target(segment, index, false, line)?;
            VmCommand::Push(segment, index)
        }
        ("pop", 3) => {
            let segment: Segment = tokens[1]
                .parse()
                .map_err(|_| err(line, format!("unknown segment '{}'", tokens[1])))?;
            let index = parse_index(tokens[2], line)?;
            check_target(segment, index, true, line)?;
            VmCommand::Pop(segment, index)
        }
        ("label", 2) => VmCommand::Label(parse_name(tokens[1], line)?),
        ("goto", 2) => VmCommand::Goto(parse_name(tokens[1], line)?),
        ("if-goto", 2) => VmCommand::IfGoto(parse_name(tokens[1], line)?),
        ("function", 3) => {
            VmCommand::Function(parse_name(tokens[1], line)?, parse_index(tokens[2], line)?)
        }
        ("call", 3) => VmCommand::Call(parse_name(tokens[1], line)?, parse_index(tokens[2], line)?),
        ("return", 1) => VmCommand::Return,
        _ => match tokens[0].parse::<ArithmeticOp>() {
            Ok(op) if tokens.len() == 1 => VmCommand::Arithmetic(op),
            _ => return Err(err(line, format!("unknown command '{text}'"))),
        },
    };
    Ok(Some(command))
}

/// Parse a whole `.vm` file into commands, dropping comments and blanks.
pub fn parse_source(source: &str) -> Result<Vec<VmCommand>, TranslateError> {
    let mut commands = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        if let Some(command) = parse_line(raw, i + 1)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_pop() {
        assert_eq!(
            parse_line("push constant 7", 1).unwrap(),
            Some(VmCommand::Push(Segment::Constant, 7))
        );
        assert_eq!(
            parse_line("pop local 2", 1).unwrap(),
            Some(VmCommand::Pop(Segment::Local, 2))
        );
        assert_eq!(
            parse_line("push static 3 // comment", 1).unwrap(),
            Some(VmCommand::Push(Segment::Static, 3))
        );
    }

    #[test]
    fn test_parse_arithmetic() {
        for (text, op) in [
            ("add", ArithmeticOp::Add),
            ("sub", ArithmeticOp::Sub),
            ("neg", ArithmeticOp::Neg),
            ("eq", ArithmeticOp::Eq),
            ("gt", ArithmeticOp::Gt),
            ("lt", ArithmeticOp::Lt),
            ("and", ArithmeticOp::And),
            ("or", ArithmeticOp::Or),
            ("not", ArithmeticOp::Not),
        ] {
            assert_eq!(
                parse_line(text, 1).unwrap(),
                Some(VmCommand::Arithmetic(op))
            );
        }
    }

    #[test]
    fn test_parse_control_flow() {
        assert_eq!(
            parse_line("label LOOP_START", 1).unwrap(),
            Some(VmCommand::Label("LOOP_START".to_string()))
        );
        assert_eq!(
            parse_line("if-goto LOOP_START", 1).unwrap(),
            Some(VmCommand::IfGoto("LOOP_START".to_string()))
        );
        assert_eq!(
            parse_line("function Sys.init 0", 1).unwrap(),
            Some(VmCommand::Function("Sys.init".to_string(), 0))
        );
        assert_eq!(
            parse_line("call Math.multiply 2", 1).unwrap(),
            Some(VmCommand::Call("Math.multiply".to_string(), 2))
        );
        assert_eq!(parse_line("return", 1).unwrap(), Some(VmCommand::Return));
    }

    #[test]
    fn test_comments_and_blanks() {
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("   ", 1).unwrap(), None);
        assert_eq!(parse_line("// push constant 7", 1).unwrap(), None);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let e = parse_line("push constant", 7).unwrap_err();
        assert!(e.to_string().contains("line 7"));
        assert!(parse_line("pop constant 0", 1).is_err());
        assert!(parse_line("push junk 0", 1).is_err());
        assert!(parse_line("push temp 8", 1).is_err());
        assert!(parse_line("push pointer 2", 1).is_err());
        assert!(parse_line("push constant 40000", 1).is_err());
        assert!(parse_line("frobnicate", 1).is_err());
        assert!(parse_line("add 1", 1).is_err());
    }

    #[test]
    fn test_round_trip_is_identity() {
        let canonical = "\
push constant 7
push constant 8
add
pop temp 0
function Foo.bar 2
push argument 0
push local 1
sub
if-goto Foo.bar$end
label Foo.bar$loop
goto Foo.bar$loop
call Math.multiply 2
return
";
        let commands = parse_source(canonical).unwrap();
        let reprinted: String = commands.iter().map(|c| format!("{c}\n")).collect();
        assert_eq!(reprinted, canonical);
    }
}
