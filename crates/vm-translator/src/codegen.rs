//! Hack assembly emission for VM commands.
//!
//! [`CodeWriter`] accumulates assembly text in a `String` buffer and keeps
//! the translation-unit-wide counters that make emitted labels unique:
//! comparison commands get `TRUE.<uid>` / `CONTINUE.<uid>` join labels, and
//! every call site gets a fresh `<callee>$ret.<uid>` return address. Both
//! counters run monotonically across all files of a translation unit and
//! are never reset, so no label can collide between files.
//!
//! Memory contract: SP at RAM[0] points to the next free slot; LCL, ARG,
//! THIS, THAT at RAM[1..=4]; `temp i` is RAM[5+i]; `pointer 0/1` are
//! THIS/THAT themselves; `static i` of file `Foo` is the symbol `Foo.i`,
//! left for the assembler to place. R13 is scratch within a single pop
//! sequence and is not preserved across commands.

use std::fmt::Write;

use crate::TranslateError;
use crate::parser::{ArithmeticOp, Segment, VmCommand};

/// Emits Hack assembly for a stream of VM commands.
pub struct CodeWriter {
    output: String,
    /// Unique suffix for comparison branch labels
    cmp_counter: usize,
    /// Unique suffix for call return-address labels
    call_counter: usize,
    /// Prefix for `static` symbols: the stem of the current `.vm` file
    file_scope: String,
    /// Prefix for `label`/`goto`/`if-goto`: the enclosing function, or the
    /// file stem before the first `function` command
    label_scope: String,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        CodeWriter {
            output: String::new(),
            cmp_counter: 0,
            call_counter: 0,
            file_scope: String::new(),
            label_scope: String::new(),
        }
    }

    /// Start translating a new `.vm` file. Counters deliberately survive
    /// this call; only the scoping prefixes change.
    pub fn set_file_scope(&mut self, stem: &str) {
        self.file_scope = stem.to_string();
        self.label_scope = stem.to_string();
    }

    /// Consume the writer and hand back the accumulated assembly.
    pub fn finish(self) -> String {
        self.output
    }

    /// Emit the prelude for directory-mode translation: SP = 256, then a
    /// regular call to Sys.init so the frame discipline holds from the
    /// very first instruction.
    pub fn write_bootstrap(&mut self) -> Result<(), TranslateError> {
        writeln!(self.output, "// bootstrap")?;
        writeln!(self.output, "@256")?;
        writeln!(self.output, "D=A")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "M=D")?;
        self.write_command(&VmCommand::Call("Sys.init".to_string(), 0))
    }

    /// Emit the assembly realization of one VM command, preceded by a
    /// `// <command>` comment line.
    pub fn write_command(&mut self, command: &VmCommand) -> Result<(), TranslateError> {
        writeln!(self.output, "// {command}")?;
        match command {
            VmCommand::Push(segment, index) => self.push(*segment, *index)?,
            VmCommand::Pop(segment, index) => self.pop(*segment, *index)?,
            VmCommand::Arithmetic(op) => self.arithmetic(*op)?,
            VmCommand::Label(name) => {
                writeln!(self.output, "({}${})", self.label_scope, name)?;
            }
            VmCommand::Goto(name) => {
                writeln!(self.output, "@{}${}", self.label_scope, name)?;
                writeln!(self.output, "0;JMP")?;
            }
            VmCommand::IfGoto(name) => {
                // pop the condition, jump on non-zero
                writeln!(self.output, "@SP")?;
                writeln!(self.output, "AM=M-1")?;
                writeln!(self.output, "D=M")?;
                writeln!(self.output, "@{}${}", self.label_scope, name)?;
                writeln!(self.output, "D;JNE")?;
            }
            VmCommand::Function(name, n_locals) => self.function(name, *n_locals)?,
            VmCommand::Call(name, n_args) => self.call(name, *n_args)?,
            VmCommand::Return => self.ret()?,
        }
        Ok(())
    }

    /// Load the pushed value into D, then the common push tail.
    fn push(&mut self, segment: Segment, index: u16) -> Result<(), TranslateError> {
        match segment {
            Segment::Constant => {
                writeln!(self.output, "@{index}")?;
                writeln!(self.output, "D=A")?;
            }
            Segment::Temp => {
                writeln!(self.output, "@{}", 5 + index)?;
                writeln!(self.output, "D=M")?;
            }
            Segment::Pointer => {
                writeln!(self.output, "@{}", 3 + index)?;
                writeln!(self.output, "D=M")?;
            }
            Segment::Static => {
                writeln!(self.output, "@{}.{}", self.file_scope, index)?;
                writeln!(self.output, "D=M")?;
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                writeln!(self.output, "@{index}")?;
                writeln!(self.output, "D=A")?;
                writeln!(self.output, "@{}", base_pointer(segment))?;
                writeln!(self.output, "A=M")?;
                writeln!(self.output, "A=A+D")?;
                writeln!(self.output, "D=M")?;
            }
        }
        self.push_d()
    }

    /// *SP = D; SP++
    fn push_d(&mut self) -> Result<(), TranslateError> {
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "M=D")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "M=M+1")?;
        Ok(())
    }

    /// Compute the target address into D, stash it in R13, then pop the
    /// top of stack into the stashed address.
    fn pop(&mut self, segment: Segment, index: u16) -> Result<(), TranslateError> {
        match segment {
            Segment::Constant => unreachable!("rejected by the parser"),
            Segment::Temp => {
                writeln!(self.output, "@{}", 5 + index)?;
                writeln!(self.output, "D=A")?;
            }
            Segment::Pointer => {
                writeln!(self.output, "@{}", 3 + index)?;
                writeln!(self.output, "D=A")?;
            }
            Segment::Static => {
                writeln!(self.output, "@{}.{}", self.file_scope, index)?;
                writeln!(self.output, "D=A")?;
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                writeln!(self.output, "@{index}")?;
                writeln!(self.output, "D=A")?;
                writeln!(self.output, "@{}", base_pointer(segment))?;
                writeln!(self.output, "A=M")?;
                writeln!(self.output, "A=A+D")?;
                writeln!(self.output, "D=A")?;
            }
        }
        writeln!(self.output, "@R13")?;
        writeln!(self.output, "M=D")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@R13")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "M=D")?;
        Ok(())
    }

    fn arithmetic(&mut self, op: ArithmeticOp) -> Result<(), TranslateError> {
        match op {
            ArithmeticOp::Add => self.binary("D=D+M"),
            ArithmeticOp::Sub => self.binary("D=M-D"),
            ArithmeticOp::And => self.binary("D=D&M"),
            ArithmeticOp::Or => self.binary("D=D|M"),
            ArithmeticOp::Neg => self.unary("M=-M"),
            ArithmeticOp::Not => self.unary("M=!M"),
            ArithmeticOp::Eq => self.compare("JEQ"),
            ArithmeticOp::Gt => self.compare("JGT"),
            ArithmeticOp::Lt => self.compare("JLT"),
        }
    }

    /// Pop y into D, then combine with x in place on the new stack top.
    fn binary(&mut self, combine: &str) -> Result<(), TranslateError> {
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "{combine}")?;
        self.push_d()
    }

    fn unary(&mut self, apply: &str) -> Result<(), TranslateError> {
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "{apply}")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "M=M+1")?;
        Ok(())
    }

    /// x <op> y via subtraction and a conditional jump: the result slot
    /// gets -1 (all ones) on the TRUE branch, 0 otherwise.
    fn compare(&mut self, jump: &str) -> Result<(), TranslateError> {
        let uid = self.cmp_counter;
        self.cmp_counter += 1;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "D=M-D")?;
        writeln!(self.output, "@TRUE.{uid}")?;
        writeln!(self.output, "D;{jump}")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "M=0")?;
        writeln!(self.output, "@CONTINUE.{uid}")?;
        writeln!(self.output, "0;JMP")?;
        writeln!(self.output, "(TRUE.{uid})")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "M=-1")?;
        writeln!(self.output, "(CONTINUE.{uid})")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "M=M+1")?;
        Ok(())
    }

    /// `(F)` plus one pushed zero per local. The function also becomes the
    /// scope for subsequent branching labels.
    fn function(&mut self, name: &str, n_locals: u16) -> Result<(), TranslateError> {
        writeln!(self.output, "({name})")?;
        self.label_scope = name.to_string();
        for _ in 0..n_locals {
            self.write_command(&VmCommand::Push(Segment::Constant, 0))?;
        }
        Ok(())
    }

    /// The caller half of the calling convention: push the return address
    /// and the saved LCL/ARG/THIS/THAT, reposition ARG and LCL, jump, and
    /// plant the return label.
    fn call(&mut self, function: &str, n_args: u16) -> Result<(), TranslateError> {
        let ret = format!("{function}$ret.{}", self.call_counter);
        self.call_counter += 1;

        writeln!(self.output, "@{ret}")?;
        writeln!(self.output, "D=A")?;
        self.push_d()?;
        for saved in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.output, "@{saved}")?;
            writeln!(self.output, "D=M")?;
            self.push_d()?;
        }
        // ARG = SP - 5 - nArgs
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@5")?;
        writeln!(self.output, "D=D-A")?;
        writeln!(self.output, "@{n_args}")?;
        writeln!(self.output, "D=D-A")?;
        writeln!(self.output, "@ARG")?;
        writeln!(self.output, "M=D")?;
        // LCL = SP
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@LCL")?;
        writeln!(self.output, "M=D")?;
        writeln!(self.output, "@{function}")?;
        writeln!(self.output, "0;JMP")?;
        writeln!(self.output, "({ret})")?;
        Ok(())
    }

    /// The callee half: recover the return address from the frame before
    /// the return value lands on *ARG (for a zero-argument callee they
    /// are the same cell), restore the saved pointers walking down from
    /// endFrame, and jump out.
    fn ret(&mut self) -> Result<(), TranslateError> {
        // R13 = endFrame = LCL
        writeln!(self.output, "@LCL")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@R13")?;
        writeln!(self.output, "M=D")?;
        // R14 = retAddr = *(endFrame - 5)
        writeln!(self.output, "@5")?;
        writeln!(self.output, "A=D-A")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@R14")?;
        writeln!(self.output, "M=D")?;
        // *ARG = pop()
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "AM=M-1")?;
        writeln!(self.output, "D=M")?;
        writeln!(self.output, "@ARG")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "M=D")?;
        // SP = ARG + 1
        writeln!(self.output, "@ARG")?;
        writeln!(self.output, "D=M+1")?;
        writeln!(self.output, "@SP")?;
        writeln!(self.output, "M=D")?;
        // restore THAT, THIS, ARG, LCL from the frame
        for saved in ["THAT", "THIS", "ARG", "LCL"] {
            writeln!(self.output, "@R13")?;
            writeln!(self.output, "AM=M-1")?;
            writeln!(self.output, "D=M")?;
            writeln!(self.output, "@{saved}")?;
            writeln!(self.output, "M=D")?;
        }
        writeln!(self.output, "@R14")?;
        writeln!(self.output, "A=M")?;
        writeln!(self.output, "0;JMP")?;
        Ok(())
    }
}

fn base_pointer(segment: Segment) -> &'static str {
    match segment {
        Segment::Local => "LCL",
        Segment::Argument => "ARG",
        Segment::This => "THIS",
        Segment::That => "THAT",
        _ => unreachable!("segment has no base pointer"),
    }
}
