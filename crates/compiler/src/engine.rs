//! The compilation engine: a recursive-descent parser over the Jack
//! grammar that emits VM commands inline during the descent. No syntax
//! tree is ever built.
//!
//! Grammar productions map one-to-one to `compile_*` functions. The engine
//! owns the two symbol tables (class scope and subroutine scope), the
//! current class name, and the monotonic counters behind unique if/while
//! labels. A subroutine's `function` header is only written once all of
//! its `var` declarations have been parsed, because the header carries the
//! local count.

use crate::CompileError;
use crate::symbol_table::{Kind, Symbol, SymbolTable};
use crate::tokenizer::{Keyword, Token, TokenKind, Tokenizer};
use crate::vm_writer::{Command, Segment, VmWriter};

pub struct CompilationEngine {
    tokenizer: Tokenizer,
    current: Option<Token>,
    last_line: usize,
    class_table: SymbolTable,
    subroutine_table: SymbolTable,
    class_name: String,
    writer: VmWriter,
    if_counter: usize,
    while_counter: usize,
}

impl CompilationEngine {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let mut tokenizer = Tokenizer::new(source);
        let current = tokenizer.next_token()?;
        Ok(CompilationEngine {
            tokenizer,
            current,
            last_line: 1,
            class_table: SymbolTable::new(),
            subroutine_table: SymbolTable::new(),
            class_name: String::new(),
            writer: VmWriter::new(),
            if_counter: 0,
            while_counter: 0,
        })
    }

    /// Compile one class, the unit a `.jack` file holds, and hand back the
    /// emitted VM program.
    pub fn compile(mut self) -> Result<String, CompileError> {
        self.compile_class()?;
        if let Some(token) = &self.current {
            return Err(CompileError::Syntax {
                line: token.line,
                msg: format!("unexpected '{}' after the class body", token.text),
            });
        }
        Ok(self.writer.finish())
    }

    // ---- token plumbing ----

    fn advance(&mut self) -> Result<Token, CompileError> {
        let token = self.current.take().ok_or(CompileError::Syntax {
            line: self.last_line,
            msg: "unexpected end of input".to_string(),
        })?;
        self.last_line = token.line;
        self.current = self.tokenizer.next_token()?;
        Ok(token)
    }

    fn peek(&self) -> Result<&Token, CompileError> {
        self.current.as_ref().ok_or(CompileError::Syntax {
            line: self.last_line,
            msg: "unexpected end of input".to_string(),
        })
    }

    fn peek_symbol(&self, c: char) -> bool {
        self.current.as_ref().is_some_and(|t| t.is_symbol(c))
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.current.as_ref().is_some_and(|t| t.is_keyword(keyword))
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), CompileError> {
        let token = self.advance()?;
        if !token.is_symbol(c) {
            return Err(CompileError::Syntax {
                line: token.line,
                msg: format!("expected '{c}', got '{}'", token.text),
            });
        }
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        let token = self.advance()?;
        if !token.is_keyword(keyword) {
            return Err(CompileError::Syntax {
                line: token.line,
                msg: format!("expected '{}', got '{}'", keyword.as_str(), token.text),
            });
        }
        Ok(())
    }

    fn expect_identifier(&mut self) -> Result<Token, CompileError> {
        let token = self.advance()?;
        if token.kind != TokenKind::Identifier {
            return Err(CompileError::Syntax {
                line: token.line,
                msg: format!("expected an identifier, got '{}'", token.text),
            });
        }
        Ok(token)
    }

    // ---- symbol helpers ----

    /// Subroutine scope shadows class scope.
    fn lookup(&self, name: &str) -> Option<Symbol> {
        self.subroutine_table
            .lookup(name)
            .or_else(|| self.class_table.lookup(name))
            .cloned()
    }

    fn resolve(&self, name: &str, line: usize) -> Result<Symbol, CompileError> {
        self.lookup(name).ok_or_else(|| CompileError::Symbol {
            line,
            name: name.to_string(),
        })
    }

    fn segment_of(kind: Kind) -> Segment {
        match kind {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Arg => Segment::Argument,
            Kind::Var => Segment::Local,
        }
    }

    fn push_variable(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        let symbol = self.resolve(name, line)?;
        self.writer
            .write_push(Self::segment_of(symbol.kind), symbol.index)?;
        Ok(())
    }

    // ---- declarations ----

    fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier()?.text;
        self.expect_symbol('{')?;
        while !self.peek_symbol('}') {
            let token = self.peek()?;
            match token.kind {
                TokenKind::Keyword(Keyword::Static) | TokenKind::Keyword(Keyword::Field) => {
                    self.compile_class_var_dec()?;
                }
                TokenKind::Keyword(Keyword::Constructor)
                | TokenKind::Keyword(Keyword::Function)
                | TokenKind::Keyword(Keyword::Method) => {
                    self.compile_subroutine()?;
                }
                _ => {
                    return Err(CompileError::Syntax {
                        line: token.line,
                        msg: format!("expected a declaration, got '{}'", token.text),
                    });
                }
            }
        }
        self.expect_symbol('}')
    }

    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = match self.advance()?.kind {
            TokenKind::Keyword(Keyword::Static) => Kind::Static,
            _ => Kind::Field,
        };
        let ty = self.compile_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.class_table.define(&name.text, &ty, kind);
            if self.peek_symbol(',') {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect_symbol(';')
    }

    /// A type name: `int`, `char`, `boolean`, or a class identifier.
    fn compile_type(&mut self) -> Result<String, CompileError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Keyword(Keyword::Int)
            | TokenKind::Keyword(Keyword::Char)
            | TokenKind::Keyword(Keyword::Boolean)
            | TokenKind::Identifier => Ok(token.text),
            _ => Err(CompileError::Syntax {
                line: token.line,
                msg: format!("expected a type, got '{}'", token.text),
            }),
        }
    }

    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        let kind_token = self.advance()?;
        let TokenKind::Keyword(subroutine_kind) = kind_token.kind else {
            unreachable!("dispatched on keyword");
        };

        self.subroutine_table.reset();
        if subroutine_kind == Keyword::Method {
            // the receiver rides in as argument 0; real parameters follow
            let class_name = self.class_name.clone();
            self.subroutine_table.define("this", &class_name, Kind::Arg);
        }

        // return type: void or a type; unused beyond syntax
        if self.peek_keyword(Keyword::Void) {
            self.advance()?;
        } else {
            self.compile_type()?;
        }

        let name = self.expect_identifier()?.text;
        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;
        self.compile_subroutine_body(subroutine_kind, &name)
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        while !self.peek_symbol(')') {
            let ty = self.compile_type()?;
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name.text, &ty, Kind::Arg);
            if self.peek_symbol(',') {
                self.advance()?;
            }
        }
        Ok(())
    }

    fn compile_subroutine_body(
        &mut self,
        subroutine_kind: Keyword,
        name: &str,
    ) -> Result<(), CompileError> {
        self.expect_symbol('{')?;
        while self.peek_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        // All locals are known now; the header can finally be written.
        let full_name = format!("{}.{}", self.class_name, name);
        self.writer
            .write_function(&full_name, self.subroutine_table.var_count(Kind::Var))?;

        match subroutine_kind {
            Keyword::Constructor => {
                // allocate one word per field, anchor `this`
                self.writer
                    .write_push(Segment::Constant, self.class_table.var_count(Kind::Field))?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        let statements = self.compile_statements()?;
        if statements == 0 {
            // an empty body still has to return control to the caller
            self.writer.write_push(Segment::Constant, 0)?;
            self.writer.write_return()?;
        }
        self.expect_symbol('}')
    }

    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Var)?;
        let ty = self.compile_type()?;
        loop {
            let name = self.expect_identifier()?;
            self.subroutine_table.define(&name.text, &ty, Kind::Var);
            if self.peek_symbol(',') {
                self.advance()?;
            } else {
                break;
            }
        }
        self.expect_symbol(';')
    }

    // ---- statements ----

    /// Compile statements until something that is not a statement keyword,
    /// returning how many were compiled.
    fn compile_statements(&mut self) -> Result<usize, CompileError> {
        let mut count = 0;
        loop {
            let Some(token) = &self.current else {
                return Ok(count);
            };
            match token.kind {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if()?,
                TokenKind::Keyword(Keyword::While) => self.compile_while()?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                _ => return Ok(count),
            }
            count += 1;
        }
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Let)?;
        let target = self.expect_identifier()?;

        if self.peek_symbol('[') {
            // element address = base + index, computed before the RHS so
            // the RHS is free to clobber `that`
            self.advance()?;
            self.push_variable(&target.text, target.line)?;
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.write_arithmetic(Command::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;

            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            let symbol = self.resolve(&target.text, target.line)?;
            self.writer
                .write_pop(Self::segment_of(symbol.kind), symbol.index)?;
        }
        self.expect_symbol(';')
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        let k = self.if_counter;
        self.if_counter += 1;
        let label_true = format!("{}.IFTRUE{}", self.class_name, k);
        let label_false = format!("{}.IFFALSE{}", self.class_name, k);

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&label_false)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&label_true)?;
        self.writer.write_label(&label_false)?;

        if self.peek_keyword(Keyword::Else) {
            self.advance()?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }
        self.writer.write_label(&label_true)?;
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        let k = self.while_counter;
        self.while_counter += 1;
        let label_begin = format!("{}.BEGINWHILE{}", self.class_name, k);
        let label_end = format!("{}.ENDWHILE{}", self.class_name, k);

        self.expect_keyword(Keyword::While)?;
        self.writer.write_label(&label_begin)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&label_end)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&label_begin)?;
        self.writer.write_label(&label_end)?;
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Do)?;
        let first = self.expect_identifier()?;
        self.compile_subroutine_call(first)?;
        // a do-statement discards the callee's return value
        self.writer.write_pop(Segment::Temp, 0)?;
        self.expect_symbol(';')
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Return)?;
        if self.peek_symbol(';') {
            // void subroutines still return a value for the caller to drop
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.writer.write_return()?;
        self.expect_symbol(';')
    }

    // ---- expressions ----

    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        while let Some(op) = self.current.as_ref().and_then(binary_op) {
            self.advance()?;
            self.compile_term()?;
            match op {
                '+' => self.writer.write_arithmetic(Command::Add)?,
                '-' => self.writer.write_arithmetic(Command::Sub)?,
                '&' => self.writer.write_arithmetic(Command::And)?,
                '|' => self.writer.write_arithmetic(Command::Or)?,
                '<' => self.writer.write_arithmetic(Command::Lt)?,
                '>' => self.writer.write_arithmetic(Command::Gt)?,
                '=' => self.writer.write_arithmetic(Command::Eq)?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                _ => unreachable!("filtered by binary_op"),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::IntConst(value) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, value)?;
            }
            TokenKind::StringConst => {
                let token = self.advance()?;
                self.compile_string(token.string_val())?;
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, 1)?;
                self.writer.write_arithmetic(Command::Neg)?;
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, 0)?;
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance()?;
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            TokenKind::Symbol('(') => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol('-') => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Command::Neg)?;
            }
            TokenKind::Symbol('~') => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Command::Not)?;
            }
            TokenKind::Identifier => {
                let name = self.advance()?;
                if self.peek_symbol('[') {
                    // base + index, then read through `that`
                    self.advance()?;
                    self.push_variable(&name.text, name.line)?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.writer.write_arithmetic(Command::Add)?;
                    self.writer.write_pop(Segment::Pointer, 1)?;
                    self.writer.write_push(Segment::That, 0)?;
                } else if self.peek_symbol('(') || self.peek_symbol('.') {
                    self.compile_subroutine_call(name)?;
                } else {
                    self.push_variable(&name.text, name.line)?;
                }
            }
            _ => {
                return Err(CompileError::Syntax {
                    line: token.line,
                    msg: format!("expected a term, got '{}'", token.text),
                });
            }
        }
        Ok(())
    }

    /// `name(args)` is a method call on `this`; `X.name(args)` is a method
    /// call when X is a known variable (its type names the class, and X is
    /// pushed as the receiver), otherwise a function call on class X.
    fn compile_subroutine_call(&mut self, first: Token) -> Result<(), CompileError> {
        if self.peek_symbol('(') {
            self.advance()?;
            self.writer.write_push(Segment::Pointer, 0)?;
            let n_args = self.compile_expression_list()?;
            self.expect_symbol(')')?;
            let full_name = format!("{}.{}", self.class_name, first.text);
            self.writer.write_call(&full_name, n_args + 1)?;
            return Ok(());
        }

        self.expect_symbol('.')?;
        let method = self.expect_identifier()?.text;
        self.expect_symbol('(')?;
        match self.lookup(&first.text) {
            Some(receiver) => {
                self.writer
                    .write_push(Self::segment_of(receiver.kind), receiver.index)?;
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer
                    .write_call(&format!("{}.{}", receiver.ty, method), n_args + 1)?;
            }
            None => {
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer
                    .write_call(&format!("{}.{}", first.text, method), n_args)?;
            }
        }
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        let mut count = 0;
        if !self.peek_symbol(')') {
            self.compile_expression()?;
            count += 1;
            while self.peek_symbol(',') {
                self.advance()?;
                self.compile_expression()?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// A string literal becomes a String object built one char at a time.
    fn compile_string(&mut self, value: &str) -> Result<(), CompileError> {
        self.writer
            .write_push(Segment::Constant, value.chars().count() as u16)?;
        self.writer.write_call("String.new", 1)?;
        for c in value.chars() {
            self.writer.write_push(Segment::Constant, c as u16)?;
            self.writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }
}

fn binary_op(token: &Token) -> Option<char> {
    match token.kind {
        TokenKind::Symbol(c) if "+-*/&|<>=".contains(c) => Some(c),
        _ => None,
    }
}
