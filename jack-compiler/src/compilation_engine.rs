//! Recursive-descent parser over the Jack grammar. Drives the symbol
//! table and [`VmWriter`] to compile a single class to VM code.
//!
//! The grammar needs one token of lookahead at exactly one decision point
//! (is a bare identifier a variable, an array access, or a subroutine
//! call) and the tokenizer is single-pass and non-restartable, so the
//! engine owns a one-slot pushback buffer rather than re-tokenizing.

use std::io::Write;

use crate::symbol_table::{Kind, SymbolTable};
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::vm_writer::{ArithmeticCommand, Segment, VmWriter};
use crate::CompileError;

pub struct CompilationEngine<'a, W: Write> {
    tokenizer: Tokenizer<'a>,
    pushback: Option<Token>,
    vm_writer: VmWriter<W>,
    symbol_table: SymbolTable,
    class_name: String,
    if_index: u32,
    while_index: u32,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    #[must_use]
    pub fn new(source: &'a str, sink: W) -> Self {
        Self {
            tokenizer: Tokenizer::new(source),
            pushback: None,
            vm_writer: VmWriter::new(sink),
            symbol_table: SymbolTable::new(),
            class_name: String::new(),
            if_index: 0,
            while_index: 0,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.vm_writer.into_inner()
    }

    // --- token stream plumbing -------------------------------------------------

    fn advance(&mut self) -> Result<Token, CompileError> {
        if let Some(tok) = self.pushback.take() {
            return Ok(tok);
        }
        self.tokenizer
            .next_token()?
            .ok_or(CompileError::UnexpectedEof)
    }

    fn push_back(&mut self, tok: Token) {
        debug_assert!(self.pushback.is_none(), "pushback buffer only holds one token");
        self.pushback = Some(tok);
    }

    fn peek(&mut self) -> Result<Token, CompileError> {
        let tok = self.advance()?;
        self.push_back(tok.clone());
        Ok(tok)
    }

    fn peek_is_symbol(&mut self, sym: char) -> Result<bool, CompileError> {
        Ok(self.peek()?.is_symbol(sym))
    }

    fn peek_is_keyword(&mut self, word: &str) -> Result<bool, CompileError> {
        Ok(self.peek()?.is_keyword(word))
    }

    fn expect_symbol(&mut self, sym: char) -> Result<(), CompileError> {
        let tok = self.advance()?;
        if tok.is_symbol(sym) {
            Ok(())
        } else {
            Err(CompileError::UnexpectedToken {
                expected: sym.to_string(),
                found: tok.lexeme,
                line: tok.line,
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        let tok = self.advance()?;
        if tok.kind == TokenKind::Identifier {
            Ok(tok.lexeme)
        } else {
            Err(CompileError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: tok.lexeme,
                line: tok.line,
            })
        }
    }

    /// `int | char | boolean | className`.
    fn compile_type(&mut self) -> Result<String, CompileError> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Keyword if ["int", "char", "boolean"].contains(&tok.lexeme.as_str()) => {
                Ok(tok.lexeme)
            }
            TokenKind::Identifier => Ok(tok.lexeme),
            _ => Err(CompileError::UnexpectedToken {
                expected: "type".to_string(),
                found: tok.lexeme,
                line: tok.line,
            }),
        }
    }

    fn is_class_var_dec(tok: &Token) -> bool {
        tok.is_keyword("static") || tok.is_keyword("field")
    }

    fn is_subroutine_dec(tok: &Token) -> bool {
        tok.is_keyword("constructor") || tok.is_keyword("function") || tok.is_keyword("method")
    }

    fn is_statement(tok: &Token) -> bool {
        ["let", "if", "while", "do", "return"]
            .iter()
            .any(|k| tok.is_keyword(k))
    }

    fn binary_op(symbol: char) -> Option<ArithmeticCommand> {
        match symbol {
            '+' => Some(ArithmeticCommand::Add),
            '-' => Some(ArithmeticCommand::Sub),
            '=' => Some(ArithmeticCommand::Eq),
            '>' => Some(ArithmeticCommand::Gt),
            '<' => Some(ArithmeticCommand::Lt),
            '&' => Some(ArithmeticCommand::And),
            '|' => Some(ArithmeticCommand::Or),
            _ => None,
        }
    }

    // --- grammar -----------------------------------------------------------

    /// `class className '{' classVarDec* subroutineDec* '}'`
    pub fn compile_class(&mut self) -> Result<(), CompileError> {
        let class_tok = self.advance()?;
        if !class_tok.is_keyword("class") {
            return Err(CompileError::UnexpectedToken {
                expected: "class".to_string(),
                found: class_tok.lexeme,
                line: class_tok.line,
            });
        }
        self.class_name = self.expect_identifier()?;
        self.expect_symbol('{')?;

        while Self::is_class_var_dec(&self.peek()?) {
            self.compile_class_var_dec()?;
        }
        while Self::is_subroutine_dec(&self.peek()?) {
            self.compile_subroutine()?;
        }

        self.expect_symbol('}')?;
        Ok(())
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind_tok = self.advance()?;
        let kind = if kind_tok.is_keyword("static") {
            Kind::Static
        } else {
            Kind::Field
        };
        let type_name = self.compile_type()?;

        let name = self.expect_identifier()?;
        self.symbol_table.define(&name, &type_name, kind);
        while self.peek_is_symbol(',')? {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.symbol_table.define(&name, &type_name, kind);
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    /// `('constructor'|'function'|'method') ('void'|type) subroutineName
    /// '(' parameterList ')' '{' varDec* statements '}'`
    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        let kind_tok = self.advance()?;
        self.advance()?; // return type: void or a type, not needed for code generation
        let name = self.expect_identifier()?;

        self.symbol_table.start_subroutine();
        if kind_tok.is_keyword("method") {
            self.symbol_table.define("this", &self.class_name, Kind::Arg);
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;

        while self.peek_is_keyword("var")? {
            self.compile_var_dec()?;
        }

        let function_name = format!("{}.{name}", self.class_name);
        let n_locals = self.symbol_table.var_count(Kind::Var);
        self.vm_writer.write_function(&function_name, n_locals)?;

        if kind_tok.is_keyword("constructor") {
            let n_fields = self.symbol_table.var_count(Kind::Field);
            self.vm_writer.write_push(Segment::Const, n_fields)?;
            self.vm_writer.write_call("Memory.alloc", 1)?;
            self.vm_writer.write_pop(Segment::Pointer, 0)?;
        } else if kind_tok.is_keyword("method") {
            self.vm_writer.write_push(Segment::Arg, 0)?;
            self.vm_writer.write_pop(Segment::Pointer, 0)?;
        }

        self.compile_statements()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.peek_is_symbol(')')? {
            return Ok(());
        }
        let type_name = self.compile_type()?;
        let name = self.expect_identifier()?;
        self.symbol_table.define(&name, &type_name, Kind::Arg);

        while self.peek_is_symbol(',')? {
            self.advance()?;
            let type_name = self.compile_type()?;
            let name = self.expect_identifier()?;
            self.symbol_table.define(&name, &type_name, Kind::Arg);
        }
        Ok(())
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.advance()?; // 'var'
        let type_name = self.compile_type()?;
        let name = self.expect_identifier()?;
        self.symbol_table.define(&name, &type_name, Kind::Var);

        while self.peek_is_symbol(',')? {
            self.advance()?;
            let name = self.expect_identifier()?;
            self.symbol_table.define(&name, &type_name, Kind::Var);
        }
        self.expect_symbol(';')?;
        Ok(())
    }

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        while Self::is_statement(&self.peek()?) {
            let tok = self.advance()?;
            match tok.lexeme.as_str() {
                "let" => self.compile_let()?,
                "if" => self.compile_if()?,
                "while" => self.compile_while()?,
                "do" => self.compile_do()?,
                "return" => self.compile_return()?,
                _ => unreachable!("is_statement guards this match"),
            }
        }
        Ok(())
    }

    /// `'do' subroutineCall ';'`
    fn compile_do(&mut self) -> Result<(), CompileError> {
        let leading = self.advance()?;
        self.compile_subroutine_call(leading)?;
        self.vm_writer.write_pop(Segment::Temp, 0)?;
        self.expect_symbol(';')?;
        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self) -> Result<(), CompileError> {
        let var_name = self.expect_identifier()?;
        let kind = self
            .symbol_table
            .kind_of(&var_name)
            .ok_or_else(|| CompileError::UndefinedVariable(var_name.clone()))?;
        let index = self.symbol_table.index_of(&var_name).unwrap();
        let segment = Segment::from_kind(kind);

        if self.peek_is_symbol('[')? {
            self.advance()?;
            self.compile_expression()?;
            self.expect_symbol(']')?;

            self.vm_writer.write_push(segment, index)?;
            self.vm_writer.write_arithmetic(ArithmeticCommand::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            // `e` may itself use `pointer 1`, so stash the RHS before
            // binding THAT to the target address.
            self.vm_writer.write_pop(Segment::Temp, 0)?;
            self.vm_writer.write_pop(Segment::Pointer, 1)?;
            self.vm_writer.write_push(Segment::Temp, 0)?;
            self.vm_writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.vm_writer.write_pop(segment, index)?;
        }
        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> Result<(), CompileError> {
        let idx = self.while_index;
        self.while_index += 1;
        let exp_label = format!("WHILE_EXP{idx}");
        let end_label = format!("WHILE_END{idx}");

        self.vm_writer.write_label(&exp_label)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.vm_writer.write_arithmetic(ArithmeticCommand::Not)?;
        self.vm_writer.write_if(&end_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.vm_writer.write_goto(&exp_label)?;
        self.vm_writer.write_label(&end_label)?;
        Ok(())
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> Result<(), CompileError> {
        if self.peek_is_symbol(';')? {
            self.vm_writer.write_push(Segment::Const, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.vm_writer.write_return()?;
        self.expect_symbol(';')?;
        Ok(())
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> Result<(), CompileError> {
        let idx = self.if_index;
        self.if_index += 1;
        let true_label = format!("IF_TRUE{idx}");
        let false_label = format!("IF_FALSE{idx}");
        let end_label = format!("IF_END{idx}");

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        self.vm_writer.write_if(&true_label)?;
        self.vm_writer.write_goto(&false_label)?;
        self.vm_writer.write_label(&true_label)?;
        self.compile_statements()?;
        self.vm_writer.write_goto(&end_label)?;
        self.expect_symbol('}')?;

        self.vm_writer.write_label(&false_label)?;
        if self.peek_is_keyword("else")? {
            self.advance()?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }
        self.vm_writer.write_label(&end_label)?;
        Ok(())
    }

    /// `term (op term)*` — no operator precedence, resolved left to right.
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        loop {
            let tok = self.peek()?;
            let Some(op) = (if tok.kind == TokenKind::Symbol {
                tok.lexeme.chars().next()
            } else {
                None
            }) else {
                break;
            };
            if !"+-*/&|<>=".contains(op) {
                break;
            }
            self.advance()?;
            self.compile_term()?;
            if let Some(cmd) = Self::binary_op(op) {
                self.vm_writer.write_arithmetic(cmd)?;
            } else if op == '*' {
                self.vm_writer.write_call("Math.multiply", 2)?;
            } else if op == '/' {
                self.vm_writer.write_call("Math.divide", 2)?;
            }
        }
        Ok(())
    }

    /// `integerConstant | stringConstant | keywordConstant | varName |
    /// varName '[' expression ']' | subroutineCall | '(' expression ')' |
    /// unaryOp term`
    fn compile_term(&mut self) -> Result<(), CompileError> {
        let tok = self.peek()?;

        if tok.is_symbol('-') || tok.is_symbol('~') {
            self.advance()?;
            self.compile_term()?;
            let cmd = if tok.is_symbol('-') {
                ArithmeticCommand::Neg
            } else {
                ArithmeticCommand::Not
            };
            self.vm_writer.write_arithmetic(cmd)?;
            return Ok(());
        }

        if tok.is_symbol('(') {
            self.advance()?;
            self.compile_expression()?;
            self.expect_symbol(')')?;
            return Ok(());
        }

        match tok.kind {
            TokenKind::IntConst(n) => {
                self.advance()?;
                self.vm_writer.write_push(Segment::Const, n)?;
                Ok(())
            }
            TokenKind::StringConst(ref s) => {
                let s = s.clone();
                self.advance()?;
                self.compile_string(&s)?;
                Ok(())
            }
            TokenKind::Keyword => {
                self.advance()?;
                self.compile_keyword(&tok)?;
                Ok(())
            }
            TokenKind::Identifier => {
                let leading = self.advance()?;
                let next = self.peek()?;
                if next.is_symbol('[') {
                    self.advance()?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;

                    let kind = self
                        .symbol_table
                        .kind_of(&leading.lexeme)
                        .ok_or_else(|| CompileError::UndefinedVariable(leading.lexeme.clone()))?;
                    let index = self.symbol_table.index_of(&leading.lexeme).unwrap();
                    self.vm_writer.write_push(Segment::from_kind(kind), index)?;
                    self.vm_writer.write_arithmetic(ArithmeticCommand::Add)?;
                    self.vm_writer.write_pop(Segment::Pointer, 1)?;
                    self.vm_writer.write_push(Segment::That, 0)?;
                    Ok(())
                } else if next.is_symbol('.') || next.is_symbol('(') {
                    self.compile_subroutine_call(leading)
                } else {
                    let kind = self
                        .symbol_table
                        .kind_of(&leading.lexeme)
                        .ok_or_else(|| CompileError::UndefinedVariable(leading.lexeme.clone()))?;
                    let index = self.symbol_table.index_of(&leading.lexeme).unwrap();
                    self.vm_writer.write_push(Segment::from_kind(kind), index)?;
                    Ok(())
                }
            }
            TokenKind::Symbol => Err(CompileError::UnexpectedToken {
                expected: "term".to_string(),
                found: tok.lexeme,
                line: tok.line,
            }),
        }
    }

    /// `(expression (',' expression)*)?`; returns the argument count.
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        let mut n_args = 0;
        if self.peek_is_symbol(')')? {
            return Ok(0);
        }
        self.compile_expression()?;
        n_args += 1;

        while self.peek_is_symbol(',')? {
            self.advance()?;
            self.compile_expression()?;
            n_args += 1;
        }
        Ok(n_args)
    }

    fn compile_keyword(&mut self, tok: &Token) -> Result<(), CompileError> {
        match tok.lexeme.as_str() {
            "this" => self.vm_writer.write_push(Segment::Pointer, 0),
            "true" => {
                self.vm_writer.write_push(Segment::Const, 0)?;
                self.vm_writer.write_arithmetic(ArithmeticCommand::Not)
            }
            _ => self.vm_writer.write_push(Segment::Const, 0), // false, null
        }
        .map_err(CompileError::from)
    }

    fn compile_string(&mut self, s: &str) -> Result<(), CompileError> {
        self.vm_writer
            .write_push(Segment::Const, u16::try_from(s.chars().count()).unwrap_or(u16::MAX))?;
        self.vm_writer.write_call("String.new", 1)?;
        for c in s.chars() {
            self.vm_writer.write_push(Segment::Const, c as u16)?;
            self.vm_writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }

    /// `subroutineName '(' expressionList ')' | (className|varName) '.'
    /// subroutineName '(' expressionList ')'`. `leading` is the already
    /// consumed identifier that opens the call.
    fn compile_subroutine_call(&mut self, leading: Token) -> Result<(), CompileError> {
        let (function_name, mut n_args) = if self.peek_is_symbol('.')? {
            self.advance()?;
            let method_name = self.expect_identifier()?;

            if let Some(kind) = self.symbol_table.kind_of(&leading.lexeme) {
                let segment = Segment::from_kind(kind);
                let index = self.symbol_table.index_of(&leading.lexeme).unwrap();
                let type_name = self
                    .symbol_table
                    .type_of(&leading.lexeme)
                    .unwrap()
                    .to_string();
                self.vm_writer.write_push(segment, index)?;
                (format!("{type_name}.{method_name}"), 1)
            } else {
                (format!("{}.{method_name}", leading.lexeme), 0)
            }
        } else {
            self.vm_writer.write_push(Segment::Pointer, 0)?;
            (format!("{}.{}", self.class_name, leading.lexeme), 1)
        };

        self.expect_symbol('(')?;
        n_args += self.compile_expression_list()?;
        self.expect_symbol(')')?;

        self.vm_writer.write_call(&function_name, n_args)?;
        Ok(())
    }
}
