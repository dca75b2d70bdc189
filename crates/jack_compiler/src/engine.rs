//! Single-pass recursive-descent parser and code generator.
//!
//! Each grammar production consumes tokens with one token of lookahead,
//! resolves names against the symbol table and emits instructions in
//! left-to-right, post-order evaluation order.  No syntax tree is built.
//! The first error aborts the compile; there is no recovery.

use crate::lexer::{Keyword, LexError, Span, Token, TokenKind, Tokenizer};
use crate::symbol_table::{Kind, Symbol, SymbolTable};
use crate::trace::Trace;
use crate::CompileError;
use jack_vm::{Instruction, InstructionSink, Segment};
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// The binary operators of the expression grammar, in no particular order;
/// the grammar is precedence-free.
const OPERATORS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Expected(Span, String, String),
    UnexpectedEnd(Span),
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Expected(span, _, _) | ParseError::UnexpectedEnd(span) => span,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Expected(_, expected, found) => {
                write!(f, "expected {}, found {}.", expected, found)
            }
            ParseError::UnexpectedEnd(_) => write!(f, "Unexpected end of input."),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UndefinedNameError(pub Span, pub String);

impl UndefinedNameError {
    pub fn span(&self) -> &Span {
        &self.0
    }
}

impl Display for UndefinedNameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" is not defined.", self.1)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SemanticError {
    DuplicateName(Span, String),
    ReturnValueFromVoid(Span),
    MissingReturnValue(Span),
    CallOnPrimitive(Span, String, String),
}

impl SemanticError {
    pub fn span(&self) -> &Span {
        match self {
            SemanticError::DuplicateName(span, _)
            | SemanticError::ReturnValueFromVoid(span)
            | SemanticError::MissingReturnValue(span)
            | SemanticError::CallOnPrimitive(span, _, _) => span,
        }
    }
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::DuplicateName(_, name) => {
                write!(f, "\"{}\" is already defined in this scope.", name)
            }
            SemanticError::ReturnValueFromVoid(_) => {
                write!(f, "A void subroutine cannot return a value.")
            }
            SemanticError::MissingReturnValue(_) => {
                write!(f, "A non-void subroutine must return a value.")
            }
            SemanticError::CallOnPrimitive(_, name, ty) => {
                write!(
                    f,
                    "\"{}\" has primitive type {} and cannot be a call target.",
                    name, ty
                )
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Transient state for the subroutine currently being compiled.
#[derive(Clone, Copy)]
struct SubroutineContext {
    kind: SubroutineKind,
    returns_void: bool,
}

pub struct CompilationEngine<'a, S> {
    tokenizer: Tokenizer<'a>,
    sink: &'a mut S,
    symbols: SymbolTable,
    trace: Trace,
    class_name: String,
    label_counter: u16,
    subroutine: SubroutineContext,
}

impl<'a, S: InstructionSink> CompilationEngine<'a, S> {
    pub fn new(tokenizer: Tokenizer<'a>, sink: &'a mut S) -> Self {
        Self {
            tokenizer,
            sink,
            symbols: SymbolTable::new(),
            trace: Trace::new(),
            class_name: String::new(),
            label_counter: 0,
            subroutine: SubroutineContext {
                kind: SubroutineKind::Function,
                returns_void: true,
            },
        }
    }

    /// Compiles one full class.  The engine is not reusable across classes.
    pub fn compile_class(&mut self) -> Result<(), CompileError> {
        self.trace.open("class");

        self.expect_keyword(Keyword::Class)?;
        let (name, _) = self.expect_identifier()?;
        self.class_name = name;
        self.expect_symbol('{')?;

        loop {
            match self.peek_keyword()? {
                Some(Keyword::Static) | Some(Keyword::Field) => self.compile_class_var_dec()?,
                _ => break,
            }
        }

        loop {
            match self.peek_keyword()? {
                Some(Keyword::Constructor) | Some(Keyword::Function) | Some(Keyword::Method) => {
                    self.compile_subroutine()?
                }
                _ => break,
            }
        }

        self.expect_symbol('}')?;
        self.trace.close("class");

        debug!("compiled class {}", self.class_name);
        Ok(())
    }

    pub fn into_trace(self) -> Trace {
        self.trace
    }

    // classVarDec: ('static' | 'field') type varName (',' varName)* ';'
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        self.trace.open("classVarDec");

        let keyword = self.expect_keyword_in(&[Keyword::Static, Keyword::Field])?;
        let kind = if keyword == Keyword::Static {
            Kind::Static
        } else {
            Kind::Field
        };
        let (ty, _) = self.expect_type()?;

        loop {
            let (name, span) = self.expect_identifier()?;
            self.define(&name, &ty, kind, &span)?;

            if self.peek_symbol(',')? {
                self.expect_symbol(',')?;
            } else {
                break;
            }
        }

        self.expect_symbol(';')?;
        self.trace.close("classVarDec");
        Ok(())
    }

    // subroutineDec: ('constructor' | 'function' | 'method') ('void' | type)
    //                subroutineName '(' parameterList ')' subroutineBody
    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        self.trace.open("subroutineDec");

        let keyword = self.expect_keyword_in(&[
            Keyword::Constructor,
            Keyword::Function,
            Keyword::Method,
        ])?;
        let kind = match keyword {
            Keyword::Constructor => SubroutineKind::Constructor,
            Keyword::Function => SubroutineKind::Function,
            _ => SubroutineKind::Method,
        };

        let returns_void = match self.peek_keyword()? {
            Some(Keyword::Void) => {
                let token = self.next_token()?;
                self.trace.token(&token);
                true
            }
            _ => {
                self.expect_type()?;
                false
            }
        };

        let (name, _) = self.expect_identifier()?;

        self.symbols.start_subroutine();
        if kind == SubroutineKind::Method {
            // The receiver consumes argument slot 0 before any declared
            // parameter is processed.
            let class_name = self.class_name.clone();
            let _ = self.symbols.define("this", &class_name, Kind::Argument);
        }
        self.subroutine = SubroutineContext { kind, returns_void };

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.compile_subroutine_body(&name)?;

        self.trace.close("subroutineDec");
        debug!("compiled subroutine {}.{}", self.class_name, name);
        Ok(())
    }

    // parameterList: ((type varName) (',' type varName)*)?
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        self.trace.open("parameterList");

        if self.peek_is_type()? {
            loop {
                let (ty, _) = self.expect_type()?;
                let (name, span) = self.expect_identifier()?;
                self.define(&name, &ty, Kind::Argument, &span)?;

                if self.peek_symbol(',')? {
                    self.expect_symbol(',')?;
                } else {
                    break;
                }
            }
        }

        self.trace.close("parameterList");
        Ok(())
    }

    // subroutineBody: '{' varDec* statements '}'
    //
    // The function header is emitted only after all varDecs are parsed, when
    // the local count is known.
    fn compile_subroutine_body(&mut self, name: &str) -> Result<(), CompileError> {
        self.trace.open("subroutineBody");
        self.expect_symbol('{')?;

        while self.peek_keyword()? == Some(Keyword::Var) {
            self.compile_var_dec()?;
        }

        self.emit(Instruction::Function(
            format!("{}.{}", self.class_name, name),
            self.symbols.var_count(Kind::Local),
        ));

        match self.subroutine.kind {
            SubroutineKind::Method => {
                self.emit(Instruction::Push(Segment::Argument, 0));
                self.emit(Instruction::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Constructor => {
                self.emit(Instruction::Push(
                    Segment::Constant,
                    self.symbols.var_count(Kind::Field),
                ));
                self.emit(Instruction::Call("Memory.alloc".to_owned(), 1));
                self.emit(Instruction::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;

        self.expect_symbol('}')?;
        self.trace.close("subroutineBody");
        Ok(())
    }

    // varDec: 'var' type varName (',' varName)* ';'
    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.trace.open("varDec");

        self.expect_keyword(Keyword::Var)?;
        let (ty, _) = self.expect_type()?;

        loop {
            let (name, span) = self.expect_identifier()?;
            self.define(&name, &ty, Kind::Local, &span)?;

            if self.peek_symbol(',')? {
                self.expect_symbol(',')?;
            } else {
                break;
            }
        }

        self.expect_symbol(';')?;
        self.trace.close("varDec");
        Ok(())
    }

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        self.trace.open("statements");

        loop {
            match self.peek_keyword()? {
                Some(Keyword::Let) => self.compile_let()?,
                Some(Keyword::If) => self.compile_if()?,
                Some(Keyword::While) => self.compile_while()?,
                Some(Keyword::Do) => self.compile_do()?,
                Some(Keyword::Return) => self.compile_return()?,
                _ => break,
            }
        }

        self.trace.close("statements");
        Ok(())
    }

    // letStatement: 'let' varName ('[' expression ']')? '=' expression ';'
    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.trace.open("letStatement");

        self.expect_keyword(Keyword::Let)?;
        let (name, span) = self.expect_identifier()?;
        let symbol = self.resolve(&name, &span)?;

        if self.peek_symbol('[')? {
            // Array element: compute base + index, hold the right-hand value
            // aside in temp 0, then store through pointer 1 / that 0.
            self.expect_symbol('[')?;
            self.emit(Instruction::Push(symbol.kind.segment(), symbol.index));
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.emit(Instruction::Add);

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            self.emit(Instruction::Pop(Segment::Temp, 0));
            self.emit(Instruction::Pop(Segment::Pointer, 1));
            self.emit(Instruction::Push(Segment::Temp, 0));
            self.emit(Instruction::Pop(Segment::That, 0));
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            self.emit(Instruction::Pop(symbol.kind.segment(), symbol.index));
        }

        self.trace.close("letStatement");
        Ok(())
    }

    // ifStatement: 'if' '(' expression ')' '{' statements '}'
    //              ('else' '{' statements '}')?
    fn compile_if(&mut self) -> Result<(), CompileError> {
        self.trace.open("ifStatement");

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        let after_then = self.fresh_label();
        self.emit(Instruction::Not);
        self.emit(Instruction::IfGoto(after_then.clone()));

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        if self.peek_keyword()? == Some(Keyword::Else) {
            let end = self.fresh_label();
            self.emit(Instruction::Goto(end.clone()));
            self.emit(Instruction::Label(after_then));

            self.expect_keyword(Keyword::Else)?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;

            self.emit(Instruction::Label(end));
        } else {
            self.emit(Instruction::Label(after_then));
        }

        self.trace.close("ifStatement");
        Ok(())
    }

    // whileStatement: 'while' '(' expression ')' '{' statements '}'
    fn compile_while(&mut self) -> Result<(), CompileError> {
        self.trace.open("whileStatement");

        let top = self.fresh_label();
        let end = self.fresh_label();

        self.expect_keyword(Keyword::While)?;
        self.emit(Instruction::Label(top.clone()));

        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;

        self.emit(Instruction::Not);
        self.emit(Instruction::IfGoto(end.clone()));

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;

        self.emit(Instruction::Goto(top));
        self.emit(Instruction::Label(end));

        self.trace.close("whileStatement");
        Ok(())
    }

    // doStatement: 'do' subroutineCall ';'
    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.trace.open("doStatement");

        self.expect_keyword(Keyword::Do)?;
        let (name, span) = self.expect_identifier()?;

        if self.peek_symbol('(')? || self.peek_symbol('.')? {
            self.compile_call(name, span)?;
        } else {
            return Err(self.unexpected("a subroutine call"));
        }

        self.expect_symbol(';')?;

        // The call result is unused; discard it.
        self.emit(Instruction::Pop(Segment::Temp, 0));

        self.trace.close("doStatement");
        Ok(())
    }

    // returnStatement: 'return' expression? ';'
    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.trace.open("returnStatement");

        let return_token = self.expect_keyword(Keyword::Return)?;

        if self.peek_symbol(';')? {
            if !self.subroutine.returns_void {
                return Err(SemanticError::MissingReturnValue(return_token.span).into());
            }
            self.emit(Instruction::Push(Segment::Constant, 0));
        } else {
            if self.subroutine.returns_void {
                return Err(SemanticError::ReturnValueFromVoid(return_token.span).into());
            }
            self.compile_expression()?;
        }

        self.expect_symbol(';')?;
        self.emit(Instruction::Return);

        self.trace.close("returnStatement");
        Ok(())
    }

    // expression: term (op term)*
    //
    // No precedence: each (op, term) pair folds into the running result as
    // soon as it is parsed.
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.trace.open("expression");

        self.compile_term()?;

        loop {
            let operator = match self.tokenizer.peek()? {
                Some(Token {
                    kind: TokenKind::Symbol(c),
                    ..
                }) if OPERATORS.contains(c) => *c,
                _ => break,
            };

            // The operator is captured here, before the right operand is
            // parsed; nested sub-expressions move the read position.
            let token = self.next_token()?;
            self.trace.token(&token);

            self.compile_term()?;

            match operator {
                '+' => self.emit(Instruction::Add),
                '-' => self.emit(Instruction::Sub),
                '*' => self.emit(Instruction::Call("Math.multiply".to_owned(), 2)),
                '/' => self.emit(Instruction::Call("Math.divide".to_owned(), 2)),
                '&' => self.emit(Instruction::And),
                '|' => self.emit(Instruction::Or),
                '<' => self.emit(Instruction::Lt),
                '>' => self.emit(Instruction::Gt),
                '=' => self.emit(Instruction::Eq),
                _ => unreachable!(),
            }
        }

        self.trace.close("expression");
        Ok(())
    }

    // term: integerConstant | stringConstant | keywordConstant | varName |
    //       varName '[' expression ']' | '(' expression ')' | unaryOp term |
    //       subroutineCall
    fn compile_term(&mut self) -> Result<(), CompileError> {
        self.trace.open("term");

        let token = self.next_token()?;
        self.trace.token(&token);

        match token.kind {
            TokenKind::IntConst(value) => {
                self.emit(Instruction::Push(Segment::Constant, value));
            }

            TokenKind::StringConst(value) => self.compile_string_constant(&value),

            TokenKind::Keyword(Keyword::True) => {
                self.emit(Instruction::Push(Segment::Constant, 1));
                self.emit(Instruction::Neg);
            }

            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.emit(Instruction::Push(Segment::Constant, 0));
            }

            TokenKind::Keyword(Keyword::This) => {
                self.emit(Instruction::Push(Segment::Pointer, 0));
            }

            TokenKind::Symbol('(') => {
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }

            TokenKind::Symbol('-') => {
                self.compile_term()?;
                self.emit(Instruction::Neg);
            }

            TokenKind::Symbol('~') => {
                self.compile_term()?;
                self.emit(Instruction::Not);
            }

            TokenKind::Identifier(name) => {
                let span = token.span.clone();

                if self.peek_symbol('[')? {
                    // Array element read: compute base + index and load
                    // through pointer 1 / that 0.
                    let symbol = self.resolve(&name, &span)?;
                    self.expect_symbol('[')?;
                    self.emit(Instruction::Push(symbol.kind.segment(), symbol.index));
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.emit(Instruction::Add);
                    self.emit(Instruction::Pop(Segment::Pointer, 1));
                    self.emit(Instruction::Push(Segment::That, 0));
                } else if self.peek_symbol('(')? || self.peek_symbol('.')? {
                    self.compile_call(name, span)?;
                } else {
                    let symbol = self.resolve(&name, &span)?;
                    self.emit(Instruction::Push(symbol.kind.segment(), symbol.index));
                }
            }

            _ => {
                return Err(ParseError::Expected(
                    token.span.clone(),
                    "a term".to_owned(),
                    found(&token),
                )
                .into())
            }
        }

        self.trace.close("term");
        Ok(())
    }

    // subroutineCall: subroutineName '(' expressionList ')' |
    //                 (className | varName) '.' subroutineName
    //                 '(' expressionList ')'
    //
    // The leading identifier has already been consumed by the caller.
    fn compile_call(&mut self, name: String, span: Span) -> Result<(), CompileError> {
        if self.peek_symbol('(')? {
            // A bare call targets the current class, with the current
            // receiver passed as argument 0.
            self.expect_symbol('(')?;
            self.emit(Instruction::Push(Segment::Pointer, 0));
            let args = self.compile_expression_list()? + 1;
            self.expect_symbol(')')?;
            self.emit(Instruction::Call(
                format!("{}.{}", self.class_name, name),
                args,
            ));
            return Ok(());
        }

        self.expect_symbol('.')?;
        let (subroutine, _) = self.expect_identifier()?;

        // A name that resolves to a variable makes this an instance call on
        // that variable's declared type; otherwise the name is a class.
        let (target, receiver) = match self.symbols.resolve(&name) {
            Some(symbol) => {
                if matches!(symbol.ty.as_str(), "int" | "char" | "boolean") {
                    return Err(
                        SemanticError::CallOnPrimitive(span, name, symbol.ty.clone()).into(),
                    );
                }
                (symbol.ty.clone(), Some((symbol.kind.segment(), symbol.index)))
            }
            None => (name.clone(), None),
        };

        self.expect_symbol('(')?;
        let mut args = 0;
        if let Some((segment, index)) = receiver {
            self.emit(Instruction::Push(segment, index));
            args += 1;
        }
        args += self.compile_expression_list()?;
        self.expect_symbol(')')?;

        self.emit(Instruction::Call(format!("{}.{}", target, subroutine), args));
        Ok(())
    }

    // expressionList: (expression (',' expression)*)?
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        self.trace.open("expressionList");

        let mut count = 0;
        if !self.peek_symbol(')')? {
            loop {
                self.compile_expression()?;
                count += 1;

                if self.peek_symbol(',')? {
                    self.expect_symbol(',')?;
                } else {
                    break;
                }
            }
        }

        self.trace.close("expressionList");
        Ok(count)
    }

    fn compile_string_constant(&mut self, value: &str) {
        self.emit(Instruction::Push(
            Segment::Constant,
            value.chars().count() as u16,
        ));
        self.emit(Instruction::Call("String.new".to_owned(), 1));
        for c in value.chars() {
            self.emit(Instruction::Push(Segment::Constant, c as u16));
            self.emit(Instruction::Call("String.appendChar".to_owned(), 2));
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.sink.emit(instruction);
    }

    /// Labels are unique across the whole compilation unit; the counter is
    /// never reset between subroutines.
    fn fresh_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn define(&mut self, name: &str, ty: &str, kind: Kind, span: &Span) -> Result<(), CompileError> {
        if self.symbols.define(name, ty, kind).is_none() {
            return Err(SemanticError::DuplicateName(span.clone(), name.to_owned()).into());
        }
        Ok(())
    }

    fn resolve(&self, name: &str, span: &Span) -> Result<Symbol, CompileError> {
        self.symbols
            .resolve(name)
            .cloned()
            .ok_or_else(|| UndefinedNameError(span.clone(), name.to_owned()).into())
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        match self.tokenizer.next()? {
            Some(token) => Ok(token),
            None => {
                let pos = self.tokenizer.pos();
                Err(ParseError::UnexpectedEnd(pos..pos).into())
            }
        }
    }

    fn peek_keyword(&mut self) -> Result<Option<Keyword>, LexError> {
        Ok(match self.tokenizer.peek()? {
            Some(Token {
                kind: TokenKind::Keyword(keyword),
                ..
            }) => Some(*keyword),
            _ => None,
        })
    }

    fn peek_symbol(&mut self, symbol: char) -> Result<bool, LexError> {
        Ok(matches!(
            self.tokenizer.peek()?,
            Some(Token {
                kind: TokenKind::Symbol(c),
                ..
            }) if *c == symbol
        ))
    }

    fn peek_is_type(&mut self) -> Result<bool, LexError> {
        Ok(matches!(
            self.tokenizer.peek()?,
            Some(Token {
                kind: TokenKind::Keyword(Keyword::Int)
                    | TokenKind::Keyword(Keyword::Char)
                    | TokenKind::Keyword(Keyword::Boolean)
                    | TokenKind::Identifier(_),
                ..
            })
        ))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, CompileError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Keyword(k) if k == keyword => {
                self.trace.token(&token);
                Ok(token)
            }
            _ => Err(ParseError::Expected(
                token.span.clone(),
                format!("keyword \"{}\"", keyword),
                found(&token),
            )
            .into()),
        }
    }

    fn expect_keyword_in(&mut self, keywords: &[Keyword]) -> Result<Keyword, CompileError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Keyword(k) if keywords.contains(&k) => {
                self.trace.token(&token);
                Ok(k)
            }
            _ => {
                let expected = keywords
                    .iter()
                    .map(|k| format!("\"{}\"", k))
                    .collect::<Vec<String>>()
                    .join(" or ");
                Err(ParseError::Expected(token.span.clone(), expected, found(&token)).into())
            }
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<Token, CompileError> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Symbol(c) if c == symbol => {
                self.trace.token(&token);
                Ok(token)
            }
            _ => Err(ParseError::Expected(
                token.span.clone(),
                format!("symbol \"{}\"", symbol),
                found(&token),
            )
            .into()),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), CompileError> {
        let token = self.next_token()?;
        match &token.kind {
            TokenKind::Identifier(name) => {
                self.trace.token(&token);
                Ok((name.clone(), token.span))
            }
            _ => Err(ParseError::Expected(
                token.span.clone(),
                "an identifier".to_owned(),
                found(&token),
            )
            .into()),
        }
    }

    // type: 'int' | 'char' | 'boolean' | className
    fn expect_type(&mut self) -> Result<(String, Span), CompileError> {
        let token = self.next_token()?;
        let ty = match &token.kind {
            TokenKind::Keyword(Keyword::Int) => "int".to_owned(),
            TokenKind::Keyword(Keyword::Char) => "char".to_owned(),
            TokenKind::Keyword(Keyword::Boolean) => "boolean".to_owned(),
            TokenKind::Identifier(name) => name.clone(),
            _ => {
                return Err(ParseError::Expected(
                    token.span.clone(),
                    "a type".to_owned(),
                    found(&token),
                )
                .into())
            }
        };
        self.trace.token(&token);
        Ok((ty, token.span))
    }

    /// Builds an "expected ..." error from the lookahead without consuming
    /// it.
    fn unexpected(&mut self, expected: &str) -> CompileError {
        match self.tokenizer.peek() {
            Ok(Some(token)) => ParseError::Expected(
                token.span.clone(),
                expected.to_owned(),
                found(token),
            )
            .into(),
            Ok(None) => {
                let pos = self.tokenizer.pos();
                ParseError::UnexpectedEnd(pos..pos).into()
            }
            Err(err) => err.into(),
        }
    }
}

fn found(token: &Token) -> String {
    match &token.kind {
        TokenKind::Keyword(keyword) => format!("keyword \"{}\"", keyword),
        TokenKind::Symbol(symbol) => format!("symbol \"{}\"", symbol),
        TokenKind::Identifier(name) => format!("identifier \"{}\"", name),
        TokenKind::IntConst(value) => format!("number \"{}\"", value),
        TokenKind::StringConst(_) => format!("string {}", token.text),
    }
}
