//! Parser for JavaScript source code
//!
//! Recursive descent for statements, precedence climbing for binary
//! operators. Statements and expressions outside the evaluated subset are
//! still consumed with balanced brackets and come out as [`Unsupported`]
//! nodes.
//!
//! The lexer only produces keywords for words that start a node this parser
//! builds. Other reserved words arrive as identifiers and are classified
//! here, either as the start of a skipped statement or as a reserved operand.

use std::rc::Rc;

use crate::ast::*;
use crate::error::SimError;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
use crate::value::JsString;

/// Deepest nesting of statements and expressions the parser accepts
pub const MAX_NESTING_DEPTH: usize = 128;

/// Words that can never name a binding
const RESERVED_WORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "try", "catch", "finally",
    "throw", "class", "extends", "import", "export", "break", "continue", "debugger", "this",
    "super", "yield", "with", "enum",
];

/// Operator found at the current token while parsing a binary expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
            depth: 0,
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, SimError> {
        let mut body = Vec::new();
        while !self.at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program {
            body,
            span: Span::new(0, self.current.span.end, 1, 1),
        })
    }

    // ============ NESTING ============

    /// Run `parse` one level deeper, failing once nesting passes
    /// [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, SimError>) -> Result<T, SimError> {
        self.descend()?;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    fn descend(&mut self) -> Result<(), SimError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("Nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Operator and member chains grow their tree in a loop. Each link
    /// counts toward the nesting limit until the chain ends.
    fn chain<T>(&mut self, build: impl FnOnce(&mut Self) -> Result<T, SimError>) -> Result<T, SimError> {
        let depth = self.depth;
        let result = build(self);
        self.depth = depth;
        result
    }

    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> Result<Statement, SimError> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> Result<Statement, SimError> {
        let start = self.current.span;

        if let Some(kind) = self.current_word().and_then(skipped_statement) {
            let dynamic_import = kind == "ImportDeclaration" && self.peek().is_punct("(");
            if !dynamic_import {
                return self.skip_statement(kind, start);
            }
        } else if self.at_identifier() && self.peek().is_punct(":") {
            return self.skip_statement("LabeledStatement", start);
        }

        match &self.current.kind {
            TokenKind::Keyword(Keyword::Var | Keyword::Let | Keyword::Const) => self.variable_declaration(),
            TokenKind::Keyword(Keyword::Function) if self.peek().is_punct("*") => {
                self.skip_statement("GeneratorFunctionDeclaration", start)
            }
            TokenKind::Keyword(Keyword::Function) => {
                let function = self.function(FunctionForm::Declaration)?;
                Ok(Statement::FunctionDeclaration(Rc::new(function)))
            }
            TokenKind::Keyword(Keyword::Async) if self.peek().is_keyword(Keyword::Function) => {
                self.skip_statement("AsyncFunctionDeclaration", start)
            }
            TokenKind::Keyword(Keyword::Return) => self.return_statement(),
            TokenKind::Punct("{") => Ok(Statement::Block(self.block()?)),
            TokenKind::Punct(";") => {
                self.advance();
                Ok(Statement::Empty(start))
            }
            _ => {
                let expression = self.parse_expression()?;
                self.end_statement()?;
                let span = self.span_from(start);
                Ok(Statement::Expression(ExpressionStatement { expression, span }))
            }
        }
    }

    fn variable_declaration(&mut self) -> Result<Statement, SimError> {
        let start = self.current.span;
        let kind = match self.current.kind {
            TokenKind::Keyword(Keyword::Let) => VariableKind::Let,
            TokenKind::Keyword(Keyword::Const) => VariableKind::Const,
            _ => VariableKind::Var,
        };
        self.advance();

        // Destructuring is outside the subset; keep the statement as a whole
        if self.at_punct("{") || self.at_punct("[") {
            return self.skip_statement("VariableDeclaration", start);
        }

        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current.span;
            let id = self.identifier()?;
            let init = if self.eat_punct("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator {
                id,
                init,
                span: self.span_from(decl_start),
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.end_statement()?;

        let span = self.span_from(start);
        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
            span,
        }))
    }

    fn return_statement(&mut self) -> Result<Statement, SimError> {
        let start = self.current.span;
        self.advance();

        let bare = self.at_punct(";") || self.at_punct("}") || self.at_end() || self.current.newline_before;
        let argument = if bare { None } else { Some(self.parse_expression()?) };
        self.end_statement()?;

        let span = self.span_from(start);
        Ok(Statement::Return(ReturnStatement { argument, span }))
    }

    fn block(&mut self) -> Result<BlockStatement, SimError> {
        let start = self.current.span;
        self.expect_punct("{")?;

        let mut body = Vec::new();
        while !self.eat_punct("}") {
            if self.at_end() {
                return Err(self.error("Unexpected end of input, expected '}'"));
            }
            body.push(self.parse_statement()?);
        }

        let span = self.span_from(start);
        Ok(BlockStatement { body, span })
    }

    /// Consume a statement the evaluator does not run, keeping brackets
    /// balanced. The statement ends at a top-level `;`, at the `}` of the
    /// enclosing block, or at a line break where ASI would apply. Statements
    /// with block bodies also end at the `}` closing their last block, unless
    /// `else`/`catch`/`finally` continues them.
    fn skip_statement(&mut self, kind: &'static str, start: Span) -> Result<Statement, SimError> {
        let block_bodied = has_block_body(kind);
        let mut depth = 0usize;
        let mut consumed = false;

        loop {
            if depth == 0 && consumed && self.current.newline_before && ends_expression(&self.previous.kind) {
                break;
            }

            let boundary = match &self.current.kind {
                TokenKind::Eof if depth > 0 => return Err(self.error("Unexpected end of input")),
                TokenKind::Eof => break,
                TokenKind::Invalid(_) | TokenKind::Unterminated(_) => {
                    return Err(self.unexpected("statement"));
                }
                TokenKind::Punct("(" | "[" | "{") => {
                    depth += 1;
                    false
                }
                TokenKind::Punct("}") if depth == 0 => break,
                TokenKind::Punct(")" | "]") if depth == 0 => return Err(self.unexpected("statement")),
                TokenKind::Punct(close @ (")" | "]" | "}")) => {
                    depth -= 1;
                    depth == 0 && block_bodied && *close == "}"
                }
                TokenKind::Punct(";") => depth == 0,
                _ => false,
            };

            self.advance();
            consumed = true;
            if boundary && !self.continues(kind) {
                break;
            }
        }

        let span = self.span_from(start);
        Ok(Statement::Unsupported(Unsupported { kind, span }))
    }

    /// Whether the current word carries on the statement being skipped
    fn continues(&self, kind: &str) -> bool {
        match self.current_word() {
            Some("else" | "catch" | "finally") => true,
            Some("while") => kind == "DoWhileStatement",
            _ => false,
        }
    }

    // ============ FUNCTIONS ============

    fn function(&mut self, form: FunctionForm) -> Result<Function, SimError> {
        let start = self.current.span;
        self.expect_keyword(Keyword::Function)?;
        self.function_rest(start, form)
    }

    /// Name, parameters and body of a function once `function` (and any
    /// `*`) has been consumed
    fn function_rest(&mut self, start: Span, form: FunctionForm) -> Result<Function, SimError> {
        let id = if self.at_identifier() {
            Some(self.identifier()?)
        } else if form == FunctionForm::Declaration {
            return Err(self.unexpected("function name"));
        } else {
            None
        };
        let params = self.params()?;
        let body = FunctionBody::Block(self.block()?);

        let span = self.span_from(start);
        Ok(Function {
            id,
            params,
            body,
            form,
            span,
        })
    }

    fn params(&mut self) -> Result<Vec<Identifier>, SimError> {
        self.expect_punct("(")?;

        let mut params = Vec::new();
        while !self.eat_punct(")") {
            if !self.at_identifier() {
                return Err(self.error(
                    "Only plain identifier parameters are supported (no defaults, rest or destructuring)",
                ));
            }
            params.push(self.identifier()?);
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }

        Ok(params)
    }

    /// Whether an arrow function starts at the current token
    fn at_arrow(&self) -> bool {
        if self.at_identifier() {
            return self.peek().is_punct("=>");
        }
        self.at_punct("(") && self.arrow_params_follow()
    }

    /// Scan past the parenthesized group at the current token on a cloned
    /// lexer and check for `=>`
    fn arrow_params_follow(&self) -> bool {
        let mut lexer = self.lexer.clone();
        let mut token = self.current.clone();
        let mut depth = 0usize;
        loop {
            match &token.kind {
                TokenKind::Punct("(") => depth += 1,
                TokenKind::Punct(")") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return lexer.next_token().is_punct("=>");
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            token = lexer.next_token();
        }
    }

    fn arrow_function(&mut self) -> Result<Function, SimError> {
        let start = self.current.span;

        let params = if self.at_punct("(") {
            self.params()?
        } else {
            vec![self.identifier()?]
        };
        self.expect_punct("=>")?;

        let body = if self.at_punct("{") {
            FunctionBody::Block(self.block()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };

        let span = self.span_from(start);
        Ok(Function {
            id: None,
            params,
            body,
            form: FunctionForm::Arrow,
            span,
        })
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        let first = self.parse_assignment()?;
        if !self.at_punct(",") {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat_punct(",") {
            expressions.push(self.parse_assignment()?);
        }

        let span = self.span_from(start);
        Ok(Expression::Sequence(SequenceExpression { expressions, span }))
    }

    fn parse_assignment(&mut self) -> Result<Expression, SimError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;

        if self.at_arrow() {
            return Ok(Expression::Function(Rc::new(self.arrow_function()?)));
        }
        if self.current.is_keyword(Keyword::Async) {
            return self.async_expression(start);
        }

        let test = self.binary(0)?;
        let left = self.conditional_tail(test, start)?;
        self.assignment_tail(left, start)
    }

    /// `async function`, `async () =>`, or a plain identifier named `async`
    fn async_expression(&mut self, start: Span) -> Result<Expression, SimError> {
        self.advance();
        if self.current.is_keyword(Keyword::Function) {
            self.function(FunctionForm::Expression)?;
            return Ok(self.unsupported("AsyncFunctionExpression", start));
        }
        if self.at_arrow() {
            self.arrow_function()?;
            return Ok(self.unsupported("AsyncArrowFunctionExpression", start));
        }

        let name = JsString::from(Keyword::Async.as_str());
        let callee = Expression::Identifier(Identifier {
            name,
            span: self.span_from(start),
        });
        let left = self.call_tail(callee, start)?;
        let left = self.binary_tail(left, 0, start)?;
        let left = self.conditional_tail(left, start)?;
        self.assignment_tail(left, start)
    }

    fn assignment_tail(&mut self, left: Expression, start: Span) -> Result<Expression, SimError> {
        let Some(operator) = assignment_op(&self.current.kind) else {
            return Ok(left);
        };
        self.advance();
        let value = self.parse_assignment()?;

        match left {
            Expression::Identifier(target) => Ok(Expression::Assignment(AssignmentExpression {
                operator,
                target,
                value: Box::new(value),
                span: self.span_from(start),
            })),
            _ => Ok(self.unsupported("AssignmentExpression", start)),
        }
    }

    fn conditional_tail(&mut self, test: Expression, start: Span) -> Result<Expression, SimError> {
        if !self.eat_punct("?") {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect_punct(":")?;
        let alternate = self.parse_assignment()?;

        let span = self.span_from(start);
        Ok(Expression::Conditional(ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span,
        }))
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expression, SimError> {
        let start = self.current.span;
        let left = self.parse_unary()?;
        self.binary_tail(left, min_prec, start)
    }

    fn binary_tail(&mut self, left: Expression, min_prec: u8, start: Span) -> Result<Expression, SimError> {
        self.chain(|parser| {
            let mut left = left;
            while let Some((op, prec)) = infix_op(&parser.current.kind).filter(|(_, prec)| *prec >= min_prec) {
                parser.descend()?;
                parser.advance();

                // `**` is right-associative
                let next_prec = if op == InfixOp::Binary(BinaryOp::Exp) { prec } else { prec + 1 };
                let right = Box::new(parser.binary(next_prec)?);
                let left_operand = Box::new(left);
                let span = parser.span_from(start);

                left = match op {
                    InfixOp::Binary(operator) => Expression::Binary(BinaryExpression {
                        operator,
                        left: left_operand,
                        right,
                        span,
                    }),
                    InfixOp::Logical(operator) => Expression::Logical(LogicalExpression {
                        operator,
                        left: left_operand,
                        right,
                        span,
                    }),
                };
            }
            Ok(left)
        })
    }

    fn parse_unary(&mut self) -> Result<Expression, SimError> {
        self.nested(Self::unary)
    }

    /// Prefix operators, `await`, and postfix `++`/`--`
    fn unary(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;

        if let Some(operator) = unary_op(&self.current.kind) {
            self.advance();
            let argument = Box::new(self.parse_unary()?);
            let span = self.span_from(start);
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument,
                span,
            }));
        }
        if self.current.is_keyword(Keyword::Await) {
            self.advance();
            self.parse_unary()?;
            return Ok(self.unsupported("AwaitExpression", start));
        }
        if let Some(operator) = update_op(&self.current.kind) {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(self.update(operator, true, argument, start));
        }

        let operand = self.left_hand_side()?;
        match update_op(&self.current.kind) {
            Some(operator) if !self.current.newline_before => {
                self.advance();
                Ok(self.update(operator, false, operand, start))
            }
            _ => Ok(operand),
        }
    }

    fn update(&self, operator: UpdateOp, prefix: bool, argument: Expression, start: Span) -> Expression {
        match argument {
            Expression::Identifier(target) => Expression::Update(UpdateExpression {
                operator,
                prefix,
                target,
                span: self.span_from(start),
            }),
            _ => self.unsupported("UpdateExpression", start),
        }
    }

    fn left_hand_side(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;

        let callee = if self.current.is_keyword(Keyword::New) {
            self.advance();
            self.member_chain()?;
            if self.at_punct("(") {
                self.arguments()?;
            }
            self.unsupported("NewExpression", start)
        } else {
            self.primary()?
        };

        self.call_tail(callee, start)
    }

    /// Member accesses without calls, used for `new` callees
    fn member_chain(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        let object = self.primary()?;

        self.chain(|parser| {
            let mut expr = object;
            loop {
                if parser.eat_punct(".") {
                    parser.descend()?;
                    let property = parser.property_name()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property,
                        span: parser.span_from(start),
                    });
                } else if parser.at_punct("[") {
                    parser.skip_group()?;
                    expr = parser.unsupported("MemberExpression", start);
                } else {
                    return Ok(expr);
                }
            }
        })
    }

    fn call_tail(&mut self, callee: Expression, start: Span) -> Result<Expression, SimError> {
        self.chain(|parser| {
            let mut expr = callee;
            loop {
                expr = match &parser.current.kind {
                    TokenKind::Punct(".") => {
                        parser.descend()?;
                        parser.advance();
                        let property = parser.property_name()?;
                        Expression::Member(MemberExpression {
                            object: Box::new(expr),
                            property,
                            span: parser.span_from(start),
                        })
                    }
                    TokenKind::Punct("(") => {
                        parser.descend()?;
                        let arguments = parser.arguments()?;
                        Expression::Call(CallExpression {
                            callee: Box::new(expr),
                            arguments,
                            span: parser.span_from(start),
                        })
                    }
                    TokenKind::Punct("?.") => {
                        parser.advance();
                        if parser.at_punct("(") {
                            parser.arguments()?;
                        } else if parser.at_punct("[") {
                            parser.skip_group()?;
                        } else {
                            parser.property_name()?;
                        }
                        parser.unsupported("ChainExpression", start)
                    }
                    TokenKind::Punct("[") => {
                        parser.skip_group()?;
                        parser.unsupported("MemberExpression", start)
                    }
                    TokenKind::Template(_) => {
                        parser.advance();
                        parser.unsupported("TaggedTemplateExpression", start)
                    }
                    _ => return Ok(expr),
                };
            }
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expression>, SimError> {
        self.expect_punct("(")?;

        let mut arguments = Vec::new();
        while !self.eat_punct(")") {
            let start = self.current.span;
            let argument = if self.eat_punct("...") {
                self.parse_assignment()?;
                self.unsupported("SpreadElement", start)
            } else {
                self.parse_assignment()?
            };
            arguments.push(argument);
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }

        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;

        let value = match &self.current.kind {
            TokenKind::Number(n) => LiteralValue::Number(*n),
            TokenKind::String(s) => LiteralValue::String(s.clone()),
            TokenKind::Keyword(Keyword::True) => LiteralValue::Boolean(true),
            TokenKind::Keyword(Keyword::False) => LiteralValue::Boolean(false),
            TokenKind::Keyword(Keyword::Null) => LiteralValue::Null,
            TokenKind::Identifier(_) => return self.identifier_operand(),
            TokenKind::Keyword(Keyword::Function) => return self.function_expression(),
            TokenKind::Punct("(") => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_punct(")")?;
                return Ok(expr);
            }
            TokenKind::Punct("[") => {
                self.skip_group()?;
                return Ok(self.unsupported("ArrayExpression", start));
            }
            TokenKind::Punct("{") => {
                self.skip_group()?;
                return Ok(self.unsupported("ObjectExpression", start));
            }
            TokenKind::Punct("/" | "/=") => return self.regexp(),
            TokenKind::Template(_) => {
                self.advance();
                return Ok(self.unsupported("TemplateLiteral", start));
            }
            _ => return Err(self.unexpected("expression")),
        };

        self.advance();
        Ok(Expression::Literal(Literal { value, span: start }))
    }

    /// An identifier, or a reserved word that starts an expression the
    /// evaluator does not run
    fn identifier_operand(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        let kind = match self.current_word().and_then(reserved_operand) {
            Some("ClassExpression") => return self.class_expression(),
            Some(kind) => kind,
            None => return Ok(Expression::Identifier(self.identifier()?)),
        };
        self.advance();
        Ok(self.unsupported(kind, start))
    }

    fn function_expression(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        self.advance();
        let generator = self.eat_punct("*");
        let function = self.function_rest(start, FunctionForm::Expression)?;
        if generator {
            return Ok(self.unsupported("GeneratorFunctionExpression", start));
        }
        Ok(Expression::Function(Rc::new(function)))
    }

    fn class_expression(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        while !self.at_punct("{") {
            if self.at_end() {
                return Err(self.error("Unexpected end of input in class expression"));
            }
            self.advance();
        }
        self.skip_group()?;
        Ok(self.unsupported("ClassExpression", start))
    }

    fn regexp(&mut self) -> Result<Expression, SimError> {
        let start = self.current.span;
        self.current = self.lexer.rescan_as_regexp(&self.current);
        if let TokenKind::Unterminated(_) = self.current.kind {
            return Err(self.error("Unterminated regular expression"));
        }
        self.advance();
        Ok(self.unsupported("RegExpLiteral", start))
    }

    /// Skip a bracketed group starting at the current `(`, `[` or `{`
    fn skip_group(&mut self) -> Result<(), SimError> {
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                TokenKind::Eof => return Err(self.error("Unexpected end of input, unbalanced brackets")),
                TokenKind::Invalid(_) | TokenKind::Unterminated(_) => {
                    return Err(self.unexpected("expression"));
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ============ TOKENS ============

    fn identifier(&mut self) -> Result<Identifier, SimError> {
        match &self.current.kind {
            TokenKind::Identifier(name) if !is_reserved(name.as_str()) => {
                let id = Identifier {
                    name: name.clone(),
                    span: self.current.span,
                };
                self.advance();
                Ok(id)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Property names may be any word, reserved or not (`promise.catch`,
    /// `promise.finally`, `a.new`)
    fn property_name(&mut self) -> Result<Identifier, SimError> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Keyword(keyword) => JsString::from(keyword.as_str()),
            _ => return Err(self.unexpected("property name")),
        };
        let id = Identifier {
            name,
            span: self.current.span,
        };
        self.advance();
        Ok(id)
    }

    fn unsupported(&self, kind: &'static str, start: Span) -> Expression {
        Expression::Unsupported(Unsupported {
            kind,
            span: self.span_from(start),
        })
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// The token after the current one
    fn peek(&self) -> Token {
        self.lexer.clone().next_token()
    }

    fn current_word(&self) -> Option<&str> {
        match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        }
    }

    fn at_identifier(&self) -> bool {
        self.current_word().is_some_and(|word| !is_reserved(word))
    }

    fn at_punct(&self, punct: &str) -> bool {
        self.current.is_punct(punct)
    }

    fn at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.at_punct(punct);
        if found {
            self.advance();
        }
        found
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), SimError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", punct)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), SimError> {
        if !self.current.is_keyword(keyword) {
            return Err(self.unexpected(&format!("'{}'", keyword.as_str())));
        }
        self.advance();
        Ok(())
    }

    /// Accept `;`, or insert one before `}`, at the end, or after a line break
    fn end_statement(&mut self) -> Result<(), SimError> {
        if self.eat_punct(";") || self.at_punct("}") || self.at_end() || self.current.newline_before {
            return Ok(());
        }
        Err(self.unexpected("';'"))
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous.span.end.max(start.start),
            start.line,
            start.column,
        )
    }

    fn error(&self, message: &str) -> SimError {
        SimError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn unexpected(&self, expected: &str) -> SimError {
        let message = match &self.current.kind {
            TokenKind::Invalid(c) => format!("Invalid or unexpected token '{}'", c),
            TokenKind::Unterminated('`') => "Unterminated template literal".to_string(),
            TokenKind::Unterminated('/') => "Unterminated regular expression".to_string(),
            TokenKind::Unterminated(_) => "Unterminated string literal".to_string(),
            TokenKind::Eof => format!("Unexpected end of input, expected {}", expected),
            _ => format!(
                "Unexpected token '{}', expected {}",
                self.lexer.slice(self.current.span),
                expected
            ),
        };
        SimError::syntax_error(message, self.current.span.line, self.current.span.column)
    }
}

fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// Node kind of a statement that starts with `word` and is skipped whole
fn skipped_statement(word: &str) -> Option<&'static str> {
    let kind = match word {
        "if" => "IfStatement",
        "for" => "ForStatement",
        "while" => "WhileStatement",
        "do" => "DoWhileStatement",
        "switch" => "SwitchStatement",
        "try" => "TryStatement",
        "throw" => "ThrowStatement",
        "class" => "ClassDeclaration",
        "import" => "ImportDeclaration",
        "export" => "ExportDeclaration",
        "break" => "BreakStatement",
        "continue" => "ContinueStatement",
        "debugger" => "DebuggerStatement",
        _ => return None,
    };
    Some(kind)
}

/// Node kind of an expression that starts with the reserved word `word`
fn reserved_operand(word: &str) -> Option<&'static str> {
    let kind = match word {
        "this" => "ThisExpression",
        "super" => "Super",
        "import" => "ImportExpression",
        "class" => "ClassExpression",
        _ => return None,
    };
    Some(kind)
}

fn has_block_body(kind: &str) -> bool {
    !matches!(
        kind,
        "VariableDeclaration"
            | "ThrowStatement"
            | "ImportDeclaration"
            | "BreakStatement"
            | "ContinueStatement"
            | "DebuggerStatement"
    )
}

/// Tokens after which a line break terminates a statement under ASI
fn ends_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Template(_)
            | TokenKind::RegExp { .. }
            | TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::Null)
            | TokenKind::Punct("]" | "++" | "--")
    )
}

/// Binary or logical operator and its precedence
fn infix_op(kind: &TokenKind) -> Option<(InfixOp, u8)> {
    let op = match kind {
        TokenKind::Keyword(Keyword::In) => (InfixOp::Binary(BinaryOp::In), 10),
        TokenKind::Keyword(Keyword::Instanceof) => (InfixOp::Binary(BinaryOp::Instanceof), 10),
        TokenKind::Punct(punct) => match *punct {
            "??" => (InfixOp::Logical(LogicalOp::NullishCoalescing), 4),
            "||" => (InfixOp::Logical(LogicalOp::Or), 4),
            "&&" => (InfixOp::Logical(LogicalOp::And), 5),
            "|" => (InfixOp::Binary(BinaryOp::BitOr), 6),
            "^" => (InfixOp::Binary(BinaryOp::BitXor), 7),
            "&" => (InfixOp::Binary(BinaryOp::BitAnd), 8),
            "==" => (InfixOp::Binary(BinaryOp::Eq), 9),
            "!=" => (InfixOp::Binary(BinaryOp::NotEq), 9),
            "===" => (InfixOp::Binary(BinaryOp::StrictEq), 9),
            "!==" => (InfixOp::Binary(BinaryOp::StrictNotEq), 9),
            "<" => (InfixOp::Binary(BinaryOp::Lt), 10),
            "<=" => (InfixOp::Binary(BinaryOp::LtEq), 10),
            ">" => (InfixOp::Binary(BinaryOp::Gt), 10),
            ">=" => (InfixOp::Binary(BinaryOp::GtEq), 10),
            "<<" => (InfixOp::Binary(BinaryOp::LShift), 11),
            ">>" => (InfixOp::Binary(BinaryOp::RShift), 11),
            ">>>" => (InfixOp::Binary(BinaryOp::URShift), 11),
            "+" => (InfixOp::Binary(BinaryOp::Add), 12),
            "-" => (InfixOp::Binary(BinaryOp::Sub), 12),
            "*" => (InfixOp::Binary(BinaryOp::Mul), 13),
            "/" => (InfixOp::Binary(BinaryOp::Div), 13),
            "%" => (InfixOp::Binary(BinaryOp::Mod), 13),
            "**" => (InfixOp::Binary(BinaryOp::Exp), 14),
            _ => return None,
        },
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Punct("-") => Some(UnaryOp::Minus),
        TokenKind::Punct("+") => Some(UnaryOp::Plus),
        TokenKind::Punct("!") => Some(UnaryOp::Not),
        TokenKind::Punct("~") => Some(UnaryOp::BitNot),
        TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
        TokenKind::Keyword(Keyword::Void) => Some(UnaryOp::Void),
        TokenKind::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
        _ => None,
    }
}

fn update_op(kind: &TokenKind) -> Option<UpdateOp> {
    match kind {
        TokenKind::Punct("++") => Some(UpdateOp::Increment),
        TokenKind::Punct("--") => Some(UpdateOp::Decrement),
        _ => None,
    }
}

/// Assignment operators are looked up by their source text
fn assignment_op(kind: &TokenKind) -> Option<AssignmentOp> {
    const ASSIGNMENT_OPS: &[AssignmentOp] = &[
        AssignmentOp::Assign,
        AssignmentOp::AddAssign,
        AssignmentOp::SubAssign,
        AssignmentOp::MulAssign,
        AssignmentOp::DivAssign,
        AssignmentOp::ModAssign,
        AssignmentOp::ExpAssign,
        AssignmentOp::BitAndAssign,
        AssignmentOp::BitOrAssign,
        AssignmentOp::BitXorAssign,
        AssignmentOp::LShiftAssign,
        AssignmentOp::RShiftAssign,
        AssignmentOp::URShiftAssign,
        AssignmentOp::AndAssign,
        AssignmentOp::OrAssign,
        AssignmentOp::NullishAssign,
    ];
    let TokenKind::Punct(punct) = kind else {
        return None;
    };
    ASSIGNMENT_OPS.iter().copied().find(|op| op.as_str() == *punct)
}

/// Parse source text into a [`Program`]
pub fn parse(source: &str) -> Result<Program, SimError> {
    Parser::new(source).parse_program()
}
