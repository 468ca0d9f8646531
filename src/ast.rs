//! Abstract Syntax Tree types for the supported JavaScript subset
//!
//! Node kinds are closed sum types. Constructs the parser recognises but the
//! evaluator does not run are kept as [`Unsupported`] nodes carrying their
//! ESTree kind name, so evaluation can report and skip them.

use std::rc::Rc;

use serde::Serialize;

use crate::lexer::Span;
use crate::value::JsString;

/// A complete program (script)
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Statement>,
    pub span: Span,
}

// ============ STATEMENTS ============

#[derive(Debug, Clone)]
pub enum Statement {
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Rc<Function>),
    Expression(ExpressionStatement),
    Return(ReturnStatement),
    Block(BlockStatement),
    Empty(Span),
    Unsupported(Unsupported),
}

impl Statement {
    /// ESTree node kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::FunctionDeclaration(_) => "FunctionDeclaration",
            Statement::Expression(_) => "ExpressionStatement",
            Statement::Return(_) => "ReturnStatement",
            Statement::Block(_) => "BlockStatement",
            Statement::Empty(_) => "EmptyStatement",
            Statement::Unsupported(node) => node.kind,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(decl) => decl.span,
            Statement::FunctionDeclaration(func) => func.span,
            Statement::Expression(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
            Statement::Block(block) => block.span,
            Statement::Empty(span) => *span,
            Statement::Unsupported(node) => node.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    pub span: Span,
}

/// A parsed construct the evaluator does not implement
#[derive(Debug, Clone)]
pub struct Unsupported {
    pub kind: &'static str,
    pub span: Span,
}

// ============ FUNCTIONS ============

/// Shared function node for declarations, expressions and arrows.
///
/// Wrapped in `Rc` so callables can reference their AST subtree without
/// copying it.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: FunctionBody,
    pub form: FunctionForm,
    pub span: Span,
}

impl Function {
    pub fn kind(&self) -> &'static str {
        match self.form {
            FunctionForm::Declaration => "FunctionDeclaration",
            FunctionForm::Expression => "FunctionExpression",
            FunctionForm::Arrow => "ArrowFunctionExpression",
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.kind(), self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionForm {
    Declaration,
    Expression,
    Arrow,
}

/// Function body (block or expression for arrow functions)
#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(BlockStatement),
    Expression(Box<Expression>),
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    Function(Rc<Function>),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),
    Member(MemberExpression),
    Call(CallExpression),
    Unsupported(Unsupported),
}

impl Expression {
    /// ESTree node kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Literal(_) => "Literal",
            Expression::Identifier(_) => "Identifier",
            Expression::Function(func) => func.kind(),
            Expression::Unary(_) => "UnaryExpression",
            Expression::Binary(_) => "BinaryExpression",
            Expression::Logical(_) => "LogicalExpression",
            Expression::Conditional(_) => "ConditionalExpression",
            Expression::Assignment(_) => "AssignmentExpression",
            Expression::Update(_) => "UpdateExpression",
            Expression::Sequence(_) => "SequenceExpression",
            Expression::Member(_) => "MemberExpression",
            Expression::Call(_) => "CallExpression",
            Expression::Unsupported(node) => node.kind,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(lit) => lit.span,
            Expression::Identifier(id) => id.span,
            Expression::Function(func) => func.span,
            Expression::Unary(expr) => expr.span,
            Expression::Binary(expr) => expr.span,
            Expression::Logical(expr) => expr.span,
            Expression::Conditional(expr) => expr.span,
            Expression::Assignment(expr) => expr.span,
            Expression::Update(expr) => expr.span,
            Expression::Sequence(expr) => expr.span,
            Expression::Member(expr) => expr.span,
            Expression::Call(expr) => expr.span,
            Expression::Unsupported(node) => node.span,
        }
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.kind(), self.span())
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    URShift,
    In,
    Instanceof,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => ">>>",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    pub target: Identifier,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

impl AssignmentOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubAssign => "-=",
            AssignmentOp::MulAssign => "*=",
            AssignmentOp::DivAssign => "/=",
            AssignmentOp::ModAssign => "%=",
            AssignmentOp::ExpAssign => "**=",
            AssignmentOp::BitAndAssign => "&=",
            AssignmentOp::BitOrAssign => "|=",
            AssignmentOp::BitXorAssign => "^=",
            AssignmentOp::LShiftAssign => "<<=",
            AssignmentOp::RShiftAssign => ">>=",
            AssignmentOp::URShiftAssign => ">>>=",
            AssignmentOp::AndAssign => "&&=",
            AssignmentOp::OrAssign => "||=",
            AssignmentOp::NullishAssign => "??=",
        }
    }

    /// The binary operator a compound assignment applies, if it is one the
    /// evaluator supports.
    pub fn binary_op(self) -> Option<BinaryOp> {
        match self {
            AssignmentOp::AddAssign => Some(BinaryOp::Add),
            AssignmentOp::SubAssign => Some(BinaryOp::Sub),
            AssignmentOp::MulAssign => Some(BinaryOp::Mul),
            AssignmentOp::DivAssign => Some(BinaryOp::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub target: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

/// Named member access (`object.property`)
#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

impl CallExpression {
    /// Dotted name of the callee for diagnostics (`foo`, `console.log`)
    pub fn callee_name(&self) -> String {
        fn dotted(expr: &Expression) -> Option<String> {
            match expr {
                Expression::Identifier(id) => Some(id.name.to_string()),
                Expression::Member(member) => {
                    dotted(&member.object).map(|object| format!("{}.{}", object, member.property.name))
                }
                _ => None,
            }
        }
        dotted(&self.callee).unwrap_or_else(|| format!("<{}>", self.callee.kind()))
    }
}

// ============ NODE REFERENCES ============

/// A lightweight reference to an AST node, kept in trace snapshots for
/// highlighting the active source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeRef {
    pub kind: &'static str,
    pub span: Span,
}

impl NodeRef {
    pub fn new(kind: &'static str, span: Span) -> Self {
        Self { kind, span }
    }
}
