use crate::common::Spanned;
use crate::token::TokenKind;

/// A statement node, spanned to the source text it was parsed from.
pub type Stmt = Spanned<StmtKind>;

/// A expression node, spanned to the source text it was parsed from.
pub type Expr = Spanned<ExprKind>;

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    If {
        cond: Box<Expr>,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Box<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Return(Option<Box<Expr>>),
    VarDecl {
        name: String,
        init: Box<Expr>,
    },
    FunDecl {
        name: String,
        params: Vec<String>,
        body: Box<Stmt>,
    },
    Print(Box<Expr>),
    ExprStmt(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Binary {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: TokenKind,
        operand: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Ident(String),
    Literal(TokenKind),
}
