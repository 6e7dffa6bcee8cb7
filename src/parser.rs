use std::rc::Rc;

use crate::ast::{Expr, ExprKind, Stmt, StmtKind};
use crate::common::Span;
use crate::error::{Location, MidasError};
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};

/// Recursive-descent parser, one token of lookahead, over the grammar
/// described by the top-level `program` rule. Tracks loop- and
/// function-nesting depth so `break`/`return` can be rejected outside
/// their enclosing construct.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    function_depth: usize,
}

type ParseResult<T> = Result<T, MidasError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens,
            current: 0,
            loop_depth: 0,
            function_depth: 0,
        }
    }

    pub fn parse(source: Rc<crate::common::Source>) -> ParseResult<Vec<Stmt>> {
        let tokens = Scanner::scan_all(source)?;
        let mut parser = Parser::new(tokens);
        parser.program()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn location(&self) -> Location {
        Location::from(self.peek().span)
    }

    fn error(&self, message: impl Into<String>) -> MidasError {
        MidasError::SyntaxError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {} {}, found {}",
                kind, context, self.peek().kind
            )))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!(
                "expected identifier {}, found {}",
                context, other
            ))),
        }
    }

    fn span(&self, start: Span, token_before_current: usize) -> Span {
        let end = &self.tokens[token_before_current];
        Span::new(start.line, start.column, end.span.column.saturating_sub(start.column) + 1)
    }

    // program → declaration* EOF
    fn program(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        Ok(statements)
    }

    // declaration → var_decl | fun_decl | statement
    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.check(&TokenKind::Var) {
            self.var_decl()
        } else if self.check(&TokenKind::Fun) {
            self.fun_decl()
        } else {
            self.statement()
        }
    }

    // var_decl → "var" IDENT "=" expression ";"
    fn var_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "var"
        let name = self.expect_identifier("after 'var'")?;
        self.expect(&TokenKind::Equal, "after variable name")?;
        let init = self.expression()?;
        self.expect(&TokenKind::Semicolon, "after variable declaration")?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(
            StmtKind::VarDecl {
                name,
                init: Box::new(init),
            },
            span,
        ))
    }

    // fun_decl → "fun" IDENT "(" ( IDENT ( "," IDENT )* )? ")" block
    fn fun_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "fun"
        let name = self.expect_identifier("after 'fun'")?;
        self.expect(&TokenKind::LeftParen, "after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("as a parameter name")?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "after parameter list")?;
        self.function_depth += 1;
        // A function body starts its own break-target scope: a loop
        // lexically enclosing this declaration is not an enclosing loop
        // for code inside the body, since a call runs in a fresh frame
        // unrelated to the call site's loop.
        let outer_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = outer_loop_depth;
        self.function_depth -= 1;
        let body = body?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(
            StmtKind::FunDecl {
                name,
                params,
                body: Box::new(body),
            },
            span,
        ))
    }

    // statement → block | if | while | for | break | return | print | exp_stm
    fn statement(&mut self) -> ParseResult<Stmt> {
        match &self.peek().kind {
            TokenKind::Do => self.block(),
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Break => self.break_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Print => self.print_stmt(),
            _ => self.expr_stmt(),
        }
    }

    // block → "do" declaration* "end"
    fn block(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.expect(&TokenKind::Do, "to start a block")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::End) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.expect(&TokenKind::End, "to close a block")?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(StmtKind::Block(statements), span))
    }

    // if → "if" "(" expression ")" statement ( "else" statement )?
    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "if"
        self.expect(&TokenKind::LeftParen, "after 'if'")?;
        let cond = self.expression()?;
        self.expect(&TokenKind::RightParen, "after if condition")?;
        let then = self.statement()?;
        let otherwise = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(
            StmtKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise,
            },
            span,
        ))
    }

    // while → "while" "(" expression ")" statement
    fn while_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "while"
        self.expect(&TokenKind::LeftParen, "after 'while'")?;
        let cond = self.expression()?;
        self.expect(&TokenKind::RightParen, "after while condition")?;
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let body = body?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(
            StmtKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            span,
        ))
    }

    // for → "for" "(" ( var_decl | exp_stm | ";" )
    //                 expression? ";"
    //                 assignment? ")" statement
    //
    // Desugars to: do init; while (cond) do body; update; end end
    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "for"
        self.expect(&TokenKind::LeftParen, "after 'for'")?;

        let init = if self.matches(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Var) {
            Some(self.var_decl()?)
        } else {
            Some(self.expr_stmt()?)
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            let span = self.peek().span;
            Expr::new(ExprKind::Literal(TokenKind::True), span)
        } else {
            self.expression()?
        };
        self.expect(&TokenKind::Semicolon, "after loop condition")?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::RightParen, "after for clauses")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let mut body = body?;

        if let Some(update) = update {
            let update_span = update.span;
            let update_stmt = Stmt::new(StmtKind::ExprStmt(Box::new(update)), update_span);
            body = match body.item {
                StmtKind::Block(mut statements) => {
                    statements.push(update_stmt);
                    Stmt::new(StmtKind::Block(statements), body.span)
                }
                _ => {
                    let span = body.span;
                    Stmt::new(StmtKind::Block(vec![body, update_stmt]), span)
                }
            };
        }

        let while_stmt = Stmt::new(
            StmtKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            start,
        );

        let result = match init {
            Some(init) => Stmt::new(StmtKind::Block(vec![init, while_stmt]), start),
            None => while_stmt,
        };

        Ok(result)
    }

    // break → "break" ";"
    fn break_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "break"
        if self.loop_depth == 0 {
            return Err(self.error("'break' outside of a loop"));
        }
        self.expect(&TokenKind::Semicolon, "after 'break'")?;
        Ok(Stmt::new(StmtKind::Break, start))
    }

    // return → "return" expression? ";"
    //
    // Accepts a full expression, not just a primary: `return a + b;`
    // and `return n * fact(n - 1);` both need to parse.
    fn return_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "return"
        if self.function_depth == 0 {
            return Err(self.error("'return' outside of a function"));
        }
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.expect(&TokenKind::Semicolon, "after return value")?;
        Ok(Stmt::new(StmtKind::Return(value), start))
    }

    // print → "print" expression ";"
    fn print_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        self.advance(); // "print"
        let expr = self.expression()?;
        self.expect(&TokenKind::Semicolon, "after print expression")?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(StmtKind::Print(Box::new(expr)), span))
    }

    // exp_stm → expression ";"
    fn expr_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        let expr = self.expression()?;
        self.expect(&TokenKind::Semicolon, "after expression")?;
        let span = self.span(start, self.current - 1);
        Ok(Stmt::new(StmtKind::ExprStmt(Box::new(expr)), span))
    }

    // expression → assignment
    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    // assignment → logic_or ( "=" assignment )?
    fn assignment(&mut self) -> ParseResult<Expr> {
        let target = self.logic_or()?;
        if self.matches(&TokenKind::Equal) {
            let value = self.assignment()?;
            let span = target.span;
            return match target.item {
                ExprKind::Ident(name) => Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    },
                    span,
                )),
                _ => Err(MidasError::InvalidAssignmentTarget {
                    location: Location::from(span),
                }),
            };
        }
        Ok(target)
    }

    // logic_or → logic_and ( "or" logic_and )*
    fn logic_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.logic_and()?;
        while self.matches(&TokenKind::Or) {
            let right = self.logic_and()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op: TokenKind::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // logic_and → equality ( "and" equality )*
    fn logic_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.equality()?;
        while self.matches(&TokenKind::And) {
            let right = self.equality()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op: TokenKind::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // equality → ordering ( ( "!=" | "==" ) ordering )*
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.ordering()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::BangEqual => TokenKind::BangEqual,
                TokenKind::EqualEqual => TokenKind::EqualEqual,
                _ => break,
            };
            self.advance();
            let right = self.ordering()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // ordering → addition ( ( ">" | ">=" | "<" | "<=" ) addition )*
    fn ordering(&mut self) -> ParseResult<Expr> {
        let mut left = self.addition()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Greater => TokenKind::Greater,
                TokenKind::GreaterEqual => TokenKind::GreaterEqual,
                TokenKind::Less => TokenKind::Less,
                TokenKind::LessEqual => TokenKind::LessEqual,
                _ => break,
            };
            self.advance();
            let right = self.addition()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // addition → multiplication ( ( "-" | "+" ) multiplication )*
    fn addition(&mut self) -> ParseResult<Expr> {
        let mut left = self.multiplication()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Minus => TokenKind::Minus,
                TokenKind::Plus => TokenKind::Plus,
                _ => break,
            };
            self.advance();
            let right = self.multiplication()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // multiplication → unary ( ( "/" | "//" | "*" | "%" ) unary )*
    fn multiplication(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Slash => TokenKind::Slash,
                TokenKind::SlashSlash => TokenKind::SlashSlash,
                TokenKind::Star => TokenKind::Star,
                TokenKind::Percent => TokenKind::Percent,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    // unary → ( "!" | "-" ) unary | call
    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match &self.peek().kind {
            TokenKind::Bang => Some(TokenKind::Bang),
            TokenKind::Minus => Some(TokenKind::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.peek().span;
            self.advance();
            let operand = self.unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                start,
            ));
        }
        self.call()
    }

    // call → primary ( "(" ( expression ( "," expression )* )? ")" )*
    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.matches(&TokenKind::LeftParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RightParen, "after call arguments")?;
                let span = expr.span;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    // primary → IDENT | INTEGER | DOUBLE | STRING | "nil" | "false" | "true"
    //         | "(" expression ")"
    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Ident(name), span))
            }
            TokenKind::Integer(_)
            | TokenKind::Double(_)
            | TokenKind::String(_)
            | TokenKind::Nil
            | TokenKind::True
            | TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(token.kind), span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&TokenKind::RightParen, "to close a grouped expression")?;
                Ok(inner)
            }
            other => Err(self.error(format!("expected an expression, found {}", other))),
        }
    }
}
