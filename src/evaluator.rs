use std::io::Write;
use std::rc::Rc;

use log::trace;

use crate::ast::{ExprKind, Stmt, StmtKind};
use crate::environment::Environment;
use crate::error::{Location, MidasError};
use crate::token::TokenKind;
use crate::value::{FunctionRef, Value};

/// What a statement's execution did, beyond any side effects it had.
/// `Block`, `While`, and function calls inspect this after running a
/// nested statement and either keep unwinding or absorb it.
enum Signal {
    Normal,
    Break,
    Return(Value),
}

/// Walks an AST against an [`Environment`], producing `print` output
/// and propagating [`Signal`]s for `break`/`return`.
pub struct Evaluator<W: Write> {
    globals: Environment,
    out: W,
}

impl<W: Write> Evaluator<W> {
    pub fn new(out: W) -> Evaluator<W> {
        Evaluator {
            globals: Environment::globals(),
            out,
        }
    }

    /// Executes every top-level statement in order against the
    /// globals frame.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), MidasError> {
        let globals = self.globals.clone();
        for stmt in program {
            match self.execute(stmt, &globals)? {
                Signal::Normal => {}
                // break/return reaching the top level would be a parser bug
                // (the parser rejects both outside their enclosing construct).
                Signal::Break | Signal::Return(_) => {
                    unreachable!("break/return escaped to top level")
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, env: &Environment) -> Result<Signal, MidasError> {
        let at = Location::from(stmt.span);
        trace!("execute {:?}", std::mem::discriminant(&stmt.item));
        match &stmt.item {
            StmtKind::Block(statements) => {
                let child = env.new_child();
                for statement in statements {
                    match self.execute(statement, &child)? {
                        Signal::Normal => {}
                        signal => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }

            StmtKind::If {
                cond,
                then,
                otherwise,
            } => {
                if self.evaluate(cond, env)?.truthy() {
                    self.execute(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.execute(otherwise, env)
                } else {
                    Ok(Signal::Normal)
                }
            }

            StmtKind::While { cond, body } => {
                while self.evaluate(cond, env)?.truthy() {
                    match self.execute(body, env)? {
                        Signal::Normal => {}
                        Signal::Break => break,
                        signal @ Signal::Return(_) => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }

            StmtKind::Break => Ok(Signal::Break),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }

            StmtKind::VarDecl { name, init } => {
                let value = self.evaluate(init, env)?;
                env.declare(name, value, at)?;
                Ok(Signal::Normal)
            }

            StmtKind::FunDecl { name, params, body } => {
                let function = Value::Function(Rc::new(FunctionRef {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::new((**body).clone()),
                }));
                env.declare(name, function, at)?;
                Ok(Signal::Normal)
            }

            StmtKind::Print(expr) => {
                let value = self.evaluate(expr, env)?;
                writeln!(self.out, "{}", value).map_err(|source| MidasError::IOError {
                    path: "<stdout>".into(),
                    source,
                })?;
                Ok(Signal::Normal)
            }

            StmtKind::ExprStmt(expr) => {
                self.evaluate(expr, env)?;
                Ok(Signal::Normal)
            }
        }
    }

    fn evaluate(
        &mut self,
        expr: &crate::ast::Expr,
        env: &Environment,
    ) -> Result<Value, MidasError> {
        let at = Location::from(expr.span);
        match &expr.item {
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                env.assign(name, value.clone(), at)?;
                Ok(value)
            }

            ExprKind::Binary { op, left, right } => self.binary(op, left, right, env, at),

            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand, env)?;
                match op {
                    TokenKind::Minus => value.negate(at),
                    TokenKind::Bang => Ok(value.not()),
                    other => unreachable!("unary operator {:?} should be unreachable", other),
                }
            }

            ExprKind::Call { callee, args } => self.call(callee, args, env, at),

            ExprKind::Ident(name) => env.lookup(name, at),

            ExprKind::Literal(kind) => Ok(Value::from_literal(kind)),
        }
    }

    fn binary(
        &mut self,
        op: &TokenKind,
        left: &crate::ast::Expr,
        right: &crate::ast::Expr,
        env: &Environment,
        at: Location,
    ) -> Result<Value, MidasError> {
        // `and`/`or` must short-circuit: the right side is not evaluated
        // once the left side already determines the result.
        match op {
            TokenKind::And => {
                let left = self.evaluate(left, env)?;
                return if !left.truthy() {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                };
            }
            TokenKind::Or => {
                let left = self.evaluate(left, env)?;
                return if left.truthy() {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                };
            }
            _ => {}
        }

        let left = self.evaluate(left, env)?;
        let right = self.evaluate(right, env)?;
        match op {
            TokenKind::Plus => left.add(&right, at),
            TokenKind::Minus => left.sub(&right, at),
            TokenKind::Star => left.mul(&right, at),
            TokenKind::Slash => left.div(&right, at),
            TokenKind::SlashSlash => left.int_div(&right, at),
            TokenKind::Percent => left.rem(&right, at),
            TokenKind::BangEqual => Ok(Value::Bool(!left.value_eq(&right))),
            TokenKind::EqualEqual => Ok(Value::Bool(left.value_eq(&right))),
            TokenKind::Greater => Ok(Value::Bool(left.compare(&right, at)?.is_gt())),
            TokenKind::GreaterEqual => Ok(Value::Bool(left.compare(&right, at)?.is_ge())),
            TokenKind::Less => Ok(Value::Bool(left.compare(&right, at)?.is_lt())),
            TokenKind::LessEqual => Ok(Value::Bool(left.compare(&right, at)?.is_le())),
            other => unreachable!("binary operator {:?} should be unreachable", other),
        }
    }

    fn call(
        &mut self,
        callee: &crate::ast::Expr,
        args: &[crate::ast::Expr],
        env: &Environment,
        at: Location,
    ) -> Result<Value, MidasError> {
        let callee = self.evaluate(callee, env)?;
        let Value::Function(function) = callee else {
            return Err(MidasError::TypeMismatch {
                message: "call target is not a function".to_string(),
                location: at,
            });
        };

        if args.len() != function.params.len() {
            return Err(MidasError::ArityMismatch {
                expected: function.params.len(),
                got: args.len(),
                location: at,
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, env)?);
        }

        trace!("calling {}", function.name);
        // Fresh frame parented to globals, not the caller's frame: this
        // interpreter has no closures over non-global locals (see I5).
        let call_frame = self.globals.new_child();
        for (param, value) in function.params.iter().zip(values) {
            call_frame.declare(param, value, at)?;
        }

        let result = match self.execute(&function.body, &call_frame)? {
            Signal::Return(value) => value,
            Signal::Normal => Value::Nil,
            Signal::Break => {
                unreachable!("break cannot escape a function body past its enclosing loop")
            }
        };
        trace!("returning from {}", function.name);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Source;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<String, MidasError> {
        let source = Source::in_memory(src);
        let program = Parser::parse(source)?;
        let mut out = Vec::new();
        let mut evaluator = Evaluator::new(&mut out);
        evaluator.run(&program)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn arithmetic_promotion() {
        assert_eq!(run("print 1 + 2.0;").unwrap(), "3.000000\n");
    }

    #[test]
    fn scoping() {
        assert_eq!(
            run("var x = 1; do var x = 2; print x; end print x;").unwrap(),
            "2\n1\n"
        );
    }

    #[test]
    fn while_and_break() {
        assert_eq!(
            run("var i = 0; while (i < 5) do if (i == 3) break; print i; i = i + 1; end print i;")
                .unwrap(),
            "0\n1\n2\n3\n"
        );
    }

    #[test]
    fn function_with_return() {
        assert_eq!(
            run("fun add(a, b) do return a + b; end print add(2, 3);").unwrap(),
            "5\n"
        );
    }

    #[test]
    fn short_circuit() {
        assert_eq!(
            run("var x = 0; true or (x = 1); print x; false and (x = 2); print x;").unwrap(),
            "0\n0\n"
        );
    }

    #[test]
    fn error_path_reports_undeclared() {
        let err = run("print y;").unwrap_err();
        assert!(matches!(err, MidasError::Undeclared { ref name, .. } if name == "y"));
    }

    #[test]
    fn for_loop_desugars_correctly() {
        assert_eq!(
            run("for (var i = 0; i < 3; i = i + 1) do print i; end").unwrap(),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn functions_do_not_close_over_locals() {
        let err = run(
            "fun outer() do var x = 1; fun inner() do return x; end return inner(); end print outer();",
        )
        .unwrap_err();
        assert!(matches!(err, MidasError::Undeclared { ref name, .. } if name == "x"));
    }

    #[test]
    fn scope_hygiene_after_block_exit() {
        let err = run("do var x = 1; end print x;").unwrap_err();
        assert!(matches!(err, MidasError::Undeclared { .. }));
    }
}
