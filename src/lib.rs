//! A small tree-walking interpreter: source text goes in through
//! [`scanner`] and [`parser`], comes out as an AST (see [`ast`]), and
//! [`evaluator`] walks that tree against an [`environment`] chain of
//! [`value`]s.

pub mod ast;
pub mod common;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use common::Source;
pub use error::{MidasError, MidasResult};
pub use evaluator::Evaluator;
pub use parser::Parser;

use std::io::Write;
use std::rc::Rc;

/// Parses and runs a whole program, writing `print` output to `out`.
pub fn run(source: Rc<Source>, out: impl Write) -> MidasResult<()> {
    let program = Parser::parse(source)?;
    Evaluator::new(out).run(&program)
}
