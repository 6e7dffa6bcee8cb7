use std::path::PathBuf;

use thiserror::Error;

use crate::common::Span;

/// Where a `MidasError` was raised, when it was raised anywhere in
/// the source (scanner/parser/evaluator errors all have one; a
/// top-level I/O failure does not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl From<Span> for Location {
    fn from(span: Span) -> Location {
        Location {
            line: span.line,
            column: span.column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The closed set of ways a run can fail. Every variant surfaces as a
/// single diagnostic line; there is no recovery from any of them.
#[derive(Debug, Error)]
pub enum MidasError {
    #[error("could not read '{path}': {source}")]
    IOError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{location}: {message}")]
    LexError { message: String, location: Location },

    #[error("{location}: {message}")]
    SyntaxError { message: String, location: Location },

    #[error("{location}: assignment target must be a variable name")]
    InvalidAssignmentTarget { location: Location },

    #[error("{location}: undeclared name '{name}'")]
    Undeclared { name: String, location: Location },

    #[error("{location}: '{name}' is already declared in this scope")]
    AlreadyDeclared { name: String, location: Location },

    #[error("{location}: {message}")]
    TypeMismatch { message: String, location: Location },

    #[error("{location}: expected {expected} argument(s), got {got}")]
    ArityMismatch {
        expected: usize,
        got: usize,
        location: Location,
    },

    #[error("{location}: division by zero")]
    DivideByZero { location: Location },
}

pub type MidasResult<T> = Result<T, MidasError>;
