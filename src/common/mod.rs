//! Datastructures shared by every compilation stage: how source text
//! is held onto, and how positions within it are tracked and reported.

pub mod source;
pub mod span;

pub use source::Source;
pub use span::{Span, Spanned};
