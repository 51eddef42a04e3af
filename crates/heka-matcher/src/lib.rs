//! # Heka Matcher
//!
//! Compiles the predicate DSL into a [`Specification`] and
//! evaluates it against [`heka_core::Message`] values. Used by the router
//! to select which filter/output inboxes a message fans out to.

pub mod ast;
pub mod error;
mod eval;
mod parser;
mod templates;

pub use ast::{Expr, Lhs, RelOp, Rhs};
pub use error::MatchError;
pub use eval::{CaptureSet, MatchOutcome, Specification};
