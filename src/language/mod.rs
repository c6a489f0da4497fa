//! Interned terms, referenced by handle.

pub mod term;

pub use term::{Connector, TemporalOrder, Term, TermArena, TermError, TermId, VarKind};
