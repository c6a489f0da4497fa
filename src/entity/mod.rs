//! Budgeted, stamped units of knowledge.

pub mod budget;
pub mod sentence;
pub mod stamp;
pub mod truth;

pub use budget::Budget;
pub use sentence::{Punctuation, Sentence, SentenceKey, Task};
pub use stamp::{base_overlap, Stamp, StampEq};
pub use truth::TruthValue;
