//! Attention allocation and evidence bookkeeping for a NARS-style reasoner.
//!
//! Knowledge lives in [`Concept`]s kept in a bounded, priority-stratified
//! [`Bag`]. Every touch decays a budget and every overflow forgets the
//! weakest item. Stamps keep conclusions from resting on overlapping or
//! self-produced evidence. Goals are revised, realized, questioned or acted
//! upon by the decision procedure in [`control::goal`].

pub mod bag;
pub mod concept;
pub mod config;
pub mod control;
pub mod entity;
pub mod language;
pub mod memory;
pub mod operator;

pub use bag::{Bag, Item};
pub use concept::{Concept, TaskLink, TermLink};
pub use config::{BagConfig, BudgetDefaults, Config, ConfigError, InternalExperienceConfig};
pub use control::{
    Anticipation, DerivationContext, DirectOutcome, GoalDecision, Inference, JudgmentDecision, NullInference,
    QuestionDecision,
};
pub use entity::{Budget, Punctuation, Sentence, Stamp, Task, TruthValue};
pub use language::{Connector, TemporalOrder, Term, TermArena, TermError, TermId, VarKind};
pub use memory::{CycleReport, Event, EventKind, EventLog, Memory, MemoryError, Observer};
pub use operator::{Operator, OperatorRegistry};
