//! Registry of the operations the system can perform in its environment.

use crate::language::{TermArena, TermId};
use std::collections::HashMap;
use std::fmt;

/// An action the system can take. `execute` is called at most once per
/// decision and must not re-enter the reasoning cycle.
pub trait Operator: Send {
    /// Name including the leading `^`
    fn name(&self) -> &str;

    /// Function operators take an output argument last, which may stay a variable
    fn is_function(&self) -> bool {
        false
    }

    fn execute(&mut self, operation: TermId, args: &[TermId], terms: &TermArena) -> bool;
}

#[derive(Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Box<dyn Operator>>,
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.operators.keys()).finish()
    }
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the operator previously registered under the same name
    pub fn register(&mut self, operator: Box<dyn Operator>) -> Option<Box<dyn Operator>> {
        self.operators.insert(operator.name().to_string(), operator)
    }

    /// Whether an operator named `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Operator + 'static)> {
        self.operators.get_mut(name).map(|op| op.as_mut())
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}
