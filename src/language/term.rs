use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("{0:?} needs at least {1} components")]
    TooFewComponents(Connector, usize),
    #[error("Term handle {0} does not belong to this arena")]
    Unknown(TermId),
    #[error("Operation predicate {0} is not an operator")]
    NotAnOperator(TermId),
}

/// Handle to an interned term; equal handles mean structurally equal terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(u32);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    Independent,
    Dependent,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connector {
    Inheritance,
    Similarity,
    Implication,
    Equivalence,
    Conjunction,
    Product,
    Negation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalOrder {
    None,
    Forward,
    Concurrent,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Atom(String),
    Variable(VarKind, String),
    /// Elapsed cycles between two events of a sequence
    Interval(u64),
    /// Operator name including the leading `^`
    Operator(String),
    Compound {
        connector: Connector,
        order: TemporalOrder,
        components: Vec<TermId>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct VarFlags {
    independent: bool,
    dependent: bool,
    query: bool,
}

impl VarFlags {
    fn union(self, other: VarFlags) -> VarFlags {
        VarFlags {
            independent: self.independent || other.independent,
            dependent: self.dependent || other.dependent,
            query: self.query || other.query,
        }
    }
}

/// Owns every term of one memory. Terms are immutable once interned.
#[derive(Debug)]
pub struct TermArena {
    nodes: Vec<(Term, VarFlags)>,
    index: HashMap<Term, TermId>,
    self_term: TermId,
}

impl Default for TermArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TermArena {
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            self_term: TermId(0),
        };
        arena.self_term = arena.atom("SELF");
        arena
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The `SELF` atom every executable operation names as its first argument
    pub fn self_term(&self) -> TermId {
        self.self_term
    }

    fn intern(&mut self, term: Term, vars: VarFlags) -> TermId {
        if let Some(&id) = self.index.get(&term) {
            return id;
        }
        let id = TermId(self.nodes.len() as u32);
        self.index.insert(term.clone(), id);
        self.nodes.push((term, vars));
        id
    }

    pub fn atom(&mut self, name: &str) -> TermId {
        self.intern(Term::Atom(name.to_string()), VarFlags::default())
    }

    pub fn variable(&mut self, kind: VarKind, name: &str) -> TermId {
        let vars = VarFlags {
            independent: kind == VarKind::Independent,
            dependent: kind == VarKind::Dependent,
            query: kind == VarKind::Query,
        };
        self.intern(Term::Variable(kind, name.to_string()), vars)
    }

    pub fn interval(&mut self, cycles: u64) -> TermId {
        self.intern(Term::Interval(cycles), VarFlags::default())
    }

    pub fn operator(&mut self, name: &str) -> TermId {
        let name = if name.starts_with('^') {
            name.to_string()
        } else {
            format!("^{}", name)
        };
        self.intern(Term::Operator(name), VarFlags::default())
    }

    fn compound(
        &mut self,
        connector: Connector,
        order: TemporalOrder,
        components: Vec<TermId>,
        min: usize,
    ) -> Result<TermId, TermError> {
        if components.len() < min {
            return Err(TermError::TooFewComponents(connector, min));
        }
        let mut vars = VarFlags::default();
        for &c in &components {
            let (_, flags) = self.nodes.get(c.0 as usize).ok_or(TermError::Unknown(c))?;
            vars = vars.union(*flags);
        }
        Ok(self.intern(
            Term::Compound {
                connector,
                order,
                components,
            },
            vars,
        ))
    }

    pub fn inheritance(&mut self, subject: TermId, predicate: TermId) -> Result<TermId, TermError> {
        self.compound(Connector::Inheritance, TemporalOrder::None, vec![subject, predicate], 2)
    }

    pub fn similarity(&mut self, a: TermId, b: TermId) -> Result<TermId, TermError> {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.compound(Connector::Similarity, TemporalOrder::None, vec![a, b], 2)
    }

    pub fn implication(
        &mut self,
        subject: TermId,
        predicate: TermId,
        order: TemporalOrder,
    ) -> Result<TermId, TermError> {
        self.compound(Connector::Implication, order, vec![subject, predicate], 2)
    }

    pub fn equivalence(
        &mut self,
        subject: TermId,
        predicate: TermId,
        order: TemporalOrder,
    ) -> Result<TermId, TermError> {
        self.compound(Connector::Equivalence, order, vec![subject, predicate], 2)
    }

    /// A conjunction of one component is that component
    pub fn conjunction(&mut self, components: &[TermId], order: TemporalOrder) -> Result<TermId, TermError> {
        match components {
            [] => Err(TermError::TooFewComponents(Connector::Conjunction, 1)),
            [single] => Ok(*single),
            _ => self.compound(Connector::Conjunction, order, components.to_vec(), 2),
        }
    }

    pub fn product(&mut self, components: &[TermId]) -> Result<TermId, TermError> {
        self.compound(Connector::Product, TemporalOrder::None, components.to_vec(), 1)
    }

    pub fn negation(&mut self, term: TermId) -> Result<TermId, TermError> {
        self.compound(Connector::Negation, TemporalOrder::None, vec![term], 1)
    }

    /// `<(*, args..) --> ^op>`
    pub fn operation(&mut self, operator: TermId, args: &[TermId]) -> Result<TermId, TermError> {
        match self.get(operator) {
            Some(Term::Operator(_)) => {}
            Some(_) => return Err(TermError::NotAnOperator(operator)),
            None => return Err(TermError::Unknown(operator)),
        }
        let product = self.product(args)?;
        self.inheritance(product, operator)
    }

    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.nodes.get(id.0 as usize).map(|(term, _)| term)
    }

    pub fn components(&self, id: TermId) -> &[TermId] {
        match self.get(id) {
            Some(Term::Compound { components, .. }) => components,
            _ => &[],
        }
    }

    pub fn connector(&self, id: TermId) -> Option<Connector> {
        match self.get(id) {
            Some(Term::Compound { connector, .. }) => Some(*connector),
            _ => None,
        }
    }

    pub fn order(&self, id: TermId) -> TemporalOrder {
        match self.get(id) {
            Some(Term::Compound { order, .. }) => *order,
            _ => TemporalOrder::None,
        }
    }

    fn is_statement(&self, id: TermId) -> bool {
        matches!(
            self.connector(id),
            Some(Connector::Inheritance | Connector::Similarity | Connector::Implication | Connector::Equivalence)
        )
    }

    pub fn subject(&self, id: TermId) -> Option<TermId> {
        if self.is_statement(id) {
            self.components(id).first().copied()
        } else {
            None
        }
    }

    pub fn predicate(&self, id: TermId) -> Option<TermId> {
        if self.is_statement(id) {
            self.components(id).get(1).copied()
        } else {
            None
        }
    }

    pub fn interval_cycles(&self, id: TermId) -> Option<u64> {
        match self.get(id) {
            Some(Term::Interval(cycles)) => Some(*cycles),
            _ => None,
        }
    }

    pub fn is_operator(&self, id: TermId) -> bool {
        matches!(self.get(id), Some(Term::Operator(_)))
    }

    pub fn is_operation(&self, id: TermId) -> bool {
        self.operation_parts(id).is_some()
    }

    /// Splits `<(*, args..) --> ^op>` into the operator and its arguments
    pub fn operation_parts(&self, id: TermId) -> Option<(TermId, &[TermId])> {
        if self.connector(id) != Some(Connector::Inheritance) {
            return None;
        }
        let (subject, predicate) = (self.subject(id)?, self.predicate(id)?);
        if !self.is_operator(predicate) || self.connector(subject) != Some(Connector::Product) {
            return None;
        }
        Some((predicate, self.components(subject)))
    }

    pub fn operator_name(&self, id: TermId) -> Option<&str> {
        match self.get(id) {
            Some(Term::Operator(name)) => Some(name),
            _ => None,
        }
    }

    fn flags(&self, id: TermId) -> VarFlags {
        self.nodes.get(id.0 as usize).map(|(_, f)| *f).unwrap_or_default()
    }

    pub fn has_var_indep(&self, id: TermId) -> bool {
        self.flags(id).independent
    }

    pub fn has_var_dep(&self, id: TermId) -> bool {
        self.flags(id).dependent
    }

    pub fn has_var_query(&self, id: TermId) -> bool {
        self.flags(id).query
    }

    /// Narsese-like rendering for log fields
    pub fn render(&self, id: TermId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: TermId, out: &mut String) {
        match self.get(id) {
            None => out.push_str(&id.to_string()),
            Some(Term::Atom(name)) | Some(Term::Operator(name)) => out.push_str(name),
            Some(Term::Variable(kind, name)) => {
                out.push(match kind {
                    VarKind::Independent => '$',
                    VarKind::Dependent => '#',
                    VarKind::Query => '?',
                });
                out.push_str(name);
            }
            Some(Term::Interval(cycles)) => out.push_str(&format!("+{}", cycles)),
            Some(Term::Compound {
                connector,
                order,
                components,
            }) => {
                let copula = match (connector, order) {
                    (Connector::Inheritance, _) => Some("-->"),
                    (Connector::Similarity, _) => Some("<->"),
                    (Connector::Implication, TemporalOrder::Forward) => Some("=/>"),
                    (Connector::Implication, TemporalOrder::Concurrent) => Some("=|>"),
                    (Connector::Implication, TemporalOrder::Backward) => Some("=\\>"),
                    (Connector::Implication, TemporalOrder::None) => Some("==>"),
                    (Connector::Equivalence, TemporalOrder::Forward) => Some("</>"),
                    (Connector::Equivalence, _) => Some("<=>"),
                    _ => None,
                };
                if let (Some(copula), [s, p]) = (copula, components.as_slice()) {
                    out.push('<');
                    self.render_into(*s, out);
                    out.push(' ');
                    out.push_str(copula);
                    out.push(' ');
                    self.render_into(*p, out);
                    out.push('>');
                    return;
                }
                let op = match (connector, order) {
                    (Connector::Conjunction, TemporalOrder::Forward) => "&/",
                    (Connector::Conjunction, TemporalOrder::Concurrent) => "&|",
                    (Connector::Conjunction, _) => "&&",
                    (Connector::Product, _) => "*",
                    _ => "--",
                };
                out.push('(');
                out.push_str(op);
                for c in components {
                    out.push_str(", ");
                    self.render_into(*c, out);
                }
                out.push(')');
            }
        }
    }
}
