use super::budget::Budget;
use super::stamp::Stamp;
use super::truth::{self, TruthValue};
use crate::bag::Item;
use crate::language::TermId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Punctuation {
    Judgment,
    Goal,
    Question,
    Quest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    term: TermId,
    punctuation: Punctuation,
    /// Truth for judgments, desire for goals, absent for questions and quests
    truth: Option<TruthValue>,
    stamp: Stamp,
}

impl Sentence {
    pub fn new(term: TermId, punctuation: Punctuation, truth: Option<TruthValue>, stamp: Stamp) -> Self {
        let truth = match punctuation {
            Punctuation::Judgment | Punctuation::Goal => truth,
            Punctuation::Question | Punctuation::Quest => None,
        };
        Self {
            term,
            punctuation,
            truth,
            stamp,
        }
    }

    pub fn term(&self) -> TermId {
        self.term
    }

    pub fn punctuation(&self) -> Punctuation {
        self.punctuation
    }

    pub fn truth(&self) -> Option<&TruthValue> {
        self.truth.as_ref()
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    pub fn is_judgment(&self) -> bool {
        self.punctuation == Punctuation::Judgment
    }

    pub fn is_goal(&self) -> bool {
        self.punctuation == Punctuation::Goal
    }

    pub fn is_question(&self) -> bool {
        self.punctuation == Punctuation::Question
    }

    pub fn is_quest(&self) -> bool {
        self.punctuation == Punctuation::Quest
    }

    pub fn is_eternal(&self) -> bool {
        self.stamp.is_eternal()
    }

    pub fn occurrence_time(&self) -> Option<i64> {
        self.stamp.occurrence_time()
    }

    /// Expectation of the truth or desire, 0 for questions
    pub fn expectation(&self) -> f32 {
        self.truth.map(|t| t.expectation()).unwrap_or(0.0)
    }

    /// Truth carried to `target` as seen from `now`. An event whose projected
    /// confidence falls below its eternalized confidence becomes eternal.
    pub fn projection(&self, target: Option<i64>, now: i64, duration: i64, horizon: f32) -> Sentence {
        let (truth, occurrence) = match (self.truth, self.occurrence_time()) {
            (Some(t), Some(source)) => {
                let eternal = truth::eternalize(&t, horizon);
                match target {
                    Some(target) => {
                        let factor = truth::temporal_projection(source, target, now, duration);
                        let projected = t.confidence() * factor;
                        if projected > eternal.confidence() {
                            (Some(t.with_confidence(projected)), Some(target))
                        } else {
                            (Some(eternal), None)
                        }
                    }
                    None => (Some(eternal), None),
                }
            }
            (truth, occurrence) => (truth, occurrence),
        };
        Sentence {
            term: self.term,
            punctuation: self.punctuation,
            truth,
            stamp: self.stamp.with_occurrence_time(occurrence),
        }
    }

    pub fn with_stamp(&self, stamp: Stamp) -> Sentence {
        Sentence {
            stamp,
            ..self.clone()
        }
    }

    /// Same content and evidence, regardless of when it was stamped
    pub fn equivalent(&self, other: &Sentence) -> bool {
        self.term == other.term
            && self.punctuation == other.punctuation
            && match (self.truth, other.truth) {
                (Some(a), Some(b)) => a.approx_eq(&b),
                (None, None) => true,
                _ => false,
            }
            && self.occurrence_time() == other.occurrence_time()
            && self.stamp.equals(&other.stamp, super::stamp::StampEq::EVIDENCE)
    }

    pub fn key(&self) -> SentenceKey {
        let mut evidence = self.stamp.evidential_base().to_vec();
        evidence.sort_unstable();
        SentenceKey {
            term: self.term,
            punctuation: self.punctuation,
            truth: self
                .truth
                .map(|t| ((t.frequency() * 1000.0) as u32, (t.confidence() * 1000.0) as u32)),
            occurrence: self.occurrence_time(),
            evidence,
        }
    }
}

/// Identity of a sentence inside bags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentenceKey {
    term: TermId,
    punctuation: Punctuation,
    truth: Option<(u32, u32)>,
    occurrence: Option<i64>,
    evidence: Vec<i64>,
}

/// A sentence plus the attention it is owed
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    sentence: Sentence,
    budget: Budget,
    /// Best answer found so far for a question, or best belief seen for a goal
    best_solution: Option<Sentence>,
    input: bool,
}

impl Task {
    pub fn new(sentence: Sentence, budget: Budget) -> Self {
        Self {
            sentence,
            budget,
            best_solution: None,
            input: false,
        }
    }

    pub fn input(sentence: Sentence, budget: Budget) -> Self {
        Self {
            input: true,
            ..Self::new(sentence, budget)
        }
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub fn term(&self) -> TermId {
        self.sentence.term
    }

    pub fn truth(&self) -> Option<&TruthValue> {
        self.sentence.truth()
    }

    pub fn stamp(&self) -> &Stamp {
        self.sentence.stamp()
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }

    pub fn priority(&self) -> f32 {
        self.budget.priority()
    }

    pub fn is_input(&self) -> bool {
        self.input
    }

    pub fn best_solution(&self) -> Option<&Sentence> {
        self.best_solution.as_ref()
    }

    pub fn set_best_solution(&mut self, solution: Sentence) {
        self.best_solution = Some(solution);
    }

    pub fn above_threshold(&self, threshold: f32) -> bool {
        self.budget.above_threshold(threshold)
    }
}

impl Item for Task {
    type Key = SentenceKey;

    fn key(&self) -> SentenceKey {
        self.sentence.key()
    }

    fn budget(&self) -> &Budget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }
}
