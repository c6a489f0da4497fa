//! Thresholds, capacities and multipliers consumed by the reasoning core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{0} must be non-zero")]
    Zero(&'static str),
}

/// Capacities and forgetting rates of the bags and tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagConfig {
    /// Number of priority levels each bag is stratified into
    pub levels: usize,
    /// Maximum resident concepts in memory
    pub concepts: usize,
    /// Maximum task links per concept
    pub task_links: usize,
    /// Maximum term links per concept
    pub term_links: usize,
    /// Maximum derived tasks waiting for direct processing
    pub novel_tasks: usize,
    /// Maximum beliefs per concept
    pub beliefs: usize,
    /// Maximum goals per concept
    pub goals: usize,
    /// Maximum questions (and, separately, quests) per concept
    pub questions: usize,
    /// Maximum learned executable preconditions per concept
    pub preconditions: usize,
    /// Cycles for a concept's priority to decay toward its quality floor
    pub concept_forgetting_cycles: f32,
    pub task_link_forgetting_cycles: f32,
    pub term_link_forgetting_cycles: f32,
    pub novel_task_forgetting_cycles: f32,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            levels: 100,
            concepts: 1000,
            task_links: 100,
            term_links: 100,
            novel_tasks: 1000,
            beliefs: 28,
            goals: 7,
            questions: 5,
            preconditions: 28,
            concept_forgetting_cycles: 10.0,
            task_link_forgetting_cycles: 20.0,
            term_link_forgetting_cycles: 50.0,
            novel_task_forgetting_cycles: 5.0,
        }
    }
}

/// Budgets and truth values assigned to tasks created without a parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDefaults {
    pub judgment_priority: f32,
    pub judgment_durability: f32,
    pub goal_priority: f32,
    pub goal_durability: f32,
    pub question_priority: f32,
    pub question_durability: f32,
    pub judgment_confidence: f32,
    pub goal_confidence: f32,
    /// Priority multiplier for questions generated while deciding
    pub curiosity_priority_mul: f32,
    /// Durability multiplier for questions generated while deciding
    pub curiosity_durability_mul: f32,
}

impl Default for BudgetDefaults {
    fn default() -> Self {
        Self {
            judgment_priority: 0.8,
            judgment_durability: 0.5,
            goal_priority: 0.9,
            goal_durability: 0.9,
            question_priority: 0.9,
            question_durability: 0.9,
            judgment_confidence: 0.9,
            goal_confidence: 0.9,
            curiosity_priority_mul: 0.1,
            curiosity_durability_mul: 0.3,
        }
    }
}

/// Reflective `^want`/`^believe`/`^wonder`/`^evaluate` judgments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalExperienceConfig {
    pub enabled: bool,
    /// Also reflect judgments and goals, not only questions and quests
    pub allow_want_believe: bool,
    pub min_priority_want_believe: f32,
    pub min_priority_wonder_evaluate: f32,
    pub priority_mul: f32,
    pub durability_mul: f32,
}

impl Default for InternalExperienceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_want_believe: true,
            min_priority_want_believe: 0.3,
            min_priority_wonder_evaluate: 0.3,
            priority_mul: 0.1,
            durability_mul: 0.1,
        }
    }
}

/// Configuration threaded into [`crate::Memory`] at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Expectation a desire must exceed before acting on it
    pub decision_threshold: f32,
    /// Anti-satisfaction below which a goal counts as fulfilled
    pub satisfaction_threshold: f32,
    /// Budget summary below which a task is not worked on
    pub budget_threshold: f32,
    /// Cycles per duration unit
    pub duration: i64,
    /// Evidential horizon used by the truth functions
    pub horizon: f32,
    /// Longest evidential base kept on a stamp
    pub max_evidential_base: usize,
    /// Largest occurrence distance at which two events may be revised
    pub revision_max_occurrence_distance: i64,
    /// Multiplier on a precondition interval giving the anticipation window
    pub anticipation_tolerance: f32,
    /// Confidence of the negative evidence derived from a failed anticipation
    pub anticipation_confidence: f32,
    /// Pending anticipations kept at once; the oldest is dropped beyond this
    pub anticipation_capacity: usize,
    /// Cycles to wait after an automatic decision before the next one
    pub decision_block_cycles: i64,
    /// Ask `<?how =/> goal>?` for every committed goal
    pub how_question_on_decision: bool,
    /// Re-ask every committed goal as a question
    pub question_on_decision: bool,
    pub allow_execution: bool,
    /// Recent event judgments kept for precondition matching
    pub event_buffer_size: usize,
    /// Seed of the memory's random source
    pub seed: u64,
    pub bags: BagConfig,
    pub budgets: BudgetDefaults,
    pub internal_experience: InternalExperienceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            decision_threshold: 0.51,
            satisfaction_threshold: 0.0,
            budget_threshold: 0.01,
            duration: 5,
            horizon: 1.0,
            max_evidential_base: 20_000,
            revision_max_occurrence_distance: 10,
            anticipation_tolerance: 100.0,
            anticipation_confidence: 0.1,
            anticipation_capacity: 100,
            decision_block_cycles: 1,
            how_question_on_decision: false,
            question_on_decision: false,
            allow_execution: true,
            event_buffer_size: 30,
            seed: 1,
            bags: BagConfig::default(),
            budgets: BudgetDefaults::default(),
            internal_experience: InternalExperienceConfig::default(),
        }
    }
}

fn unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value: value as f64,
            min: 0.0,
            max: 1.0,
        })
    }
}

fn non_zero(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::Zero(name))
    } else {
        Ok(())
    }
}

impl Config {
    /// Checks every threshold and capacity before a memory is built on it
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("decision_threshold", self.decision_threshold)?;
        unit("satisfaction_threshold", self.satisfaction_threshold)?;
        unit("budget_threshold", self.budget_threshold)?;
        unit("anticipation_confidence", self.anticipation_confidence)?;

        let b = &self.budgets;
        for (name, value) in [
            ("budgets.judgment_priority", b.judgment_priority),
            ("budgets.judgment_durability", b.judgment_durability),
            ("budgets.goal_priority", b.goal_priority),
            ("budgets.goal_durability", b.goal_durability),
            ("budgets.question_priority", b.question_priority),
            ("budgets.question_durability", b.question_durability),
            ("budgets.judgment_confidence", b.judgment_confidence),
            ("budgets.goal_confidence", b.goal_confidence),
            ("budgets.curiosity_priority_mul", b.curiosity_priority_mul),
            ("budgets.curiosity_durability_mul", b.curiosity_durability_mul),
        ] {
            unit(name, value)?;
        }

        non_zero("bags.levels", self.bags.levels)?;
        non_zero("bags.concepts", self.bags.concepts)?;
        non_zero("bags.task_links", self.bags.task_links)?;
        non_zero("bags.term_links", self.bags.term_links)?;
        non_zero("bags.novel_tasks", self.bags.novel_tasks)?;
        non_zero("bags.beliefs", self.bags.beliefs)?;
        non_zero("bags.goals", self.bags.goals)?;
        non_zero("max_evidential_base", self.max_evidential_base)?;
        non_zero("anticipation_capacity", self.anticipation_capacity)?;

        if self.duration <= 0 {
            return Err(ConfigError::Zero("duration"));
        }
        if self.horizon <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "horizon",
                value: self.horizon as f64,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
        Ok(())
    }
}
