//! Direct processing of questions and quests.

use super::derivation::DerivationContext;
use super::local_rules::try_solution;
use crate::concept::{select_candidate, Concept};
use crate::entity::{Punctuation, Task};
use crate::memory::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionDecision {
    pub answered: bool,
    /// False when an equivalent question was already pending
    pub stored: bool,
}

/// Answers a question from the beliefs, or a quest from the desires, then
/// keeps it pending for better answers.
pub fn process_question(concept: &mut Concept, ctx: &mut DerivationContext<'_>, mut task: Task) -> QuestionDecision {
    let config = ctx.config;
    let quest = task.sentence().punctuation() == Punctuation::Quest;
    let table = if quest { &concept.desires } else { &concept.beliefs };
    let answer = select_candidate(table, task.sentence(), ctx.time(), config.duration, config.horizon)
        .map(|i| table[i].sentence().clone());
    let answered = match answer {
        Some(solution) => try_solution(&solution, &mut task, ctx),
        None => false,
    };

    let list = if quest { &mut concept.quests } else { &mut concept.questions };
    let already = list.iter().any(|q| q.sentence().equivalent(task.sentence()));
    Concept::push_bounded(list, task.clone(), config.bags.questions);
    if !already {
        ctx.emit(Event::ConceptQuestionAdd {
            concept: concept.term(),
            task,
        });
    }
    QuestionDecision {
        answered,
        stored: !already,
    }
}
