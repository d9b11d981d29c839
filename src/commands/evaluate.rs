//! Evaluate command
//!
//! Scores a single answer and, when a session id is given, appends the
//! exchange to that session while keeping its difficulty.

use crate::config::Config;
use crate::error::{MockprepError, Result};
use crate::evaluator::{Evaluation, Evaluator};
use crate::providers::create_generator;
use crate::storage::{HistoryItem, SessionStore, DEFAULT_DIFFICULTY};
use colored::Colorize;
use serde_json::json;

/// Arguments for [`run_evaluate`]
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    /// Interview question
    pub question: String,
    /// Candidate answer
    pub answer: String,
    /// Session to append the exchange to
    pub session: Option<String>,
    /// Topic label stored with the exchange
    pub topic: Option<String>,
    /// Owner written with the session
    pub user: Option<String>,
    /// Print JSON instead of text
    pub json: bool,
}

/// History record for one evaluated answer
pub fn exchange_item(
    question: &str,
    answer: &str,
    topic: Option<&str>,
    evaluation: &Evaluation,
) -> HistoryItem {
    let mut record = json!({
        "question": question,
        "answer": answer,
        "score": evaluation.score,
        "feedback": evaluation.feedback,
        "correct_solution": evaluation.correct_solution,
    });
    if let Some(topic) = topic {
        record["topic"] = json!(topic);
    }
    HistoryItem::Exchange(record)
}

/// Append an evaluated exchange to a session, keeping its difficulty
///
/// A missing session starts empty at the default difficulty. A failed read
/// aborts before anything is written.
///
/// # Errors
///
/// Returns error if the session cannot be read or the write fails
pub async fn append_exchange(
    store: &SessionStore,
    session_id: &str,
    item: HistoryItem,
    user_id: Option<&str>,
) -> std::result::Result<(), MockprepError> {
    let (difficulty, mut items) = match store.load_session(session_id).await? {
        Some(state) => (state.difficulty, state.items),
        None => (DEFAULT_DIFFICULTY.to_string(), Vec::new()),
    };
    items.push(item);

    store
        .update_session(session_id, &difficulty, items, user_id)
        .await
}

/// Run the evaluate command
///
/// The evaluation is printed before the session write, so a store failure
/// still leaves the result on screen.
///
/// # Errors
///
/// Returns error if the generator cannot be built or the session cannot be
/// read or written
pub async fn run_evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let generator = create_generator(&config.generation)?;
    let evaluator = Evaluator::new(generator);

    let evaluation = evaluator.evaluate(&args.question, &args.answer).await;
    print_evaluation(&evaluation, args.json)?;

    if let Some(session_id) = &args.session {
        let store = SessionStore::connect(&config.store);
        let item = exchange_item(
            &args.question,
            &args.answer,
            args.topic.as_deref(),
            &evaluation,
        );

        append_exchange(&store, session_id, item, args.user.as_deref())
            .await
            .map_err(|e| {
                tracing::error!("Evaluation not saved to session {}: {}", session_id, e);
                e
            })?;
        tracing::info!("Appended evaluation to session {}", session_id);
    }

    Ok(())
}

fn print_evaluation(evaluation: &Evaluation, json: bool) -> Result<()> {
    if json {
        let json =
            serde_json::to_string_pretty(evaluation).map_err(MockprepError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    let score = format!("{}/10", evaluation.score);
    if evaluation.is_fallback() {
        println!("{} {}", "Score:".bold(), score.red());
    } else {
        println!("{} {}", "Score:".bold(), score.green());
    }
    println!("{} {}", "Feedback:".bold(), evaluation.feedback);
    println!("{} {}", "Solution:".bold(), evaluation.correct_solution);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_item_with_topic() {
        let evaluation = Evaluation {
            score: 7.0,
            feedback: "Solid".to_string(),
            correct_solution: "Use a heap".to_string(),
        };
        let item = exchange_item("Top k?", "Sort", Some("Heaps"), &evaluation);
        assert_eq!(item.topic(), Some("Heaps"));
        assert!(!item.is_marker());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["score"], 7.0);
        assert_eq!(value["question"], "Top k?");
    }

    #[test]
    fn test_exchange_item_without_topic() {
        let item = exchange_item("Q", "A", None, &Evaluation::fallback("x"));
        assert_eq!(item.topic(), None);
    }
}
