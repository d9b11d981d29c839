//! Answer evaluation
//!
//! Wraps a [`TextGenerator`] with the interviewer prompt and a tolerant
//! JSON parse of the reply. Evaluation never fails: an unavailable
//! generator or an unparseable reply produce a zero-score [`Evaluation`]
//! with an explanatory message.

use crate::providers::TextGenerator;

use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Feedback used when the generator returned nothing
pub const UNAVAILABLE_FEEDBACK: &str = "AI Service Unavailable";

/// Feedback used when the generator reply was not valid JSON
pub const UNPARSEABLE_FEEDBACK: &str = "Could not parse AI response.";

/// Placeholder solution for fallback evaluations
pub const NO_SOLUTION: &str = "N/A";

/// Structured result of evaluating one answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score on a 1-10 scale (0 for fallbacks)
    #[serde(deserialize_with = "lenient_score")]
    pub score: f64,
    /// Interviewer feedback
    #[serde(default)]
    pub feedback: String,
    /// Reference solution
    #[serde(default = "default_solution")]
    pub correct_solution: String,
}

fn default_solution() -> String {
    NO_SOLUTION.to_string()
}

/// Models sometimes quote the score; accept `8` and `"8"` alike
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    match Score::deserialize(deserializer)? {
        Score::Number(n) => Ok(n),
        Score::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("score is not a number: {:?}", text))),
    }
}

impl Evaluation {
    /// Zero-score evaluation carrying only a feedback message
    pub fn fallback(feedback: &str) -> Self {
        Self {
            score: 0.0,
            feedback: feedback.to_string(),
            correct_solution: NO_SOLUTION.to_string(),
        }
    }

    /// Whether this is one of the fallback results
    pub fn is_fallback(&self) -> bool {
        self.score == 0.0
            && (self.feedback == UNAVAILABLE_FEEDBACK || self.feedback == UNPARSEABLE_FEEDBACK)
    }
}

/// Evaluates candidate answers through a text generator
pub struct Evaluator {
    generator: Arc<dyn TextGenerator>,
}

impl Evaluator {
    /// Create an evaluator over the given generator
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Build the interviewer prompt for a question/answer pair
    pub fn build_prompt(question: &str, answer: &str) -> String {
        format!(
            "You are a technical interviewer.\n\
             Question: {question}\n\
             Candidate Answer: {answer}\n\
             \n\
             Evaluate the answer on a scale of 1-10.\n\
             Provide feedback and the correct solution.\n\
             Return ONLY valid JSON in this format:\n\
             {{ \"score\": number, \"feedback\": \"string\", \"correct_solution\": \"string\" }}\n"
        )
    }

    /// Evaluate an answer
    ///
    /// Always returns an evaluation; see the module docs for fallbacks.
    pub async fn evaluate(&self, question: &str, answer: &str) -> Evaluation {
        if !self.generator.is_enabled() {
            tracing::warn!("Evaluation skipped: generator disabled");
            return Evaluation::fallback(UNAVAILABLE_FEEDBACK);
        }

        let prompt = Self::build_prompt(question, answer);
        let Some(reply) = self.generator.generate(&prompt).await else {
            tracing::warn!("Evaluation skipped: generator unavailable");
            return Evaluation::fallback(UNAVAILABLE_FEEDBACK);
        };

        match parse_evaluation(&reply) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                tracing::error!("JSON Parse Error: {}", e);
                Evaluation::fallback(UNPARSEABLE_FEEDBACK)
            }
        }
    }
}

/// Strip Markdown code fences from a model reply
///
/// Rules, applied in order:
/// 1. every `` ```json `` opener is removed (tag matched case-insensitively);
/// 2. every remaining `` ``` `` is removed;
/// 3. surrounding whitespace is trimmed.
///
/// Text outside the fences is left in place, so prose around a fenced block
/// will still make the JSON parse fail.
///
/// # Examples
///
/// ```
/// use mockprep::evaluator::strip_code_fences;
///
/// assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
/// ```
pub fn strip_code_fences(text: &str) -> String {
    const OPENER: &str = "```json";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        let after = &rest[pos..];
        let skip = match after.get(..OPENER.len()) {
            Some(head) if head.eq_ignore_ascii_case(OPENER) => OPENER.len(),
            _ => 3,
        };
        rest = &after[skip..];
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Parse a model reply into an [`Evaluation`] after fence stripping
pub fn parse_evaluation(reply: &str) -> serde_json::Result<Evaluation> {
    serde_json::from_str(&strip_code_fences(reply))
}
