//! Multiple-choice descriptor and `<choice>` rendering

use crate::decamp::error::{LineError, Malformed};
use once_cell::sync::Lazy;
use regex::Regex;

static CORRECT_ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"has_chosen\(.*?\bcorrect\s*=\s*(\d+)").unwrap());

/// Prefix of a solution-check call line.
pub const CHECK_CALL_PREFIX: &str = "Ex()";

/// One answer option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choice {
    pub answer: String,
    pub correct: bool,
    pub feedback: String,
}

impl Choice {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Default::default()
        }
    }
}

/// Answer text of a `- ` list line.
pub fn answer_text(line: &str) -> Option<&str> {
    line.strip_prefix("- ").map(str::trim)
}

/// The 1-based choice named by a `has_chosen(..., correct=N)` call.
pub fn correct_argument(call: &str) -> Option<usize> {
    CORRECT_ARGUMENT
        .captures(call)
        .and_then(|caps| caps[1].parse().ok())
}

/// Flag the correct choice from the check calls of an `@sct` block.
///
/// Exactly one call must name a choice, and it must exist. `block` is the
/// offset reported when no call names one.
pub fn mark_correct(
    choices: &mut [Choice],
    calls: &[(usize, String)],
    block: usize,
) -> Result<(), LineError> {
    let named: Vec<(usize, usize)> = calls
        .iter()
        .filter_map(|(offset, call)| correct_argument(call).map(|index| (*offset, index)))
        .collect();

    let (offset, index) = match named.as_slice() {
        [] => return Err(LineError::new(block, Malformed::NoCorrectAnswer)),
        [single] => *single,
        [_, second, ..] => {
            return Err(LineError::new(
                second.0,
                Malformed::MultipleCorrectAnswers {
                    choices: named.iter().map(|(_, index)| *index).collect(),
                },
            ))
        }
    };

    match index.checked_sub(1).and_then(|i| choices.get_mut(i)) {
        Some(choice) => {
            choice.correct = true;
            Ok(())
        }
        None => Err(LineError::new(
            offset,
            Malformed::CorrectIndexOutOfRange {
                index,
                answers: choices.len(),
            },
        )),
    }
}

/// Assign feedback messages to choices by position.
pub fn assign_feedback(
    choices: &mut [Choice],
    messages: Vec<String>,
    block: usize,
) -> Result<(), LineError> {
    if messages.len() != choices.len() {
        return Err(LineError::new(
            block,
            Malformed::FeedbackCountMismatch {
                messages: messages.len(),
                answers: choices.len(),
            },
        ));
    }
    for (choice, message) in choices.iter_mut().zip(messages) {
        choice.feedback = message;
    }
    Ok(())
}

/// Render a `<choice>` block with one `<opt>` per answer.
pub fn render_choices(choices: &[Choice]) -> String {
    let mut out = String::from("<choice>\n");
    for choice in choices {
        out.push_str(&format!("<opt text=\"{}\"", escape_attribute(&choice.answer)));
        if choice.correct {
            out.push_str(" correct=\"true\"");
        }
        out.push_str(&format!(">{}</opt>\n", choice.feedback));
    }
    out.push_str("</choice>\n");
    out
}

pub(crate) fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
