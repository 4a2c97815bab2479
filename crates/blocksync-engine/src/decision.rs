//! The interactive-decision port.
//!
//! Rules that need user input call a [`DecisionPort`]. The call is a plain
//! blocking call: the rule does not continue until it returns.

use std::collections::VecDeque;

use crate::error::DecisionError;

/// Asks the user to pick one of several options or to type some text.
pub trait DecisionPort {
    /// Return the index of the chosen option.
    fn select_one(&mut self, prompt: &str, options: &[String]) -> Result<usize, DecisionError>;

    /// Return free text entered by the user (possibly empty).
    fn request_text(&mut self, prompt: &str) -> Result<String, DecisionError>;
}

/// A prepared answer for [`ScriptedDecisions`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Choice(usize),
    Text(String),
}

/// A decision port answering from a queue of prepared answers.
///
/// Every question asked is recorded, which makes it useful for checking
/// what a rule asked as well as for replaying edit scripts.
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Builder: queue a choice.
    pub fn choose(mut self, index: usize) -> Self {
        self.answers.push_back(Answer::Choice(index));
        self
    }

    /// Builder: queue a text answer.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Text(text.into()));
        self
    }

    /// Prompts asked so far, oldest first.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl DecisionPort for ScriptedDecisions {
    fn select_one(&mut self, prompt: &str, options: &[String]) -> Result<usize, DecisionError> {
        self.asked.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Choice(index)) if index < options.len() => Ok(index),
            Some(Answer::Choice(index)) => Err(DecisionError::OutOfRange {
                index,
                options: options.len(),
            }),
            Some(Answer::Text(_)) => Err(DecisionError::WrongAnswerKind {
                prompt: prompt.to_string(),
                expected: "choice",
            }),
            None => Err(DecisionError::Exhausted(prompt.to_string())),
        }
    }

    fn request_text(&mut self, prompt: &str) -> Result<String, DecisionError> {
        self.asked.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(Answer::Text(text)) => Ok(text),
            Some(Answer::Choice(_)) => Err(DecisionError::WrongAnswerKind {
                prompt: prompt.to_string(),
                expected: "text",
            }),
            None => Err(DecisionError::Exhausted(prompt.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into()]
    }

    #[test]
    fn answers_in_order() {
        let mut d = ScriptedDecisions::default().choose(1).text("run");
        assert_eq!(d.select_one("pick", &options()).unwrap(), 1);
        assert_eq!(d.request_text("name").unwrap(), "run");
        assert_eq!(d.asked(), &["pick".to_string(), "name".to_string()]);
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn out_of_range_choice() {
        let mut d = ScriptedDecisions::new([Answer::Choice(5)]);
        assert!(matches!(
            d.select_one("pick", &options()),
            Err(DecisionError::OutOfRange { index: 5, options: 2 })
        ));
    }

    #[test]
    fn wrong_kind_and_exhausted() {
        let mut d = ScriptedDecisions::default().text("x");
        assert!(matches!(
            d.select_one("pick", &options()),
            Err(DecisionError::WrongAnswerKind { .. })
        ));
        assert!(matches!(
            d.request_text("name"),
            Err(DecisionError::Exhausted(_))
        ));
    }
}
