//! Per-session quiz state: the live quiz plus the user's in-progress answers.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::SessionError;
use crate::quiz::{Quiz, Truth};
use crate::scoring::{self, Outcome, UserAnswer};

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub outcome: Outcome,
    pub submitted_at: DateTime<Utc>,
}

/// Quiz state owned by one interactive session. Nothing here is shared between sessions.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    quiz: Option<Quiz>,
    answers: Vec<Option<UserAnswer>>,
    started_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any current quiz and reset all answers to unset.
    pub fn start(&mut self, quiz: Quiz) {
        info!(kind = %quiz.kind(), questions = quiz.len(), "Starting quiz");
        self.answers = vec![None; quiz.len()];
        self.quiz = Some(quiz);
        self.started_at = Some(Utc::now());
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn answers(&self) -> &[Option<UserAnswer>] {
        &self.answers
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    fn active(&self) -> Result<&Quiz, SessionError> {
        self.quiz.as_ref().ok_or(SessionError::NoActiveQuiz)
    }

    fn check_index(quiz: &Quiz, index: usize) -> Result<(), SessionError> {
        if index < quiz.len() {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange { index, len: quiz.len() })
        }
    }

    /// Set one answer slot. The answer must fit the quiz kind and, for
    /// multiple-choice, name an existing option.
    pub fn record_answer(&mut self, index: usize, answer: UserAnswer) -> Result<(), SessionError> {
        let quiz = self.active()?;
        Self::check_index(quiz, index)?;

        match (quiz, &answer) {
            (Quiz::MultipleChoice { questions, .. }, UserAnswer::Choice(option)) => {
                let available = questions[index].options.len();
                if *option >= available {
                    return Err(SessionError::OptionOutOfRange { index, option: *option, available });
                }
            }
            (Quiz::TrueFalse { .. }, UserAnswer::Truth(_)) | (Quiz::OpenEnded { .. }, UserAnswer::Text(_)) => {}
            (quiz, answer) => {
                return Err(SessionError::AnswerKindMismatch {
                    kind: quiz.kind().as_str(),
                    answer: answer.label(),
                })
            }
        }

        debug!(index, answer = answer.label(), "Recorded answer");
        self.answers[index] = Some(answer);
        Ok(())
    }

    /// Turn raw user input into an answer for question `index`.
    ///
    /// Multiple-choice accepts the option text or its letter (`a` for the first
    /// option); true/false accepts `True`/`False`; open-ended keeps the text.
    pub fn interpret(&self, index: usize, raw: &str) -> Result<UserAnswer, SessionError> {
        let quiz = self.active()?;
        Self::check_index(quiz, index)?;
        let unrecognized = || SessionError::Unrecognized { index, input: raw.to_string() };

        match quiz {
            Quiz::MultipleChoice { questions, .. } => questions[index]
                .resolve(raw)
                .map(UserAnswer::Choice)
                .ok_or_else(unrecognized),
            Quiz::TrueFalse { .. } => raw
                .parse::<Truth>()
                .map(UserAnswer::Truth)
                .map_err(|_| unrecognized()),
            Quiz::OpenEnded { .. } => Ok(UserAnswer::Text(raw.to_string())),
        }
    }

    /// `interpret` followed by `record_answer`.
    pub fn record_input(&mut self, index: usize, raw: &str) -> Result<(), SessionError> {
        let answer = self.interpret(index, raw)?;
        self.record_answer(index, answer)
    }

    pub fn clear_answer(&mut self, index: usize) -> Result<(), SessionError> {
        let quiz = self.active()?;
        Self::check_index(quiz, index)?;
        self.answers[index] = None;
        Ok(())
    }

    /// Indices of questions that still need an answer.
    pub fn unanswered(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.as_ref().is_some_and(UserAnswer::is_filled))
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether every slot holds a non-empty answer. False when no quiz is active.
    pub fn all_answered(&self) -> bool {
        self.quiz.is_some() && self.unanswered().is_empty()
    }

    /// Score the answers. Incomplete submissions are rejected and the recorded
    /// answers stay in place for another attempt.
    pub fn submit(&self) -> Result<Submission, SessionError> {
        let quiz = self.active()?;
        let unanswered = self.unanswered();
        if !unanswered.is_empty() {
            info!(unanswered = unanswered.len(), "Rejected incomplete submission");
            return Err(SessionError::Incomplete { unanswered });
        }

        let outcome = scoring::score(quiz, &self.answers)?;
        if let Some(score) = outcome.score() {
            info!(%score, "Quiz scored");
        }
        Ok(Submission { outcome, submitted_at: Utc::now() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{ChoiceQuestion, TrueFalseQuestion};

    fn capitals() -> Quiz {
        Quiz::MultipleChoice {
            title: String::new(),
            questions: vec![ChoiceQuestion {
                prompt: "Capital of France?".into(),
                options: vec!["Paris".into(), "Lyon".into(), "Nice".into()],
                answer: 0,
            }],
        }
    }

    fn true_false() -> Quiz {
        Quiz::TrueFalse {
            title: String::new(),
            questions: vec![
                TrueFalseQuestion { prompt: "A".into(), answer: Truth::True },
                TrueFalseQuestion { prompt: "B".into(), answer: Truth::False },
            ],
        }
    }

    #[test]
    fn nothing_works_before_start() {
        let mut session = QuizSession::new();
        assert!(!session.all_answered());
        assert_eq!(session.record_answer(0, UserAnswer::Choice(0)), Err(SessionError::NoActiveQuiz));
        assert_eq!(session.submit(), Err(SessionError::NoActiveQuiz));
    }

    #[test]
    fn start_resets_answers_to_new_size() {
        let mut session = QuizSession::new();
        session.start(capitals());
        session.record_answer(0, UserAnswer::Choice(1)).unwrap();
        assert!(session.all_answered());

        session.start(true_false());
        assert_eq!(session.answers(), &[None, None]);
        assert!(!session.all_answered());
        assert!(session.started_at().is_some());
    }

    #[test]
    fn selected_text_matches_letter_key() {
        let mut session = QuizSession::new();
        session.start(capitals());
        session.record_input(0, "Paris").unwrap();
        assert_eq!(session.answers(), &[Some(UserAnswer::Choice(0))]);
        let submission = session.submit().unwrap();
        assert_eq!(submission.outcome.score().map(|s| s.correct), Some(1));
    }

    #[test]
    fn record_answer_validates_index_kind_and_option() {
        let mut session = QuizSession::new();
        session.start(capitals());
        assert_eq!(
            session.record_answer(3, UserAnswer::Choice(0)),
            Err(SessionError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(
            session.record_answer(0, UserAnswer::Choice(5)),
            Err(SessionError::OptionOutOfRange { index: 0, option: 5, available: 3 })
        );
        assert!(matches!(
            session.record_answer(0, UserAnswer::Truth(Truth::True)),
            Err(SessionError::AnswerKindMismatch { .. })
        ));
        assert!(matches!(session.record_input(0, "Berlin"), Err(SessionError::Unrecognized { .. })));
    }

    #[test]
    fn incomplete_submission_keeps_answers() {
        let mut session = QuizSession::new();
        session.start(true_false());
        session.record_input(1, "True").unwrap();

        assert_eq!(session.submit(), Err(SessionError::Incomplete { unanswered: vec![0] }));
        assert_eq!(session.answers(), &[None, Some(UserAnswer::Truth(Truth::True))]);

        session.record_input(0, "True").unwrap();
        let submission = session.submit().unwrap();
        assert_eq!(submission.outcome.score().map(|s| s.to_string()), Some("1/2".into()));
    }

    #[test]
    fn clear_answer_unsets_slot() {
        let mut session = QuizSession::new();
        session.start(capitals());
        session.record_input(0, "b").unwrap();
        session.clear_answer(0).unwrap();
        assert_eq!(session.unanswered(), vec![0]);
    }
}
