use std::fmt;

use crate::error::ScoringError;
use crate::quiz::{Quiz, Truth};

/// One user answer, already normalized to the quiz's canonical key form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAnswer {
    /// Zero-based option index of a multiple-choice question.
    Choice(usize),
    Truth(Truth),
    Text(String),
}

impl UserAnswer {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::Truth(_) => "true/false",
            Self::Text(_) => "text",
        }
    }

    /// Blank text counts as no answer.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(text) => !text.trim().is_empty(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.correct, self.total)
    }
}

/// An open-ended question laid next to its reference answer for self-assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub prompt: String,
    pub given: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Automatically scored; `per_question[i]` tells whether answer `i` matched the key.
    Scored { score: Score, per_question: Vec<bool> },
    /// Open-ended quizzes are not scored automatically.
    SelfAssessment(Vec<Review>),
}

impl Outcome {
    pub fn score(&self) -> Option<Score> {
        match self {
            Self::Scored { score, .. } => Some(*score),
            Self::SelfAssessment(_) => None,
        }
    }
}

fn mismatch(index: usize, quiz: &Quiz, answer: &UserAnswer) -> ScoringError {
    ScoringError::KindMismatch { index, kind: quiz.kind().as_str(), answer: answer.label() }
}

/// Compare a fully answered set against the quiz's answer key.
pub fn score(quiz: &Quiz, answers: &[Option<UserAnswer>]) -> Result<Outcome, ScoringError> {
    if answers.len() != quiz.len() {
        return Err(ScoringError::LengthMismatch { expected: quiz.len(), got: answers.len() });
    }

    let mut given = Vec::with_capacity(answers.len());
    for (index, slot) in answers.iter().enumerate() {
        match slot {
            Some(answer) if answer.is_filled() => given.push(answer),
            _ => return Err(ScoringError::Unanswered(index)),
        }
    }

    let per_question = match quiz {
        Quiz::MultipleChoice { questions, .. } => questions
            .iter()
            .zip(&given)
            .enumerate()
            .map(|(index, (question, answer))| match answer {
                UserAnswer::Choice(choice) => Ok(*choice == question.answer),
                other => Err(mismatch(index, quiz, other)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Quiz::TrueFalse { questions, .. } => questions
            .iter()
            .zip(&given)
            .enumerate()
            .map(|(index, (question, answer))| match answer {
                UserAnswer::Truth(truth) => Ok(*truth == question.answer),
                other => Err(mismatch(index, quiz, other)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Quiz::OpenEnded { questions } => {
            let reviews = questions
                .iter()
                .zip(&given)
                .enumerate()
                .map(|(index, (question, answer))| match answer {
                    UserAnswer::Text(text) => Ok(Review {
                        prompt: question.prompt.clone(),
                        given: text.trim().to_string(),
                        reference: question.reference.clone(),
                    }),
                    other => Err(mismatch(index, quiz, other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Outcome::SelfAssessment(reviews));
        }
    };

    let correct = per_question.iter().filter(|&&hit| hit).count();
    Ok(Outcome::Scored { score: Score { correct, total: per_question.len() }, per_question })
}
