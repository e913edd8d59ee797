//! Quiz data model.
//!
//! The `*Response` structs are the wire schemas requested from the model (their
//! JSON schema is appended to the prompt). They hold parallel lists, which are
//! checked and folded into one record per question when converted into [`Quiz`].

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ContractViolation;
use crate::templates::QuizKind;

/// The two canonical true/false answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum Truth {
    #[serde(rename = "True")]
    True,
    #[serde(rename = "False")]
    False,
}

impl Truth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Truth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "True" | "true" => Ok(Self::True),
            "False" | "false" => Ok(Self::False),
            other => Err(format!("expected True or False, got {other:?}")),
        }
    }
}

// Models sometimes emit JSON booleans instead of the string literals.
impl<'de> Deserialize<'de> for Truth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bool(bool),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bool(b) => Ok(b.into()),
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Wire shape of a multiple-choice quiz.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "QuizMultipleChoice", description = "A multiple-choice quiz")]
pub struct MultipleChoiceResponse {
    /// The quiz text
    #[serde(default)]
    pub quiz_text: String,
    /// The quiz questions
    pub questions: Vec<String>,
    /// The quiz alternatives for each question as a list of lists
    pub alternatives: Vec<Vec<String>>,
    /// For each question, the letter of the correct alternative (a for the first, b for the second, ...)
    pub answers: Vec<String>,
}

/// Wire shape of a true/false quiz.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "QuizTrueFalse", description = "A true/false quiz")]
pub struct TrueFalseResponse {
    /// The quiz text
    #[serde(default)]
    pub quiz_text: String,
    /// The quiz questions
    pub questions: Vec<String>,
    /// The quiz answers for each question as True or False only
    pub answers: Vec<Truth>,
}

/// Wire shape of an open-ended quiz.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "QuizOpenEnded", description = "An open-ended quiz")]
pub struct OpenEndedResponse {
    /// The quiz questions
    pub questions: Vec<String>,
    /// A reference answer for each question
    pub answers: Vec<String>,
}

/// A wire schema that can be requested from the model and validated into a [`Quiz`].
pub trait QuizSchema: DeserializeOwned + JsonSchema + Send {
    const KIND: QuizKind;

    fn into_quiz(self) -> Result<Quiz, ContractViolation>;
}

fn check_answers(questions: usize, answers: usize) -> Result<(), ContractViolation> {
    if questions == 0 {
        return Err(ContractViolation::NoQuestions);
    }
    if questions != answers {
        return Err(ContractViolation::AnswerCountMismatch { questions, answers });
    }
    Ok(())
}

impl QuizSchema for MultipleChoiceResponse {
    const KIND: QuizKind = QuizKind::MultipleChoice;

    fn into_quiz(self) -> Result<Quiz, ContractViolation> {
        check_answers(self.questions.len(), self.answers.len())?;
        if self.questions.len() != self.alternatives.len() {
            return Err(ContractViolation::OptionListCountMismatch {
                questions: self.questions.len(),
                option_lists: self.alternatives.len(),
            });
        }

        let questions = self
            .questions
            .into_iter()
            .zip(self.alternatives)
            .zip(self.answers)
            .enumerate()
            .map(|(index, ((prompt, options), key))| {
                if options.is_empty() {
                    return Err(ContractViolation::EmptyOptions { index });
                }
                let answer = resolve_option(&options, &key)
                    .ok_or(ContractViolation::UnresolvableKey { index, key })?;
                Ok(ChoiceQuestion { prompt, options, answer })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz::MultipleChoice { title: self.quiz_text, questions })
    }
}

impl QuizSchema for TrueFalseResponse {
    const KIND: QuizKind = QuizKind::TrueFalse;

    fn into_quiz(self) -> Result<Quiz, ContractViolation> {
        check_answers(self.questions.len(), self.answers.len())?;
        let questions = self
            .questions
            .into_iter()
            .zip(self.answers)
            .map(|(prompt, answer)| TrueFalseQuestion { prompt, answer })
            .collect();
        Ok(Quiz::TrueFalse { title: self.quiz_text, questions })
    }
}

impl QuizSchema for OpenEndedResponse {
    const KIND: QuizKind = QuizKind::OpenEnded;

    fn into_quiz(self) -> Result<Quiz, ContractViolation> {
        check_answers(self.questions.len(), self.answers.len())?;
        let questions = self
            .questions
            .into_iter()
            .zip(self.answers)
            .map(|(prompt, reference)| OpenQuestion { prompt, reference })
            .collect();
        Ok(Quiz::OpenEnded { questions })
    }
}

/// Positional identifier of an option: `a` for index 0.
pub fn option_letter(index: usize) -> char {
    // Past `z` there is no letter; callers only render short option lists
    char::from(b'a' + (index % 26) as u8)
}

/// Resolve an answer key entry or a user selection to an option index.
///
/// Accepts the literal option text first, then the text with any positional
/// label (`a) Paris`, `(b) Lyon`, `c. Nice`) removed from either side, then a
/// positional letter (`a`, `B`, `c)`, `(d)`, `e.`).
pub fn resolve_option(options: &[String], input: &str) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(index) = options.iter().position(|option| option.trim() == input) {
        return Some(index);
    }
    let bare = strip_label(input);
    if let Some(index) = options.iter().position(|option| strip_label(option) == bare) {
        return Some(index);
    }

    let mut chars = input.strip_prefix('(').unwrap_or(input).chars();
    let letter = chars.next()?;
    let delimited = matches!(chars.next(), None | Some(')' | '.' | ':'));
    if !letter.is_ascii_alphabetic() || !delimited {
        return None;
    }
    let index = (letter.to_ascii_lowercase() as u8 - b'a') as usize;
    (index < options.len()).then_some(index)
}

/// Drop a leading `a)`, `(a)`, `a.` or `a:` label. Text that is only a label
/// is returned unchanged.
fn strip_label(text: &str) -> &str {
    let text = text.trim();
    let unlabeled = text.strip_prefix('(').unwrap_or(text);
    let mut chars = unlabeled.char_indices();
    match (chars.next(), chars.next()) {
        (Some((_, letter)), Some((at, ')' | '.' | ':'))) if letter.is_ascii_alphabetic() => {
            let rest = unlabeled[at + 1..].trim_start();
            if rest.is_empty() { text } else { rest }
        }
        _ => text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub answer: usize,
}

impl ChoiceQuestion {
    /// `None` only when `answer` was set out of range by hand; decoded
    /// quizzes always carry a valid index.
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.answer).map(String::as_str)
    }

    pub fn resolve(&self, input: &str) -> Option<usize> {
        resolve_option(&self.options, input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrueFalseQuestion {
    pub prompt: String,
    pub answer: Truth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenQuestion {
    pub prompt: String,
    pub reference: String,
}

/// A generated quiz. One record per question, so questions, options and
/// answers always line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quiz {
    MultipleChoice { title: String, questions: Vec<ChoiceQuestion> },
    TrueFalse { title: String, questions: Vec<TrueFalseQuestion> },
    OpenEnded { questions: Vec<OpenQuestion> },
}

impl Quiz {
    pub fn kind(&self) -> QuizKind {
        match self {
            Self::MultipleChoice { .. } => QuizKind::MultipleChoice,
            Self::TrueFalse { .. } => QuizKind::TrueFalse,
            Self::OpenEnded { .. } => QuizKind::OpenEnded,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::MultipleChoice { questions, .. } => questions.len(),
            Self::TrueFalse { questions, .. } => questions.len(),
            Self::OpenEnded { questions } => questions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::MultipleChoice { title, .. } | Self::TrueFalse { title, .. } => {
                Some(title.as_str()).filter(|t| !t.trim().is_empty())
            }
            Self::OpenEnded { .. } => None,
        }
    }

    pub fn prompt(&self, index: usize) -> Option<&str> {
        match self {
            Self::MultipleChoice { questions, .. } => questions.get(index).map(|q| q.prompt.as_str()),
            Self::TrueFalse { questions, .. } => questions.get(index).map(|q| q.prompt.as_str()),
            Self::OpenEnded { questions } => questions.get(index).map(|q| q.prompt.as_str()),
        }
    }

    /// The correct answer of a question, as shown to the user.
    pub fn answer_text(&self, index: usize) -> Option<&str> {
        match self {
            Self::MultipleChoice { questions, .. } => questions.get(index).and_then(ChoiceQuestion::correct_option),
            Self::TrueFalse { questions, .. } => questions.get(index).map(|q| q.answer.as_str()),
            Self::OpenEnded { questions } => questions.get(index).map(|q| q.reference.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_letters_and_literal_text() {
        let opts = options(&["Paris", "Lyon", "Nice"]);
        assert_eq!(resolve_option(&opts, "a"), Some(0));
        assert_eq!(resolve_option(&opts, "B"), Some(1));
        assert_eq!(resolve_option(&opts, "c)"), Some(2));
        assert_eq!(resolve_option(&opts, "(b)"), Some(1));
        assert_eq!(resolve_option(&opts, " Lyon "), Some(1));
        assert_eq!(resolve_option(&opts, "d"), None);
        assert_eq!(resolve_option(&opts, "Marseille"), None);
        assert_eq!(resolve_option(&opts, ""), None);
    }

    #[test]
    fn labelled_options_match_bare_text() {
        let opts = options(&["a) Paris", "b) Lyon", "(c) Nice", "d. Lille"]);
        assert_eq!(resolve_option(&opts, "Paris"), Some(0));
        assert_eq!(resolve_option(&opts, "Nice"), Some(2));
        assert_eq!(resolve_option(&opts, "Lille"), Some(3));
        assert_eq!(resolve_option(&opts, "b) Lyon"), Some(1));
        assert_eq!(resolve_option(&opts, "b"), Some(1));

        let bare = options(&["Paris", "Lyon"]);
        assert_eq!(resolve_option(&bare, "B) Lyon"), Some(1));
        assert_eq!(strip_label("a)"), "a)");
    }

    #[test]
    fn out_of_range_answer_has_no_correct_option() {
        let question = ChoiceQuestion { prompt: "Q".into(), options: options(&["x", "y"]), answer: 5 };
        assert_eq!(question.correct_option(), None);
        let quiz = Quiz::MultipleChoice { title: String::new(), questions: vec![question] };
        assert_eq!(quiz.answer_text(0), None);
    }

    #[test]
    fn literal_text_wins_over_letter() {
        let opts = options(&["b", "a"]);
        assert_eq!(resolve_option(&opts, "a"), Some(1));
    }

    #[test]
    fn truth_accepts_strings_and_booleans() {
        let parsed: Vec<Truth> = serde_json::from_str(r#"["True", "false", true, false]"#).unwrap();
        assert_eq!(parsed, vec![Truth::True, Truth::False, Truth::True, Truth::False]);
        assert!(serde_json::from_str::<Truth>(r#""maybe""#).is_err());
        assert_eq!(serde_json::to_string(&Truth::False).unwrap(), r#""False""#);
    }

    #[test]
    fn multiple_choice_response_normalizes_keys() {
        let wire = MultipleChoiceResponse {
            quiz_text: "Geography".into(),
            questions: vec!["Capital of France?".into(), "Largest planet?".into()],
            alternatives: vec![options(&["Paris", "Lyon", "Nice"]), options(&["Mars", "Jupiter"])],
            answers: vec!["a".into(), "Jupiter".into()],
        };
        let quiz = wire.into_quiz().unwrap();
        match &quiz {
            Quiz::MultipleChoice { questions, .. } => {
                assert_eq!(questions[0].answer, 0);
                assert_eq!(questions[1].answer, 1);
                assert_eq!(questions[1].correct_option(), Some("Jupiter"));
            }
            other => panic!("expected multiple choice, got {other:?}"),
        }
        assert_eq!(quiz.title(), Some("Geography"));
        assert_eq!(quiz.answer_text(0), Some("Paris"));
    }

    #[test]
    fn mismatched_lengths_are_contract_violations() {
        let wire = MultipleChoiceResponse {
            quiz_text: String::new(),
            questions: vec!["Q1".into(), "Q2".into()],
            alternatives: vec![options(&["x", "y"])],
            answers: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            wire.into_quiz(),
            Err(ContractViolation::OptionListCountMismatch { questions: 2, option_lists: 1 })
        );

        let wire = TrueFalseResponse {
            quiz_text: String::new(),
            questions: vec!["Q1".into()],
            answers: vec![Truth::True, Truth::False],
        };
        assert_eq!(
            wire.into_quiz(),
            Err(ContractViolation::AnswerCountMismatch { questions: 1, answers: 2 })
        );
    }

    #[test]
    fn unresolvable_key_and_empty_quiz_are_rejected() {
        let wire = MultipleChoiceResponse {
            quiz_text: String::new(),
            questions: vec!["Q1".into()],
            alternatives: vec![options(&["x", "y"])],
            answers: vec!["z".into()],
        };
        assert_eq!(
            wire.into_quiz(),
            Err(ContractViolation::UnresolvableKey { index: 0, key: "z".into() })
        );

        let wire = OpenEndedResponse { questions: vec![], answers: vec![] };
        assert_eq!(wire.into_quiz(), Err(ContractViolation::NoQuestions));
    }

    #[test]
    fn empty_option_list_is_rejected() {
        let wire = MultipleChoiceResponse {
            quiz_text: String::new(),
            questions: vec!["Q1".into()],
            alternatives: vec![vec![]],
            answers: vec!["a".into()],
        };
        assert_eq!(wire.into_quiz(), Err(ContractViolation::EmptyOptions { index: 0 }));
    }
}
