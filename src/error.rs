use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryResolverError {
    #[error("AI error: {0}")]
    Ai(#[from] AIError),
    #[error("No response from the model within {0:?}")]
    Timeout(Duration),
    #[error("JSON deserialization error: {0}. Raw response: {1}")]
    JsonDeserialization(#[source] serde_json::Error, String),
    #[error("No structured data found in response. Raw response: {0}")]
    NoStructuredData(String),
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[cfg(feature = "deepseek")]
    #[error("DeepSeek API error: {0}")]
    DeepSeek(#[from] DeepSeekError),
    #[error("Mock client error: {0}")]
    Mock(String),
}

impl AIError {
    /// True when the request never left the process because no API key was configured.
    pub fn is_missing_credential(&self) -> bool {
        match self {
            Self::OpenAI(OpenAIError::MissingCredential(_)) => true,
            #[cfg(feature = "deepseek")]
            Self::DeepSeek(DeepSeekError::MissingCredential(_)) => true,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum OpenAIError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

#[cfg(feature = "deepseek")]
#[derive(Error, Debug)]
pub enum DeepSeekError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

/// A decoded model response that breaks the quiz invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractViolation {
    #[error("Model returned no questions")]
    NoQuestions,
    #[error("Model returned {questions} questions but {answers} answers")]
    AnswerCountMismatch { questions: usize, answers: usize },
    #[error("Model returned {questions} questions but {option_lists} option lists")]
    OptionListCountMismatch { questions: usize, option_lists: usize },
    #[error("Question {index} has no options")]
    EmptyOptions { index: usize },
    #[error("Answer key {key:?} for question {index} matches none of its options")]
    UnresolvableKey { index: usize, key: String },
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Missing credential: {0}")]
    MissingCredential(#[source] AIError),
    #[error("Please provide a non-empty context (or upload a readable document)")]
    EmptyContext,
    #[error("Question count must be between {min} and {max}, got {got}")]
    InvalidQuestionCount { got: u8, min: u8, max: u8 },
    #[error("Temperature must be between {min} and {max}, got {got}")]
    InvalidTemperature { got: f32, min: f32, max: f32 },
    #[error("Quiz generation failed: {0}")]
    Service(#[source] AIError),
    #[error("Quiz generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Model output did not match the {kind} schema: {source}")]
    SchemaDecode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
        raw: String,
    },
    #[error("Model output contained no {kind} quiz")]
    NoStructuredData { kind: &'static str, raw: String },
    #[error("Model output violated the quiz contract: {0}")]
    Contract(#[from] ContractViolation),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document is empty")]
    EmptyDocument,
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("Failed to extract text: {0}")]
    Text(String),
    #[error("No content extracted from the document")]
    NoContent,
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),
    #[error("Parsing service error: {0}")]
    Service(String),
    #[error("Parsing job {job_id} did not finish after {attempts} polls")]
    JobTimeout { job_id: String, attempts: u32 },
    #[error("Parsing job {job_id} ended with status {status}")]
    JobFailed { job_id: String, status: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No quiz has been generated yet")]
    NoActiveQuiz,
    #[error("Question {index} does not exist (quiz has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("A {answer} answer cannot be recorded for a {kind} quiz")]
    AnswerKindMismatch { kind: &'static str, answer: &'static str },
    #[error("Option {option} does not exist for question {index} ({available} options)")]
    OptionOutOfRange { index: usize, option: usize, available: usize },
    #[error("{input:?} is not a valid answer for question {index}")]
    Unrecognized { index: usize, input: String },
    #[error("Please answer all the questions before submitting ({} unanswered)", .unanswered.len())]
    Incomplete { unanswered: Vec<usize> },
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Expected {expected} answers, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("Question {0} has no answer")]
    Unanswered(usize),
    #[error("Question {index} was answered with a {answer} answer in a {kind} quiz")]
    KindMismatch { index: usize, kind: &'static str, answer: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown quiz kind {0:?}; expected multiple-choice, true-false or open-ended")]
pub struct UnknownQuizKind(pub String);
