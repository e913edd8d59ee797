use std::env;
use std::time::Duration;

use crate::error::QuizError;

/// Trait for types that can retrieve their configuration key from environment variables
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking the .env file first, then the environment.
    /// Blank values count as missing.
    fn find_key() -> Option<String> {
        // First try to load .env file (silently fail if not found)
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Resolve an explicit key (e.g. a command line flag) before falling back to the environment.
    fn key_or_env(explicit: Option<String>) -> Option<String> {
        explicit
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(Self::find_key)
    }
}

pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 10;
pub const DEFAULT_QUESTIONS: u8 = 3;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// User-facing knobs of a generation request, validated before any network call.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSettings {
    pub question_count: u8,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTIONS,
            temperature: MIN_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl QuizSettings {
    #[must_use]
    pub const fn with_question_count(mut self, count: u8) -> Self {
        self.question_count = count;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        validate_question_count(self.question_count)?;
        validate_temperature(self.temperature)
    }
}

pub fn validate_question_count(count: u8) -> Result<(), QuizError> {
    if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
        Ok(())
    } else {
        Err(QuizError::InvalidQuestionCount { got: count, min: MIN_QUESTIONS, max: MAX_QUESTIONS })
    }
}

pub fn validate_temperature(temperature: f32) -> Result<(), QuizError> {
    // NaN fails the range check too
    if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(())
    } else {
        Err(QuizError::InvalidTemperature { got: temperature, min: MIN_TEMPERATURE, max: MAX_TEMPERATURE })
    }
}
