pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod generator;
pub mod json_utils;
pub mod locale;
pub mod quiz;
pub mod scoring;
pub mod session;
pub mod templates;

// Convenient re-exports
pub use generator::{GenerationRequest, QuizGenerator};
pub use locale::Locale;
pub use quiz::{Quiz, Truth};
pub use scoring::{Outcome, Score, UserAnswer};
pub use session::QuizSession;
pub use templates::QuizKind;
