//! Quiz generation: validate the request, pick and fill the template, ask the
//! model for the kind's schema and validate the answer into a [`Quiz`].

use tracing::{info, instrument, warn};

use crate::config::{validate_question_count, validate_temperature, QuizSettings, DEFAULT_QUESTIONS};
use crate::core::{ChatRequest, LowLevelClient, QueryResolver, ResolverConfig};
use crate::error::{QueryResolverError, QuizError};
use crate::locale::{LanguageDetector, LocaleResolver};
use crate::quiz::{MultipleChoiceResponse, OpenEndedResponse, Quiz, QuizSchema, TrueFalseResponse};
use crate::session::QuizSession;
use crate::templates::{select_template, QuizKind};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: QuizKind,
    pub question_count: u8,
    pub context: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(kind: QuizKind, context: impl Into<String>) -> Self {
        Self { kind, question_count: DEFAULT_QUESTIONS, context: context.into(), temperature: 0.0 }
    }

    /// Take count and temperature from validated-elsewhere settings.
    pub fn from_settings(kind: QuizKind, context: impl Into<String>, settings: &QuizSettings) -> Self {
        Self::new(kind, context)
            .with_question_count(settings.question_count)
            .with_temperature(settings.temperature)
    }

    #[must_use]
    pub fn with_question_count(mut self, question_count: u8) -> Self {
        self.question_count = question_count;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug)]
pub struct QuizGenerator<C: LowLevelClient> {
    resolver: QueryResolver<C>,
    locales: Box<dyn LocaleResolver>,
}

impl<C: LowLevelClient> QuizGenerator<C> {
    /// Generator with auto-detected locale.
    pub fn new(client: C, config: ResolverConfig) -> Self {
        Self {
            resolver: QueryResolver::new(client, config),
            locales: Box::new(LanguageDetector),
        }
    }

    #[must_use]
    pub fn with_locale_resolver(mut self, locales: Box<dyn LocaleResolver>) -> Self {
        self.locales = locales;
        self
    }

    pub fn client(&self) -> &C {
        self.resolver.client()
    }

    /// Validate a request and build the chat messages for it. No network access.
    pub fn prepare(&self, request: &GenerationRequest) -> Result<ChatRequest, QuizError> {
        self.resolver
            .client()
            .ensure_credentials()
            .map_err(QuizError::MissingCredential)?;
        validate_question_count(request.question_count)?;
        validate_temperature(request.temperature)?;

        let context = request.context.trim();
        if context.is_empty() {
            return Err(QuizError::EmptyContext);
        }

        let locale = self.locales.resolve(context);
        let rendered = select_template(request.kind, locale).render(request.question_count, context);
        info!(kind = %request.kind, %locale, count = request.question_count, "Prepared quiz prompt");

        Ok(ChatRequest::new(rendered.system, rendered.user)
            .with_temperature(request.temperature)
            .with_schema_name(request.kind.as_str()))
    }

    /// Generate a quiz. On any error nothing has been committed anywhere.
    #[instrument(target = "quiz_forge::generator", skip(self, request), fields(kind = %request.kind, count = request.question_count))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Quiz, QuizError> {
        let chat = self.prepare(request)?;
        let quiz = match request.kind {
            QuizKind::MultipleChoice => self.request_quiz::<MultipleChoiceResponse>(chat).await?,
            QuizKind::TrueFalse => self.request_quiz::<TrueFalseResponse>(chat).await?,
            QuizKind::OpenEnded => self.request_quiz::<OpenEndedResponse>(chat).await?,
        };

        if quiz.len() != usize::from(request.question_count) {
            warn!(requested = request.question_count, received = quiz.len(), "Model returned a different question count");
        }
        info!(questions = quiz.len(), "Quiz generated");
        Ok(quiz)
    }

    /// Generate and, only on success, start the quiz in `session`.
    pub async fn generate_into(&self, session: &mut QuizSession, request: &GenerationRequest) -> Result<(), QuizError> {
        let quiz = self.generate(request).await?;
        session.start(quiz);
        Ok(())
    }

    async fn request_quiz<W: QuizSchema>(&self, chat: ChatRequest) -> Result<Quiz, QuizError> {
        let kind = W::KIND.as_str();
        let wire = self.resolver.query::<W>(chat).await.map_err(|e| match e {
            QueryResolverError::Ai(ai) if ai.is_missing_credential() => QuizError::MissingCredential(ai),
            QueryResolverError::Ai(ai) => QuizError::Service(ai),
            QueryResolverError::Timeout(after) => QuizError::Timeout(after),
            QueryResolverError::JsonDeserialization(source, raw) => QuizError::SchemaDecode { kind, source, raw },
            QueryResolverError::NoStructuredData(raw) => QuizError::NoStructuredData { kind, raw },
        })?;

        wire.into_quiz().map_err(|violation| {
            warn!(%violation, "Decoded quiz broke the contract");
            QuizError::Contract(violation)
        })
    }
}
