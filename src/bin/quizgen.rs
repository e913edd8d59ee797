use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quiz_forge::clients::openai::models::OpenAIModel;
use quiz_forge::clients::{FlexibleClient, OpenAIClient, OpenAIConfig};
use quiz_forge::config::{KeyFromEnv, QuizSettings, DEFAULT_QUESTIONS};
use quiz_forge::core::ResolverConfig;
use quiz_forge::error::SessionError;
use quiz_forge::extract::{
    extract_or_empty, DocumentExtractor, LlamaParseConfig, LlamaParseExtractor, PdfTextExtractor,
    NO_CONTENT_SENTINEL,
};
use quiz_forge::locale::{FixedLocale, Locale};
use quiz_forge::quiz::{option_letter, Quiz};
use quiz_forge::scoring::Outcome;
use quiz_forge::session::Submission;
use quiz_forge::{GenerationRequest, QuizGenerator, QuizKind, QuizSession};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Provider {
    Openai,
    #[cfg(feature = "deepseek")]
    Deepseek,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Extraction {
    /// Local PDF text extraction
    Standard,
    /// LlamaParse service (needs LLAMA_CLOUD_API_KEY)
    Llamaparse,
}

#[derive(Parser)]
#[command(author, version, about = "Generate a quiz from a document and take it in the terminal", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    OPENAI_API_KEY       API key for the OpenAI provider
    DEEPSEEK_API_KEY     API key for the DeepSeek provider
    LLAMA_CLOUD_API_KEY  API key for --extraction llamaparse
    RUST_LOG             Log filter [default: quiz_forge=info]

EXAMPLES:
    quizgen notes.pdf                               # Three multiple-choice questions
    quizgen notes.pdf --kind true-false -n 5        # Five true/false questions
    quizgen chapter.txt --kind open-ended --locale fr
    quizgen scan.pdf --extraction llamaparse")]
struct Args {
    /// PDF document, or a plain-text file used as the quiz context as is
    input: PathBuf,

    /// Quiz kind: multiple-choice, true-false, open-ended
    #[arg(short, long, default_value = "multiple-choice")]
    kind: QuizKind,

    /// Number of questions (1-10)
    #[arg(short = 'n', long, default_value_t = DEFAULT_QUESTIONS)]
    questions: u8,

    /// Sampling temperature (0.0-2.0)
    #[arg(short, long, default_value_t = 0.0)]
    temperature: f32,

    /// Model id [default: provider default]
    #[arg(short, long)]
    model: Option<String>,

    /// Force the template locale (en, fr, ar) instead of detecting it from the text
    #[arg(long)]
    locale: Option<String>,

    #[arg(long, value_enum, default_value = "openai")]
    provider: Provider,

    #[arg(long, value_enum, default_value = "standard")]
    extraction: Extraction,

    /// Seconds to wait for the model before giving up
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Provider API key, overrides the environment
    #[arg(long)]
    api_key: Option<String>,

    /// LlamaParse API key, overrides the environment
    #[arg(long)]
    llama_api_key: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quiz_forge=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn load_context(args: &Args) -> Result<String> {
    if !is_pdf(&args.input) {
        return std::fs::read_to_string(&args.input)
            .with_context(|| format!("Could not read {}", args.input.display()));
    }

    let bytes = std::fs::read(&args.input).with_context(|| format!("Could not read {}", args.input.display()))?;
    let extractor: Box<dyn DocumentExtractor> = match args.extraction {
        Extraction::Standard => Box::new(PdfTextExtractor),
        Extraction::Llamaparse => {
            let file_name = args
                .input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string());
            Box::new(LlamaParseExtractor::new(LlamaParseConfig {
                api_key: LlamaParseExtractor::key_or_env(args.llama_api_key.clone()).unwrap_or_default(),
                file_name,
                ..LlamaParseConfig::default()
            }))
        }
    };
    Ok(extract_or_empty(extractor.as_ref(), &bytes).await)
}

fn build_client(args: &Args, timeout: Duration) -> FlexibleClient {
    match args.provider {
        Provider::Openai => {
            let mut config = OpenAIConfig {
                api_key: OpenAIClient::key_or_env(args.api_key.clone()).unwrap_or_default(),
                request_timeout: timeout,
                ..OpenAIConfig::default()
            };
            if let Some(model) = &args.model {
                config = config.with_model(OpenAIModel::from_id(model));
            }
            FlexibleClient::openai(config)
        }
        #[cfg(feature = "deepseek")]
        Provider::Deepseek => {
            use quiz_forge::clients::deepseek::models::DeepSeekModel;
            use quiz_forge::clients::{DeepSeekClient, DeepSeekConfig};

            let mut config = DeepSeekConfig {
                api_key: DeepSeekClient::key_or_env(args.api_key.clone()).unwrap_or_default(),
                request_timeout: timeout,
                ..DeepSeekConfig::default()
            };
            if let Some(model) = &args.model {
                config.model = DeepSeekModel::from_id(model);
            }
            FlexibleClient::deepseek(config)
        }
    }
}

enum Key {
    Pick(char),
    Skip,
    Abort,
}

/// Wait for one of `valid` (lowercased), Enter/Esc to skip, or Ctrl-C.
fn read_single_key(valid: &[char]) -> io::Result<Key> {
    terminal::enable_raw_mode()?;

    let result = loop {
        match event::read() {
            Ok(Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. })) => match code {
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break Ok(Key::Abort),
                KeyCode::Char(c) if valid.contains(&c.to_ascii_lowercase()) => {
                    break Ok(Key::Pick(c.to_ascii_lowercase()))
                }
                KeyCode::Enter | KeyCode::Esc => break Ok(Key::Skip),
                _ => continue,
            },
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };

    terminal::disable_raw_mode()?;
    result
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        bail!("Input closed before the quiz was finished");
    }
    Ok(input.trim().to_string())
}

/// Single keystroke when the terminal allows it, a whole line otherwise.
fn read_choice(valid: &[char]) -> Result<String> {
    match read_single_key(valid) {
        Ok(Key::Pick(c)) => {
            println!("{c}");
            Ok(c.to_string())
        }
        Ok(Key::Skip) => {
            println!();
            Ok(String::new())
        }
        Ok(Key::Abort) => {
            println!();
            bail!("Quiz aborted");
        }
        Err(_) => read_line(),
    }
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush()?;
    Ok(())
}

fn ask_question(session: &mut QuizSession, index: usize) -> Result<()> {
    let Some(quiz) = session.quiz() else {
        bail!("No quiz has been generated");
    };
    let total = quiz.len();

    let input = match quiz {
        Quiz::MultipleChoice { questions, .. } => {
            let question = &questions[index];
            println!("\n{}. {}", index + 1, question.prompt);
            let letters: Vec<char> = (0..question.options.len()).map(option_letter).collect();
            for (letter, option) in letters.iter().zip(&question.options) {
                println!("   {letter}) {option}");
            }
            prompt(&format!("Answer [{}-{}]: ", letters[0], letters[letters.len() - 1]))?;
            read_choice(&letters)?
        }
        Quiz::TrueFalse { questions, .. } => {
            println!("\n{}. {}", index + 1, questions[index].prompt);
            prompt("True or False? [t/f]: ")?;
            match read_choice(&['t', 'f'])?.as_str() {
                "t" => "True".to_string(),
                "f" => "False".to_string(),
                other => other.to_string(),
            }
        }
        Quiz::OpenEnded { questions } => {
            println!("\n{}. {}", index + 1, questions[index].prompt);
            prompt("Your answer: ")?;
            read_line()?
        }
    };

    if input.trim().is_empty() {
        session.clear_answer(index)?;
        println!("   (skipped, question {} of {total})", index + 1);
        return Ok(());
    }
    match session.record_input(index, &input) {
        Ok(()) => Ok(()),
        Err(e @ SessionError::Unrecognized { .. }) => {
            println!("   {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn report(quiz: &Quiz, submission: &Submission) {
    println!();
    match &submission.outcome {
        Outcome::Scored { score, per_question } => {
            for (index, hit) in per_question.iter().enumerate() {
                let mark = if *hit { "correct" } else { "wrong" };
                let answer = quiz.answer_text(index).unwrap_or_default();
                println!("{}. {mark} (answer: {answer})", index + 1);
            }
            println!("\nScore: {score}");
        }
        Outcome::SelfAssessment(reviews) => {
            println!("Open-ended answers are not scored. Compare with the reference answers:");
            for (index, review) in reviews.iter().enumerate() {
                println!("\n{}. {}", index + 1, review.prompt);
                println!("   You:       {}", review.given);
                println!("   Reference: {}", review.reference);
            }
        }
    }
    println!("\nSubmitted at {}", submission.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn take_quiz(session: &mut QuizSession) -> Result<()> {
    let Some(quiz) = session.quiz() else {
        bail!("No quiz has been generated");
    };
    if let Some(title) = quiz.title() {
        println!("\n{title}");
    }
    for index in 0..quiz.len() {
        ask_question(session, index)?;
    }

    loop {
        match session.submit() {
            Ok(submission) => {
                if let Some(quiz) = session.quiz() {
                    report(quiz, &submission);
                }
                return Ok(());
            }
            Err(SessionError::Incomplete { unanswered }) => {
                println!("\nPlease answer all questions before submitting ({} left).", unanswered.len());
                for index in unanswered {
                    ask_question(session, index)?;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let args = Args::parse();

    let settings = QuizSettings::default()
        .with_question_count(args.questions)
        .with_temperature(args.temperature)
        .with_timeout(Duration::from_secs(args.timeout));
    settings.validate()?;

    let context = load_context(&args).await?;
    if context.trim().is_empty() {
        println!("{NO_CONTENT_SENTINEL}");
    } else {
        info!(chars = context.len(), "Loaded quiz context");
    }

    let client = build_client(&args, settings.timeout);
    let mut generator = QuizGenerator::new(client, ResolverConfig { timeout: settings.timeout });
    if let Some(tag) = &args.locale {
        let locale = Locale::from_tag(tag);
        info!(requested = %tag, %locale, "Using fixed template locale");
        generator = generator.with_locale_resolver(Box::new(FixedLocale(locale)));
    }

    println!("Generating {} {} question(s)...", settings.question_count, args.kind);
    let request = GenerationRequest::from_settings(args.kind, context, &settings);
    let mut session = QuizSession::new();
    generator
        .generate_into(&mut session, &request)
        .await
        .context("Quiz generation failed")?;

    take_quiz(&mut session)
}
