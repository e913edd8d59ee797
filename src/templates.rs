//! Static instruction templates, one per (quiz kind, locale).

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownQuizKind;
use crate::locale::Locale;

pub const COUNT_PLACEHOLDER: &str = "{num_questions}";
pub const CONTEXT_PLACEHOLDER: &str = "{quiz_context}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizKind {
    MultipleChoice,
    TrueFalse,
    OpenEnded,
}

impl QuizKind {
    pub const ALL: [QuizKind; 3] = [QuizKind::MultipleChoice, QuizKind::TrueFalse, QuizKind::OpenEnded];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::TrueFalse => "true-false",
            Self::OpenEnded => "open-ended",
        }
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizKind {
    type Err = UnknownQuizKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple-choice" => Ok(Self::MultipleChoice),
            "true-false" => Ok(Self::TrueFalse),
            "open-ended" => Ok(Self::OpenEnded),
            other => Err(UnknownQuizKind(other.to_string())),
        }
    }
}

/// A two-part instruction: the role-setting system message and the user
/// message carrying `{num_questions}` and `{quiz_context}`.
#[derive(Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

/// A template with its placeholders filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    pub fn render(&self, question_count: u8, context: &str) -> RenderedPrompt {
        // Context goes in last so placeholder-like text inside it stays verbatim
        let user = self
            .user
            .replace(COUNT_PLACEHOLDER, &question_count.to_string())
            .replace(CONTEXT_PLACEHOLDER, context);
        RenderedPrompt { system: self.system.to_string(), user }
    }
}

static MULTIPLE_CHOICE_EN: PromptTemplate = PromptTemplate {
    system: "You are a quiz engine that generates multiple-choice questions with answers according to user input specifications.",
    user: "Create a quiz with {num_questions} questions using the following context: {quiz_context}",
};

static TRUE_FALSE_EN: PromptTemplate = PromptTemplate {
    system: "You are a quiz engine that generates true-false questions with answers according to user input specifications.",
    user: "Create a quiz with {num_questions} true/false questions using the following context: {quiz_context}",
};

static OPEN_ENDED_EN: PromptTemplate = PromptTemplate {
    system: "You are a quiz engine that generates open-ended questions with answers according to user input specifications.",
    user: "Create a quiz with {num_questions} open-ended questions using the following context: {quiz_context}",
};

static MULTIPLE_CHOICE_FR: PromptTemplate = PromptTemplate {
    system: "Vous êtes un moteur de quiz qui génère des questions à choix multiples avec des réponses conformément aux spécifications de l'utilisateur.",
    user: "Créez un quiz avec {num_questions} questions en utilisant le contexte suivant : {quiz_context}",
};

static TRUE_FALSE_FR: PromptTemplate = PromptTemplate {
    system: "Vous êtes un moteur de quiz qui génère des questions Vrai/Faux avec des réponses conformément aux spécifications de l'utilisateur.",
    user: "Créez un quiz avec {num_questions} questions Vrai/Faux en utilisant le contexte suivant : {quiz_context}",
};

static OPEN_ENDED_FR: PromptTemplate = PromptTemplate {
    system: "Vous êtes un moteur de quiz qui génère des questions ouvertes avec des réponses conformément aux spécifications de l'utilisateur.",
    user: "Créez un quiz avec {num_questions} questions ouvertes en utilisant le contexte suivant : {quiz_context}",
};

static MULTIPLE_CHOICE_AR: PromptTemplate = PromptTemplate {
    system: "أنت محرك اختبارات (quiz) يقوم بإنشاء أسئلة متعددة الخيارات مع إجابات وفقًا لمتطلبات المستخدم.",
    user: "قم بإنشاء اختبار (quiz) يحتوي على {num_questions} من الأسئلة بناءً على السياق التالي: {quiz_context}",
};

static TRUE_FALSE_AR: PromptTemplate = PromptTemplate {
    system: "أنت محرك اختبارات (quiz) يقوم بإنشاء أسئلة صحيحة/خاطئة مع إجابات وفقًا لمتطلبات المستخدم.",
    user: "قم بإنشاء اختبار (quiz) يحتوي على {num_questions} من الأسئلة الصحيحة/الخاطئة بناءً على السياق التالي: {quiz_context}",
};

static OPEN_ENDED_AR: PromptTemplate = PromptTemplate {
    system: "أنت محرك اختبارات (quiz) يقوم بإنشاء أسئلة مفتوحة النهاية مع إجابات وفقًا لمتطلبات المستخدم.",
    user: "قم بإنشاء اختبار (quiz) يحتوي على {num_questions} من الأسئلة المفتوحة بناءً على السياق التالي: {quiz_context}",
};

/// Pick the instruction template for a quiz kind in a locale.
pub fn select_template(kind: QuizKind, locale: Locale) -> &'static PromptTemplate {
    match (kind, locale) {
        (QuizKind::MultipleChoice, Locale::En) => &MULTIPLE_CHOICE_EN,
        (QuizKind::MultipleChoice, Locale::Fr) => &MULTIPLE_CHOICE_FR,
        (QuizKind::MultipleChoice, Locale::Ar) => &MULTIPLE_CHOICE_AR,
        (QuizKind::TrueFalse, Locale::En) => &TRUE_FALSE_EN,
        (QuizKind::TrueFalse, Locale::Fr) => &TRUE_FALSE_FR,
        (QuizKind::TrueFalse, Locale::Ar) => &TRUE_FALSE_AR,
        (QuizKind::OpenEnded, Locale::En) => &OPEN_ENDED_EN,
        (QuizKind::OpenEnded, Locale::Fr) => &OPEN_ENDED_FR,
        (QuizKind::OpenEnded, Locale::Ar) => &OPEN_ENDED_AR,
    }
}
