/// DeepSeek chat model ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeepSeekModel {
    #[default]
    Chat,
    Reasoner,
    Override(String),
}

impl DeepSeekModel {
    pub fn from_id(id: &str) -> Self {
        match id.trim() {
            "deepseek-chat" => Self::Chat,
            "deepseek-reasoner" => Self::Reasoner,
            other => Self::Override(other.to_string()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Chat => "deepseek-chat",
            Self::Reasoner => "deepseek-reasoner",
            Self::Override(s) => s.as_str(),
        }
    }

    /// The reasoner ignores sampling parameters and has no JSON output mode.
    pub fn is_reasoner(&self) -> bool {
        matches!(self, Self::Reasoner)
    }
}
