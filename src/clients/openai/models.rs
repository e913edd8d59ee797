#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpenAIModel {
    #[default]
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    Gpt41Mini,
    O1,
    O3Mini,
    Override(String),
}

impl OpenAIModel {
    /// Map an API model id back to a known variant, keeping unknown ids verbatim.
    pub fn from_id(id: &str) -> Self {
        match id {
            "gpt-4o" => Self::Gpt4o,
            "gpt-4o-mini" => Self::Gpt4oMini,
            "gpt-4.1" => Self::Gpt41,
            "gpt-4.1-mini" => Self::Gpt41Mini,
            "o1" => Self::O1,
            "o3-mini" => Self::O3Mini,
            other => Self::Override(other.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt41 => "gpt-4.1",
            Self::Gpt41Mini => "gpt-4.1-mini",
            Self::O1 => "o1",
            Self::O3Mini => "o3-mini",
            Self::Override(s) => s.as_str(),
        }
    }

    /// Reasoning models take `max_completion_tokens` instead of `max_tokens`.
    pub fn is_reasoning(&self) -> bool {
        matches!(self, Self::O1 | Self::O3Mini)
    }

    /// Reasoning models reject a custom temperature.
    pub fn accepts_temperature(&self) -> bool {
        !self.is_reasoning()
    }
}
