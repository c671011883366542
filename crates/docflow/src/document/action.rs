use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One step of the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ExtractText,
    Summarize,
    Tts,
    GenerateImage,
    Complete,
}

/// The producing actions in dependency order. Each action's preconditions are
/// exactly the outputs of every action before it.
pub const PIPELINE: [Action; 4] = [
    Action::ExtractText,
    Action::Summarize,
    Action::Tts,
    Action::GenerateImage,
];

impl Action {
    /// Every action in vocabulary order.
    pub const ALL: [Action; 5] = [
        Action::ExtractText,
        Action::Summarize,
        Action::Tts,
        Action::GenerateImage,
        Action::Complete,
    ];

    /// The wire token used in prompts, logs and the audit trail.
    pub fn token(&self) -> &'static str {
        match self {
            Action::ExtractText => "extract_text",
            Action::Summarize => "summarize",
            Action::Tts => "tts",
            Action::GenerateImage => "generate_image",
            Action::Complete => "complete",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.token() == token)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Complete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| UnknownAction(s.to_string()))
    }
}
