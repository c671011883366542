//! Parser for free-text oracle replies.
//!
//! The oracle is asked for a single action token but may answer with a
//! sentence, a synonym or nothing useful at all. Parsing never fails: it
//! either finds an action and records which rule matched, or reports
//! [`Decision::Fallback`] so the caller can switch to the rule-based plan.

use serde::Serialize;

use crate::document::Action;

/// Which parsing rule produced an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// The reply contains an action token verbatim.
    Token,
    SummarizeKeyword,
    ExtractKeyword,
    SpeechKeyword,
    ImageKeyword,
    CompleteKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Parsed { action: Action, rule: MatchRule },
    Fallback,
}

impl Decision {
    pub fn action(&self) -> Option<Action> {
        match self {
            Decision::Parsed { action, .. } => Some(*action),
            Decision::Fallback => None,
        }
    }
}

struct KeywordRule {
    rule: MatchRule,
    action: Action,
    /// Every one of these must appear.
    all_of: &'static [&'static str],
    /// At least one of these must appear (ignored when empty).
    any_of: &'static [&'static str],
}

impl KeywordRule {
    fn matches(&self, reply: &str) -> bool {
        self.all_of.iter().all(|k| reply.contains(k))
            && (self.any_of.is_empty() || self.any_of.iter().any(|k| reply.contains(k)))
    }
}

/// Tried in order after no token matched.
const KEYWORD_RULES: [KeywordRule; 5] = [
    KeywordRule {
        rule: MatchRule::SummarizeKeyword,
        action: Action::Summarize,
        all_of: &["summar"],
        any_of: &[],
    },
    KeywordRule {
        rule: MatchRule::ExtractKeyword,
        action: Action::ExtractText,
        all_of: &["text", "extract"],
        any_of: &[],
    },
    KeywordRule {
        rule: MatchRule::SpeechKeyword,
        action: Action::Tts,
        all_of: &[],
        any_of: &["tts", "speech", "audio"],
    },
    KeywordRule {
        rule: MatchRule::ImageKeyword,
        action: Action::GenerateImage,
        all_of: &["image"],
        any_of: &[],
    },
    KeywordRule {
        rule: MatchRule::CompleteKeyword,
        action: Action::Complete,
        all_of: &[],
        any_of: &["complete", "done", "finish"],
    },
];

/// Maps a raw oracle reply to an action.
///
/// The reply is lowercased and trimmed, then searched for each action token
/// in vocabulary order, then for the keyword rules in order. Anything else
/// is [`Decision::Fallback`].
pub fn parse_decision(raw: &str) -> Decision {
    let reply = raw.trim().to_lowercase();

    if let Some(action) = Action::ALL.into_iter().find(|a| reply.contains(a.token())) {
        return Decision::Parsed {
            action,
            rule: MatchRule::Token,
        };
    }

    KEYWORD_RULES
        .iter()
        .find(|k| k.matches(&reply))
        .map(|k| Decision::Parsed {
            action: k.action,
            rule: k.rule,
        })
        .unwrap_or(Decision::Fallback)
}
