use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::PIPELINE;
use super::record::Presence;

/// Cached projection of which pipeline outputs a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    TextExtracted,
    Summarized,
    TtsDone,
    ImageGenerated,
    Complete,
}

/// Status reached after the first `n` pipeline stages are present.
const PROGRESSION: [DocumentStatus; 5] = [
    DocumentStatus::Uploaded,
    DocumentStatus::TextExtracted,
    DocumentStatus::Summarized,
    DocumentStatus::TtsDone,
    DocumentStatus::ImageGenerated,
];

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::TextExtracted => "text_extracted",
            DocumentStatus::Summarized => "summarized",
            DocumentStatus::TtsDone => "tts_done",
            DocumentStatus::ImageGenerated => "image_generated",
            DocumentStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(DocumentStatus::Uploaded),
            "text_extracted" => Some(DocumentStatus::TextExtracted),
            "summarized" => Some(DocumentStatus::Summarized),
            "tts_done" => Some(DocumentStatus::TtsDone),
            "image_generated" => Some(DocumentStatus::ImageGenerated),
            "complete" => Some(DocumentStatus::Complete),
            _ => None,
        }
    }

    /// Derives the label from the longest run of present stages in pipeline
    /// order. Never yields `Complete`; that label is only set by the
    /// terminal action.
    pub fn derive(presence: Presence) -> Self {
        let done = PIPELINE
            .iter()
            .take_while(|action| presence.has(**action))
            .count();
        PROGRESSION[done]
    }

    pub fn is_consistent_with(&self, presence: Presence) -> bool {
        match self {
            DocumentStatus::Complete => presence.all(),
            other => *other == Self::derive(presence),
        }
    }

    /// Recomputes the label after a field write. A terminal label survives
    /// as long as every field is still present.
    pub fn refresh(current: DocumentStatus, presence: Presence) -> Self {
        if current == DocumentStatus::Complete && presence.all() {
            DocumentStatus::Complete
        } else {
            Self::derive(presence)
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(text: bool, summary: bool, audio: bool, image: bool) -> Presence {
        Presence {
            text,
            summary,
            audio,
            image,
        }
    }

    #[test]
    fn test_derive_follows_pipeline_prefix() {
        assert_eq!(
            DocumentStatus::derive(presence(false, false, false, false)),
            DocumentStatus::Uploaded
        );
        assert_eq!(
            DocumentStatus::derive(presence(true, false, false, false)),
            DocumentStatus::TextExtracted
        );
        assert_eq!(
            DocumentStatus::derive(presence(true, true, false, false)),
            DocumentStatus::Summarized
        );
        assert_eq!(
            DocumentStatus::derive(presence(true, true, true, false)),
            DocumentStatus::TtsDone
        );
        assert_eq!(
            DocumentStatus::derive(presence(true, true, true, true)),
            DocumentStatus::ImageGenerated
        );
    }

    #[test]
    fn test_derive_stops_at_first_gap() {
        // Image without audio does not count past the missing stage.
        assert_eq!(
            DocumentStatus::derive(presence(true, true, false, true)),
            DocumentStatus::Summarized
        );
    }

    #[test]
    fn test_complete_requires_all_fields() {
        assert!(DocumentStatus::Complete.is_consistent_with(presence(true, true, true, true)));
        assert!(!DocumentStatus::Complete.is_consistent_with(presence(true, true, true, false)));
        assert!(!DocumentStatus::Summarized.is_consistent_with(presence(true, false, false, false)));
    }

    #[test]
    fn test_refresh_keeps_terminal_label() {
        let all = presence(true, true, true, true);
        assert_eq!(
            DocumentStatus::refresh(DocumentStatus::Complete, all),
            DocumentStatus::Complete
        );
        assert_eq!(
            DocumentStatus::refresh(DocumentStatus::TtsDone, all),
            DocumentStatus::ImageGenerated
        );
    }

    #[test]
    fn test_labels_round_trip() {
        for status in PROGRESSION.iter().chain([DocumentStatus::Complete].iter()) {
            assert_eq!(DocumentStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(DocumentStatus::parse("pending"), None);
    }
}
