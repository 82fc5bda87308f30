use serde::{Deserialize, Serialize};

/// The closed set of application intents a transcript can resolve to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VoiceAction {
    CapturePhoto,
    SosAlert,
    ReportIssue,
    OpenIssues,
    OpenCommunity,
    OpenProfile,
    Help,
    Cancel,
    Unknown,
}

impl VoiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceAction::CapturePhoto => "capture_photo",
            VoiceAction::SosAlert => "sos_alert",
            VoiceAction::ReportIssue => "report_issue",
            VoiceAction::OpenIssues => "open_issues",
            VoiceAction::OpenCommunity => "open_community",
            VoiceAction::OpenProfile => "open_profile",
            VoiceAction::Help => "help",
            VoiceAction::Cancel => "cancel",
            VoiceAction::Unknown => "unknown",
        }
    }
}

/// Result of one recognition event. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommand {
    /// Lower-cased, trimmed recognized text.
    pub transcript: String,
    /// Engine-reported score, passed through untouched.
    pub confidence: f32,
    pub action: VoiceAction,
    /// Epoch milliseconds of recognition.
    pub timestamp: i64,
}

/// Configuration held by the recognition adapter and pushed into the engine
/// whenever it is reconfigured while idle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionSettings {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub max_alternatives: u32,
    pub timeout_ms: u64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
            timeout_ms: 5000,
        }
    }
}
