use crate::models::VoiceAction;

/// Trigger phrases per action, matched by substring containment against the
/// lower-cased transcript. Order inside a set does not matter; the order of
/// the sets does — the first matching set wins, so "help me" resolves to
/// [`VoiceAction::SosAlert`] before the help set is ever consulted.
const CAPTURE_PHOTO_PHRASES: &[&str] = &[
    "take photo",
    "capture photo",
    "take picture",
    "capture picture",
    "open camera",
    "camera",
    "photo",
    "picture",
];

const SOS_ALERT_PHRASES: &[&str] = &[
    "sos",
    "emergency",
    "help me",
    "alert",
    "emergency alert",
    "send sos",
];

const REPORT_ISSUE_PHRASES: &[&str] = &[
    "report issue",
    "report problem",
    "submit issue",
    "new issue",
];

const OPEN_ISSUES_PHRASES: &[&str] = &["my issues", "view issues", "show issues", "issues list"];

const OPEN_COMMUNITY_PHRASES: &[&str] = &[
    "community",
    "community issues",
    "show community",
    "browse issues",
];

const OPEN_PROFILE_PHRASES: &[&str] = &["profile", "my profile", "user profile", "account"];

const HELP_PHRASES: &[&str] = &["help", "what can you do", "commands", "voice commands"];

const CANCEL_PHRASES: &[&str] = &["cancel", "stop", "close", "exit"];

const PHRASE_SETS: &[(VoiceAction, &[&str])] = &[
    (VoiceAction::CapturePhoto, CAPTURE_PHOTO_PHRASES),
    (VoiceAction::SosAlert, SOS_ALERT_PHRASES),
    (VoiceAction::ReportIssue, REPORT_ISSUE_PHRASES),
    (VoiceAction::OpenIssues, OPEN_ISSUES_PHRASES),
    (VoiceAction::OpenCommunity, OPEN_COMMUNITY_PHRASES),
    (VoiceAction::OpenProfile, OPEN_PROFILE_PHRASES),
    (VoiceAction::Help, HELP_PHRASES),
    (VoiceAction::Cancel, CANCEL_PHRASES),
];

/// Maps a transcript to an application intent. Pure; the transcript is
/// lower-cased before matching so callers may pass raw engine output.
pub fn map_to_action(transcript: &str) -> VoiceAction {
    let transcript = transcript.to_lowercase();

    for (action, phrases) in PHRASE_SETS {
        if phrases.iter().any(|phrase| transcript.contains(phrase)) {
            return *action;
        }
    }

    VoiceAction::Unknown
}
