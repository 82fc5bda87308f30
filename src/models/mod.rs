pub mod alert;
pub mod location;
pub mod voice;

pub use alert::{
    Alert, AlertDraft, AlertPriority, AlertStatus, AlertType, NearbyUser, UserPing,
    DEFAULT_ALERT_MESSAGE,
};
pub use location::{Coordinates, ResolvedLocation};
pub use voice::{RecognitionSettings, VoiceAction, VoiceCommand};
