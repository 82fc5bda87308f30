use log::debug;

use crate::feedback::FeedbackEngine;

/// Outbound spoken feedback. Implementations must be best-effort: `speak`
/// never fails and never blocks the caller on playback.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str);
}

/// Synthesizer for hosts without any speech surface. Keeps a debug trace so
/// the phrases remain observable in logs.
pub struct NullSynthesizer;

impl SpeechSynthesizer for NullSynthesizer {
    fn speak(&self, text: &str) {
        debug!("speech feedback (muted): {text}");
    }
}

/// Replaces spoken phrases with a short attention chime when the platform has
/// audio output but no text-to-speech.
pub struct CueSynthesizer {
    engine: FeedbackEngine,
}

impl CueSynthesizer {
    pub fn new(engine: FeedbackEngine) -> Self {
        Self { engine }
    }
}

impl SpeechSynthesizer for CueSynthesizer {
    fn speak(&self, text: &str) {
        debug!("speech feedback (cue): {text}");
        let _ = self.engine.play_chime(880.0);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SpeechSynthesizer;
    use std::sync::{Arc, Mutex};

    /// Records every spoken phrase for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingSynthesizer {
        pub phrases: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSynthesizer {
        pub fn spoken(&self) -> Vec<String> {
            self.phrases.lock().unwrap().clone()
        }
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&self, text: &str) {
            self.phrases.lock().unwrap().push(text.to_string());
        }
    }
}
