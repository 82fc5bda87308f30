use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{info, warn};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::models::{RecognitionSettings, VoiceCommand};
use crate::utils::registry::{CallbackRegistry, SubscriptionId};

use super::intent;
use super::synthesis::SpeechSynthesizer;

/// Engine-side failure codes, mirrored from the platform recognition API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    Other(String),
}

/// Events pushed by a [`RecognitionEngine`] while a listening session is open.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Result { transcript: String, confidence: f32 },
    Error(EngineError),
    Ended,
}

/// Platform speech-recognition capability. `start` must acknowledge or reject
/// synchronously; everything afterwards streams through the event sender.
/// Closing the sender (or emitting `Ended`) ends the session.
pub trait RecognitionEngine: Send + Sync {
    fn is_supported(&self) -> bool;
    fn configure(&self, settings: &RecognitionSettings);
    fn start(&self, events: UnboundedSender<EngineEvent>) -> anyhow::Result<()>;
    fn stop(&self);
}

/// Engine for platforms without speech recognition.
pub struct UnsupportedEngine;

impl RecognitionEngine for UnsupportedEngine {
    fn is_supported(&self) -> bool {
        false
    }

    fn configure(&self, _settings: &RecognitionSettings) {}

    fn start(&self, _events: UnboundedSender<EngineEvent>) -> anyhow::Result<()> {
        anyhow::bail!("speech recognition not supported")
    }

    fn stop(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerState {
    Idle,
    Listening,
    Error,
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("speech recognition failed to start: {0}")]
    StartFailed(String),
}

type CommandCallback = dyn Fn(&VoiceCommand) + Send + Sync;
type ErrorCallback = dyn Fn(&str) + Send + Sync;
type StatusCallback = dyn Fn(bool) + Send + Sync;

struct AdapterInner {
    engine: Arc<dyn RecognitionEngine>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    state: Mutex<RecognizerState>,
    settings: Mutex<RecognitionSettings>,
    command_subscribers: CallbackRegistry<CommandCallback>,
    error_subscribers: CallbackRegistry<ErrorCallback>,
    status_subscribers: CallbackRegistry<StatusCallback>,
}

/// Wraps the platform recognition engine: normalizes results into
/// [`VoiceCommand`]s, classifies engine errors into user-facing messages, and
/// fans command/error/status events out to subscribers. One instance per
/// application session; cheap to clone.
#[derive(Clone)]
pub struct SpeechRecognitionAdapter {
    inner: Arc<AdapterInner>,
}

impl SpeechRecognitionAdapter {
    pub fn new(engine: Arc<dyn RecognitionEngine>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            inner: Arc::new(AdapterInner {
                engine,
                synthesizer,
                state: Mutex::new(RecognizerState::Idle),
                settings: Mutex::new(RecognitionSettings::default()),
                command_subscribers: CallbackRegistry::new(),
                error_subscribers: CallbackRegistry::new(),
                status_subscribers: CallbackRegistry::new(),
            }),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.inner.engine.is_supported()
    }

    pub fn state(&self) -> RecognizerState {
        *self.inner.state.lock().unwrap()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == RecognizerState::Listening
    }

    /// Opens a listening session. Rejects synchronously when the platform has
    /// no recognition capability or the engine refuses to start; a call while
    /// already listening is a no-op. Recognition results then stream to the
    /// command subscribers until the engine ends the session.
    pub fn start_listening(&self) -> Result<(), RecognitionError> {
        if !self.inner.engine.is_supported() {
            return Err(RecognitionError::Unsupported);
        }

        {
            let state = self.inner.state.lock().unwrap();
            if *state == RecognizerState::Listening {
                return Ok(());
            }
        }

        self.inner
            .engine
            .configure(&self.inner.settings.lock().unwrap());

        let (tx, mut rx) = mpsc::unbounded_channel();
        self.inner
            .engine
            .start(tx)
            .map_err(|err| RecognitionError::StartFailed(err.to_string()))?;

        self.set_listening(true);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    EngineEvent::Result {
                        transcript,
                        confidence,
                    } => handle_result(&inner, &transcript, confidence),
                    EngineEvent::Error(err) => handle_error(&inner, err),
                    EngineEvent::Ended => {
                        handle_ended(&inner);
                        return;
                    }
                }
            }
            // Engine dropped the sender without a terminal event.
            handle_ended(&inner);
        });

        Ok(())
    }

    /// Asks the engine to stop. Only effective while listening; the state
    /// transition happens when the engine's end-of-session event arrives.
    pub fn stop_listening(&self) {
        if self.is_listening() {
            self.inner.engine.stop();
        }
    }

    /// Replaces the recognition settings. While idle the engine is
    /// reconfigured immediately; a listening session keeps its settings until
    /// the next `start_listening`.
    pub fn update_settings(&self, settings: RecognitionSettings) {
        *self.inner.settings.lock().unwrap() = settings.clone();
        if !self.is_listening() {
            self.inner.engine.configure(&settings);
        }
    }

    pub fn settings(&self) -> RecognitionSettings {
        self.inner.settings.lock().unwrap().clone()
    }

    /// Best-effort spoken feedback; never fails.
    pub fn speak(&self, text: &str) {
        self.inner.synthesizer.speak(text);
    }

    pub fn on_command(
        &self,
        callback: impl Fn(&VoiceCommand) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.command_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_command(&self, id: SubscriptionId) -> bool {
        self.inner.command_subscribers.remove(id)
    }

    pub fn on_error(&self, callback: impl Fn(&str) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.error_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_error(&self, id: SubscriptionId) -> bool {
        self.inner.error_subscribers.remove(id)
    }

    pub fn on_status(&self, callback: impl Fn(bool) + Send + Sync + 'static) -> SubscriptionId {
        self.inner.status_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_status(&self, id: SubscriptionId) -> bool {
        self.inner.status_subscribers.remove(id)
    }

    fn set_listening(&self, listening: bool) {
        *self.inner.state.lock().unwrap() = if listening {
            RecognizerState::Listening
        } else {
            RecognizerState::Idle
        };
        self.inner
            .status_subscribers
            .notify(|callback| callback(listening));
    }
}

fn handle_result(inner: &Arc<AdapterInner>, transcript: &str, confidence: f32) {
    let transcript = transcript.to_lowercase().trim().to_string();
    let command = VoiceCommand {
        action: intent::map_to_action(&transcript),
        confidence,
        transcript,
        timestamp: Utc::now().timestamp_millis(),
    };

    info!(
        "voice command recognized: \"{}\" -> {} ({:.2})",
        command.transcript,
        command.action.as_str(),
        command.confidence
    );
    inner.command_subscribers.notify(|callback| callback(&command));
}

fn handle_error(inner: &Arc<AdapterInner>, err: EngineError) {
    let message = classify_engine_error(&err);
    warn!("speech recognition error: {message}");

    *inner.state.lock().unwrap() = RecognizerState::Error;
    inner.status_subscribers.notify(|callback| callback(false));
    inner.error_subscribers.notify(|callback| callback(message.as_str()));
}

fn handle_ended(inner: &Arc<AdapterInner>) {
    let mut state = inner.state.lock().unwrap();
    // An errored session stays in the error state until the next start.
    if *state == RecognizerState::Error {
        return;
    }
    *state = RecognizerState::Idle;
    drop(state);

    inner.status_subscribers.notify(|callback| callback(false));
}

fn classify_engine_error(err: &EngineError) -> String {
    match err {
        EngineError::NoSpeech => "No speech detected. Please try again.".to_string(),
        EngineError::AudioCapture => {
            "Microphone not accessible. Please check permissions.".to_string()
        }
        EngineError::NotAllowed => {
            "Microphone access denied. Please enable microphone permissions.".to_string()
        }
        EngineError::Network => "Network error occurred during voice recognition.".to_string(),
        EngineError::Other(code) => format!("Voice recognition error: {code}"),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedEngine;
    use super::*;
    use crate::models::VoiceAction;
    use crate::voice::synthesis::test_support::RecordingSynthesizer;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fn adapter_with(engine: Arc<ScriptedEngine>) -> SpeechRecognitionAdapter {
        SpeechRecognitionAdapter::new(engine, Arc::new(RecordingSynthesizer::default()))
    }

    #[tokio::test]
    async fn unsupported_engine_rejects_start() {
        let adapter = SpeechRecognitionAdapter::new(
            Arc::new(UnsupportedEngine),
            Arc::new(RecordingSynthesizer::default()),
        );

        let err = adapter.start_listening().unwrap_err();
        assert!(matches!(err, RecognitionError::Unsupported));
        assert_eq!(adapter.state(), RecognizerState::Idle);
    }

    #[tokio::test]
    async fn results_become_normalized_commands() {
        let engine = ScriptedEngine::new();
        let adapter = adapter_with(engine.clone());

        let received: Arc<Mutex<Vec<VoiceCommand>>> = Arc::new(Mutex::new(Vec::new()));
        let received_clone = received.clone();
        adapter.on_command(move |command| {
            received_clone.lock().unwrap().push(command.clone());
        });

        adapter.start_listening().unwrap();
        assert!(adapter.is_listening());

        engine.emit(EngineEvent::Result {
            transcript: "  Please Send SOS now ".to_string(),
            confidence: 0.87,
        });
        settle().await;

        let commands = received.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].transcript, "please send sos now");
        assert_eq!(commands[0].action, VoiceAction::SosAlert);
        assert_eq!(commands[0].confidence, 0.87);
        // A result does not end the session.
        assert!(adapter.is_listening());
    }

    #[tokio::test]
    async fn engine_errors_are_classified_and_latch_the_error_state() {
        let engine = ScriptedEngine::new();
        let adapter = adapter_with(engine.clone());

        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = errors.clone();
        adapter.on_error(move |message| {
            errors_clone.lock().unwrap().push(message.to_string());
        });

        adapter.start_listening().unwrap();
        engine.emit(EngineEvent::Error(EngineError::NotAllowed));
        engine.emit(EngineEvent::Ended);
        settle().await;

        assert_eq!(
            errors.lock().unwrap().as_slice(),
            ["Microphone access denied. Please enable microphone permissions."]
        );
        assert_eq!(adapter.state(), RecognizerState::Error);
    }

    #[tokio::test]
    async fn natural_end_returns_to_idle_and_notifies_status() {
        let engine = ScriptedEngine::new();
        let adapter = adapter_with(engine.clone());

        let statuses: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
        let statuses_clone = statuses.clone();
        adapter.on_status(move |listening| {
            statuses_clone.lock().unwrap().push(listening);
        });

        adapter.start_listening().unwrap();
        engine.emit(EngineEvent::Ended);
        settle().await;

        assert_eq!(statuses.lock().unwrap().as_slice(), [true, false]);
        assert_eq!(adapter.state(), RecognizerState::Idle);
    }

    #[tokio::test]
    async fn stop_listening_closes_the_session() {
        let engine = ScriptedEngine::new();
        let adapter = adapter_with(engine.clone());

        adapter.start_listening().unwrap();
        adapter.stop_listening();
        settle().await;

        assert_eq!(adapter.state(), RecognizerState::Idle);

        // A second stop while idle is a no-op.
        adapter.stop_listening();
        assert_eq!(adapter.state(), RecognizerState::Idle);
    }

    #[tokio::test]
    async fn settings_reconfigure_the_engine_while_idle() {
        let engine = ScriptedEngine::new();
        let adapter = adapter_with(engine.clone());

        let mut settings = RecognitionSettings::default();
        settings.language = "en-IN".to_string();
        settings.continuous = true;
        adapter.update_settings(settings.clone());

        assert_eq!(engine.configured.lock().unwrap().last(), Some(&settings));
        assert_eq!(adapter.settings(), settings);
    }
}
