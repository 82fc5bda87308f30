use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{VoiceAction, VoiceCommand};
use crate::utils::registry::{CallbackRegistry, SubscriptionId};

use super::recognizer::SpeechRecognitionAdapter;
use super::synthesis::SpeechSynthesizer;

/// Actions gated behind an explicit yes/no confirmation.
const CRITICAL_ACTIONS: &[VoiceAction] = &[VoiceAction::SosAlert, VoiceAction::CapturePhoto];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationResponse {
    Yes,
    No,
}

/// Runtime configuration. Changes apply to the next command, never
/// retroactively to a confirmation already pending.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub enable_feedback: bool,
    pub enable_confirmation: bool,
    pub confirmation_timeout_ms: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enable_feedback: true,
            enable_confirmation: true,
            confirmation_timeout_ms: 3000,
        }
    }
}

/// One-way notification emitted whenever a voice command executes; the hosting
/// application routes these to camera, SOS modal, navigation, or help display.
#[derive(Debug, Clone)]
pub struct CommandDispatch {
    pub action: VoiceAction,
    pub command: VoiceCommand,
}

/// Handler metadata surfaced for help and UI display.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub action: VoiceAction,
    pub description: String,
    pub examples: Vec<String>,
}

type HandlerFn = dyn Fn(&VoiceCommand) -> anyhow::Result<()> + Send + Sync;
type DispatchCallback = dyn Fn(&CommandDispatch) + Send + Sync;
type PendingCallback = dyn Fn(Option<&VoiceCommand>) + Send + Sync;

struct RegisteredCommand {
    info: CommandInfo,
    handler: Arc<HandlerFn>,
}

struct PendingConfirmation {
    token: Uuid,
    command: VoiceCommand,
    timeout: JoinHandle<()>,
}

struct ProcessorInner {
    handlers: Mutex<HashMap<VoiceAction, RegisteredCommand>>,
    config: Mutex<ProcessorConfig>,
    pending: Mutex<Option<PendingConfirmation>>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    dispatch_subscribers: CallbackRegistry<DispatchCallback>,
    pending_subscribers: CallbackRegistry<PendingCallback>,
}

/// Consumes recognized commands, gates the critical ones behind a timed yes/no
/// confirmation, and dispatches resolved actions through the handler registry.
/// One instance per application session; cheap to clone.
#[derive(Clone)]
pub struct VoiceCommandProcessor {
    inner: Arc<ProcessorInner>,
}

impl VoiceCommandProcessor {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        let processor = Self {
            inner: Arc::new(ProcessorInner {
                handlers: Mutex::new(HashMap::new()),
                config: Mutex::new(ProcessorConfig::default()),
                pending: Mutex::new(None),
                synthesizer,
                dispatch_subscribers: CallbackRegistry::new(),
                pending_subscribers: CallbackRegistry::new(),
            }),
        };
        processor.install_default_handlers();
        processor
    }

    /// Routes the adapter's command stream into this processor. Returns the
    /// adapter-side subscription id.
    pub fn attach(&self, adapter: &SpeechRecognitionAdapter) -> SubscriptionId {
        let processor = self.clone();
        adapter.on_command(move |command| processor.process_command(command.clone()))
    }

    /// Entry point for one recognized command, evaluated against the current
    /// state: while a confirmation is pending a new critical command replaces
    /// it (single-slot semantics, no queueing).
    pub fn process_command(&self, command: VoiceCommand) {
        debug!(
            "processing voice command \"{}\" ({})",
            command.transcript,
            command.action.as_str()
        );

        if command.action == VoiceAction::Unknown {
            info!("unrecognized voice command: \"{}\"", command.transcript);
            self.speak_if_enabled(
                "Sorry, I didn't understand that command. Say help to see available commands.",
            );
            return;
        }

        if !self.inner.handlers.lock().unwrap().contains_key(&command.action) {
            warn!("no handler registered for action {}", command.action.as_str());
            return;
        }

        if self.requires_confirmation(command.action) {
            self.request_confirmation(command);
        } else {
            self.execute(&command);
        }
    }

    /// Resolves the pending confirmation. A no-op when nothing is pending.
    pub fn resolve_confirmation(&self, response: ConfirmationResponse) {
        let Some(pending) = self.inner.pending.lock().unwrap().take() else {
            debug!("confirmation response with nothing pending, ignoring");
            return;
        };
        pending.timeout.abort();
        self.notify_pending(None);

        match response {
            ConfirmationResponse::Yes => self.execute(&pending.command),
            ConfirmationResponse::No => self.speak_if_enabled("Command cancelled"),
        }
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.inner.pending.lock().unwrap().is_some()
    }

    pub fn pending_confirmation(&self) -> Option<VoiceCommand> {
        self.inner
            .pending
            .lock()
            .unwrap()
            .as_ref()
            .map(|pending| pending.command.clone())
    }

    /// Fires exactly when the pending-confirmation slot changes: armed,
    /// resolved, replaced, or timed out.
    pub fn on_pending_change(
        &self,
        callback: impl Fn(Option<&VoiceCommand>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.pending_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_pending_change(&self, id: SubscriptionId) -> bool {
        self.inner.pending_subscribers.remove(id)
    }

    /// One-way execution notifications for the hosting application.
    pub fn on_dispatch(
        &self,
        callback: impl Fn(&CommandDispatch) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.dispatch_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_dispatch(&self, id: SubscriptionId) -> bool {
        self.inner.dispatch_subscribers.remove(id)
    }

    pub fn register_handler(
        &self,
        action: VoiceAction,
        description: &str,
        examples: &[&str],
        handler: impl Fn(&VoiceCommand) -> anyhow::Result<()> + Send + Sync + 'static,
    ) {
        let registration = RegisteredCommand {
            info: CommandInfo {
                action,
                description: description.to_string(),
                examples: examples.iter().map(|s| s.to_string()).collect(),
            },
            handler: Arc::new(handler),
        };
        self.inner.handlers.lock().unwrap().insert(action, registration);
    }

    pub fn unregister_handler(&self, action: VoiceAction) -> bool {
        self.inner.handlers.lock().unwrap().remove(&action).is_some()
    }

    /// Current registry contents for help/UI display.
    pub fn available_commands(&self) -> Vec<CommandInfo> {
        let handlers = self.inner.handlers.lock().unwrap();
        let mut commands: Vec<CommandInfo> =
            handlers.values().map(|entry| entry.info.clone()).collect();
        commands.sort_by_key(|info| info.action.as_str());
        commands
    }

    pub fn config(&self) -> ProcessorConfig {
        self.inner.config.lock().unwrap().clone()
    }

    pub fn set_config(&self, config: ProcessorConfig) {
        *self.inner.config.lock().unwrap() = config;
    }

    fn requires_confirmation(&self, action: VoiceAction) -> bool {
        CRITICAL_ACTIONS.contains(&action) && self.inner.config.lock().unwrap().enable_confirmation
    }

    fn request_confirmation(&self, command: VoiceCommand) {
        let token = Uuid::new_v4();
        let timeout_ms = self.inner.config.lock().unwrap().confirmation_timeout_ms;

        let processor = self.clone();
        let timeout = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            processor.expire_confirmation(token);
        });

        let action = command.action;
        {
            let mut pending = self.inner.pending.lock().unwrap();
            if let Some(previous) = pending.take() {
                info!(
                    "replacing pending confirmation for {}",
                    previous.command.action.as_str()
                );
                previous.timeout.abort();
            }
            *pending = Some(PendingConfirmation {
                token,
                command: command.clone(),
                timeout,
            });
        }

        self.notify_pending(Some(&command));
        self.speak_if_enabled(confirmation_text(action));
    }

    /// Called by the armed timeout task; the token guards against clearing a
    /// newer confirmation that replaced the one this timer belonged to.
    fn expire_confirmation(&self, token: Uuid) {
        {
            let mut pending = self.inner.pending.lock().unwrap();
            match pending.as_ref() {
                Some(current) if current.token == token => {
                    *pending = None;
                }
                _ => return,
            }
        }

        info!("pending confirmation expired");
        self.notify_pending(None);
        self.speak_if_enabled("Command cancelled due to timeout");
    }

    fn execute(&self, command: &VoiceCommand) {
        let handler = {
            let handlers = self.inner.handlers.lock().unwrap();
            match handlers.get(&command.action) {
                Some(entry) => entry.handler.clone(),
                None => {
                    warn!("no handler registered for action {}", command.action.as_str());
                    return;
                }
            }
        };

        match (*handler)(command) {
            Ok(()) => self.speak_if_enabled(success_text(command.action)),
            Err(err) => {
                error!(
                    "voice command handler for {} failed: {err:#}",
                    command.action.as_str()
                );
                self.speak_if_enabled("Sorry, there was an error executing that command");
            }
        }
    }

    fn speak_if_enabled(&self, text: &str) {
        if self.inner.config.lock().unwrap().enable_feedback {
            self.inner.synthesizer.speak(text);
        }
    }

    fn notify_pending(&self, command: Option<&VoiceCommand>) {
        self.inner
            .pending_subscribers
            .notify(|callback| callback(command));
    }

    /// Installs the dispatch-forwarding defaults for every action. Handlers
    /// hold a weak reference so the registry does not keep its own processor
    /// alive.
    fn install_default_handlers(&self) {
        let defaults: &[(VoiceAction, &str, &[&str])] = &[
            (
                VoiceAction::CapturePhoto,
                "Take a photo using the camera",
                &["take photo", "capture photo", "open camera", "camera"],
            ),
            (
                VoiceAction::SosAlert,
                "Send emergency SOS alert",
                &["sos", "emergency", "help me", "send alert"],
            ),
            (
                VoiceAction::ReportIssue,
                "Open issue reporting form",
                &["report issue", "submit issue", "new issue"],
            ),
            (
                VoiceAction::OpenIssues,
                "View my reported issues",
                &["my issues", "view issues", "show issues"],
            ),
            (
                VoiceAction::OpenCommunity,
                "Browse community issues",
                &["community", "community issues", "browse issues"],
            ),
            (
                VoiceAction::OpenProfile,
                "Open user profile",
                &["profile", "my profile", "account"],
            ),
            (
                VoiceAction::Help,
                "Show available voice commands",
                &["help", "what can you do", "commands"],
            ),
            (
                VoiceAction::Cancel,
                "Cancel current operation",
                &["cancel", "stop", "close", "exit"],
            ),
        ];

        for &(action, description, examples) in defaults {
            let weak: Weak<ProcessorInner> = Arc::downgrade(&self.inner);
            self.register_handler(action, description, examples, move |command| {
                let Some(inner) = weak.upgrade() else {
                    return Ok(());
                };

                // The cancel command also clears any pending confirmation.
                if action == VoiceAction::Cancel {
                    let cleared = {
                        let mut pending = inner.pending.lock().unwrap();
                        pending.take().map(|previous| previous.timeout.abort()).is_some()
                    };
                    if cleared {
                        inner.pending_subscribers.notify(|callback| callback(None));
                    }
                }

                let dispatch = CommandDispatch {
                    action,
                    command: command.clone(),
                };
                inner
                    .dispatch_subscribers
                    .notify(|callback| callback(&dispatch));
                Ok(())
            });
        }
    }
}

fn confirmation_text(action: VoiceAction) -> &'static str {
    match action {
        VoiceAction::SosAlert => {
            "Are you sure you want to send an emergency SOS alert? Say yes to confirm or no to cancel."
        }
        VoiceAction::CapturePhoto => {
            "Are you sure you want to take a photo? Say yes to confirm or no to cancel."
        }
        _ => "Please confirm this action by saying yes or no.",
    }
}

fn success_text(action: VoiceAction) -> &'static str {
    match action {
        VoiceAction::CapturePhoto => "Opening camera to take photo",
        VoiceAction::SosAlert => "Sending emergency SOS alert",
        VoiceAction::ReportIssue => "Opening issue reporting form",
        VoiceAction::OpenIssues => "Opening your issues",
        VoiceAction::OpenCommunity => "Opening community issues",
        VoiceAction::OpenProfile => "Opening your profile",
        VoiceAction::Help => "Here are the available voice commands",
        VoiceAction::Cancel => "Operation cancelled",
        VoiceAction::Unknown => "Command executed successfully",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::synthesis::test_support::RecordingSynthesizer;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command(action: VoiceAction, transcript: &str) -> VoiceCommand {
        VoiceCommand {
            transcript: transcript.to_string(),
            confidence: 0.9,
            action,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    fn processor_with_speaker() -> (VoiceCommandProcessor, RecordingSynthesizer) {
        let speaker = RecordingSynthesizer::default();
        let processor = VoiceCommandProcessor::new(Arc::new(speaker.clone()));
        (processor, speaker)
    }

    fn counting_handler(
        processor: &VoiceCommandProcessor,
        action: VoiceAction,
    ) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        processor.register_handler(action, "test", &[], move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        calls
    }

    #[tokio::test]
    async fn critical_command_awaits_confirmation() {
        let (processor, speaker) = processor_with_speaker();
        let calls = counting_handler(&processor, VoiceAction::SosAlert);

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));

        assert!(processor.has_pending_confirmation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(speaker.spoken()[0].starts_with("Are you sure you want to send"));
    }

    #[tokio::test]
    async fn yes_executes_the_pending_command_exactly_once() {
        let (processor, _speaker) = processor_with_speaker();
        let calls = counting_handler(&processor, VoiceAction::SosAlert);

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        processor.resolve_confirmation(ConfirmationResponse::Yes);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!processor.has_pending_confirmation());

        // A second resolution is a no-op.
        processor.resolve_confirmation(ConfirmationResponse::Yes);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_discards_the_pending_command() {
        let (processor, speaker) = processor_with_speaker();
        let calls = counting_handler(&processor, VoiceAction::SosAlert);

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        processor.resolve_confirmation(ConfirmationResponse::No);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!processor.has_pending_confirmation());
        assert!(speaker.spoken().contains(&"Command cancelled".to_string()));
    }

    #[tokio::test]
    async fn timeout_cancels_and_accepts_new_commands() {
        let (processor, speaker) = processor_with_speaker();
        let sos_calls = counting_handler(&processor, VoiceAction::SosAlert);
        let help_calls = counting_handler(&processor, VoiceAction::Help);

        processor.set_config(ProcessorConfig {
            confirmation_timeout_ms: 40,
            ..ProcessorConfig::default()
        });

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(sos_calls.load(Ordering::SeqCst), 0);
        assert!(!processor.has_pending_confirmation());
        assert!(speaker
            .spoken()
            .contains(&"Command cancelled due to timeout".to_string()));

        processor.process_command(command(VoiceAction::Help, "help"));
        assert_eq!(help_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_critical_commands_execute_immediately_and_dispatch() {
        let (processor, speaker) = processor_with_speaker();

        let dispatched = Arc::new(Mutex::new(Vec::new()));
        let dispatched_clone = dispatched.clone();
        processor.on_dispatch(move |dispatch| {
            dispatched_clone.lock().unwrap().push(dispatch.action);
        });

        processor.process_command(command(VoiceAction::OpenProfile, "my profile"));

        assert_eq!(
            dispatched.lock().unwrap().as_slice(),
            [VoiceAction::OpenProfile]
        );
        assert!(speaker
            .spoken()
            .contains(&"Opening your profile".to_string()));
    }

    #[tokio::test]
    async fn unknown_commands_only_produce_feedback() {
        let (processor, speaker) = processor_with_speaker();

        processor.process_command(command(VoiceAction::Unknown, "banana"));

        assert!(!processor.has_pending_confirmation());
        assert!(speaker.spoken()[0].starts_with("Sorry, I didn't understand"));
    }

    #[tokio::test]
    async fn handler_failure_becomes_spoken_feedback() {
        let (processor, speaker) = processor_with_speaker();
        processor.register_handler(VoiceAction::Help, "test", &[], |_| {
            Err(anyhow::anyhow!("boom"))
        });

        processor.process_command(command(VoiceAction::Help, "help"));

        assert!(speaker
            .spoken()
            .contains(&"Sorry, there was an error executing that command".to_string()));
    }

    #[tokio::test]
    async fn new_critical_command_replaces_the_pending_slot() {
        let (processor, _speaker) = processor_with_speaker();
        let sos_calls = counting_handler(&processor, VoiceAction::SosAlert);
        let photo_calls = counting_handler(&processor, VoiceAction::CapturePhoto);

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        processor.process_command(command(VoiceAction::CapturePhoto, "take photo"));

        assert_eq!(
            processor.pending_confirmation().unwrap().action,
            VoiceAction::CapturePhoto
        );

        processor.resolve_confirmation(ConfirmationResponse::Yes);
        assert_eq!(sos_calls.load(Ordering::SeqCst), 0);
        assert_eq!(photo_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_confirmation_executes_critical_commands_directly() {
        let (processor, _speaker) = processor_with_speaker();
        let calls = counting_handler(&processor, VoiceAction::SosAlert);

        processor.set_config(ProcessorConfig {
            enable_confirmation: false,
            ..ProcessorConfig::default()
        });

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!processor.has_pending_confirmation());
    }

    #[tokio::test]
    async fn disabled_feedback_mutes_all_phrases() {
        let (processor, speaker) = processor_with_speaker();

        processor.set_config(ProcessorConfig {
            enable_feedback: false,
            ..ProcessorConfig::default()
        });

        processor.process_command(command(VoiceAction::Unknown, "banana"));
        processor.process_command(command(VoiceAction::Help, "help"));

        assert!(speaker.spoken().is_empty());
    }

    #[tokio::test]
    async fn pending_change_fires_on_every_slot_transition() {
        let (processor, _speaker) = processor_with_speaker();

        let transitions = Arc::new(Mutex::new(Vec::new()));
        let transitions_clone = transitions.clone();
        processor.on_pending_change(move |pending| {
            transitions_clone
                .lock()
                .unwrap()
                .push(pending.map(|command| command.action));
        });

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        processor.resolve_confirmation(ConfirmationResponse::No);

        assert_eq!(
            transitions.lock().unwrap().as_slice(),
            [Some(VoiceAction::SosAlert), None]
        );
    }

    #[tokio::test]
    async fn cancel_clears_a_pending_confirmation() {
        let (processor, _speaker) = processor_with_speaker();
        let sos_calls = counting_handler(&processor, VoiceAction::SosAlert);

        processor.process_command(command(VoiceAction::SosAlert, "send sos"));
        processor.process_command(command(VoiceAction::Cancel, "cancel"));

        assert!(!processor.has_pending_confirmation());
        processor.resolve_confirmation(ConfirmationResponse::Yes);
        assert_eq!(sos_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registry_lists_defaults_and_supports_unregistration() {
        let (processor, _speaker) = processor_with_speaker();

        assert_eq!(processor.available_commands().len(), 8);

        assert!(processor.unregister_handler(VoiceAction::OpenProfile));
        assert!(!processor.unregister_handler(VoiceAction::OpenProfile));
        assert_eq!(processor.available_commands().len(), 7);

        // An action without a handler is a logged no-op.
        processor.process_command(command(VoiceAction::OpenProfile, "my profile"));
        assert!(!processor.has_pending_confirmation());
    }
}
