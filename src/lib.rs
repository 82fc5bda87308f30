pub mod alerts;
pub mod feedback;
pub mod geo;
pub mod models;
pub mod settings;
pub mod sos;
pub mod utils;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use alerts::{AlertStore, AlertSweeper, UserDirectory};
use feedback::FeedbackEngine;
use geo::{GeolocationResolver, HttpReverseGeocoder, PositionSource};
use settings::VoiceSettingsStore;
use sos::SosController;
use voice::{
    RecognitionEngine, SpeechRecognitionAdapter, SpeechSynthesizer, VoiceCommandProcessor,
};

pub use utils::registry::SubscriptionId;

/// Platform capabilities and host surfaces injected into [`CoreServices`].
/// Each is a seam the hosting application fills with its real implementation;
/// the crate ships simulated stand-ins for all of them.
pub struct CoreDeps {
    pub recognition_engine: Arc<dyn RecognitionEngine>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub position_source: Arc<dyn PositionSource>,
    pub user_directory: Arc<dyn UserDirectory>,
    /// Where voice preferences are persisted between sessions.
    pub settings_path: PathBuf,
}

/// One fully wired instance of the emergency core. Construct exactly one per
/// application session and drop it (after [`CoreServices::shutdown`]) when the
/// session ends; tests build fresh instances for isolation.
pub struct CoreServices {
    pub store: AlertStore,
    pub recognizer: SpeechRecognitionAdapter,
    pub processor: VoiceCommandProcessor,
    pub sos: SosController,
    pub settings: VoiceSettingsStore,
    pub feedback: FeedbackEngine,
    sweeper: AlertSweeper,
}

impl CoreServices {
    /// Wires the whole pipeline: store + sweeper, resolver, recognition
    /// adapter, command processor (attached to the adapter's command stream),
    /// SOS controller, and persisted settings applied on load. Requires a
    /// running tokio runtime.
    pub fn init(deps: CoreDeps) -> Result<Self> {
        let feedback = FeedbackEngine::new();

        let store = AlertStore::new(deps.user_directory);
        let mut sweeper = AlertSweeper::new();
        sweeper
            .start(store.clone())
            .context("failed to start alert sweeper")?;

        let resolver = Arc::new(GeolocationResolver::new(
            deps.position_source,
            HttpReverseGeocoder::new(),
        ));
        let sos = SosController::new(store.clone(), resolver, Some(feedback.clone()));

        let recognizer =
            SpeechRecognitionAdapter::new(deps.recognition_engine, deps.synthesizer.clone());
        let processor = VoiceCommandProcessor::new(deps.synthesizer);
        processor.attach(&recognizer);

        let settings = VoiceSettingsStore::new(deps.settings_path)
            .context("failed to load voice settings")?;
        settings.apply(&recognizer, &processor);

        info!("emergency core wired");

        Ok(Self {
            store,
            recognizer,
            processor,
            sos,
            settings,
            feedback,
            sweeper,
        })
    }

    /// Stops the background maintenance work. Call once when the hosting
    /// session ends.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.recognizer.stop_listening();
        self.sweeper.stop().await
    }
}
