use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::models::RecognitionSettings;
use crate::voice::{ProcessorConfig, SpeechRecognitionAdapter, VoiceCommandProcessor};

/// Voice preferences persisted between application sessions. The host hands us
/// the file path; everything else about storage is ours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceSettings {
    pub enable_feedback: bool,
    pub enable_confirmation: bool,
    pub language: String,
    pub confirmation_timeout_ms: u64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enable_feedback: true,
            enable_confirmation: true,
            language: "en-US".into(),
            confirmation_timeout_ms: 3000,
        }
    }
}

pub struct VoiceSettingsStore {
    path: PathBuf,
    data: RwLock<VoiceSettings>,
}

impl VoiceSettingsStore {
    /// Loads settings from `path`; a missing or corrupt file falls back to
    /// defaults rather than failing the session.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            VoiceSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> VoiceSettings {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, settings: VoiceSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    /// Pushes the stored preferences into the recognition adapter and the
    /// command processor. Called once after load and again after every update.
    pub fn apply(&self, adapter: &SpeechRecognitionAdapter, processor: &VoiceCommandProcessor) {
        let settings = self.current();

        adapter.update_settings(RecognitionSettings {
            language: settings.language.clone(),
            ..adapter.settings()
        });

        processor.set_config(ProcessorConfig {
            enable_feedback: settings.enable_feedback,
            enable_confirmation: settings.enable_confirmation,
            confirmation_timeout_ms: settings.confirmation_timeout_ms,
        });
    }

    fn persist(&self, data: &VoiceSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::synthesis::test_support::RecordingSynthesizer;
    use crate::voice::UnsupportedEngine;
    use std::sync::Arc;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("civicsync-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = VoiceSettingsStore::new(temp_path()).unwrap();
        assert_eq!(store.current(), VoiceSettings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let path = temp_path();
        fs::write(&path, "not json at all").unwrap();

        let store = VoiceSettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.current(), VoiceSettings::default());

        fs::remove_file(path).ok();
    }

    #[test]
    fn update_persists_across_reload() {
        let path = temp_path();
        let store = VoiceSettingsStore::new(path.clone()).unwrap();

        let settings = VoiceSettings {
            enable_confirmation: false,
            language: "en-IN".into(),
            confirmation_timeout_ms: 5000,
            ..VoiceSettings::default()
        };
        store.update(settings.clone()).unwrap();

        let reloaded = VoiceSettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.current(), settings);

        fs::remove_file(path).ok();
    }

    #[test]
    fn apply_pushes_settings_into_adapter_and_processor() {
        let store = VoiceSettingsStore::new(temp_path()).unwrap();
        store
            .update(VoiceSettings {
                enable_feedback: false,
                language: "en-IN".into(),
                confirmation_timeout_ms: 1500,
                ..VoiceSettings::default()
            })
            .unwrap();

        let adapter = SpeechRecognitionAdapter::new(
            Arc::new(UnsupportedEngine),
            Arc::new(RecordingSynthesizer::default()),
        );
        let processor = VoiceCommandProcessor::new(Arc::new(RecordingSynthesizer::default()));

        store.apply(&adapter, &processor);

        assert_eq!(adapter.settings().language, "en-IN");
        let config = processor.config();
        assert!(!config.enable_feedback);
        assert_eq!(config.confirmation_timeout_ms, 1500);
    }
}
