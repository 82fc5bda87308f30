use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use log::info;
use tokio::sync::mpsc::{self, UnboundedSender};

use civicsync_core::alerts::RosterDirectory;
use civicsync_core::geo::FixedPositionSource;
use civicsync_core::models::{
    AlertPriority, AlertType, Coordinates, RecognitionSettings, UserPing, VoiceAction,
};
use civicsync_core::voice::{
    ConfirmationResponse, EngineEvent, NullSynthesizer, RecognitionEngine,
};
use civicsync_core::{CoreDeps, CoreServices};

/// Recognition engine that replays a fixed transcript script, the way a
/// microphone session would deliver results.
struct ScriptedMicrophone {
    script: Vec<&'static str>,
    session: Mutex<Option<UnboundedSender<EngineEvent>>>,
}

impl ScriptedMicrophone {
    fn new(script: Vec<&'static str>) -> Self {
        Self {
            script,
            session: Mutex::new(None),
        }
    }
}

impl RecognitionEngine for ScriptedMicrophone {
    fn is_supported(&self) -> bool {
        true
    }

    fn configure(&self, settings: &RecognitionSettings) {
        info!("microphone configured for {}", settings.language);
    }

    fn start(&self, events: UnboundedSender<EngineEvent>) -> Result<()> {
        *self.session.lock().unwrap() = Some(events.clone());

        let script = self.script.clone();
        tokio::spawn(async move {
            for transcript in script {
                tokio::time::sleep(Duration::from_millis(400)).await;
                if events
                    .send(EngineEvent::Result {
                        transcript: transcript.to_string(),
                        confidence: 0.92,
                    })
                    .is_err()
                {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(400)).await;
            let _ = events.send(EngineEvent::Ended);
        });
        Ok(())
    }

    fn stop(&self) {
        self.session.lock().unwrap().take();
    }
}

fn demo_roster(center: Coordinates) -> Arc<RosterDirectory> {
    let roster = Arc::new(RosterDirectory::new());
    let now = chrono::Utc::now().timestamp_millis();

    roster.upsert(UserPing {
        id: "user1".into(),
        name: "John Doe".into(),
        location: Coordinates::new(center.latitude + 0.001, center.longitude + 0.001),
        last_seen: now - 5 * 60 * 1000,
        is_online: true,
    });
    roster.upsert(UserPing {
        id: "user2".into(),
        name: "Jane Smith".into(),
        location: Coordinates::new(center.latitude - 0.002, center.longitude + 0.001),
        last_seen: now - 10 * 60 * 1000,
        is_online: true,
    });
    roster.upsert(UserPing {
        id: "user3".into(),
        name: "Mike Johnson".into(),
        location: Coordinates::new(center.latitude + 0.003, center.longitude - 0.002),
        last_seen: now - 20 * 60 * 1000,
        is_online: false,
    });

    roster
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("CivicSync emergency core simulation starting");

    let center = Coordinates::new(12.9716, 77.5946);
    let script = vec!["take a photo please", "please send sos now", "banana"];

    let settings_path = PathBuf::from(
        std::env::var("CIVICSYNC_SETTINGS")
            .unwrap_or_else(|_| "civicsync-voice-settings.json".to_string()),
    );

    let mut core = CoreServices::init(CoreDeps {
        recognition_engine: Arc::new(ScriptedMicrophone::new(script)),
        synthesizer: Arc::new(NullSynthesizer),
        position_source: Arc::new(FixedPositionSource::new(center)),
        user_directory: demo_roster(center),
        settings_path,
    })?;

    core.store.subscribe_alerts(|alerts| {
        info!("alert list now holds {} alert(s)", alerts.len());
    });

    // Route executed commands the way the dashboard would.
    let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
    core.processor.on_dispatch(move |dispatch| {
        let _ = dispatch_tx.send(dispatch.action);
    });

    // Auto-confirm critical commands after a beat, standing in for the
    // operator pressing "yes".
    let (pending_tx, mut pending_rx) = mpsc::unbounded_channel();
    core.processor.on_pending_change(move |pending| {
        if let Some(command) = pending {
            let _ = pending_tx.send(command.action);
        }
    });
    let confirming = core.processor.clone();
    tokio::spawn(async move {
        while let Some(action) = pending_rx.recv().await {
            info!("confirmation pending for {}, answering yes", action.as_str());
            tokio::time::sleep(Duration::from_millis(300)).await;
            confirming.resolve_confirmation(ConfirmationResponse::Yes);
        }
    });

    core.recognizer.start_listening()?;

    // Drive host-side reactions until the script runs dry.
    loop {
        let action = tokio::select! {
            action = dispatch_rx.recv() => match action {
                Some(action) => action,
                None => break,
            },
            _ = tokio::time::sleep(Duration::from_secs(2)) => break,
        };

        match action {
            VoiceAction::CapturePhoto => info!("host: camera surface opened"),
            VoiceAction::SosAlert => {
                let location = core.sos.prepare().await?;
                info!("host: location resolved to {}", location.address);
                let alert = core.sos.send(
                    AlertType::Safety,
                    AlertPriority::High,
                    "",
                    "demo-user",
                    "Demo Operator",
                )?;
                info!(
                    "host: alert {} sent to {} nearby user(s)",
                    alert.id,
                    alert.nearby_users.len()
                );
            }
            other => info!("host: navigation to {}", other.as_str()),
        }
    }

    // Let the simulated fan-out finish logging.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let alerts = core.store.alerts();
    println!("{}", serde_json::to_string_pretty(&alerts)?);

    core.shutdown().await?;
    Ok(())
}
