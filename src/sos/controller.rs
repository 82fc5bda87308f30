use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time;

use crate::alerts::AlertStore;
use crate::feedback::FeedbackEngine;
use crate::geo::{LocationError, LocationProvider};
use crate::models::{Alert, AlertDraft, AlertPriority, AlertType, ResolvedLocation};
use crate::utils::registry::{CallbackRegistry, SubscriptionId};

/// Seconds the readiness countdown runs after a location is resolved.
const READINESS_COUNTDOWN_SECS: u32 = 10;

/// Siren length played when an alert goes out.
const SIREN_SECS: f32 = 3.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SosPhase {
    Idle,
    Locating,
    Ready,
    Sending,
    Sent,
    Failed,
}

/// Status stream surfaced to operators while a report moves through the flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum SosEvent {
    Locating,
    Ready { location: ResolvedLocation },
    CountdownTick { seconds_left: u32 },
    CountdownElapsed,
    Sending,
    Sent { alert: Alert },
    Failed { reason: String },
    Cancelled,
}

type EventCallback = dyn Fn(&SosEvent) + Send + Sync;

struct SosState {
    phase: SosPhase,
    location: Option<ResolvedLocation>,
}

/// Drives one emergency report end to end: resolve the location, run the
/// readiness countdown for the operator, hand the draft to the alert store,
/// and surface every transition as an event. One instance per application
/// session; cheap to clone.
#[derive(Clone)]
pub struct SosController {
    state: Arc<Mutex<SosState>>,
    store: AlertStore,
    provider: Arc<dyn LocationProvider>,
    feedback: Option<FeedbackEngine>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    subscribers: Arc<CallbackRegistry<EventCallback>>,
    countdown_secs: u32,
    tick_interval: Duration,
}

impl SosController {
    pub fn new(
        store: AlertStore,
        provider: Arc<dyn LocationProvider>,
        feedback: Option<FeedbackEngine>,
    ) -> Self {
        Self::with_timing(
            store,
            provider,
            feedback,
            READINESS_COUNTDOWN_SECS,
            Duration::from_secs(1),
        )
    }

    fn with_timing(
        store: AlertStore,
        provider: Arc<dyn LocationProvider>,
        feedback: Option<FeedbackEngine>,
        countdown_secs: u32,
        tick_interval: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SosState {
                phase: SosPhase::Idle,
                location: None,
            })),
            store,
            provider,
            feedback,
            ticker: Arc::new(Mutex::new(None)),
            subscribers: Arc::new(CallbackRegistry::new()),
            countdown_secs,
            tick_interval,
        }
    }

    pub fn phase(&self) -> SosPhase {
        self.state.lock().unwrap().phase
    }

    pub fn location(&self) -> Option<ResolvedLocation> {
        self.state.lock().unwrap().location.clone()
    }

    pub fn on_event(&self, callback: impl Fn(&SosEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Resolves the current location and, on success, arms the readiness
    /// countdown. Failures surface both as the returned error and as a
    /// `Failed` event so passive observers stay in sync.
    pub async fn prepare(&self) -> Result<ResolvedLocation, LocationError> {
        self.set_phase(SosPhase::Locating);
        self.emit(&SosEvent::Locating);

        match self.provider.current_location().await {
            Ok(location) => {
                {
                    let mut state = self.state.lock().unwrap();
                    state.phase = SosPhase::Ready;
                    state.location = Some(location.clone());
                }
                self.emit(&SosEvent::Ready {
                    location: location.clone(),
                });
                self.spawn_countdown();
                Ok(location)
            }
            Err(err) => {
                self.set_phase(SosPhase::Failed);
                warn!("location resolution failed: {err}");
                self.emit(&SosEvent::Failed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Submits the report through the alert store. Requires a previously
    /// resolved location; the store contract leaves that precondition to us.
    pub fn send(
        &self,
        kind: AlertType,
        priority: AlertPriority,
        message: &str,
        sender_id: &str,
        sender_name: &str,
    ) -> Result<Alert> {
        let location = self
            .state
            .lock()
            .unwrap()
            .location
            .clone()
            .ok_or_else(|| anyhow!("no resolved location, call prepare first"))?;

        self.cancel_countdown();
        self.set_phase(SosPhase::Sending);
        self.emit(&SosEvent::Sending);

        let alert = self.store.send_alert(AlertDraft {
            kind,
            priority,
            location,
            message: message.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
        });

        self.set_phase(SosPhase::Sent);
        info!("sos alert {} sent", alert.id);
        self.emit(&SosEvent::Sent {
            alert: alert.clone(),
        });

        if let Some(feedback) = &self.feedback {
            if let Err(err) = feedback.play_siren(SIREN_SECS) {
                warn!("siren cue unavailable: {err}");
            }
        }

        Ok(alert)
    }

    /// Abandons the in-progress report and returns to idle.
    pub fn cancel(&self) {
        self.cancel_countdown();
        {
            let mut state = self.state.lock().unwrap();
            state.phase = SosPhase::Idle;
            state.location = None;
        }
        self.emit(&SosEvent::Cancelled);
    }

    fn spawn_countdown(&self) {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(controller.tick_interval);
            ticker.tick().await; // immediate first tick

            for seconds_left in (1..=controller.countdown_secs).rev() {
                ticker.tick().await;
                controller.emit(&SosEvent::CountdownTick { seconds_left });
            }
            controller.emit(&SosEvent::CountdownElapsed);
        });

        let mut guard = self.ticker.lock().unwrap();
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(handle);
    }

    fn cancel_countdown(&self) {
        if let Some(handle) = self.ticker.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn set_phase(&self, phase: SosPhase) {
        self.state.lock().unwrap().phase = phase;
    }

    fn emit(&self, event: &SosEvent) {
        self.subscribers.notify(|callback| callback(event));
    }
}
