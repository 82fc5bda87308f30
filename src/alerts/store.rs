use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::info;
use rand::Rng;

use crate::geo::proximity;
use crate::models::{
    Alert, AlertDraft, AlertStatus, Coordinates, NearbyUser, UserPing, DEFAULT_ALERT_MESSAGE,
};
use crate::utils::registry::{CallbackRegistry, SubscriptionId};

use super::dispatch;

/// Radius used when resolving the notification set for a new alert.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

/// Radius used when listing active alerts around a location.
pub const DEFAULT_ALERTS_NEAR_RADIUS_KM: f64 = 10.0;

/// Source of proximity candidates. The host pushes presence updates into
/// whatever implementation it injects; the store only ever reads.
pub trait UserDirectory: Send + Sync {
    fn candidates(&self) -> Vec<UserPing>;
}

/// In-memory directory for hosts that feed presence over their own channel,
/// for the simulation binary, and for tests.
#[derive(Default)]
pub struct RosterDirectory {
    users: Mutex<HashMap<String, UserPing>>,
}

impl RosterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, ping: UserPing) {
        self.users.lock().unwrap().insert(ping.id.clone(), ping);
    }

    pub fn remove(&self, id: &str) -> bool {
        self.users.lock().unwrap().remove(id).is_some()
    }
}

impl UserDirectory for RosterDirectory {
    fn candidates(&self) -> Vec<UserPing> {
        self.users.lock().unwrap().values().cloned().collect()
    }
}

type AlertsCallback = dyn Fn(&[Alert]) + Send + Sync;
type NearbyCallback = dyn Fn(&[NearbyUser]) + Send + Sync;

#[derive(Default)]
struct StoreState {
    alerts: Vec<Alert>,
    nearby_users: Vec<NearbyUser>,
}

/// Single in-process registry for alerts and the last nearby-user snapshot.
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct AlertStore {
    state: Arc<Mutex<StoreState>>,
    directory: Arc<dyn UserDirectory>,
    alert_subscribers: Arc<CallbackRegistry<AlertsCallback>>,
    nearby_subscribers: Arc<CallbackRegistry<NearbyCallback>>,
}

impl AlertStore {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            directory,
            alert_subscribers: Arc::new(CallbackRegistry::new()),
            nearby_subscribers: Arc::new(CallbackRegistry::new()),
        }
    }

    /// Recomputes the nearby-user set around `origin`, retains it as the
    /// latest snapshot, and notifies nearby-user subscribers.
    pub fn find_nearby_users(&self, origin: Coordinates, radius_km: f64) -> Vec<NearbyUser> {
        let nearby = proximity::filter_within_radius(origin, self.directory.candidates(), radius_km);

        self.state.lock().unwrap().nearby_users = nearby.clone();
        self.notify_nearby_subscribers(&nearby);
        nearby
    }

    /// Creates an alert from the draft: resolves the notification set at the
    /// default radius, assigns an id, stamps the creation instant, applies the
    /// empty-message placeholder, and prepends so iteration is
    /// most-recent-first. Alert subscribers observe the new list before this
    /// call returns; the out-of-band fan-out is scheduled fire-and-forget.
    pub fn send_alert(&self, draft: AlertDraft) -> Alert {
        let nearby =
            self.find_nearby_users(draft.location.coordinates(), DEFAULT_NEARBY_RADIUS_KM);

        let timestamp = Utc::now().timestamp_millis();
        let message = if draft.message.trim().is_empty() {
            DEFAULT_ALERT_MESSAGE.to_string()
        } else {
            draft.message
        };

        let alert = Alert {
            id: new_alert_id(timestamp),
            kind: draft.kind,
            priority: draft.priority,
            location: draft.location,
            message,
            timestamp,
            sender_id: draft.sender_id,
            sender_name: draft.sender_name,
            status: AlertStatus::Active,
            nearby_users: nearby.iter().map(|user| user.id.clone()).collect(),
        };

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            state.alerts.insert(0, alert.clone());
            state.alerts.clone()
        };
        info!(
            "alert {} ({} / {}) created, notifying {} nearby users",
            alert.id,
            alert.kind.as_str(),
            alert.priority.as_str(),
            nearby.len()
        );
        self.notify_alert_subscribers(&snapshot);

        dispatch::schedule(alert.clone(), nearby);

        alert
    }

    /// Overwrites the status of the alert with the given id and republishes.
    /// Returns whether the alert existed. Every transition is permitted, the
    /// backward ones included; operators use this to revive alerts resolved by
    /// mistake.
    pub fn update_status(&self, id: &str, status: AlertStatus) -> bool {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            let Some(alert) = state.alerts.iter_mut().find(|alert| alert.id == id) else {
                return false;
            };
            alert.status = status;
            state.alerts.clone()
        };

        self.notify_alert_subscribers(&snapshot);
        true
    }

    /// Defensive copy of the alert list, most recent first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.clone()
    }

    /// Defensive copy of the latest nearby-user snapshot.
    pub fn nearby_users(&self) -> Vec<NearbyUser> {
        self.state.lock().unwrap().nearby_users.clone()
    }

    /// Active alerts within `radius_km` of `origin`.
    pub fn alerts_near(&self, origin: Coordinates, radius_km: f64) -> Vec<Alert> {
        self.state
            .lock()
            .unwrap()
            .alerts
            .iter()
            .filter(|alert| {
                alert.status == AlertStatus::Active
                    && proximity::distance_km(origin, alert.location.coordinates()) <= radius_km
            })
            .cloned()
            .collect()
    }

    pub fn subscribe_alerts(
        &self,
        callback: impl Fn(&[Alert]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.alert_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_alerts(&self, id: SubscriptionId) -> bool {
        self.alert_subscribers.remove(id)
    }

    pub fn subscribe_nearby(
        &self,
        callback: impl Fn(&[NearbyUser]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.nearby_subscribers.add(Box::new(callback))
    }

    pub fn unsubscribe_nearby(&self, id: SubscriptionId) -> bool {
        self.nearby_subscribers.remove(id)
    }

    /// Drops alerts whose creation instant is older than `max_age` and
    /// republishes. Called hourly by the sweeper, not by any alert's own
    /// lifecycle.
    pub fn prune_older_than(&self, max_age: Duration) {
        self.prune_older_than_at(max_age, Utc::now().timestamp_millis());
    }

    fn prune_older_than_at(&self, max_age: Duration, now_ms: i64) {
        let cutoff = now_ms - max_age.as_millis() as i64;
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            let before = state.alerts.len();
            state.alerts.retain(|alert| alert.timestamp > cutoff);
            if state.alerts.len() == before {
                return;
            }
            info!("pruned {} expired alerts", before - state.alerts.len());
            state.alerts.clone()
        };

        self.notify_alert_subscribers(&snapshot);
    }

    fn notify_alert_subscribers(&self, alerts: &[Alert]) {
        // Runs outside the state lock so subscribers may re-enter the store.
        self.alert_subscribers.notify(|callback| callback(alerts));
    }

    fn notify_nearby_subscribers(&self, users: &[NearbyUser]) {
        self.nearby_subscribers.notify(|callback| callback(users));
    }
}

/// Opaque alert id: creation instant plus a random base-36 suffix.
fn new_alert_id(timestamp: i64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("alert_{timestamp}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertPriority, AlertType, ResolvedLocation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn roster_with(users: Vec<UserPing>) -> Arc<RosterDirectory> {
        let roster = Arc::new(RosterDirectory::new());
        for user in users {
            roster.upsert(user);
        }
        roster
    }

    fn ping_at(id: &str, latitude: f64, longitude: f64) -> UserPing {
        UserPing {
            id: id.to_string(),
            name: id.to_string(),
            location: Coordinates::new(latitude, longitude),
            last_seen: Utc::now().timestamp_millis(),
            is_online: true,
        }
    }

    fn draft(message: &str) -> AlertDraft {
        AlertDraft {
            kind: AlertType::Fire,
            priority: AlertPriority::Critical,
            location: ResolvedLocation {
                latitude: 12.9,
                longitude: 77.6,
                address: "MG Road".to_string(),
            },
            message: message.to_string(),
            sender_id: "user-1".to_string(),
            sender_name: "Asha".to_string(),
        }
    }

    #[test]
    fn send_alert_applies_placeholder_and_defaults() {
        let store = AlertStore::new(roster_with(vec![]));

        let first = store.send_alert(draft(""));
        let second = store.send_alert(draft(""));

        assert_eq!(first.message, DEFAULT_ALERT_MESSAGE);
        assert_eq!(first.status, AlertStatus::Active);
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        // Most recent first.
        assert_eq!(store.alerts()[0].id, second.id);
    }

    #[test]
    fn nearby_snapshot_respects_the_five_km_radius() {
        // One degree of latitude is ~111.19 km, so these offsets sit at
        // roughly 4.9 km and 5.1 km from the draft location.
        let roster = roster_with(vec![
            ping_at("inside", 12.9 + 4.9 / 111.1949, 77.6),
            ping_at("outside", 12.9 + 5.1 / 111.1949, 77.6),
        ]);
        let store = AlertStore::new(roster);

        let alert = store.send_alert(draft("fire on the second floor"));
        assert_eq!(alert.nearby_users, vec!["inside".to_string()]);
    }

    #[test]
    fn update_status_is_idempotent_and_reports_missing_ids() {
        let store = AlertStore::new(roster_with(vec![]));
        let alert = store.send_alert(draft("test"));

        assert!(store.update_status(&alert.id, AlertStatus::Resolved));
        assert!(store.update_status(&alert.id, AlertStatus::Resolved));
        assert_eq!(store.alerts()[0].status, AlertStatus::Resolved);

        assert!(!store.update_status("alert_0_missing", AlertStatus::Cancelled));
    }

    #[test]
    fn subscribers_observe_the_alert_within_send_alert() {
        let store = AlertStore::new(roster_with(vec![]));
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        store.subscribe_alerts(move |alerts| {
            seen_clone.store(alerts.len(), Ordering::SeqCst);
        });

        store.send_alert(draft("one"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_removes_exactly_one() {
        let store = AlertStore::new(roster_with(vec![]));
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));

        let first_clone = first_calls.clone();
        let first = store.subscribe_alerts(move |_| {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });
        let second_clone = second_calls.clone();
        let _second = store.subscribe_alerts(move |_| {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe_alerts(first));
        assert!(!store.unsubscribe_alerts(first));

        store.send_alert(draft("two"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 0);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nearby_lookup_updates_snapshot_and_notifies() {
        let roster = roster_with(vec![ping_at("close", 12.901, 77.601)]);
        let store = AlertStore::new(roster);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        store.subscribe_nearby(move |users| {
            seen_clone.store(users.len(), Ordering::SeqCst);
        });

        let found = store.find_nearby_users(Coordinates::new(12.9, 77.6), 5.0);
        assert_eq!(found.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(store.nearby_users()[0].id, "close");
    }

    #[test]
    fn prune_drops_only_expired_alerts() {
        let store = AlertStore::new(roster_with(vec![]));
        let alert = store.send_alert(draft("old"));

        let day = Duration::from_secs(24 * 60 * 60);
        let hour = 60 * 60 * 1000_i64;

        // 23 hours later the alert survives a 24 h sweep.
        store.prune_older_than_at(day, alert.timestamp + 23 * hour);
        assert_eq!(store.alerts().len(), 1);

        // 25 hours later it does not.
        store.prune_older_than_at(day, alert.timestamp + 25 * hour);
        assert!(store.alerts().is_empty());
    }

    #[test]
    fn alerts_near_filters_by_status_and_distance() {
        let store = AlertStore::new(roster_with(vec![]));
        let near = store.send_alert(draft("near"));

        let mut far_draft = draft("far");
        far_draft.location = ResolvedLocation {
            latitude: 13.9,
            longitude: 77.6,
            address: "elsewhere".to_string(),
        };
        store.send_alert(far_draft);

        let resolved = store.send_alert(draft("resolved"));
        store.update_status(&resolved.id, AlertStatus::Resolved);

        let origin = Coordinates::new(12.9, 77.6);
        let found = store.alerts_near(origin, DEFAULT_ALERTS_NEAR_RADIUS_KM);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, near.id);
    }
}
