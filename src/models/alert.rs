use serde::{Deserialize, Serialize};

use super::location::{Coordinates, ResolvedLocation};

/// Placeholder stored when an alert is submitted without a message.
pub const DEFAULT_ALERT_MESSAGE: &str = "Emergency assistance required";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AlertType {
    Medical,
    Safety,
    Fire,
    Police,
    Other,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Medical => "medical",
            AlertType::Safety => "safety",
            AlertType::Fire => "fire",
            AlertType::Police => "police",
            AlertType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
            AlertPriority::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    Active,
    Resolved,
    Cancelled,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Cancelled => "cancelled",
        }
    }
}

/// One emergency report. The store owns the mutable collection; everyone else
/// works with clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub location: ResolvedLocation,
    pub message: String,
    /// Creation instant, epoch milliseconds. Immutable after creation.
    pub timestamp: i64,
    pub sender_id: String,
    pub sender_name: String,
    pub status: AlertStatus,
    /// Ids of the users notified when the alert was created. A snapshot, never
    /// recomputed afterwards.
    pub nearby_users: Vec<String>,
}

/// Caller-supplied fields for a new alert; id, timestamp, status and the
/// nearby-user snapshot are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub priority: AlertPriority,
    pub location: ResolvedLocation,
    pub message: String,
    pub sender_id: String,
    pub sender_name: String,
}

/// A platform user as reported by the host's presence surface, before any
/// distance has been derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPing {
    pub id: String,
    pub name: String,
    pub location: Coordinates,
    /// Epoch milliseconds of the user's last presence update.
    pub last_seen: i64,
    pub is_online: bool,
}

/// Ephemeral proximity record: a `UserPing` with its distance from the query
/// origin. Produced fresh on every nearby-user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUser {
    pub id: String,
    pub name: String,
    pub location: Coordinates,
    /// Kilometers from the query origin, computed at query time.
    pub distance_km: f64,
    pub last_seen: i64,
    pub is_online: bool,
}

impl NearbyUser {
    pub fn from_ping(ping: UserPing, distance_km: f64) -> Self {
        Self {
            id: ping.id,
            name: ping.name,
            location: ping.location,
            distance_km,
            last_seen: ping.last_seen,
            is_online: ping.is_online,
        }
    }
}
