use std::time::Duration;

use crate::models::{Alert, NearbyUser};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// How long the simulated transports take to "deliver".
const DISPATCH_DELAY: Duration = Duration::from_secs(1);

/// Schedules the out-of-band notification fan-out for a freshly created alert.
/// The reference behavior is simulated: after a short delay the deliveries are
/// logged. A production deployment substitutes real push/SMS/emergency-service
/// transports behind this same contract. Fire-and-forget; nothing here can
/// affect alert creation, and without a runtime the simulation is skipped.
pub fn schedule(alert: Alert, recipients: Vec<NearbyUser>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(DISPATCH_DELAY).await;
                deliver(&alert, &recipients);
            });
        }
        Err(_) => {
            log_warn!(
                "no async runtime available, skipping simulated dispatch for alert {}",
                alert.id
            );
        }
    }
}

fn deliver(alert: &Alert, recipients: &[NearbyUser]) {
    log_info!(
        "push notification sent to {} nearby users for alert {}",
        recipients.len(),
        alert.id
    );
    for user in recipients {
        log_info!(
            "  -> {} ({:.2} km away, {})",
            user.name,
            user.distance_km,
            if user.is_online { "online" } else { "offline" }
        );
    }
    log_info!(
        "SMS sent to emergency contacts ({} / {})",
        alert.kind.as_str(),
        alert.priority.as_str()
    );
    log_info!("alert {} broadcast to local emergency services", alert.id);
}
