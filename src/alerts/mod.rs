pub mod dispatch;
pub mod store;
pub mod sweeper;

pub use store::{
    AlertStore, RosterDirectory, UserDirectory, DEFAULT_ALERTS_NEAR_RADIUS_KM,
    DEFAULT_NEARBY_RADIUS_KM,
};
pub use sweeper::{AlertSweeper, MAX_ALERT_AGE, SWEEP_INTERVAL};
