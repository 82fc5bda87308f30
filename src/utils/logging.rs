//! Conditional logging macros for chatty modules.
//!
//! A module that logs on a hot path (the dispatch simulation, the sweep loop)
//! declares its own switch and uses these instead of the `log` macros
//! directly:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_error, log_info, log_warn};
//!
//! log_info!("notified {} users", 3);
//! ```
//!
//! The macros read the `ENABLE_LOGS` const in the calling module, so one flag
//! silences a whole module without touching the global filter.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
