use std::sync::Arc;
use std::time::Duration;

use log::warn;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::models::{Coordinates, ResolvedLocation};

use super::geocode::ReverseGeocoder;

/// Options for a single position fix request.
#[derive(Debug, Clone)]
pub struct FixOptions {
    pub high_accuracy: bool,
    /// How long to wait for the platform to deliver a fix.
    pub timeout: Duration,
    /// Oldest cached fix the platform may hand back instead of a fresh one.
    pub max_age: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            max_age: Duration::from_secs(300),
        }
    }
}

/// Failure reported by a position source for one fix request.
#[derive(Debug, Clone, Error)]
pub enum FixError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of `GeolocationResolver::resolve_current_location`.
#[derive(Debug, Clone, Error)]
pub enum LocationError {
    #[error("geolocation is not supported on this platform")]
    Unsupported,
    #[error("location access denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("failed to determine location: {0}")]
    Unavailable(String),
}

/// Platform geolocation capability. A request is answered at most once through
/// the supplied oneshot sender; dropping the sender without replying leaves the
/// resolver to its timeout.
pub trait PositionSource: Send + Sync {
    fn is_supported(&self) -> bool;
    fn request_fix(&self, options: &FixOptions, reply: oneshot::Sender<Result<Coordinates, FixError>>);
}

/// Source for platforms without any geolocation capability.
pub struct UnsupportedPositionSource;

impl PositionSource for UnsupportedPositionSource {
    fn is_supported(&self) -> bool {
        false
    }

    fn request_fix(&self, _options: &FixOptions, _reply: oneshot::Sender<Result<Coordinates, FixError>>) {}
}

/// Source that always replies with the configured coordinates. Used by the
/// simulation binary and in tests.
pub struct FixedPositionSource {
    coordinates: Coordinates,
}

impl FixedPositionSource {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

impl PositionSource for FixedPositionSource {
    fn is_supported(&self) -> bool {
        true
    }

    fn request_fix(&self, _options: &FixOptions, reply: oneshot::Sender<Result<Coordinates, FixError>>) {
        let _ = reply.send(Ok(self.coordinates));
    }
}

/// Object-safe face of the resolver, so controllers can hold it without
/// carrying the geocoder type parameter around.
pub trait LocationProvider: Send + Sync {
    fn current_location(
        &self,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ResolvedLocation, LocationError>> + Send + '_>,
    >;
}

impl<G: ReverseGeocoder> LocationProvider for GeolocationResolver<G> {
    fn current_location(
        &self,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ResolvedLocation, LocationError>> + Send + '_>,
    > {
        Box::pin(self.resolve_current_location())
    }
}

/// Wraps the platform position source and reverse geocoding into a single
/// normalized location lookup.
pub struct GeolocationResolver<G: ReverseGeocoder> {
    source: Arc<dyn PositionSource>,
    geocoder: G,
    options: FixOptions,
}

impl<G: ReverseGeocoder> GeolocationResolver<G> {
    pub fn new(source: Arc<dyn PositionSource>, geocoder: G) -> Self {
        Self {
            source,
            geocoder,
            options: FixOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FixOptions) -> Self {
        self.options = options;
        self
    }

    /// Requests one position fix and derives a human-readable address for it.
    /// Geocoding failures never fail the resolution; the address falls back to
    /// the coordinate string.
    pub async fn resolve_current_location(&self) -> Result<ResolvedLocation, LocationError> {
        if !self.source.is_supported() {
            return Err(LocationError::Unsupported);
        }

        let (tx, rx) = oneshot::channel();
        self.source.request_fix(&self.options, tx);

        let fix = match tokio::time::timeout(self.options.timeout, rx).await {
            Err(_) => return Err(LocationError::Timeout),
            // Sender dropped without a reply: treat like a timed-out request.
            Ok(Err(_)) => return Err(LocationError::Timeout),
            Ok(Ok(Err(FixError::PermissionDenied))) => {
                return Err(LocationError::PermissionDenied)
            }
            Ok(Ok(Err(FixError::Unavailable(reason)))) => {
                return Err(LocationError::Unavailable(reason))
            }
            Ok(Ok(Ok(coords))) => coords,
        };

        let address = match self.geocoder.locality(fix).await {
            Ok(name) if !name.trim().is_empty() => Some(name),
            Ok(_) => None,
            Err(err) => {
                warn!("reverse geocoding failed, falling back to coordinates: {err:#}");
                None
            }
        };

        Ok(ResolvedLocation::from_coordinates(fix, address))
    }
}
