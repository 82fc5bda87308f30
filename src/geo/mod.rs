pub mod geocode;
pub mod proximity;
pub mod resolver;

pub use geocode::{HttpReverseGeocoder, ReverseGeocoder};
pub use resolver::{
    FixError, FixOptions, FixedPositionSource, GeolocationResolver, LocationError,
    LocationProvider, PositionSource, UnsupportedPositionSource,
};
