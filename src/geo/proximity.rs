use crate::models::{Coordinates, NearbyUser, UserPing};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Derives a distance for every candidate, keeps those within `radius_km`
/// (boundary inclusive), and returns them sorted ascending by distance.
pub fn filter_within_radius(
    origin: Coordinates,
    candidates: Vec<UserPing>,
    radius_km: f64,
) -> Vec<NearbyUser> {
    let mut users: Vec<NearbyUser> = candidates
        .into_iter()
        .map(|ping| {
            let distance = distance_km(origin, ping.location);
            NearbyUser::from_ping(ping, distance)
        })
        .filter(|user| user.distance_km <= radius_km)
        .collect();

    users.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    users
}
