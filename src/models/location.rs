use serde::{Deserialize, Serialize};

/// A bare latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinate string used wherever a human-readable address is missing,
    /// e.g. "12.900000, 77.600000".
    pub fn display_string(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A position fix plus the best human-readable address we could derive for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl ResolvedLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Builds a location whose address falls back to the coordinate string.
    pub fn from_coordinates(coords: Coordinates, address: Option<String>) -> Self {
        let address = address.unwrap_or_else(|| coords.display_string());
        Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            address,
        }
    }
}
