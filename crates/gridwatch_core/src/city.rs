use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEntity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub state_code: String,
}

impl CityEntity {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        state_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            state_code: state_code.into(),
        }
    }

    /// Display label; names alone are ambiguous (Portland, Charleston).
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.state_code)
    }
}

// One or more major cities per state, in state order.
const CITY_TABLE: &[(&str, f64, f64, &str)] = &[
    ("Birmingham", 32.3617, -86.7794, "AL"),
    ("Anchorage", 61.2181, -149.9003, "AK"),
    ("Phoenix", 33.4484, -112.0740, "AZ"),
    ("Little Rock", 34.7465, -92.2896, "AR"),
    ("Los Angeles", 34.0522, -118.2437, "CA"),
    ("San Francisco", 37.7749, -122.4194, "CA"),
    ("Denver", 39.7392, -104.9903, "CO"),
    ("Hartford", 41.7658, -72.6734, "CT"),
    ("Wilmington", 39.7391, -75.5398, "DE"),
    ("Miami", 25.7617, -80.1918, "FL"),
    ("Jacksonville", 30.3322, -81.6557, "FL"),
    ("Atlanta", 33.7490, -84.3880, "GA"),
    ("Honolulu", 21.3099, -157.8581, "HI"),
    ("Boise", 43.6150, -116.2023, "ID"),
    ("Chicago", 41.8781, -87.6298, "IL"),
    ("Indianapolis", 39.7684, -86.1581, "IN"),
    ("Des Moines", 41.5868, -93.6250, "IA"),
    ("Wichita", 37.6872, -97.3301, "KS"),
    ("Louisville", 38.2527, -85.7585, "KY"),
    ("New Orleans", 29.9511, -90.0715, "LA"),
    ("Portland", 43.6591, -70.2568, "ME"),
    ("Baltimore", 39.2904, -76.6122, "MD"),
    ("Boston", 42.3601, -71.0589, "MA"),
    ("Detroit", 42.3314, -83.0458, "MI"),
    ("Minneapolis", 44.9778, -93.2650, "MN"),
    ("Jackson", 32.2988, -90.1848, "MS"),
    ("Kansas City", 39.0997, -94.5786, "MO"),
    ("Billings", 45.7833, -108.5007, "MT"),
    ("Omaha", 41.2565, -95.9345, "NE"),
    ("Las Vegas", 36.1699, -115.1398, "NV"),
    ("Manchester", 42.9956, -71.4548, "NH"),
    ("Newark", 40.7357, -74.1724, "NJ"),
    ("Albuquerque", 35.0844, -106.6504, "NM"),
    ("New York", 40.7128, -74.0060, "NY"),
    ("Charlotte", 35.2271, -80.8431, "NC"),
    ("Fargo", 46.8772, -96.7898, "ND"),
    ("Columbus", 39.9612, -82.9988, "OH"),
    ("Oklahoma City", 35.4676, -97.5164, "OK"),
    ("Portland", 45.5152, -122.6784, "OR"),
    ("Philadelphia", 39.9526, -75.1652, "PA"),
    ("Providence", 41.8240, -71.4128, "RI"),
    ("Charleston", 32.7767, -79.9311, "SC"),
    ("Sioux Falls", 43.5446, -96.7311, "SD"),
    ("Nashville", 36.1627, -86.7816, "TN"),
    ("Houston", 29.7604, -95.3698, "TX"),
    ("Dallas", 32.7767, -96.7970, "TX"),
    ("San Antonio", 29.4241, -98.4936, "TX"),
    ("Salt Lake City", 40.7608, -111.8910, "UT"),
    ("Burlington", 44.4759, -73.2121, "VT"),
    ("Virginia Beach", 36.8529, -75.9780, "VA"),
    ("Seattle", 47.6062, -122.3321, "WA"),
    ("Charleston", 38.3498, -81.6326, "WV"),
    ("Milwaukee", 43.0389, -87.9065, "WI"),
    ("Cheyenne", 41.1400, -104.8197, "WY"),
];

static REFERENCE_CITIES: LazyLock<Vec<CityEntity>> = LazyLock::new(|| {
    CITY_TABLE
        .iter()
        .map(|&(name, lat, lng, state)| CityEntity::new(name, lat, lng, state))
        .collect()
});

/// The static city list used by the weather map load.
pub fn reference_cities() -> &'static [CityEntity] {
    &REFERENCE_CITIES
}
