use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What the weather provider is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherQuery {
    City(String),
    Coordinates(Coordinates),
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherQuery::City(name) => f.write_str(name),
            WeatherQuery::Coordinates(c) => write!(f, "({c})"),
        }
    }
}

/// Current conditions as reported by the provider for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub place: String,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    /// Coarse category such as "Rain", "Clouds", "Clear" or "Snow".
    pub condition: String,
    /// Provider's finer wording, e.g. "light rain".
    pub details: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub sunrise: i64,
    pub sunset: i64,
    pub observed_at: i64,
    /// Offset of the place's local time from UTC.
    pub utc_offset_secs: i32,
}

impl WeatherSnapshot {
    /// "Paris, FR", or just the place when no country is known.
    pub fn location_label(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", self.place, country),
            _ => self.place.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        place: "Paris".to_string(),
        country: Some("FR".to_string()),
        coordinates: Some(Coordinates::new(48.8534, 2.3488)),
        temperature_c: 22.0,
        feels_like_c: 21.5,
        temp_min_c: 19.0,
        temp_max_c: 24.0,
        condition: "Clear".to_string(),
        details: "clear sky".to_string(),
        humidity_pct: 55,
        wind_speed_mps: 3.1,
        sunrise: 1_760_853_600,
        sunset: 1_760_892_000,
        observed_at: 1_760_875_200,
        utc_offset_secs: 7200,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_label_includes_country_when_known() {
        let mut snap = sample_snapshot();
        assert_eq!(snap.location_label(), "Paris, FR");

        snap.country = None;
        assert_eq!(snap.location_label(), "Paris");

        snap.country = Some(String::new());
        assert_eq!(snap.location_label(), "Paris");
    }

    #[test]
    fn coordinates_validity() {
        assert!(Coordinates::new(51.5, -0.12).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, f64::NAN).is_valid());
    }
}
