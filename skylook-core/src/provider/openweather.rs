use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::DEFAULT_PROVIDER_URL,
    error::LookupError,
    model::{Coordinates, WeatherQuery, WeatherSnapshot},
};

use super::WeatherProvider;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, DEFAULT_PROVIDER_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn fetch_current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, LookupError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let mut params = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        match query {
            WeatherQuery::City(name) => params.push(("q", name.clone())),
            WeatherQuery::Coordinates(c) => {
                params.push(("lat", c.latitude.to_string()));
                params.push(("lon", c.longitude.to_string()));
            }
        }

        tracing::debug!("Requesting current weather for {query}");

        let res = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| LookupError::Network(format!("Failed to reach OpenWeather: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| LookupError::Network(format!("Failed to read OpenWeather response: {e}")))?;

        parse_current(status.as_u16(), &body)
    }
}

/// Interpret an OpenWeather current-weather body.
///
/// The `cod` field is the number `200` on success but a string such as `"404"`
/// on errors, so it is compared in its textual form.
fn parse_current(http_status: u16, body: &str) -> Result<WeatherSnapshot, LookupError> {
    let envelope: OwEnvelope = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) if (200..300).contains(&http_status) => return Err(e.into()),
        Err(_) => {
            return Err(LookupError::Rejected {
                code: http_status.to_string(),
                message: truncate_body(body),
            });
        }
    };

    let code = envelope
        .cod
        .as_ref()
        .and_then(value_as_code)
        .unwrap_or_else(|| http_status.to_string());

    if code != "200" {
        let message = envelope
            .message
            .as_ref()
            .and_then(value_as_code)
            .unwrap_or_else(|| format!("request failed with status {code}"));

        tracing::warn!("OpenWeather returned {code}: {message}");
        return Err(if code == "404" {
            LookupError::NotFound { message }
        } else {
            LookupError::Rejected { code, message }
        });
    }

    let parsed: OwCurrentResponse = serde_json::from_str(body)?;

    let (condition, details) = parsed
        .weather
        .first()
        .map(|w| (w.main.clone(), w.description.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), "unknown".to_string()));

    Ok(WeatherSnapshot {
        place: parsed.name,
        country: parsed.sys.country.filter(|c| !c.is_empty()),
        coordinates: parsed.coord.map(|c| Coordinates::new(c.lat, c.lon)),
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        temp_min_c: parsed.main.temp_min,
        temp_max_c: parsed.main.temp_max,
        condition,
        details,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        sunrise: parsed.sys.sunrise,
        sunset: parsed.sys.sunset,
        observed_at: parsed.dt,
        utc_offset_secs: parsed.timezone,
    })
}

fn value_as_code(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    coord: Option<OwCoord>,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, LookupError> {
        self.fetch_current(query).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
pub(crate) fn sample_body() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 2.3488, "lat": 48.8534 },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "main": {
            "temp": 14.2, "feels_like": 13.6, "temp_min": 12.9,
            "temp_max": 15.1, "pressure": 1012, "humidity": 81
        },
        "wind": { "speed": 4.6, "deg": 220 },
        "dt": 1_760_875_200,
        "sys": { "country": "FR", "sunrise": 1_760_853_600, "sunset": 1_760_892_000 },
        "timezone": 7200,
        "name": "Paris",
        "cod": 200
    })
}
