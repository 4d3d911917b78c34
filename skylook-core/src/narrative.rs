//! Turns raw conditions into a human phrase and a background image key.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{daylight::DaylightState, model::WeatherSnapshot};

/// Describe the current conditions in a short natural-language phrase.
///
/// Rules are checked in order and the first match wins. The condition keyword
/// is matched case-insensitively as a substring, so "Rain", "light rain" and
/// "Thunderstorm with rain" all land in the rain branch.
pub fn describe(temperature: f64, condition: &str, wind_speed: f64, is_daytime: bool) -> &'static str {
    let keyword = condition.to_lowercase();

    if keyword.contains("rain") {
        if temperature > 30.0 {
            return "Hot and stormy with heavy rain";
        }
        if temperature < 20.0 {
            return "Cold and rainy with strong winds";
        }
        return "Stormy with heavy rain";
    }

    if keyword.contains("cloud") {
        return match (is_daytime, temperature) {
            (true, t) if t > 25.0 => "Warm and cloudy",
            (false, t) if t > 25.0 => "Mild and cloudy night",
            (true, t) if t < 15.0 => "Cool and cloudy",
            (false, t) if t < 15.0 => "Chilly and overcast night",
            (true, _) => "Cloudy day",
            (false, _) => "Cloudy evening",
        };
    }

    if keyword.contains("clear") {
        if is_daytime {
            if temperature > 40.0 {
                return "Extremely hot and sunny";
            }
            if temperature > 30.0 {
                return "Hot and sunny";
            }
            if temperature > 20.0 {
                return "Sunny with a gentle breeze";
            }
            return "Clear skies with pleasant temperature";
        }
        if temperature > 25.0 {
            return "Clear and warm night";
        }
        if temperature > 15.0 {
            return "Clear night with gentle breeze";
        }
        return "Clear and cool night";
    }

    if keyword.contains("snow") {
        return "Snowy and freezing – bundle up!";
    }

    if temperature >= 18.0 && wind_speed > 6.0 {
        return "Cool wind blowing";
    }
    if (10.0..18.0).contains(&temperature) {
        return "Pleasant and cool";
    }
    if temperature < 10.0 {
        return "Cold weather – wear something warm";
    }

    "Typical day with mild conditions"
}

/// Background image tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKey {
    SunnyDay,
    CloudyDay,
    RainyDay,
    SnowyDay,
    Cold,
    Hot,
    ClearNight,
    CloudyNight,
    RainyNight,
    SnowyNight,
    DefaultNight,
}

impl ImageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKey::SunnyDay => "sunny_day",
            ImageKey::CloudyDay => "cloudy_day",
            ImageKey::RainyDay => "rainy_day",
            ImageKey::SnowyDay => "snowy_day",
            ImageKey::Cold => "cold",
            ImageKey::Hot => "hot",
            ImageKey::ClearNight => "clear_night",
            ImageKey::CloudyNight => "cloudy_night",
            ImageKey::RainyNight => "rainy_night",
            ImageKey::SnowyNight => "snowy_night",
            ImageKey::DefaultNight => "default_night",
        }
    }

    pub const fn all() -> &'static [ImageKey] {
        &[
            ImageKey::SunnyDay,
            ImageKey::CloudyDay,
            ImageKey::RainyDay,
            ImageKey::SnowyDay,
            ImageKey::Cold,
            ImageKey::Hot,
            ImageKey::ClearNight,
            ImageKey::CloudyNight,
            ImageKey::RainyNight,
            ImageKey::SnowyNight,
            ImageKey::DefaultNight,
        ]
    }

    /// Asset path relative to the image directory.
    pub fn asset_path(&self) -> String {
        format!("images/{}.jpg", self.as_str())
    }

    pub fn brightness(&self) -> Brightness {
        match self {
            ImageKey::SunnyDay
            | ImageKey::CloudyDay
            | ImageKey::SnowyDay
            | ImageKey::Hot
            | ImageKey::Cold => Brightness::Light,
            ImageKey::RainyDay
            | ImageKey::RainyNight
            | ImageKey::ClearNight
            | ImageKey::CloudyNight
            | ImageKey::SnowyNight
            | ImageKey::DefaultNight => Brightness::Dark,
        }
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageKey::all()
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown image key '{s}'"))
    }
}

/// Pick the background image for a narrative phrase.
pub fn image_for(description: &str, is_daytime: bool) -> ImageKey {
    let text = description.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if is_daytime {
        if has(&["snow"]) {
            ImageKey::SnowyDay
        } else if has(&["rain", "storm"]) {
            ImageKey::RainyDay
        } else if has(&["cloud", "overcast"]) {
            ImageKey::CloudyDay
        } else if has(&["hot"]) {
            ImageKey::Hot
        } else if has(&["cold", "cool", "chilly"]) {
            ImageKey::Cold
        } else {
            // "sunny", "clear" and anything unmatched share the daytime default.
            ImageKey::SunnyDay
        }
    } else if has(&["snow"]) {
        ImageKey::SnowyNight
    } else if has(&["rain", "storm"]) {
        ImageKey::RainyNight
    } else if has(&["cloud", "overcast"]) {
        ImageKey::CloudyNight
    } else if has(&["clear"]) {
        ImageKey::ClearNight
    } else if has(&["cold", "cool", "chilly"]) {
        ImageKey::Cold
    } else if has(&["hot"]) {
        ImageKey::Hot
    } else {
        ImageKey::DefaultNight
    }
}

/// How bright a background image is, used to pick a readable text colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Brightness {
    #[default]
    Light,
    Dark,
}

impl Brightness {
    /// Text tone that stays readable on this background.
    pub fn text_tone(self) -> Brightness {
        match self {
            Brightness::Light => Brightness::Dark,
            Brightness::Dark => Brightness::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Brightness::Light => "light",
            Brightness::Dark => "dark",
        }
    }
}

/// Brightness for an image key given by name; unknown names count as light.
pub fn brightness_of(key: &str) -> Brightness {
    key.parse::<ImageKey>()
        .map(|k| k.brightness())
        .unwrap_or_default()
}

/// Everything the display needs to present one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNarrative {
    pub description: String,
    pub image: ImageKey,
    pub brightness: Brightness,
}

impl ConditionNarrative {
    pub fn new(temperature: f64, condition: &str, wind_speed: f64, daylight: DaylightState) -> Self {
        let description = describe(temperature, condition, wind_speed, daylight.is_day());
        let image = image_for(description, daylight.is_day());

        Self {
            description: description.to_string(),
            image,
            brightness: image.brightness(),
        }
    }

    pub fn from_snapshot(snapshot: &WeatherSnapshot, daylight: DaylightState) -> Self {
        Self::new(
            snapshot.temperature_c,
            &snapshot.condition,
            snapshot.wind_speed_mps,
            daylight,
        )
    }
}

impl Default for ConditionNarrative {
    /// The neutral daytime display used before any data arrives or after a failure.
    fn default() -> Self {
        Self {
            description: String::new(),
            image: ImageKey::SunnyDay,
            brightness: ImageKey::SunnyDay.brightness(),
        }
    }
}
