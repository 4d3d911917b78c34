use serde::{Deserialize, Serialize};

/// Whether `now` falls inside the `[sunrise, sunset)` window.
///
/// A window where sunset does not come after sunrise is treated as night.
pub fn is_daytime(sunrise: i64, sunset: i64, now: i64) -> bool {
    if sunset <= sunrise {
        return false;
    }
    sunrise <= now && now < sunset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DaylightState {
    #[default]
    Day,
    Night,
}

impl DaylightState {
    pub fn at(sunrise: i64, sunset: i64, now: i64) -> Self {
        Self::from_bool(is_daytime(sunrise, sunset, now))
    }

    pub fn from_bool(is_daytime: bool) -> Self {
        if is_daytime { Self::Day } else { Self::Night }
    }

    pub fn is_day(self) -> bool {
        matches!(self, Self::Day)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}
