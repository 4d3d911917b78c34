//! Display state as a single value, advanced only by discrete events.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    daylight::DaylightState,
    error::{LocationError, LookupError},
    model::{Coordinates, WeatherQuery, WeatherSnapshot},
    narrative::ConditionNarrative,
};

/// Alert shown when the provider could not be reached or understood.
pub const FETCH_FAILED_ALERT: &str = "Failed to fetch weather data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug)]
pub enum ViewEvent {
    QueryStarted {
        seq: u64,
        query: WeatherQuery,
    },
    QuerySucceeded {
        seq: u64,
        snapshot: WeatherSnapshot,
        /// Epoch seconds used to decide day or night.
        now: i64,
        /// Overrides the provider's place name, e.g. from reverse geocoding.
        place_label: Option<String>,
    },
    QueryFailed {
        seq: u64,
        error: LookupError,
    },
    LocationFixed {
        coordinates: Coordinates,
    },
    LocationFailed {
        error: LocationError,
    },
    /// The pending alerts were presented to the user.
    AlertsShown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ViewState {
    pub status: Status,
    /// Sequence number of the most recently started query.
    pub latest_seq: u64,
    pub query: Option<WeatherQuery>,
    pub snapshot: Option<WeatherSnapshot>,
    pub place_label: Option<String>,
    pub daylight: DaylightState,
    pub narrative: ConditionNarrative,
    pub device_location: Option<Coordinates>,
    pub alerts: Vec<String>,
}

impl ViewState {
    pub fn reduce(self, event: ViewEvent) -> ViewState {
        match event {
            ViewEvent::QueryStarted { seq, query } => {
                if seq <= self.latest_seq {
                    tracing::debug!("Ignoring out-of-order query start {seq}");
                    return self;
                }
                ViewState {
                    status: Status::Loading,
                    latest_seq: seq,
                    query: Some(query),
                    ..self
                }
            }

            ViewEvent::QuerySucceeded { seq, snapshot, now, place_label } => {
                if seq != self.latest_seq {
                    tracing::debug!("Dropping stale result {seq} (latest {})", self.latest_seq);
                    return self;
                }
                let daylight = DaylightState::at(snapshot.sunrise, snapshot.sunset, now);
                let narrative = ConditionNarrative::from_snapshot(&snapshot, daylight);
                ViewState {
                    status: Status::Ready,
                    place_label: Some(place_label.unwrap_or_else(|| snapshot.location_label())),
                    snapshot: Some(snapshot),
                    daylight,
                    narrative,
                    ..self
                }
            }

            ViewEvent::QueryFailed { seq, error } => {
                if seq != self.latest_seq {
                    tracing::debug!("Dropping stale failure {seq} (latest {})", self.latest_seq);
                    return self;
                }
                let mut next = match error {
                    LookupError::Network(_) | LookupError::Malformed(_) => ViewState {
                        status: Status::Failed,
                        snapshot: None,
                        place_label: None,
                        daylight: DaylightState::Day,
                        narrative: ConditionNarrative::default(),
                        ..self
                    },
                    _ => ViewState { status: Status::Failed, ..self },
                };
                next.alerts.push(alert_for(&error));
                next
            }

            ViewEvent::LocationFixed { coordinates } => ViewState {
                device_location: Some(coordinates),
                ..self
            },

            ViewEvent::LocationFailed { error } => {
                let mut next = self;
                if next.status != Status::Ready {
                    next.status = Status::Failed;
                }
                next.alerts.push(error.user_message().to_string());
                next
            }

            ViewEvent::AlertsShown => ViewState { alerts: Vec::new(), ..self },
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

fn alert_for(error: &LookupError) -> String {
    match error {
        LookupError::Network(_) | LookupError::Malformed(_) => FETCH_FAILED_ALERT.to_string(),
        LookupError::NotFound { message } => message.clone(),
        LookupError::Rejected { message, .. } => message.clone(),
        LookupError::MissingApiKey => error.to_string(),
    }
}

/// Hands out increasing query sequence numbers, starting at 1.
#[derive(Debug, Default)]
pub struct QuerySequence(AtomicU64);

impl QuerySequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}
