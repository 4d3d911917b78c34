//! Device position: where it comes from, and polling until a usable fix arrives.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{Config, LocationMode},
    error::LocationError,
    model::Coordinates,
};

#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A position taken from configuration.
#[derive(Debug, Clone)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Location turned off by the user.
#[derive(Debug, Clone, Default)]
pub struct DisabledLocation;

#[async_trait]
impl LocationSource for DisabledLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Approximate position from the public IP address (ip-api.com JSON endpoint).
#[derive(Debug, Clone)]
pub struct IpLocator {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl LocationSource for IpLocator {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let url = format!("{}/json", self.base_url);

        let res = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::Unavailable(e.to_string())
            }
        })?;

        let body: IpApiResponse = res.json().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                LocationError::Unavailable(format!("unreadable locator response: {e}"))
            }
        })?;

        if body.status != "success" {
            return Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Unavailable("locator returned no coordinates".into())),
        }
    }
}

/// Build the location source selected in config.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn LocationSource>, LocationError> {
    let source: Arc<dyn LocationSource> = match config.location.mode {
        LocationMode::Disabled => Arc::new(DisabledLocation),
        LocationMode::Fixed => {
            let coords = config.location.fixed_coordinates().ok_or_else(|| {
                LocationError::Unavailable("fixed location mode needs latitude and longitude".into())
            })?;
            Arc::new(FixedLocation(coords))
        }
        LocationMode::Ip => Arc::new(IpLocator::new(config.ip_locator_url(), config.location.timeout())?),
    };
    Ok(source)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollState {
    Idle,
    Requesting,
    Fixed(Coordinates),
    Denied,
    Unavailable,
    TimedOut,
}

impl PollState {
    fn after_error(err: &LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => PollState::Denied,
            LocationError::Unavailable(_) => PollState::Unavailable,
            LocationError::Timeout => PollState::TimedOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Fixed(Coordinates),
    Failed(LocationError),
    Cancelled,
}

/// Asks a [`LocationSource`] for a position until it gets a valid one.
///
/// Failed attempts are retried after `interval`. Once a fix is obtained the
/// poller stops and keeps answering with it; [`LocationPoller::repoll`] asks again.
/// A permission denial ends polling immediately.
#[derive(Debug)]
pub struct LocationPoller {
    source: Arc<dyn LocationSource>,
    interval: Duration,
    max_attempts: Option<u32>,
    state: PollState,
    attempts: u32,
}

impl LocationPoller {
    pub fn new(source: Arc<dyn LocationSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            max_attempts: None,
            state: PollState::Idle,
            attempts: 0,
        }
    }

    /// Stop after `max` failed attempts instead of polling indefinitely.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = Some(max.max(1));
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Attempts made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub async fn poll_until_fixed(&mut self, cancel: &CancellationToken) -> PollOutcome {
        if let PollState::Fixed(coords) = self.state {
            return PollOutcome::Fixed(coords);
        }

        self.attempts = 0;
        loop {
            self.state = PollState::Requesting;
            self.attempts += 1;
            tracing::debug!("Requesting device location (attempt {})", self.attempts);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state = PollState::Idle;
                    return PollOutcome::Cancelled;
                }
                r = self.source.current_position() => r,
            };

            let err = match result {
                Ok(coords) if coords.is_valid() => {
                    tracing::info!("Location fixed at {coords}");
                    self.state = PollState::Fixed(coords);
                    return PollOutcome::Fixed(coords);
                }
                Ok(coords) => LocationError::Unavailable(format!("invalid fix {coords}")),
                Err(err) => err,
            };

            self.state = PollState::after_error(&err);
            tracing::warn!("Location attempt {} failed: {err}", self.attempts);

            if err == LocationError::PermissionDenied
                || self.max_attempts.is_some_and(|max| self.attempts >= max)
            {
                return PollOutcome::Failed(err);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state = PollState::Idle;
                    return PollOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Forget the current fix and poll again.
    pub async fn repoll(&mut self, cancel: &CancellationToken) -> PollOutcome {
        self.state = PollState::Idle;
        self.poll_until_fixed(cancel).await
    }
}
