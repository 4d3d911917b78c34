//! Ties the provider, geocoder and location poller to one [`ViewState`].

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::LookupError,
    geocode::{ReverseGeocoder, UNKNOWN_LOCATION},
    location::{self, LocationPoller, LocationSource, PollOutcome},
    model::{WeatherQuery, WeatherSnapshot},
    provider::{WeatherProvider, provider_from_config},
    view::{QuerySequence, ViewEvent, ViewState},
};

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct Session {
    provider: Arc<dyn WeatherProvider>,
    geocoder: ReverseGeocoder,
    poller: LocationPoller,
    sequence: QuerySequence,
    state: ViewState,
    clock: Clock,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider", &self.provider)
            .field("poller", &self.poller)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geocoder: ReverseGeocoder,
        poller: LocationPoller,
    ) -> Self {
        Self {
            provider,
            geocoder,
            poller,
            sequence: QuerySequence::new(),
            state: ViewState::default(),
            clock: Arc::new(|| Utc::now().timestamp()),
        }
    }

    /// Build a session from the on-disk configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn WeatherProvider> = provider_from_config(config)?.into();
        let source: Arc<dyn LocationSource> =
            location::source_from_config(config).context("Invalid [location] configuration")?;

        let mut poller = LocationPoller::new(source, config.location.poll_interval());
        if config.location.max_attempts > 0 {
            poller = poller.with_max_attempts(config.location.max_attempts);
        }

        Ok(Self::new(provider, ReverseGeocoder::new(config.geocoding_url()), poller))
    }

    /// Replace the wall clock used for day/night decisions.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    pub fn apply(&mut self, event: ViewEvent) -> &ViewState {
        self.state = std::mem::take(&mut self.state).reduce(event);
        &self.state
    }

    /// Start a query and return its sequence number.
    pub fn begin(&mut self, query: WeatherQuery) -> u64 {
        let seq = self.sequence.next();
        self.apply(ViewEvent::QueryStarted { seq, query });
        seq
    }

    /// Record the outcome of query `seq`; outdated results are dropped.
    pub fn finish(
        &mut self,
        seq: u64,
        result: Result<WeatherSnapshot, LookupError>,
        place_label: Option<String>,
    ) -> &ViewState {
        let event = match result {
            Ok(snapshot) => ViewEvent::QuerySucceeded { seq, snapshot, now: self.now(), place_label },
            Err(error) => ViewEvent::QueryFailed { seq, error },
        };
        self.apply(event)
    }

    /// Alerts raised since they were last taken.
    pub fn take_alerts(&mut self) -> Vec<String> {
        let alerts = self.state.alerts.clone();
        self.apply(ViewEvent::AlertsShown);
        alerts
    }

    /// Look up a city by name.
    ///
    /// When the provider does not know the city, its message is kept as an
    /// alert and the weather for the device location is shown instead.
    pub async fn lookup_city(&mut self, name: &str, cancel: &CancellationToken) -> &ViewState {
        let name = name.trim();
        if name.is_empty() {
            return &self.state;
        }

        let seq = self.begin(WeatherQuery::City(name.to_string()));
        let result = self.provider.get_weather(&WeatherQuery::City(name.to_string())).await;

        let not_found = matches!(&result, Err(e) if e.is_not_found());
        self.finish(seq, result, None);

        if not_found {
            tracing::info!("'{name}' not found, falling back to device location");
            return self.lookup_here(cancel).await;
        }
        &self.state
    }

    /// Look up the weather where the device is.
    pub async fn lookup_here(&mut self, cancel: &CancellationToken) -> &ViewState {
        let coordinates = match self.poller.poll_until_fixed(cancel).await {
            PollOutcome::Fixed(coordinates) => coordinates,
            PollOutcome::Failed(error) => return self.apply(ViewEvent::LocationFailed { error }),
            PollOutcome::Cancelled => return &self.state,
        };
        self.apply(ViewEvent::LocationFixed { coordinates });

        let query = WeatherQuery::Coordinates(coordinates);
        let seq = self.begin(query.clone());
        let result = self.provider.get_weather(&query).await;

        let label = match &result {
            Ok(snapshot) => {
                let name = self.geocoder.place_name(coordinates).await;
                // Prefer the provider's place name over an unresolved geocode.
                if name == UNKNOWN_LOCATION && !snapshot.place.trim().is_empty() {
                    None
                } else {
                    Some(name)
                }
            }
            Err(_) => None,
        };
        self.finish(seq, result, label)
    }

    /// Drop the current fix and look up the new device location.
    pub async fn relocate(&mut self, cancel: &CancellationToken) -> &ViewState {
        match self.poller.repoll(cancel).await {
            PollOutcome::Fixed(_) => self.lookup_here(cancel).await,
            PollOutcome::Failed(error) => self.apply(ViewEvent::LocationFailed { error }),
            PollOutcome::Cancelled => &self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LocationError,
        location::{DisabledLocation, FixedLocation},
        model::{Coordinates, sample_snapshot},
        view::{FETCH_FAILED_ALERT, Status},
    };
    use async_trait::async_trait;
    use std::{sync::Mutex, time::Duration};

    /// Answers from a fixed table and records every query it receives.
    #[derive(Debug, Default)]
    struct FakeProvider {
        seen: Mutex<Vec<WeatherQuery>>,
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, LookupError> {
            self.seen.lock().unwrap().push(query.clone());
            match query {
                WeatherQuery::City(name) if name == "Paris" => Ok(sample_snapshot()),
                WeatherQuery::City(name) if name == "Offline" => {
                    Err(LookupError::Network("connection refused".into()))
                }
                WeatherQuery::City(_) => Err(LookupError::NotFound { message: "city not found".into() }),
                WeatherQuery::Coordinates(c) => {
                    let mut snap = sample_snapshot();
                    snap.place = "Somewhere".into();
                    snap.coordinates = Some(*c);
                    Ok(snap)
                }
            }
        }
    }

    const HERE: Coordinates = Coordinates { latitude: 59.91, longitude: 10.75 };

    fn session(provider: Arc<FakeProvider>, source: Arc<dyn LocationSource>) -> Session {
        let poller = LocationPoller::new(source, Duration::from_secs(3)).with_max_attempts(2);
        // Nothing listens here, so reverse geocoding always comes back unresolved.
        let geocoder = ReverseGeocoder::new("http://127.0.0.1:9");
        let midday = sample_snapshot().sunrise + 3_600;
        Session::new(provider, geocoder, poller).with_clock(move || midday)
    }

    #[tokio::test]
    async fn known_city_is_displayed() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider.clone(), Arc::new(FixedLocation(HERE)));

        let state = s.lookup_city("Paris", &CancellationToken::new()).await;
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.narrative.description, "Sunny with a gentle breeze");
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_city_falls_back_to_device_location() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider.clone(), Arc::new(FixedLocation(HERE)));

        let state = s.lookup_city("Atlantis", &CancellationToken::new()).await.clone();
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.alerts, vec!["city not found".to_string()]);
        assert_eq!(state.device_location, Some(HERE));
        assert_eq!(state.place_label.as_deref(), Some("Somewhere, FR"));

        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![WeatherQuery::City("Atlantis".into()), WeatherQuery::Coordinates(HERE)]
        );

        assert_eq!(s.take_alerts(), vec!["city not found".to_string()]);
        assert!(s.state().alerts.is_empty());
    }

    #[tokio::test]
    async fn unresolved_place_without_provider_name_reads_unknown() {
        #[derive(Debug)]
        struct Nameless;

        #[async_trait]
        impl WeatherProvider for Nameless {
            async fn get_weather(&self, _: &WeatherQuery) -> Result<WeatherSnapshot, LookupError> {
                let mut snap = sample_snapshot();
                snap.place = String::new();
                snap.country = None;
                Ok(snap)
            }
        }

        let poller = LocationPoller::new(Arc::new(FixedLocation(HERE)), Duration::from_secs(3));
        let mut s = Session::new(Arc::new(Nameless), ReverseGeocoder::new("http://127.0.0.1:9"), poller);

        let state = s.lookup_here(&CancellationToken::new()).await;
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.place_label.as_deref(), Some(UNKNOWN_LOCATION));
    }

    #[tokio::test]
    async fn relocate_looks_up_the_new_fix() {
        #[derive(Debug)]
        struct Moving(Mutex<Vec<Coordinates>>);

        #[async_trait]
        impl LocationSource for Moving {
            async fn current_position(&self) -> Result<Coordinates, LocationError> {
                Ok(self.0.lock().unwrap().remove(0))
            }
        }

        let bergen = Coordinates::new(60.39, 5.32);
        let provider = Arc::new(FakeProvider::default());
        let source = Arc::new(Moving(Mutex::new(vec![HERE, bergen])));
        let mut s = session(provider.clone(), source);
        let cancel = CancellationToken::new();

        assert_eq!(s.lookup_here(&cancel).await.device_location, Some(HERE));

        let state = s.relocate(&cancel).await;
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.device_location, Some(bergen));
        assert_eq!(state.query, Some(WeatherQuery::Coordinates(bergen)));
        assert_eq!(state.snapshot.as_ref().and_then(|snap| snap.coordinates), Some(bergen));

        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![WeatherQuery::Coordinates(HERE), WeatherQuery::Coordinates(bergen)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_reports_location_failure() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider, Arc::new(DisabledLocation));

        let state = s.lookup_city("Atlantis", &CancellationToken::new()).await;
        assert_eq!(state.status, Status::Failed);
        assert_eq!(
            state.alerts,
            vec![
                "city not found".to_string(),
                LocationError::PermissionDenied.user_message().to_string()
            ]
        );
    }

    #[tokio::test]
    async fn network_failure_shows_fixed_alert_without_fallback() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider.clone(), Arc::new(FixedLocation(HERE)));

        let state = s.lookup_city("Offline", &CancellationToken::new()).await;
        assert_eq!(state.status, Status::Failed);
        assert_eq!(state.alerts, vec![FETCH_FAILED_ALERT.to_string()]);
        assert!(state.snapshot.is_none());
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_city_is_ignored() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider.clone(), Arc::new(FixedLocation(HERE)));

        let state = s.lookup_city("   ", &CancellationToken::new()).await;
        assert_eq!(state.status, Status::Idle);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_location_lookup_leaves_state_alone() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider.clone(), Arc::new(FixedLocation(HERE)));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let state = s.lookup_here(&cancel).await;
        assert_eq!(state.status, Status::Idle);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn finish_ignores_superseded_query() {
        let provider = Arc::new(FakeProvider::default());
        let mut s = session(provider, Arc::new(FixedLocation(HERE)));

        let first = s.begin(WeatherQuery::City("Paris".into()));
        let second = s.begin(WeatherQuery::City("Oslo".into()));
        assert!(second > first);

        s.finish(first, Ok(sample_snapshot()), None);
        assert!(s.state().is_loading());

        s.finish(second, Err(LookupError::NotFound { message: "city not found".into() }), None);
        assert_eq!(s.state().status, Status::Failed);
    }
}
