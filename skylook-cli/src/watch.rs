//! `skylook watch`: live clock plus periodic weather refresh.

use std::{io::Write, time::Duration};

use chrono::Local;
use skylook_core::{LookupError, Session, ViewState, WeatherQuery, WeatherSnapshot, clock};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::render;

const CLOCK_TICK: Duration = Duration::from_secs(1);
const MIN_REFRESH_SECS: u64 = 10;

type Fetched = (u64, Result<WeatherSnapshot, LookupError>);

pub async fn run(
    mut session: Session,
    city: Option<String>,
    refresh_secs: u64,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    match city.as_deref() {
        Some(city) => session.lookup_city(city, &cancel).await,
        None => session.lookup_here(&cancel).await,
    };
    show(&mut session);

    let (tx, mut rx) = mpsc::channel::<Fetched>(4);
    let mut in_flight: Option<JoinHandle<()>> = None;

    let mut clock_timer = tokio::time::interval(CLOCK_TICK);
    clock_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut refresh_timer =
        tokio::time::interval(Duration::from_secs(refresh_secs.max(MIN_REFRESH_SECS)));
    refresh_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the initial lookup already ran.
    refresh_timer.tick().await;

    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = clock_timer.tick() => {
                let line = clock::format_clock(session.now(), display_offset(session.state()));
                print!("\r{line}  ");
                let _ = stdout.flush();
            }

            _ = refresh_timer.tick() => {
                let Some(query) = session.state().query.clone() else {
                    continue;
                };
                let seq = session.begin(query.clone());
                tracing::debug!("Refreshing {query} as query {seq}");

                if let Some(previous) = in_flight.take() {
                    previous.abort();
                }
                let provider = session.provider();
                let tx = tx.clone();
                in_flight = Some(tokio::spawn(async move {
                    let result = provider.get_weather(&query).await;
                    let _ = tx.send((seq, result)).await;
                }));
            }

            Some((seq, result)) = rx.recv() => {
                let not_found = matches!(&result, Err(e) if e.is_not_found());
                let label = refresh_label(session.state());
                session.finish(seq, result, label);

                // A city that is no longer known falls back to the device location,
                // the same way an interactive lookup does.
                if not_found && session.state().latest_seq == seq {
                    tracing::info!("Refreshed city not found, falling back to device location");
                    session.lookup_here(&cancel).await;
                }
                println!();
                show(&mut session);
            }
        }
    }

    if let Some(task) = in_flight.take() {
        task.abort();
    }
    println!();
    Ok(())
}

fn show(session: &mut Session) {
    for alert in session.take_alerts() {
        eprintln!("! {alert}");
    }
    print!("{}", render::render(session.state()));
}

/// Coordinate lookups keep the reverse-geocoded name between refreshes.
fn refresh_label(state: &ViewState) -> Option<String> {
    match state.query {
        Some(WeatherQuery::Coordinates(_)) => state.place_label.clone(),
        _ => None,
    }
}

/// Show the clock in the place's time zone once it is known.
fn display_offset(state: &ViewState) -> i32 {
    state
        .snapshot
        .as_ref()
        .map(|s| s.utc_offset_secs)
        .unwrap_or_else(|| Local::now().offset().local_minus_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skylook_core::{
        Coordinates, LocationError, WeatherProvider,
        geocode::ReverseGeocoder,
        location::{FixedLocation, LocationPoller, LocationSource},
    };
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    const HERE: Coordinates = Coordinates { latitude: 59.91, longitude: 10.75 };

    /// Knows only Paris and coordinates; records every query.
    #[derive(Debug, Default)]
    struct FakeProvider {
        seen: Mutex<Vec<WeatherQuery>>,
    }

    impl FakeProvider {
        fn seen(&self) -> Vec<WeatherQuery> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, LookupError> {
            self.seen.lock().unwrap().push(query.clone());
            match query {
                WeatherQuery::City(name) if name == "Paris" => Ok(snapshot("Paris")),
                WeatherQuery::City(_) => Err(LookupError::NotFound { message: "city not found".into() }),
                WeatherQuery::Coordinates(_) => Ok(snapshot("Oslo")),
            }
        }
    }

    #[derive(Debug)]
    struct Scripted(Mutex<VecDeque<Result<Coordinates, LocationError>>>);

    #[async_trait]
    impl LocationSource for Scripted {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LocationError::Unavailable("script exhausted".into())))
        }
    }

    fn snapshot(place: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            place: place.into(),
            country: None,
            coordinates: None,
            temperature_c: 18.0,
            feels_like_c: 18.0,
            temp_min_c: 17.0,
            temp_max_c: 19.0,
            condition: "Clear".into(),
            details: "clear sky".into(),
            humidity_pct: 50,
            wind_speed_mps: 2.0,
            sunrise: 1_760_853_600,
            sunset: 1_760_892_000,
            observed_at: 1_760_860_000,
            utc_offset_secs: 7200,
        }
    }

    fn session(provider: Arc<FakeProvider>, source: Arc<dyn LocationSource>) -> Session {
        let poller = LocationPoller::new(source, Duration::from_secs(3)).with_max_attempts(1);
        Session::new(provider, ReverseGeocoder::new("http://127.0.0.1:9"), poller)
            .with_clock(|| 1_760_860_000)
    }

    fn cancel_after(secs: u64) -> CancellationToken {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            trigger.cancel();
        });
        cancel
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_once_per_interval_and_stops_on_cancel() {
        let provider = Arc::new(FakeProvider::default());
        let s = session(provider.clone(), Arc::new(FixedLocation(HERE)));

        run(s, Some("Paris".into()), 10, cancel_after(15)).await.unwrap();
        let paris = WeatherQuery::City("Paris".into());
        assert_eq!(provider.seen(), vec![paris.clone(), paris.clone()]);

        // Nothing keeps refreshing once the loop has returned.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(provider.seen(), vec![paris.clone(), paris]);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_of_unknown_city_retries_location_fallback() {
        let provider = Arc::new(FakeProvider::default());
        let source = Scripted(Mutex::new(VecDeque::from([
            Err(LocationError::Unavailable("no signal".into())),
            Ok(HERE),
        ])));
        let s = session(provider.clone(), Arc::new(source));

        run(s, Some("Atlantis".into()), 10, cancel_after(15)).await.unwrap();
        let atlantis = WeatherQuery::City("Atlantis".into());
        assert_eq!(
            provider.seen(),
            vec![atlantis.clone(), atlantis, WeatherQuery::Coordinates(HERE)]
        );
    }

    #[test]
    fn city_refresh_uses_provider_name() {
        let state = ViewState {
            query: Some(WeatherQuery::City("Oslo".into())),
            place_label: Some("Oslo, NO".into()),
            ..Default::default()
        };
        assert_eq!(refresh_label(&state), None);
    }

    #[test]
    fn coordinate_refresh_keeps_geocoded_name() {
        let state = ViewState {
            query: Some(WeatherQuery::Coordinates(Coordinates::new(59.9, 10.7))),
            place_label: Some("Oslo".into()),
            ..Default::default()
        };
        assert_eq!(refresh_label(&state).as_deref(), Some("Oslo"));
    }
}
