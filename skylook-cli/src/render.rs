use std::fmt::Write;

use skylook_core::{Status, ViewState, clock};

/// Multi-line, human-friendly view of the current state.
pub fn render(state: &ViewState) -> String {
    let mut out = String::new();

    let Some(snap) = state.snapshot.as_ref().filter(|_| state.status == Status::Ready) else {
        let line = match state.status {
            Status::Idle => "Search for a city to see its weather.",
            Status::Loading => "Fetching weather...",
            Status::Ready | Status::Failed => "No weather to show.",
        };
        let _ = writeln!(out, "{line}");
        let _ = writeln!(
            out,
            "Background: {} ({} text)",
            state.narrative.image.asset_path(),
            state.narrative.brightness.text_tone().as_str()
        );
        return out;
    };

    let place = state.place_label.clone().unwrap_or_else(|| snap.location_label());
    let _ = writeln!(out, "{place}");
    let _ = writeln!(out, "{}", clock::format_local(snap.observed_at, snap.utc_offset_secs));
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", state.narrative.description);
    let _ = writeln!(out, "  {:.1}°C ({})", snap.temperature_c, snap.details);
    let _ = writeln!(
        out,
        "  Feels like {:.1}°C, min {:.1}°C, max {:.1}°C",
        snap.feels_like_c, snap.temp_min_c, snap.temp_max_c
    );
    let _ = writeln!(out, "  Humidity {}%, wind {:.1} m/s", snap.humidity_pct, snap.wind_speed_mps);
    let _ = writeln!(
        out,
        "  Sunrise {}, sunset {} ({})",
        clock::format_time(snap.sunrise, snap.utc_offset_secs),
        clock::format_time(snap.sunset, snap.utc_offset_secs),
        state.daylight.as_str()
    );
    let _ = writeln!(
        out,
        "  Background: {} ({} text)",
        state.narrative.image.asset_path(),
        state.narrative.brightness.text_tone().as_str()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylook_core::{ViewEvent, WeatherQuery, WeatherSnapshot};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            place: "Lisbon".into(),
            country: Some("PT".into()),
            coordinates: None,
            temperature_c: 31.4,
            feels_like_c: 30.9,
            temp_min_c: 29.0,
            temp_max_c: 33.0,
            condition: "Clear".into(),
            details: "clear sky".into(),
            humidity_pct: 40,
            wind_speed_mps: 2.5,
            sunrise: 1_792_390_000,
            sunset: 1_792_430_000,
            observed_at: 1_792_411_500,
            utc_offset_secs: 3600,
        }
    }

    #[test]
    fn ready_state_lists_conditions() {
        let state = ViewState::default()
            .reduce(ViewEvent::QueryStarted { seq: 1, query: WeatherQuery::City("Lisbon".into()) })
            .reduce(ViewEvent::QuerySucceeded {
                seq: 1,
                snapshot: snapshot(),
                now: 1_792_411_500,
                place_label: None,
            });

        let text = render(&state);
        assert!(text.starts_with("Lisbon, PT\n"));
        assert!(text.contains("Mon, 19 Oct 2026 13:05"));
        assert!(text.contains("Hot and sunny"));
        assert!(text.contains("31.4°C (clear sky)"));
        assert!(text.contains("Humidity 40%"));
        assert!(text.contains("images/hot.jpg (dark text)"));
    }

    #[test]
    fn idle_state_invites_a_search() {
        let text = render(&ViewState::default());
        assert!(text.contains("Search for a city"));
        assert!(text.contains("images/sunny_day.jpg"));
    }
}
