use chrono::{DateTime, FixedOffset, Offset, Utc};

fn local(epoch: i64, utc_offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(epoch, 0).map(|utc| utc.with_timezone(&offset))
}

/// Date and time at the place, e.g. "Mon, 19 Oct 2026 14:05".
pub fn format_local(epoch: i64, utc_offset_secs: i32) -> String {
    local(epoch, utc_offset_secs)
        .map(|dt| dt.format("%a, %-d %b %Y %H:%M").to_string())
        .unwrap_or_else(|| "--".to_string())
}

/// Time of day at the place, e.g. "06:42".
pub fn format_time(epoch: i64, utc_offset_secs: i32) -> String {
    local(epoch, utc_offset_secs)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Clock line with seconds, refreshed every tick in watch mode.
pub fn format_clock(epoch: i64, utc_offset_secs: i32) -> String {
    local(epoch, utc_offset_secs)
        .map(|dt| dt.format("%a, %-d %b %Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_string())
}
