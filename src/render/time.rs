use chrono::{ DateTime, TimeZone };
use std::fmt::Display;

/// Human-relative label for a turn's timestamp, evaluated in `now`'s zone.
pub fn relative_label<Tz>(at: &DateTime<Tz>, now: &DateTime<Tz>) -> String
    where Tz: TimeZone, Tz::Offset: Display
{
    let elapsed = now.clone().signed_duration_since(at.clone());
    if elapsed.num_seconds() < 60 {
        return "just now".to_string();
    }
    let minutes = elapsed.num_minutes();
    if minutes < 60 {
        return if minutes == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", minutes)
        };
    }
    if at.date_naive() == now.date_naive() {
        at.format("%H:%M").to_string()
    } else {
        at.format("%b %-d").to_string()
    }
}
