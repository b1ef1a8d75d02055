use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::ExpiryPolicy;
use crate::models::Session;

pub const NOT_STARTED: &str = "Not started";
pub const IN_PROGRESS: &str = "In progress";
pub const EXPIRED: &str = "Expired";

/// Start of a session in local wall-clock time, from its `date` and `time`.
pub fn session_start(session: &Session) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(session.date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
    let time = parse_clock(session.time.as_deref()?)?;
    Some(date.and_time(time))
}

/// Accepts `HH:MM` and `HH:MM:SS`; seconds are ignored.
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Countdown text for a session relative to `now`.
///
/// `None` when the session has no date, time or duration. Before the start
/// this is "Not started"; during it "Xh Ym left" or "Xm left", falling to
/// "In progress" in the final minute; at and after the nominal end the
/// policy decides between "In progress" and "Expired".
pub fn time_remaining(session: &Session, now: NaiveDateTime, policy: ExpiryPolicy) -> Option<String> {
    let duration = session.duration.filter(|d| *d > 0)?;
    let start = session_start(session)?;
    let end = start + Duration::minutes(duration as i64);

    if now < start {
        return Some(NOT_STARTED.to_string());
    }
    if now >= end {
        return Some(
            match policy {
                ExpiryPolicy::Countdown => IN_PROGRESS,
                ExpiryPolicy::Expire => EXPIRED,
            }
            .to_string(),
        );
    }

    let minutes = (end - now).num_milliseconds().div_euclid(60_000);
    let hours = minutes.div_euclid(60);
    let text = if hours > 0 {
        format!("{}h {}m left", hours, minutes.rem_euclid(60))
    } else if minutes > 0 {
        format!("{}m left", minutes)
    } else {
        IN_PROGRESS.to_string()
    };
    Some(text)
}

/// Whether the session's nominal end has passed.
pub fn has_ended(session: &Session, now: NaiveDateTime) -> bool {
    match (session_start(session), session.duration) {
        (Some(start), Some(duration)) if duration > 0 => now >= start + Duration::minutes(duration as i64),
        _ => false,
    }
}

/// Lead-time text for a scheduled session starting at `start_ms`.
pub fn scheduled_info(start_ms: i64, now_ms: i64) -> String {
    let diff_mins = (start_ms - now_ms).div_euclid(60_000);
    let diff_hours = diff_mins.div_euclid(60);
    let diff_days = diff_hours.div_euclid(24);

    if diff_days > 0 {
        format!("Starts in {}d {}h", diff_days, diff_hours % 24)
    } else if diff_hours > 0 {
        format!("Starts in {}h {}m", diff_hours, diff_mins % 60)
    } else if diff_mins > 0 {
        format!("Starts in {}m", diff_mins)
    } else {
        "Starting soon".to_string()
    }
}
