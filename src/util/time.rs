use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid deadline '{0}' (use YYYY-MM-DD, YYYY-MM-DD HH:MM, RFC 3339, or +30m/+2h/+3d)")]
pub struct DeadlineParseError(pub String);

/// Parse a user-entered deadline.
///
/// Accepted forms:
/// - `+30m`, `+2h`, `+3d`: relative to `now`
/// - `2025-06-01 14:30` or `2025-06-01T14:30`: local time
/// - `2025-06-01`: end of that day, local time
/// - RFC 3339 with an explicit offset
pub fn parse_deadline(
    input: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DeadlineParseError> {
    let s = input.trim();
    let err = || DeadlineParseError(s.to_string());

    let relative = Regex::new(r"^\+(\d{1,6})([mhd])$").map_err(|_| err())?;
    if let Some(caps) = relative.captures(s) {
        let n: i64 = caps[1].parse().map_err(|_| err())?;
        let delta = match &caps[2] {
            "m" => Duration::minutes(n),
            "h" => Duration::hours(n),
            _ => Duration::days(n),
        };
        return Ok(now + delta);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive).ok_or_else(err);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).ok_or_else(err)?;
        return local_to_utc(date.and_time(end_of_day)).ok_or_else(err);
    }

    Err(err())
}

/// Resolve a local wall-clock time. Ambiguous times (DST fold) take the
/// earlier instant; nonexistent ones (DST gap) fail.
fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `2025-06-01 14:30` in local time
pub fn format_local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Compact distance from `now`: `in 3h`, `2d ago`, `now`
pub fn format_relative(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = dt - now;
    let future = delta >= Duration::zero();
    let mins = delta.num_minutes().abs();
    let amount = if mins < 1 {
        return "now".to_string();
    } else if mins < 60 {
        format!("{}m", mins)
    } else if mins < 60 * 24 {
        format!("{}h", mins / 60)
    } else {
        format!("{}d", mins / (60 * 24))
    };
    if future {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}
