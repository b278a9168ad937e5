//! Human-readable durations for arguments and output.

use std::time::Duration;

use crate::error::{Result, ViewerError};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Parses durations such as `500ms`, `2s`, `1.5m` or `1m30s`.
///
/// Accepted units are `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`. A bare `0`
/// is accepted without a unit.
///
/// # Errors
/// Returns [`ViewerError::InvalidDuration`] for anything else.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || ViewerError::InvalidDuration(input.to_owned());
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_len = rest
            .find(|ch: char| !is_number_char(ch))
            .unwrap_or(rest.len());
        let (number, after_number) = rest.split_at(number_len);
        let unit_len = after_number.find(is_number_char).unwrap_or(after_number.len());
        let (unit, remaining) = after_number.split_at(unit_len);

        let value: f64 = number.parse().map_err(|_| invalid())?;
        let nanos = (value * unit_nanos(unit).ok_or_else(invalid)?).round();
        if !nanos.is_finite() || nanos < 0.0 || nanos >= u64::MAX as f64 {
            return Err(invalid());
        }
        total = total
            .checked_add(Duration::from_nanos(nanos as u64))
            .ok_or_else(invalid)?;
        rest = remaining;
    }
    Ok(total)
}

/// Formats a duration the way the viewer prints it: `µs` below a
/// millisecond, `ms` below a second, seconds with two decimals below a
/// minute, then `1h2m3s`-style.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_millis(1) {
        return format!("{}µs", duration.as_micros());
    }
    if duration < Duration::from_secs(1) {
        return format!("{}ms", duration.as_millis());
    }
    if duration < Duration::from_secs(60) {
        return format!("{:.2}s", duration.as_secs_f64());
    }

    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else {
        format!("{minutes}m{seconds}s")
    }
}

const fn is_number_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" => Some(1_000.0),
        "ms" => Some(1_000_000.0),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60.0 * NANOS_PER_SECOND),
        "h" => Some(3_600.0 * NANOS_PER_SECOND),
        _ => None,
    }
}
