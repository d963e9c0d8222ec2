//! Duration formatting for progress and summary lines.

use std::time::Duration;

/// Format a duration as a short human-readable string.
///
/// Sub-second durations render in milliseconds; longer ones drop to the two
/// most significant units.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60 {
        format!("{}.{}s", secs, duration.subsec_millis() / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
