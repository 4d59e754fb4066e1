//! Human-relative timestamps
//!
//! Renders message timestamps the way a chat window shows them: "Just now",
//! "15 mins", "Yesterday・9:41 PM", "Tuesday・9:41 PM", "Mar 4".
//!
//! The current instant is always passed in, so rendering is a pure function
//! of `(time, now, time zone)`. Day boundaries are calendar dates in the
//! formatter's time zone, not multiples of 24 hours.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt;

/// Label for anything under a minute old, including timestamps in the future
pub const JUST_NOW: &str = "Just now";

/// Separator between a day label and a clock time
pub const DAY_TIME_SEPARATOR: &str = "・";

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Timestamps are clamped to roughly ±250,000 years, inside chrono's range
const RENDERABLE_LIMIT_MS: i64 = 8_000_000_000_000_000;

/// Formats epoch-millisecond timestamps relative to a given "now"
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use cosmic_connect_sms::TimeFormatter;
///
/// let formatter = TimeFormatter::new(Utc);
/// let now = 1_700_000_000_000;
///
/// assert_eq!(formatter.render(now - 45_000, now), "Just now");
/// assert_eq!(formatter.render(now - 15 * 60_000, now), "15 mins");
/// ```
#[derive(Debug, Clone)]
pub struct TimeFormatter<Tz: TimeZone = Local> {
    tz: Tz,
}

impl TimeFormatter<Local> {
    /// Formatter using the system's local time zone
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for TimeFormatter<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz> TimeFormatter<Tz>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    /// Formatter for an explicit time zone
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Long label, used for thread separators and message details
    ///
    /// - under a minute: `Just now`
    /// - under an hour: `N mins`
    /// - same calendar day: `9:41 PM`
    /// - previous calendar day: `Yesterday・9:41 PM`
    /// - under a week: `Tuesday・9:41 PM`
    /// - otherwise: `Mar 4`
    pub fn render(&self, time_ms: i64, now_ms: i64) -> String {
        let elapsed = now_ms.saturating_sub(time_ms);
        if let Some(label) = recent_label(elapsed) {
            return label;
        }

        let time = self.localize(time_ms);
        let now = self.localize(now_ms);
        let clock = time.format("%-I:%M %p");
        let day = time.date_naive();
        let today = now.date_naive();

        if elapsed < DAY_MS && day == today {
            clock.to_string()
        } else if today.pred_opt() == Some(day) {
            format!("Yesterday{}{}", DAY_TIME_SEPARATOR, clock)
        } else if elapsed < WEEK_MS {
            format!("{}{}{}", time.format("%A"), DAY_TIME_SEPARATOR, clock)
        } else {
            time.format("%b %-d").to_string()
        }
    }

    /// Short label, used in the conversation list
    ///
    /// - under a minute: `Just now`
    /// - under an hour: `N mins`
    /// - under a week: `Tue`
    /// - otherwise: `Mar 4`
    pub fn render_short(&self, time_ms: i64, now_ms: i64) -> String {
        let elapsed = now_ms.saturating_sub(time_ms);
        if let Some(label) = recent_label(elapsed) {
            return label;
        }

        let time = self.localize(time_ms);
        if elapsed < WEEK_MS {
            time.format("%a").to_string()
        } else {
            time.format("%b %-d").to_string()
        }
    }

    fn localize(&self, time_ms: i64) -> DateTime<Tz> {
        let clamped = time_ms.clamp(-RENDERABLE_LIMIT_MS, RENDERABLE_LIMIT_MS);
        DateTime::<Utc>::from_timestamp_millis(clamped)
            .unwrap_or_default()
            .with_timezone(&self.tz)
    }
}

/// Labels shared by both forms for anything under an hour old
fn recent_label(elapsed_ms: i64) -> Option<String> {
    if elapsed_ms < MINUTE_MS {
        Some(JUST_NOW.to_string())
    } else if elapsed_ms < HOUR_MS {
        let minutes = elapsed_ms / MINUTE_MS;
        if minutes == 1 {
            Some("1 min".to_string())
        } else {
            Some(format!("{} mins", minutes))
        }
    } else {
        None
    }
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Long label for `time_ms`, relative to the local clock
pub fn format_time(time_ms: i64) -> String {
    TimeFormatter::local().render(time_ms, now_millis())
}

/// Short label for `time_ms`, relative to the local clock
pub fn format_time_short(time_ms: i64) -> String {
    TimeFormatter::local().render_short(time_ms, now_millis())
}
