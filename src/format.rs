//! Display formatting for countdowns.
//!
//! Three formatters turn a target into a display string:
//!
//! - [`format_countdown`]: verbose, translatable wording (`"5 hours 30 minutes"`)
//! - [`format_countdown_short`]: unit tokens (`"5h 30m"`)
//! - [`format_countdown_compact`]: clock layout (`"05:30:00"`)
//!
//! Every formatter recomputes the remaining time from the target on each
//! call; none of them reads a cached value. The `*_at` variants take the
//! current instant explicitly and are pure.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_countdown::format::{
//!     format_countdown_at, format_countdown_compact_at, format_countdown_short_at,
//!     CompactOptions, FormatOptions, TranslationOptions,
//! };
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let target = now + Duration::minutes(330);
//!
//! let opts = FormatOptions::default();
//! assert_eq!(
//!     format_countdown_at(target, now, &opts, &TranslationOptions::default()).unwrap(),
//!     "5 hours 30 minutes"
//! );
//! assert_eq!(format_countdown_short_at(target, now, &opts).unwrap(), "5h 30m");
//! assert_eq!(
//!     format_countdown_compact_at(target, now, &CompactOptions::default()).unwrap(),
//!     "05:30:00"
//! );
//! ```
//!
//! # Translation
//!
//! ```rust
//! use bubbletea_countdown::format::{format_countdown_at, FormatOptions, TranslationOptions};
//! use chrono::{Duration, Utc};
//!
//! let translation = TranslationOptions::new().with_translate(|key, params| match key {
//!     "{{count}} minutes" => format!("{} Minuten", params.map_or(0, |p| p["count"])),
//!     "Available now" => "Jetzt verfügbar".to_string(),
//!     other => other.to_string(),
//! });
//!
//! let now = Utc::now();
//! let opts = FormatOptions::default();
//! let text = format_countdown_at(now + Duration::minutes(12), now, &opts, &translation).unwrap();
//! assert_eq!(text, "12 Minuten");
//! ```

use crate::error::Result;
use crate::remaining::{calculate_at, Target, TimeRemaining};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Literal shown by the short formatter when nothing is left to show.
const SHORT_ZERO: &str = "0m";

/// Placeholder substituted with the count in plural messages.
const COUNT_PLACEHOLDER: &str = "{{count}}";

/// Parameters handed to a translate function. Plural messages carry `"count"`.
pub type TranslateParams = HashMap<&'static str, u64>;

/// Translate function: `(key, params) -> message`.
pub type TranslateFn = Arc<dyn Fn(&str, Option<&TranslateParams>) -> String + Send + Sync>;

/// Shared options for the verbose and short formatters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Seconds are shown only while there are no hours and fewer minutes
    /// than this.
    pub show_seconds_threshold: u64,
    /// String placed between the rendered parts.
    pub separator: String,
    /// Render zero-valued components instead of omitting them.
    pub show_zeros: bool,
    /// Advisory timezone name. Remaining time is timezone independent, so the
    /// formatters carry it without interpreting it.
    pub timezone: Option<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_seconds_threshold: 5,
            separator: " ".to_string(),
            show_zeros: false,
            timezone: None,
        }
    }
}

impl FormatOptions {
    /// Creates options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minutes threshold below which seconds are shown.
    pub fn with_show_seconds_threshold(mut self, minutes: u64) -> Self {
        self.show_seconds_threshold = minutes;
        self
    }

    /// Sets the separator placed between parts.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets whether zero-valued components are rendered.
    pub fn with_show_zeros(mut self, show_zeros: bool) -> Self {
        self.show_zeros = show_zeros;
        self
    }

    /// Sets the advisory timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    fn shows_seconds(&self, remaining: &TimeRemaining) -> bool {
        remaining.hours == 0 && remaining.minutes < self.show_seconds_threshold
    }
}

/// Options for the compact clock layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactOptions {
    /// Show an hours field. When off, hours fold into the minutes field.
    pub show_hours: bool,
    /// Show a trailing seconds field.
    pub show_seconds: bool,
    /// Advisory timezone, carried like [`FormatOptions::timezone`].
    pub timezone: Option<String>,
}

impl Default for CompactOptions {
    fn default() -> Self {
        Self {
            show_hours: true,
            show_seconds: true,
            timezone: None,
        }
    }
}

impl CompactOptions {
    /// Creates options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether an hours field is shown.
    pub fn with_show_hours(mut self, show_hours: bool) -> Self {
        self.show_hours = show_hours;
        self
    }

    /// Sets whether a seconds field is shown.
    pub fn with_show_seconds(mut self, show_seconds: bool) -> Self {
        self.show_seconds = show_seconds;
        self
    }

    /// Sets the advisory timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

/// Message keys used by the verbose formatter.
///
/// Without a translate function the keys are the messages themselves, with
/// `{{count}}` replaced by the count in the plural slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageKeys {
    /// Shown when the countdown has expired or nothing is left to show.
    pub available_now: String,
    /// Exactly one hour.
    pub one_hour: String,
    /// Any other number of hours.
    pub hours: String,
    /// Exactly one minute.
    pub one_minute: String,
    /// Any other number of minutes.
    pub minutes: String,
    /// Exactly one second.
    pub one_second: String,
    /// Any other number of seconds.
    pub seconds: String,
}

static DEFAULT_KEYS: Lazy<MessageKeys> = Lazy::new(|| MessageKeys {
    available_now: "Available now".to_string(),
    one_hour: "1 hour".to_string(),
    hours: "{{count}} hours".to_string(),
    one_minute: "1 minute".to_string(),
    minutes: "{{count}} minutes".to_string(),
    one_second: "1 second".to_string(),
    seconds: "{{count}} seconds".to_string(),
});

impl Default for MessageKeys {
    fn default() -> Self {
        DEFAULT_KEYS.clone()
    }
}

/// Translation hooks for the verbose formatter.
#[derive(Clone, Default)]
pub struct TranslationOptions {
    /// Optional translate function. When set, it receives every key and is
    /// trusted to substitute the count itself.
    pub translate: Option<TranslateFn>,
    /// Message keys, defaulting to English wording.
    pub keys: MessageKeys,
}

impl fmt::Debug for TranslationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationOptions")
            .field("translate", &self.translate.as_ref().map(|_| "<fn>"))
            .field("keys", &self.keys)
            .finish()
    }
}

impl TranslationOptions {
    /// Creates translation options with English keys and no translate function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the translate function.
    pub fn with_translate<F>(mut self, translate: F) -> Self
    where
        F: Fn(&str, Option<&TranslateParams>) -> String + Send + Sync + 'static,
    {
        self.translate = Some(Arc::new(translate));
        self
    }

    /// Replaces the message keys.
    pub fn with_keys(mut self, keys: MessageKeys) -> Self {
        self.keys = keys;
        self
    }

    fn message(&self, key: &str, count: Option<u64>) -> String {
        match (&self.translate, count) {
            (Some(translate), Some(count)) => {
                let params = TranslateParams::from([("count", count)]);
                translate(key, Some(&params))
            }
            (Some(translate), None) => translate(key, None),
            (None, Some(count)) => key.replace(COUNT_PLACEHOLDER, &count.to_string()),
            (None, None) => key.to_string(),
        }
    }

    fn counted(&self, count: u64, one: &str, many: &str) -> String {
        if count == 1 {
            self.message(one, None)
        } else {
            self.message(many, Some(count))
        }
    }

    fn available_now(&self) -> String {
        self.message(&self.keys.available_now, None)
    }
}

/// Verbose rendering of an already computed remainder.
pub(crate) fn verbose(
    remaining: &TimeRemaining,
    options: &FormatOptions,
    translation: &TranslationOptions,
) -> String {
    if remaining.is_expired {
        return translation.available_now();
    }

    let keys = &translation.keys;
    let mut parts = Vec::with_capacity(3);

    if remaining.hours > 0 || options.show_zeros {
        parts.push(translation.counted(remaining.hours, &keys.one_hour, &keys.hours));
    }

    if remaining.minutes > 0 || (options.show_zeros && remaining.hours == 0) {
        parts.push(translation.counted(remaining.minutes, &keys.one_minute, &keys.minutes));
    }

    if options.shows_seconds(remaining) && (remaining.seconds > 0 || options.show_zeros) {
        parts.push(translation.counted(remaining.seconds, &keys.one_second, &keys.seconds));
    }

    if parts.is_empty() {
        return translation.available_now();
    }

    parts.join(&options.separator)
}

/// Short rendering of an already computed remainder.
pub(crate) fn short(remaining: &TimeRemaining, options: &FormatOptions) -> String {
    if remaining.is_expired {
        return SHORT_ZERO.to_string();
    }

    let mut tokens = Vec::with_capacity(3);
    if remaining.hours > 0 {
        tokens.push(format!("{}h", remaining.hours));
    }
    if remaining.minutes > 0 {
        tokens.push(format!("{}m", remaining.minutes));
    }
    if options.shows_seconds(remaining) && remaining.seconds > 0 {
        tokens.push(format!("{}s", remaining.seconds));
    }

    if tokens.is_empty() {
        return SHORT_ZERO.to_string();
    }

    tokens.join(&options.separator)
}

/// Compact rendering of an already computed remainder.
pub(crate) fn compact(remaining: &TimeRemaining, options: &CompactOptions) -> String {
    if remaining.is_expired {
        return if options.show_hours {
            "0:00:00".to_string()
        } else {
            "0:00".to_string()
        };
    }

    match (options.show_hours, options.show_seconds) {
        (true, true) => format!(
            "{:02}:{:02}:{:02}",
            remaining.hours, remaining.minutes, remaining.seconds
        ),
        (true, false) => format!("{:02}:{:02}", remaining.hours, remaining.minutes),
        (false, true) => format!(
            "{:02}:{:02}",
            remaining.hours * 60 + remaining.minutes,
            remaining.seconds
        ),
        (false, false) => format!("{:02}", remaining.hours * 60 + remaining.minutes),
    }
}

/// Verbose countdown text at a given instant.
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown_at(
    target: impl Into<Target>,
    now: DateTime<Utc>,
    options: &FormatOptions,
    translation: &TranslationOptions,
) -> Result<String> {
    let remaining = calculate_at(target, now)?;
    Ok(verbose(&remaining, options, translation))
}

/// Verbose countdown text, for example `"2 hours 15 minutes"` or
/// `"1 minute 30 seconds"`.
///
/// # Examples
///
/// ```rust
/// use bubbletea_countdown::format::{format_countdown, FormatOptions, TranslationOptions};
/// use chrono::{Duration, Utc};
///
/// let opts = FormatOptions::default();
/// let translation = TranslationOptions::default();
///
/// let text = format_countdown(Utc::now() + Duration::minutes(4350), &opts, &translation).unwrap();
/// assert!(text.ends_with("minutes"));
///
/// let text = format_countdown(Utc::now() - Duration::hours(1), &opts, &translation).unwrap();
/// assert_eq!(text, "Available now");
/// ```
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown(
    target: impl Into<Target>,
    options: &FormatOptions,
    translation: &TranslationOptions,
) -> Result<String> {
    format_countdown_at(target, Utc::now(), options, translation)
}

/// Short countdown text at a given instant.
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown_short_at(
    target: impl Into<Target>,
    now: DateTime<Utc>,
    options: &FormatOptions,
) -> Result<String> {
    let remaining = calculate_at(target, now)?;
    Ok(short(&remaining, options))
}

/// Short countdown text such as `"2h 15m"` or `"4m 10s"`.
///
/// # Examples
///
/// ```rust
/// use bubbletea_countdown::format::{format_countdown_short, FormatOptions};
/// use chrono::{Duration, Utc};
///
/// let opts = FormatOptions::default();
/// let text = format_countdown_short(Utc::now() + Duration::hours(30), &opts).unwrap();
/// assert!(text.starts_with("29h ") || text.starts_with("30h"));
///
/// assert_eq!(format_countdown_short("2000-01-01", &opts).unwrap(), "0m");
/// assert!(format_countdown_short("soon", &opts).is_err());
/// ```
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown_short(target: impl Into<Target>, options: &FormatOptions) -> Result<String> {
    format_countdown_short_at(target, Utc::now(), options)
}

/// Compact countdown text at a given instant.
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown_compact_at(
    target: impl Into<Target>,
    now: DateTime<Utc>,
    options: &CompactOptions,
) -> Result<String> {
    let remaining = calculate_at(target, now)?;
    Ok(compact(&remaining, options))
}

/// Compact countdown text such as `"02:15:00"` or `"135:00"`.
///
/// # Examples
///
/// ```rust
/// use bubbletea_countdown::format::{format_countdown_compact, CompactOptions};
/// use chrono::{Duration, Utc};
///
/// let past = Utc::now() - Duration::minutes(1);
/// assert_eq!(format_countdown_compact(past, &CompactOptions::default()).unwrap(), "0:00:00");
///
/// let minutes_only = CompactOptions::new().with_show_hours(false);
/// assert_eq!(format_countdown_compact(past, &minutes_only).unwrap(), "0:00");
///
/// let text = format_countdown_compact(Utc::now() + Duration::hours(2), &minutes_only).unwrap();
/// assert!(text.starts_with("119:") || text.starts_with("120:"));
/// ```
///
/// # Errors
///
/// Returns [`CountdownError::InvalidTarget`](crate::CountdownError::InvalidTarget)
/// for an unparseable target string.
pub fn format_countdown_compact(
    target: impl Into<Target>,
    options: &CompactOptions,
) -> Result<String> {
    format_countdown_compact_at(target, Utc::now(), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn after(h: i64, m: i64, s: i64) -> DateTime<Utc> {
        now() + Duration::hours(h) + Duration::minutes(m) + Duration::seconds(s)
    }

    fn verbose_at(target: DateTime<Utc>, options: &FormatOptions) -> String {
        format_countdown_at(target, now(), options, &TranslationOptions::default()).unwrap()
    }

    fn is_clock_layout(text: &str) -> bool {
        let fields: Vec<&str> = text.split(':').collect();
        (2..=3).contains(&fields.len())
            && fields.iter().all(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
            && fields[1..].iter().all(|f| f.len() == 2)
    }

    #[test]
    fn test_five_and_a_half_hours() {
        let target = after(5, 30, 0);
        let opts = FormatOptions::default();
        assert_eq!(verbose_at(target, &opts), "5 hours 30 minutes");
        assert_eq!(format_countdown_short_at(target, now(), &opts).unwrap(), "5h 30m");
        assert_eq!(
            format_countdown_compact_at(target, now(), &CompactOptions::default()).unwrap(),
            "05:30:00"
        );
    }

    #[test]
    fn test_seconds_below_threshold() {
        let target = after(0, 4, 10);
        let opts = FormatOptions::default();
        assert_eq!(format_countdown_short_at(target, now(), &opts).unwrap(), "4m 10s");
        assert_eq!(verbose_at(target, &opts), "4 minutes 10 seconds");
    }

    #[test]
    fn test_seconds_hidden_at_threshold() {
        let target = after(0, 5, 10);
        let opts = FormatOptions::default();
        assert_eq!(format_countdown_short_at(target, now(), &opts).unwrap(), "5m");
        assert_eq!(verbose_at(target, &opts), "5 minutes");

        let wide = FormatOptions::default().with_show_seconds_threshold(10);
        assert_eq!(format_countdown_short_at(target, now(), &wide).unwrap(), "5m 10s");
    }

    #[test]
    fn test_past_target_sentinels() {
        let target = now() - Duration::minutes(3);
        let opts = FormatOptions::default();
        assert_eq!(verbose_at(target, &opts), "Available now");
        assert_eq!(format_countdown_short_at(target, now(), &opts).unwrap(), "0m");
        assert_eq!(
            format_countdown_compact_at(target, now(), &CompactOptions::default()).unwrap(),
            "0:00:00"
        );
        let minutes_only = CompactOptions::default().with_show_hours(false);
        assert_eq!(
            format_countdown_compact_at(target, now(), &minutes_only).unwrap(),
            "0:00"
        );
    }

    #[test]
    fn test_singular_wording() {
        let opts = FormatOptions::default();
        assert_eq!(verbose_at(after(1, 1, 0), &opts), "1 hour 1 minute");
        assert_eq!(verbose_at(after(0, 1, 1), &opts), "1 minute 1 second");
        assert_eq!(verbose_at(after(0, 0, 1), &opts), "1 second");
    }

    #[test]
    fn test_hours_hide_seconds() {
        let opts = FormatOptions::default();
        assert_eq!(verbose_at(after(2, 0, 45), &opts), "2 hours");
        assert_eq!(format_countdown_short_at(after(2, 0, 45), now(), &opts).unwrap(), "2h");
    }

    #[test]
    fn test_show_zeros() {
        let opts = FormatOptions::default().with_show_zeros(true);
        assert_eq!(verbose_at(after(0, 0, 30), &opts), "0 hours 0 minutes 30 seconds");
        assert_eq!(verbose_at(after(3, 0, 0), &opts), "3 hours");
        assert_eq!(verbose_at(after(0, 2, 0), &opts), "0 hours 2 minutes 0 seconds");
    }

    #[test]
    fn test_separator() {
        let opts = FormatOptions::default().with_separator(", ");
        assert_eq!(verbose_at(after(5, 30, 0), &opts), "5 hours, 30 minutes");
        assert_eq!(
            format_countdown_short_at(after(0, 2, 5), now(), &opts).unwrap(),
            "2m, 5s"
        );
    }

    #[test]
    fn test_nothing_to_show_collapses_to_available_now() {
        // Threshold zero hides seconds entirely, so 30s has nothing to show.
        let no_seconds = FormatOptions::default().with_show_seconds_threshold(0);
        assert_eq!(verbose_at(after(0, 0, 30), &no_seconds), "Available now");
        assert_eq!(
            format_countdown_short_at(after(0, 0, 30), now(), &no_seconds).unwrap(),
            "0m"
        );
    }

    #[test]
    fn test_custom_keys_without_translate() {
        let keys = MessageKeys {
            available_now: "Ready".to_string(),
            hours: "{{count}}hrs".to_string(),
            minutes: "{{count}}min".to_string(),
            ..MessageKeys::default()
        };
        let translation = TranslationOptions::new().with_keys(keys);
        let opts = FormatOptions::default();
        assert_eq!(
            format_countdown_at(after(3, 20, 0), now(), &opts, &translation).unwrap(),
            "3hrs 20min"
        );
        assert_eq!(
            format_countdown_at(now(), now(), &opts, &translation).unwrap(),
            "Ready"
        );
    }

    #[test]
    fn test_translate_receives_keys_and_counts() {
        let calls: Arc<Mutex<Vec<(String, Option<u64>)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let translation = TranslationOptions::new().with_translate(move |key, params| {
            let count = params.map(|p| p["count"]);
            recorded.lock().unwrap().push((key.to_string(), count));
            format!("<{key}>")
        });

        let text =
            format_countdown_at(after(1, 3, 0), now(), &FormatOptions::default(), &translation)
                .unwrap();

        assert_eq!(text, "<1 hour> <{{count}} minutes>");
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ("1 hour".to_string(), None),
                ("{{count}} minutes".to_string(), Some(3)),
            ]
        );
    }

    #[test]
    fn test_compact_layouts() {
        let target = after(2, 5, 9);
        let cases = [
            (true, true, "02:05:09"),
            (true, false, "02:05"),
            (false, true, "125:09"),
            (false, false, "125"),
        ];
        for (show_hours, show_seconds, expected) in cases {
            let opts = CompactOptions::default()
                .with_show_hours(show_hours)
                .with_show_seconds(show_seconds);
            assert_eq!(
                format_countdown_compact_at(target, now(), &opts).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_compact_matches_clock_layout() {
        for total in [1i64, 59, 61, 3599, 3600, 36_000, 360_000] {
            let target = now() + Duration::seconds(total);
            for show_seconds in [true, false] {
                let opts = CompactOptions::default().with_show_seconds(show_seconds);
                let text = format_countdown_compact_at(target, now(), &opts).unwrap();
                assert!(is_clock_layout(&text), "{text:?} for {total}s");
            }
        }
    }

    #[test]
    fn test_formatters_are_pure() {
        let target = after(0, 3, 17);
        let opts = FormatOptions::default().with_timezone("Europe/Berlin");
        let translation = TranslationOptions::default();
        let first = format_countdown_at(target, now(), &opts, &translation).unwrap();
        let second = format_countdown_at(target, now(), &opts, &translation).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            format_countdown_short_at(target, now(), &opts).unwrap(),
            format_countdown_short_at(target, now(), &opts).unwrap()
        );
    }

    #[test]
    fn test_string_targets_and_errors() {
        let opts = FormatOptions::default();
        assert_eq!(
            format_countdown_short_at("2024-06-01T14:30:00Z", now(), &opts).unwrap(),
            "2h 30m"
        );
        assert!(format_countdown_short_at("soon", now(), &opts).is_err());
        assert!(format_countdown_compact("soon", &CompactOptions::default()).is_err());
        assert!(format_countdown("soon", &opts, &TranslationOptions::default()).is_err());
    }

    #[test]
    fn test_wall_clock_variants() {
        let opts = FormatOptions::default();
        let past = Utc::now() - Duration::hours(1);
        assert_eq!(
            format_countdown(past, &opts, &TranslationOptions::default()).unwrap(),
            "Available now"
        );
        assert_eq!(format_countdown_short(past, &opts).unwrap(), "0m");
        assert_eq!(
            format_countdown_compact(past, &CompactOptions::default()).unwrap(),
            "0:00:00"
        );
    }
}
