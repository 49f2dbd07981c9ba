#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/bubbletea-countdown/")]

//! # bubbletea-countdown
//!
//! Countdown calculation, formatting and a ticking countdown component for
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs) applications.
//!
//! ## Overview
//!
//! The crate is split into small layers that can be used on their own:
//!
//! - [`remaining`]: pure time-remaining calculation towards a target instant
//! - [`format`]: verbose (translatable), short and compact display strings
//! - [`countdown`]: a component that ticks, recomputes and renders a countdown
//! - [`schedule`]: next day and next hour boundaries for scheduled resets
//!
//! The calculation and the formatters are pure and know nothing about the
//! component. The component calls the calculator on every tick and the
//! formatters on every `view()`.
//!
//! ## Quick Start
//!
//! ```rust
//! use bubbletea_countdown::prelude::*;
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let target = now + Duration::minutes(4) + Duration::seconds(10);
//!
//! let short = format_countdown_short_at(target, now, &FormatOptions::default()).unwrap();
//! assert_eq!(short, "4m 10s");
//!
//! let remaining = calculate_at(target, now).unwrap();
//! assert_eq!(remaining.total_seconds, 250);
//! ```
//!
//! ## Integration with bubbletea-rs
//!
//! ```rust
//! use bubbletea_countdown::prelude::*;
//! use bubbletea_rs::{Cmd, Model, Msg};
//! use chrono::Utc;
//!
//! struct App {
//!     countdown: Countdown,
//! }
//!
//! impl Model for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let target = next_hour_instant(&Utc, Utc::now());
//!         let countdown = countdown_new(target, &[with_view_format(ViewFormat::Short)])
//!             .expect("valid target");
//!         let cmd = countdown.init();
//!         (Self { countdown }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.countdown.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         format!("Next refresh in {}", self.countdown.view())
//!     }
//! }
//! ```
//!
//! ## Errors
//!
//! Targets given as strings are parsed strictly: input that is not a
//! recognisable timestamp fails with [`CountdownError::InvalidTarget`]
//! instead of producing an expired countdown. A zero tick interval fails
//! with [`CountdownError::InvalidConfiguration`].
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger. Lifecycle transitions are logged at `debug`,
//! expirations at `info` and individual ticks at `trace`.

pub mod countdown;
pub mod error;
pub mod format;
pub mod remaining;
pub mod schedule;

pub use countdown::{
    new as countdown_new, new_idle as countdown_new_idle, CountdownOption, CountdownState,
    Model as Countdown, TickMsg as CountdownTickMsg, ViewFormat,
};
pub use error::{CountdownError, Result};
pub use format::{
    format_countdown, format_countdown_at, format_countdown_compact, format_countdown_compact_at,
    format_countdown_short, format_countdown_short_at, CompactOptions, FormatOptions, MessageKeys,
    TranslationOptions,
};
pub use remaining::{calculate, calculate_at, Clock, SystemClock, Target, TimeRemaining};
pub use schedule::{next_day_start, next_hour_start, TimeZoneService};

/// Prelude module for convenient imports.
///
/// ```rust
/// use bubbletea_countdown::prelude::*;
/// ```
///
/// The prelude includes the countdown component and its option functions,
/// the formatters with their options, the calculator, the schedule helpers
/// and the error type.
pub mod prelude {
    pub use crate::countdown::{
        new as countdown_new, new_idle as countdown_new_idle, with_auto_start, with_clock,
        with_compact_options, with_format_options, with_interval, with_on_change,
        with_on_expire, with_style, with_translation, with_view_format, CountdownOption,
        CountdownState, Model as Countdown, TickMsg as CountdownTickMsg, ViewFormat,
    };
    pub use crate::error::CountdownError;
    pub use crate::format::{
        format_countdown, format_countdown_at, format_countdown_compact,
        format_countdown_compact_at, format_countdown_short, format_countdown_short_at,
        CompactOptions, FormatOptions, MessageKeys, TranslateParams, TranslationOptions,
    };
    pub use crate::remaining::{calculate, calculate_at, Clock, SystemClock, Target, TimeRemaining};
    pub use crate::schedule::{
        next_day_instant, next_day_start, next_hour_instant, next_hour_start, TimeZoneService,
    };
}
