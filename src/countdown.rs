//! Countdown component for Bubble Tea applications.
//!
//! The countdown ticks towards a target instant, recomputing the remaining
//! time from the clock on every tick, and renders it with one of the
//! formatters from [`crate::format`]. It follows the usual component shape:
//! `init()`, `update()` and `view()`.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_countdown::countdown::{new, with_interval};
//! use chrono::{Duration, Utc};
//! use std::time::Duration as StdDuration;
//!
//! // Counts down to an hour from now, ticking every second.
//! let countdown = new(Utc::now() + Duration::hours(1), &[]).unwrap();
//! assert!(countdown.is_active());
//!
//! // Targets may be timestamp strings and the tick interval is configurable.
//! let countdown = new(
//!     "2099-01-01T00:00:00Z",
//!     &[with_interval(StdDuration::from_millis(250))],
//! )
//! .unwrap();
//! assert_eq!(countdown.interval(), StdDuration::from_millis(250));
//! ```
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model as BubbleTeaModel, Msg};
//! use bubbletea_countdown::countdown::{new, with_on_expire, Model};
//! use chrono::{Duration, Utc};
//!
//! struct App {
//!     countdown: Model,
//! }
//!
//! impl BubbleTeaModel for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let countdown = new(
//!             Utc::now() + Duration::minutes(5),
//!             &[with_on_expire(|| log::info!("time is up"))],
//!         )
//!         .expect("valid target");
//!         let cmd = countdown.init();
//!         (Self { countdown }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.countdown.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         format!("Next drop in {}", self.countdown.view())
//!     }
//! }
//! ```
//!
//! # Cancellation
//!
//! Pending ticks cannot be recalled once handed to the runtime. Instead every
//! tick carries the countdown's current tag, and every transition that must
//! cancel the schedule (`stop`, `reset`, `dispose`, each processed tick)
//! moves the tag on. A tick that arrives with an old tag is dropped, so a
//! stopped or disposed countdown never recomputes or calls back again.

use crate::error::{CountdownError, Result};
use crate::format::{self, CompactOptions, FormatOptions, TranslationOptions};
use crate::remaining::{Clock, SystemClock, Target, TimeRemaining};
use bubbletea_rs::{tick as bubbletea_tick, Cmd, Model as BubbleTeaModel, Msg};
use chrono::{DateTime, Utc};
use lipgloss_extras::prelude::*;
use log::{debug, info, trace};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Internal ID management for countdown instances
static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Tick interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Callback invoked when a countdown expires.
pub type ExpireCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked whenever a countdown publishes a new remaining time.
pub type ChangeCallback = Arc<dyn Fn(&TimeRemaining) + Send + Sync>;

/// Message sent on every countdown tick.
///
/// Ticks are produced by the countdown itself; use [`Model::tick_msg`] to
/// build one by hand in tests. A countdown only accepts ticks carrying its
/// own id and current tag.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// The id of the countdown that scheduled this tick.
    pub id: i64,
    /// The countdown clock's reading when the tick fired.
    pub fired_at: DateTime<Utc>,
    tag: i64,
}

/// Which formatter [`Model::view`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFormat {
    /// `"5 hours 30 minutes"`
    Verbose,
    /// `"5h 30m"`
    Short,
    /// `"05:30:00"`
    #[default]
    Compact,
}

/// Lifecycle state of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// No target and not running.
    Idle,
    /// Ticking.
    Active,
    /// Has a target but is paused.
    Stopped,
    /// Torn down; ignores every message and control call.
    Disposed,
}

/// Configuration applied by [`new`] and [`new_idle`].
pub enum CountdownOption {
    /// Tick interval.
    WithInterval(Duration),
    /// Start ticking on construction when a target is given.
    WithAutoStart(bool),
    /// Expiration callback.
    WithOnExpire(ExpireCallback),
    /// Change observer.
    WithOnChange(ChangeCallback),
    /// Time source.
    WithClock(Arc<dyn Clock>),
    /// Formatter used by `view()`.
    WithViewFormat(ViewFormat),
    /// Style applied by `view()`.
    WithStyle(Box<Style>),
    /// Options for the verbose and short formatters.
    WithFormatOptions(FormatOptions),
    /// Options for the compact formatter.
    WithCompactOptions(CompactOptions),
    /// Translation for the verbose formatter.
    WithTranslation(TranslationOptions),
}

impl CountdownOption {
    fn apply(&self, m: &mut Model) {
        match self {
            CountdownOption::WithInterval(interval) => m.interval = *interval,
            CountdownOption::WithAutoStart(auto_start) => m.auto_start = *auto_start,
            CountdownOption::WithOnExpire(callback) => m.on_expire = Some(Arc::clone(callback)),
            CountdownOption::WithOnChange(callback) => m.on_change = Some(Arc::clone(callback)),
            CountdownOption::WithClock(clock) => m.clock = Arc::clone(clock),
            CountdownOption::WithViewFormat(view_format) => m.view_format = *view_format,
            CountdownOption::WithStyle(style) => m.style = style.as_ref().clone(),
            CountdownOption::WithFormatOptions(options) => m.format_options = options.clone(),
            CountdownOption::WithCompactOptions(options) => m.compact_options = options.clone(),
            CountdownOption::WithTranslation(translation) => m.translation = translation.clone(),
        }
    }
}

/// Sets the tick interval. Defaults to one second; zero is rejected.
pub fn with_interval(interval: Duration) -> CountdownOption {
    CountdownOption::WithInterval(interval)
}

/// Sets whether a countdown with a target starts ticking on construction.
pub fn with_auto_start(auto_start: bool) -> CountdownOption {
    CountdownOption::WithAutoStart(auto_start)
}

/// Sets the callback fired once each time the countdown expires.
pub fn with_on_expire<F>(callback: F) -> CountdownOption
where
    F: Fn() + Send + Sync + 'static,
{
    CountdownOption::WithOnExpire(Arc::new(callback))
}

/// Sets the observer notified of every published remaining time.
pub fn with_on_change<F>(callback: F) -> CountdownOption
where
    F: Fn(&TimeRemaining) + Send + Sync + 'static,
{
    CountdownOption::WithOnChange(Arc::new(callback))
}

/// Sets the time source.
pub fn with_clock(clock: Arc<dyn Clock>) -> CountdownOption {
    CountdownOption::WithClock(clock)
}

/// Sets the formatter used by `view()`.
pub fn with_view_format(view_format: ViewFormat) -> CountdownOption {
    CountdownOption::WithViewFormat(view_format)
}

/// Sets the style `view()` renders with.
pub fn with_style(style: Style) -> CountdownOption {
    CountdownOption::WithStyle(Box::new(style))
}

/// Sets the options for the verbose and short formatters.
pub fn with_format_options(options: FormatOptions) -> CountdownOption {
    CountdownOption::WithFormatOptions(options)
}

/// Sets the options for the compact formatter.
pub fn with_compact_options(options: CompactOptions) -> CountdownOption {
    CountdownOption::WithCompactOptions(options)
}

/// Sets the translation used by the verbose formatter.
pub fn with_translation(translation: TranslationOptions) -> CountdownOption {
    CountdownOption::WithTranslation(translation)
}

/// Countdown towards a target instant.
///
/// The model owns its tick schedule and its state. It is mutated only through
/// its own methods: the control operations (`start`, `stop`, `toggle`,
/// `reset`, `set_target`, `clear_target`, `dispose`) apply synchronously, and
/// `update` processes ticks.
///
/// Each tick recomputes the remaining time from the clock, publishes it to
/// the `on_change` observer and, the first time it finds the countdown
/// expired, fires `on_expire`. Ticking continues after expiry so a new target
/// supplied through [`set_target`](Model::set_target) is picked up on the next
/// tick.
#[derive(Clone)]
pub struct Model {
    /// Style applied by `view()`.
    pub style: Style,
    /// Formatter used by `view()`.
    pub view_format: ViewFormat,
    /// Options for the verbose and short formatters.
    pub format_options: FormatOptions,
    /// Options for the compact formatter.
    pub compact_options: CompactOptions,
    /// Translation for the verbose formatter.
    pub translation: TranslationOptions,

    interval: Duration,
    auto_start: bool,
    target: Option<DateTime<Utc>>,
    remaining: TimeRemaining,
    active: bool,
    expire_fired: bool,
    disposed: bool,
    on_expire: Option<ExpireCallback>,
    on_change: Option<ChangeCallback>,
    clock: Arc<dyn Clock>,
    id: i64,
    tag: i64,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("target", &self.target)
            .field("remaining", &self.remaining)
            .field("active", &self.active)
            .field("disposed", &self.disposed)
            .field("interval", &self.interval)
            .field("view_format", &self.view_format)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Creates a countdown towards `target`.
///
/// The countdown is active immediately unless `with_auto_start(false)` is
/// given, in which case it waits for [`Model::start`].
///
/// # Errors
///
/// - [`CountdownError::InvalidTarget`] if `target` is an unparseable string
/// - [`CountdownError::InvalidConfiguration`] if the interval is zero
pub fn new(target: impl Into<Target>, opts: &[CountdownOption]) -> Result<Model> {
    Model::build(Some(target.into()), opts)
}

/// Creates a countdown without a target.
///
/// It reports the zero remaining time until a target is supplied through
/// [`Model::set_target`] or [`Model::reset`].
///
/// # Errors
///
/// [`CountdownError::InvalidConfiguration`] if the interval is zero.
pub fn new_idle(opts: &[CountdownOption]) -> Result<Model> {
    Model::build(None, opts)
}

impl Model {
    fn blank() -> Self {
        Self {
            style: Style::new(),
            view_format: ViewFormat::default(),
            format_options: FormatOptions::default(),
            compact_options: CompactOptions::default(),
            translation: TranslationOptions::default(),
            interval: DEFAULT_INTERVAL,
            auto_start: true,
            target: None,
            remaining: TimeRemaining::expired(),
            active: false,
            expire_fired: false,
            disposed: false,
            on_expire: None,
            on_change: None,
            clock: Arc::new(SystemClock),
            id: next_id(),
            tag: 0,
        }
    }

    fn build(target: Option<Target>, opts: &[CountdownOption]) -> Result<Self> {
        let target = target.map(|t| t.resolve()).transpose()?;

        let mut m = Self::blank();
        for opt in opts {
            opt.apply(&mut m);
        }

        if m.interval.is_zero() {
            return Err(CountdownError::invalid_configuration(
                "tick interval must be greater than zero",
            ));
        }

        m.target = target;
        m.active = m.target.is_some() && m.auto_start;
        m.remaining = m.compute();

        debug!(
            "countdown {} created: target={:?} state={:?}",
            m.id,
            m.target,
            m.state()
        );
        Ok(m)
    }

    /// Unique identifier of this countdown, used to route tick messages.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The resolved target, if any.
    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.target
    }

    /// The most recently published remaining time.
    pub fn remaining(&self) -> TimeRemaining {
        self.remaining
    }

    /// Whether the countdown is ticking.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether [`dispose`](Model::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CountdownState {
        if self.disposed {
            CountdownState::Disposed
        } else if self.active {
            CountdownState::Active
        } else if self.target.is_none() {
            CountdownState::Idle
        } else {
            CountdownState::Stopped
        }
    }

    /// A tick message addressed to this countdown's current schedule.
    pub fn tick_msg(&self) -> TickMsg {
        TickMsg {
            id: self.id,
            fired_at: self.clock.now(),
            tag: self.tag,
        }
    }

    fn tick(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        let clock = Arc::clone(&self.clock);

        bubbletea_tick(self.interval, move |_| {
            Box::new(TickMsg {
                id,
                fired_at: clock.now(),
                tag,
            }) as Msg
        })
    }

    fn compute(&self) -> TimeRemaining {
        match self.target {
            Some(target) => TimeRemaining::between(target, self.clock.now()),
            None => TimeRemaining::expired(),
        }
    }

    fn publish(&mut self, remaining: TimeRemaining) {
        self.remaining = remaining;
        if let Some(on_change) = &self.on_change {
            on_change(&remaining);
        }
    }

    /// Command for the first tick, if the countdown is active.
    pub fn init(&self) -> Option<Cmd> {
        if self.disposed || !self.active {
            return None;
        }
        Some(self.tick())
    }

    /// Starts or resumes ticking towards the current target.
    ///
    /// Returns the command for the next tick, or `None` when the countdown is
    /// already active or has been disposed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::{new, with_auto_start, CountdownState};
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::hours(1), &[with_auto_start(false)]).unwrap();
    /// assert_eq!(countdown.state(), CountdownState::Stopped);
    ///
    /// assert!(countdown.start().is_some());
    /// assert!(countdown.is_active());
    ///
    /// // Already running: no second schedule.
    /// assert!(countdown.start().is_none());
    /// ```
    pub fn start(&mut self) -> Option<Cmd> {
        if self.disposed || self.active {
            return None;
        }
        self.active = true;
        self.tag += 1;
        debug!("countdown {} started", self.id);
        Some(self.tick())
    }

    /// Pauses the countdown. Any tick already scheduled is dropped on arrival.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::{new, CountdownState};
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::minutes(10), &[]).unwrap();
    /// let pending = countdown.tick_msg();
    ///
    /// countdown.stop();
    /// assert_eq!(countdown.state(), CountdownState::Stopped);
    ///
    /// // The tick scheduled before `stop` no longer counts.
    /// assert!(countdown.update(Box::new(pending)).is_none());
    /// ```
    pub fn stop(&mut self) {
        if self.disposed || !self.active {
            return;
        }
        self.active = false;
        self.tag += 1;
        debug!("countdown {} stopped", self.id);
    }

    /// Stops an active countdown or starts a paused one.
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::new;
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::minutes(10), &[]).unwrap();
    /// assert!(countdown.toggle().is_none());
    /// assert!(!countdown.is_active());
    /// assert!(countdown.toggle().is_some());
    /// assert!(countdown.is_active());
    /// ```
    pub fn toggle(&mut self) -> Option<Cmd> {
        if self.active {
            self.stop();
            None
        } else {
            self.start()
        }
    }

    /// Restarts the countdown towards a new target.
    ///
    /// The remaining time is recomputed and published immediately, the
    /// previous schedule is cancelled and a fresh tick is returned. The
    /// countdown is active afterwards whatever its previous state.
    ///
    /// # Errors
    ///
    /// [`CountdownError::InvalidTarget`] if `target` is an unparseable string;
    /// the countdown is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::new;
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() - Duration::seconds(5), &[]).unwrap();
    /// assert!(countdown.remaining().is_expired);
    ///
    /// let cmd = countdown.reset("2099-01-01T00:00:00Z").unwrap();
    /// assert!(cmd.is_some());
    /// assert!(!countdown.remaining().is_expired);
    ///
    /// assert!(countdown.reset("tomorrow").is_err());
    /// assert!(!countdown.remaining().is_expired);
    /// ```
    pub fn reset(&mut self, target: impl Into<Target>) -> Result<Option<Cmd>> {
        let target = target.into().resolve()?;
        if self.disposed {
            return Ok(None);
        }

        self.target = Some(target);
        self.active = true;
        self.expire_fired = false;
        self.tag += 1;
        let remaining = self.compute();
        self.publish(remaining);

        debug!("countdown {} reset: target={}", self.id, target);
        Ok(Some(self.tick()))
    }

    /// Adopts a new target without touching the running state.
    ///
    /// The remaining time is recomputed and published immediately; an active
    /// countdown keeps its current tick schedule.
    ///
    /// # Errors
    ///
    /// [`CountdownError::InvalidTarget`] if `target` is an unparseable string;
    /// the countdown is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::{new, with_auto_start};
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::hours(2), &[with_auto_start(false)]).unwrap();
    /// let target = Utc::now() + Duration::hours(5);
    ///
    /// countdown.set_target(target).unwrap();
    /// assert_eq!(countdown.target(), Some(target));
    /// assert!(countdown.remaining().hours >= 4);
    ///
    /// // The running state is left alone.
    /// assert!(!countdown.is_active());
    /// ```
    pub fn set_target(&mut self, target: impl Into<Target>) -> Result<()> {
        let target = target.into().resolve()?;
        if self.disposed {
            return Ok(());
        }

        self.target = Some(target);
        self.expire_fired = false;
        let remaining = self.compute();
        self.publish(remaining);

        debug!("countdown {} target changed: {}", self.id, target);
        Ok(())
    }

    /// Drops the target. The countdown reports the zero remaining time and
    /// never expires until a new target is supplied.
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::new;
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::hours(1), &[]).unwrap();
    /// countdown.clear_target();
    /// assert_eq!(countdown.target(), None);
    /// assert_eq!(countdown.remaining().total_seconds, 0);
    /// ```
    pub fn clear_target(&mut self) {
        if self.disposed {
            return;
        }
        self.target = None;
        self.expire_fired = false;
        self.publish(TimeRemaining::expired());
        debug!("countdown {} target cleared", self.id);
    }

    /// Tears the countdown down.
    ///
    /// Pending ticks are invalidated and the callbacks released; no callback
    /// runs after this returns. Every later call is a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bubbletea_countdown::countdown::{new, CountdownState};
    /// use chrono::{Duration, Utc};
    ///
    /// let mut countdown = new(Utc::now() + Duration::hours(1), &[]).unwrap();
    /// countdown.dispose();
    ///
    /// assert_eq!(countdown.state(), CountdownState::Disposed);
    /// assert!(countdown.start().is_none());
    /// assert!(countdown.reset(Utc::now()).unwrap().is_none());
    /// ```
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.active = false;
        self.tag += 1;
        self.on_expire = None;
        self.on_change = None;
        debug!("countdown {} disposed", self.id);
    }

    /// Processes a message, returning the next tick when one is due.
    ///
    /// Only [`TickMsg`]s for this countdown's id and current tag are handled;
    /// everything else is ignored.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let tick_msg = msg.downcast_ref::<TickMsg>()?;

        if tick_msg.id != self.id {
            return None;
        }

        if self.disposed || !self.active || tick_msg.tag != self.tag {
            trace!(
                "countdown {} dropped tick: tag={} current={} active={}",
                self.id,
                tick_msg.tag,
                self.tag,
                self.active
            );
            return None;
        }

        // Advance the tag so a duplicate of this tick is rejected.
        self.tag += 1;

        let remaining = self.compute();
        self.publish(remaining);
        trace!("countdown {} tick: {}", self.id, remaining);

        if remaining.is_expired && self.target.is_some() {
            if !self.expire_fired {
                self.expire_fired = true;
                info!("countdown {} expired", self.id);
                if let Some(on_expire) = &self.on_expire {
                    on_expire();
                }
            }
        } else {
            self.expire_fired = false;
        }

        Some(self.tick())
    }

    /// Renders the remaining time with the configured formatter and style.
    ///
    /// The remaining time is recomputed from the target on every call rather
    /// than read from the last tick, so the view never lags the clock.
    pub fn view(&self) -> String {
        let remaining = self.compute();
        let text = match self.view_format {
            ViewFormat::Verbose => {
                format::verbose(&remaining, &self.format_options, &self.translation)
            }
            ViewFormat::Short => format::short(&remaining, &self.format_options),
            ViewFormat::Compact => format::compact(&remaining, &self.compact_options),
        };
        self.style.render(&text)
    }
}

impl BubbleTeaModel for Model {
    fn init() -> (Self, Option<Cmd>) {
        let model = Self::default();
        let cmd = model.init();
        (model, cmd)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        self.update(msg)
    }

    fn view(&self) -> String {
        self.view()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::blank()
    }
}
