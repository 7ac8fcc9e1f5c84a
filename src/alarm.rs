use std::fmt;

use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Timelike, Utc};

use crate::schedule::{Weekday, WeeklySchedule};

/// summarizes whether and how the alarm is currently armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Disabled,
    Enabled,
    Ringing,
    Snoozed,
}

impl AlarmState {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabled => "enabled",
            Self::Ringing => "ringing",
            Self::Snoozed => "snoozed",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        [Self::Disabled, Self::Enabled, Self::Ringing, Self::Snoozed]
            .into_iter()
            .find(|state| state.key() == key)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// a field failed validation at configuration entry creation
/// everywhere past that edge, bad input self-corrects instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: &'static str,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub const DEFAULT_SNOOZE_MINUTES: u32 = 9;

/// the configured half of the alarm: what the user asked for
/// mutated only through [`WakeClock`] operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmConfig {
    pub(crate) enabled: bool,
    pub(crate) snooze_minutes: u32,
    pub(crate) schedule: WeeklySchedule,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            schedule: WeeklySchedule::default(),
        }
    }
}

impl AlarmConfig {
    #[must_use]
    pub fn new(enabled: bool, snooze_minutes: u32, schedule: WeeklySchedule) -> Self {
        Self {
            enabled,
            snooze_minutes: snooze_minutes.clamp(1, 60),
            schedule,
        }
    }

    /// fail-fast constructor used at entry creation
    ///
    /// # Errors
    /// reports the first offending field: snooze minutes out of `[1,60]`, or a
    /// day time that is neither empty nor strict `HH:MM`
    pub fn validated(
        snooze_minutes: i64,
        times: &[(Weekday, &str)],
    ) -> Result<Self, ValidationError> {
        if !(1..=60).contains(&snooze_minutes) {
            return Err(ValidationError {
                field: "snooze".to_string(),
                message: "snooze minutes must be between 1 and 60",
            });
        }
        let mut schedule = WeeklySchedule::default();
        for (day, value) in times {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match crate::schedule::parse_hhmm(value) {
                Some(time) => schedule.set(*day, Some(time)),
                None => {
                    return Err(ValidationError {
                        field: day.key().to_string(),
                        message: "time must be HH:MM or empty",
                    })
                }
            }
        }
        Ok(Self {
            enabled: true,
            snooze_minutes: snooze_minutes as u32,
            schedule,
        })
    }
}

/// the single weekly alarm: configuration plus derived runtime state
///
/// `next_alarm` is recomputable from the schedule and "now", except while a
/// snooze override is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeClock {
    pub(crate) config: AlarmConfig,
    pub(crate) next_alarm: Option<DateTime<Local>>,
    pub(crate) alarm_state: AlarmState,
}

impl Default for WakeClock {
    fn default() -> Self {
        Self::new(AlarmConfig::default())
    }
}

impl WakeClock {
    #[must_use]
    pub const fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            next_alarm: None,
            alarm_state: if config.enabled {
                AlarmState::Enabled
            } else {
                AlarmState::Disabled
            },
        }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub const fn snooze_minutes(&self) -> u32 {
        self.config.snooze_minutes
    }

    #[must_use]
    pub const fn schedule(&self) -> &WeeklySchedule {
        &self.config.schedule
    }

    #[must_use]
    pub const fn next_alarm(&self) -> Option<DateTime<Local>> {
        self.next_alarm
    }

    #[must_use]
    pub const fn alarm_state(&self) -> AlarmState {
        self.alarm_state
    }

    #[must_use]
    pub fn snoozing(&self) -> bool {
        self.alarm_state == AlarmState::Snoozed
    }

    /// recomputes `next_alarm` from the weekly schedule and clears any snooze
    /// override
    ///
    /// scans today plus the next seven days; a candidate is the configured
    /// time on that date, seconds zeroed, and must be strictly in the future
    pub fn recalc_next(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let mut best: Option<DateTime<Local>> = None;
        for offset in 0..8 {
            let cand_day = now + Duration::days(offset);
            let Some(time) = self.config.schedule.get(cand_day.weekday().into()) else {
                continue;
            };
            let naive = cand_day.date_naive().and_time(time);
            // a local time swallowed by a DST gap has no instant, skip it
            let Some(cand) = Local.from_local_datetime(&naive).earliest() else {
                continue;
            };
            if cand <= now {
                continue;
            }
            if best.map_or(true, |b| cand < b) {
                best = Some(cand);
            }
        }

        self.next_alarm = best;
        self.alarm_state = if self.config.enabled {
            AlarmState::Enabled
        } else {
            AlarmState::Disabled
        };
        best
    }

    /// pushes `next_alarm` forward by the snooze increment, stackable
    ///
    /// base is the pending alarm while it is still in the future, otherwise
    /// "now"; the base is floored to the whole minute
    pub fn snooze(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        let base = match self.next_alarm {
            Some(next) if next > now => next,
            _ => now,
        };
        let base = base
            .with_second(0)
            .and_then(|b| b.with_nanosecond(0))
            .unwrap_or(base);

        let next = base + Duration::minutes(i64::from(self.config.snooze_minutes));
        self.next_alarm = Some(next);
        self.alarm_state = if self.config.enabled {
            AlarmState::Snoozed
        } else {
            AlarmState::Disabled
        };
        next
    }

    /// clears any snooze override and returns to the pure weekly recurrence
    pub fn dismiss(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.recalc_next(now)
    }

    /// sets or clears one day; invalid strings clear
    /// does not recompute `next_alarm`, the driver decides when to
    pub fn set_day_time(&mut self, day: Weekday, value: &str) {
        self.config.schedule.set_from_str(day, value);
    }

    /// out of range input clamps to `[1,60]` instead of erroring
    pub fn set_snooze_minutes(&mut self, minutes: u32) {
        self.config.snooze_minutes = minutes.clamp(1, 60);
    }

    /// a newly enabled alarm reflects the live schedule, any stale override
    /// is dropped
    pub fn turn_on(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.config.enabled = true;
        self.recalc_next(now)
    }

    /// `next_alarm` is kept for display, only the state goes to disabled
    pub fn turn_off(&mut self) {
        self.config.enabled = false;
        self.alarm_state = AlarmState::Disabled;
    }

    /// transitions to ringing when the pending alarm is due
    /// returns true only on the edge into ringing
    pub fn ring(&mut self, now: DateTime<Local>) -> bool {
        if !self.config.enabled {
            return false;
        }
        let due = matches!(self.next_alarm, Some(next) if next <= now);
        if !due {
            return false;
        }
        let newly_ringing = self.alarm_state != AlarmState::Ringing;
        self.alarm_state = AlarmState::Ringing;
        newly_ringing
    }

    /// next alarm in a fixed reference zone for external consumers
    /// empty while the switch is off, like a timestamp sensor
    #[must_use]
    pub fn next_alarm_utc(&self) -> Option<DateTime<Utc>> {
        if !self.config.enabled {
            return None;
        }
        self.next_alarm.map(|next| next.with_timezone(&Utc))
    }

    /// human label like "Wed 07:30"
    #[must_use]
    pub fn next_alarm_label(&self) -> Option<String> {
        self.next_alarm
            .map(|next| format!("{} {}", Weekday::from(next.weekday()), next.format("%H:%M")))
    }
}
