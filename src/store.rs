use std::{fmt, fs, io, path::PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::{
    alarm::{AlarmConfig, AlarmState, WakeClock, DEFAULT_SNOOZE_MINUTES},
    schedule::{parse_hhmm, Weekday, WeeklySchedule},
};

/// the flat persisted form of the alarm record
///
/// every field is tolerant on the way in: missing or wrongly typed values
/// fall back to their default instead of failing the whole record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub enabled: bool,
    pub snoozetime: u32,
    pub nextalarm: String,
    pub mon: String,
    pub tue: String,
    pub wed: String,
    pub thu: String,
    pub fri: String,
    pub sat: String,
    pub sun: String,
    pub alarm_state: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            enabled: true,
            snoozetime: DEFAULT_SNOOZE_MINUTES,
            nextalarm: String::new(),
            mon: String::new(),
            tue: String::new(),
            wed: String::new(),
            thu: String::new(),
            fri: String::new(),
            sat: String::new(),
            sun: String::new(),
            alarm_state: AlarmState::Disabled.key().to_string(),
        }
    }
}

impl Record {
    #[must_use]
    pub fn day(&self, day: Weekday) -> &str {
        match day {
            Weekday::Mon => &self.mon,
            Weekday::Tue => &self.tue,
            Weekday::Wed => &self.wed,
            Weekday::Thu => &self.thu,
            Weekday::Fri => &self.fri,
            Weekday::Sat => &self.sat,
            Weekday::Sun => &self.sun,
        }
    }

    fn day_mut(&mut self, day: Weekday) -> &mut String {
        match day {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        }
    }

    /// field-by-field tolerant read of a persisted table
    ///
    /// garbage collapses to defaults, day strings must be strict `HH:MM`,
    /// and `alarm_state` is re-derived from `enabled` at the end
    #[must_use]
    pub fn from_table(table: &toml::Table) -> Self {
        let mut record = Self::default();

        if let Some(enabled) = table.get("enabled").and_then(toml::Value::as_bool) {
            record.enabled = enabled;
        }
        if let Some(minutes) = table.get("snoozetime").and_then(toml::Value::as_integer) {
            record.snoozetime = minutes.clamp(1, 60) as u32;
        }
        if let Some(next) = table.get("nextalarm").and_then(toml::Value::as_str) {
            let next = next.trim();
            if parse_nextalarm(next).is_some() {
                record.nextalarm = next.to_string();
            }
        }
        for day in Weekday::ALL {
            if let Some(value) = table.get(day.key()).and_then(toml::Value::as_str) {
                let value = value.trim();
                if parse_hhmm(value).is_some() {
                    *record.day_mut(day) = value.to_string();
                }
            }
        }
        if let Some(state) = table.get("alarm_state").and_then(toml::Value::as_str) {
            if AlarmState::from_key(state).is_some() {
                record.alarm_state = state.to_string();
            }
        }

        // the invariant: disabled iff not enabled
        if !record.enabled {
            record.alarm_state = AlarmState::Disabled.key().to_string();
        } else if record.alarm_state == AlarmState::Disabled.key() {
            record.alarm_state = AlarmState::Enabled.key().to_string();
        }

        record
    }
}

/// lenient timestamp parse: RFC 3339 with offset, or a bare local datetime
fn parse_nextalarm(value: &str) -> Option<DateTime<Local>> {
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

impl From<&WakeClock> for Record {
    fn from(clock: &WakeClock) -> Self {
        let mut record = Self {
            enabled: clock.enabled(),
            snoozetime: clock.snooze_minutes(),
            nextalarm: clock
                .next_alarm()
                .map(|next| next.to_rfc3339())
                .unwrap_or_default(),
            alarm_state: clock.alarm_state().key().to_string(),
            ..Self::default()
        };
        for (day, time) in clock.schedule().iter() {
            if let Some(time) = time {
                *record.day_mut(day) = time.format("%H:%M").to_string();
            }
        }
        record
    }
}

impl From<Record> for WakeClock {
    fn from(record: Record) -> Self {
        let mut schedule = WeeklySchedule::default();
        for day in Weekday::ALL {
            schedule.set(day, parse_hhmm(record.day(day)));
        }
        let config = AlarmConfig::new(record.enabled, record.snoozetime, schedule);

        let alarm_state = if config.enabled {
            match AlarmState::from_key(&record.alarm_state) {
                Some(AlarmState::Disabled) | None => AlarmState::Enabled,
                Some(state) => state,
            }
        } else {
            AlarmState::Disabled
        };

        Self {
            config,
            next_alarm: parse_nextalarm(&record.nextalarm),
            alarm_state,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serialize(toml::ser::Error),
    /// no home directory to anchor the state file path on
    NoStatePath,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "state file i/o failed: {err}"),
            Self::Serialize(err) => write!(f, "couldn't serialize state: {err}"),
            Self::NoStatePath => write!(f, "couldn't determine a state file path"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::NoStatePath => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialize(err)
    }
}

/// owns the path of the single persisted record
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// # Errors
    /// fails when no project directory can be resolved for this user
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let mut path = directories::ProjectDirs::from("", "", "wakeclock")
            .ok_or(StoreError::NoStatePath)?
            .data_dir()
            .to_path_buf();
        path.push("state.toml");
        Ok(path)
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// a missing or unreadable file yields the default record with a logged
    /// warning, never an error: the alarm must come up in a usable state
    #[must_use]
    pub fn load(&self) -> Record {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!(
                    "couldn't read state file {}, using defaults: {err}",
                    self.path.display()
                );
                return Record::from_table(&toml::Table::new());
            }
        };
        match contents.parse::<toml::Table>() {
            Ok(table) => Record::from_table(&table),
            Err(err) => {
                log::warn!(
                    "malformed state file {}, using defaults: {err}",
                    self.path.display()
                );
                Record::from_table(&toml::Table::new())
            }
        }
    }

    /// # Errors
    /// propagates serialization and i/o failures; the caller decides whether
    /// a lost write matters
    pub fn save(&self, record: &Record) -> Result<(), StoreError> {
        let contents = toml::to_string(record)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
