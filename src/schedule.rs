use std::{fmt, str::FromStr};

use chrono::NaiveTime;

/// the seven weekdays, calendar order starting monday
/// this is the closed set of schedule keys, anything else is rejected at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// storage key, also the service-facing name of the day
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }

    /// 3-letter label for display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.key() == key)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        // chrono counts mon=0..sun=6, same as our calendar order
        Self::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWeekdayError(String);

impl fmt::Display for ParseWeekdayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weekday {:?}, expected mon..sun", self.0)
    }
}

impl std::error::Error for ParseWeekdayError {}

impl FromStr for Weekday {
    type Err = ParseWeekdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(&s.trim().to_lowercase()).ok_or_else(|| ParseWeekdayError(s.to_string()))
    }
}

/// parses a strict 24-hour `HH:MM` string
/// anything else (empty included) is "no alarm this day"
#[must_use]
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() != 5 {
        return None;
    }
    let well_formed = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| if i == 2 { *b == b':' } else { b.is_ascii_digit() });
    if !well_formed {
        return None;
    }
    let hour = value[..2].parse().ok()?;
    let minute = value[3..].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// mapping from weekday to an optional time of day
/// an unset day has no alarm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Option<NaiveTime>; 7],
}

impl WeeklySchedule {
    #[must_use]
    pub const fn get(&self, day: Weekday) -> Option<NaiveTime> {
        self.days[day.index()]
    }

    pub fn set(&mut self, day: Weekday, time: Option<NaiveTime>) {
        self.days[day.index()] = time;
    }

    /// invalid strings clear the day instead of erroring
    pub fn set_from_str(&mut self, day: Weekday, value: &str) {
        self.set(day, parse_hhmm(value));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, Option<NaiveTime>)> + '_ {
        Weekday::ALL.into_iter().map(|day| (day, self.get(day)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_times() {
        assert_eq!(parse_hhmm("07:00"), NaiveTime::from_hms_opt(7, 0, 0));
        assert_eq!(parse_hhmm("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_hhmm("00:00"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_hhmm(" 06:30 "), NaiveTime::from_hms_opt(6, 30, 0));
    }

    #[test]
    fn rejects_invalid_times() {
        for bad in ["", "7:00", "24:00", "12:60", "ab:cd", "12-30", "+1:30", "12:3", "012:30"] {
            assert_eq!(parse_hhmm(bad), None, "{bad:?} should not parse");
        }
    }

    #[test]
    fn weekday_keys_round_trip() {
        for day in Weekday::ALL {
            assert_eq!(Weekday::from_key(day.key()), Some(day));
            assert_eq!(day.key().parse::<Weekday>(), Ok(day));
        }
        assert!("maandag".parse::<Weekday>().is_err());
        assert!("".parse::<Weekday>().is_err());
    }

    #[test]
    fn weekday_matches_chrono() {
        assert_eq!(Weekday::from(chrono::Weekday::Mon), Weekday::Mon);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sun);
    }

    #[test]
    fn schedule_set_and_clear() {
        let mut schedule = WeeklySchedule::default();
        assert!(schedule.is_empty());

        schedule.set_from_str(Weekday::Mon, "07:00");
        assert_eq!(schedule.get(Weekday::Mon), NaiveTime::from_hms_opt(7, 0, 0));
        assert!(!schedule.is_empty());

        // invalid input clears the day
        schedule.set_from_str(Weekday::Mon, "garbage");
        assert_eq!(schedule.get(Weekday::Mon), None);
        assert!(schedule.is_empty());
    }
}
