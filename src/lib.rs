#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! A single recurring weekly wake-up alarm.
//!
//! The core is [`WakeClock`]: a per-weekday time table, an enabled flag and a
//! snooze increment, from which the next absolute wake-up instant is derived.
//! [`Driver`] applies operations to it and persists/publishes every change.

pub mod alarm;
pub mod communication;
pub mod driver;
pub mod schedule;
pub mod store;

pub use alarm::{AlarmConfig, AlarmState, ValidationError, WakeClock, DEFAULT_SNOOZE_MINUTES};
pub use driver::Driver;
pub use schedule::{parse_hhmm, Weekday, WeeklySchedule};
pub use store::{Record, Store, StoreError};
