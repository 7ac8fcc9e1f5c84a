use std::sync::mpsc::Sender;

use chrono::{DateTime, Local};

use crate::{
    alarm::{AlarmState, WakeClock},
    communication::{Message, MessageType},
    schedule::Weekday,
    store::{Record, Store},
};

/// applies operations to the single alarm record: mutate in memory first,
/// then persist, then publish
///
/// persistence and publishing are fire-and-forget; a failed write loses at
/// most the latest change, never the in-memory state
#[derive(Debug)]
pub struct Driver {
    clock: WakeClock,
    store: Store,
    subscribers: Option<Sender<Message>>,
    /// policy knob: whether snooze still moves the stored timestamp while
    /// the alarm is disabled (the state stays disabled either way)
    snooze_while_disabled: bool,
}

impl Driver {
    #[must_use]
    pub const fn new(clock: WakeClock, store: Store) -> Self {
        Self {
            clock,
            store,
            subscribers: None,
            snooze_while_disabled: false,
        }
    }

    #[must_use]
    pub fn with_subscriber(mut self, sender: Sender<Message>) -> Self {
        self.subscribers = Some(sender);
        self
    }

    #[must_use]
    pub const fn with_snooze_while_disabled(mut self, allow: bool) -> Self {
        self.snooze_while_disabled = allow;
        self
    }

    #[must_use]
    pub const fn clock(&self) -> &WakeClock {
        &self.clock
    }

    pub fn set_day_time(&mut self, day: Weekday, time: &str, now: DateTime<Local>) {
        self.clock.set_day_time(day, time);
        self.recalc_unless_snoozed(now);
        self.commit();
    }

    /// updates several days at once; invalid times clear their day
    pub fn set_schedule(&mut self, updates: &[(Weekday, String)], now: DateTime<Local>) {
        for (day, time) in updates {
            self.clock.set_day_time(*day, time);
        }
        self.recalc_unless_snoozed(now);
        self.commit();
    }

    pub fn set_snooze(&mut self, minutes: u32) {
        self.clock.set_snooze_minutes(minutes);
        self.commit();
    }

    pub fn recalc_next(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        if self.clock.enabled() {
            self.clock.recalc_next(now);
        }
        self.commit();
        self.clock.next_alarm()
    }

    pub fn snooze(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        if !self.clock.enabled() && !self.snooze_while_disabled {
            return None;
        }
        let next = self.clock.snooze(now);
        self.commit();
        Some(next)
    }

    pub fn dismiss(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        if self.clock.enabled() {
            self.clock.dismiss(now);
        }
        self.commit();
        self.clock.next_alarm()
    }

    pub fn turn_on(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let next = self.clock.turn_on(now);
        self.commit();
        next
    }

    pub fn turn_off(&mut self) {
        self.clock.turn_off();
        self.commit();
    }

    /// periodic tick; returns true on the edge into ringing
    pub fn tick(&mut self, now: DateTime<Local>) -> bool {
        if !self.clock.ring(now) {
            return false;
        }
        if let Some(at) = self.clock.next_alarm() {
            self.publish(MessageType::AlarmRinging { at });
        }
        self.commit();
        true
    }

    /// editing an unrelated day must not silently cancel a pending snooze
    fn recalc_unless_snoozed(&mut self, now: DateTime<Local>) {
        if self.clock.enabled() && self.clock.alarm_state() != AlarmState::Snoozed {
            self.clock.recalc_next(now);
        }
    }

    fn commit(&mut self) {
        if let Err(err) = self.store.save(&Record::from(&self.clock)) {
            log::warn!("couldn't persist alarm state: {err}");
        }
        self.publish(MessageType::RuntimeUpdated {
            next_alarm: self.clock.next_alarm(),
            alarm_state: self.clock.alarm_state(),
        });
    }

    fn publish(&self, kind: MessageType) {
        if let Some(subscribers) = &self.subscribers {
            if subscribers.send(Message::new(kind)).is_err() {
                log::debug!("no subscribers listening");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-01-01 was a monday
    fn local(day: u32, hour: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 1, day, hour, min, 0)
            .single()
            .unwrap()
    }

    fn driver(dir: &tempfile::TempDir) -> Driver {
        let store = Store::new(dir.path().join("state.toml"));
        Driver::new(WakeClock::default(), store)
    }

    #[test]
    fn operations_persist_after_each_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        driver.set_snooze(15);

        let store = Store::new(dir.path().join("state.toml"));
        let record = store.load();
        assert_eq!(record.mon, "07:00");
        assert_eq!(record.snoozetime, 15);
        assert!(!record.nextalarm.is_empty());
    }

    #[test]
    fn schedule_edit_recalcs_while_not_snoozed() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        assert_eq!(driver.clock().next_alarm(), Some(local(1, 7, 0)));

        driver.set_day_time(Weekday::Mon, "06:30", now);
        assert_eq!(driver.clock().next_alarm(), Some(local(1, 6, 30)));
    }

    #[test]
    fn schedule_edit_keeps_a_pending_snooze() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        let snoozed_until = driver.snooze(now).unwrap();
        assert_eq!(snoozed_until, local(1, 7, 9));

        // editing wednesday must not cancel the snooze override
        driver.set_day_time(Weekday::Wed, "08:00", now);
        assert_eq!(driver.clock().next_alarm(), Some(snoozed_until));
        assert_eq!(driver.clock().alarm_state(), AlarmState::Snoozed);

        // dismiss clears it deterministically
        driver.dismiss(now);
        assert_eq!(driver.clock().next_alarm(), Some(local(1, 7, 0)));
        assert_eq!(driver.clock().alarm_state(), AlarmState::Enabled);
    }

    #[test]
    fn set_schedule_updates_multiple_days() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_schedule(
            &[
                (Weekday::Mon, "07:00".to_string()),
                (Weekday::Wed, "07:30".to_string()),
                (Weekday::Fri, "bogus".to_string()),
            ],
            now,
        );
        assert_eq!(driver.clock().next_alarm(), Some(local(1, 7, 0)));
        assert!(driver.clock().schedule().get(Weekday::Fri).is_none());
    }

    #[test]
    fn snooze_on_disabled_alarm_is_a_no_op_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        driver.turn_off();

        assert_eq!(driver.snooze(now), None);
        assert_eq!(driver.clock().next_alarm(), Some(local(1, 7, 0)));
        assert_eq!(driver.clock().alarm_state(), AlarmState::Disabled);
    }

    #[test]
    fn snooze_while_disabled_policy_still_moves_the_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("state.toml"));
        let mut driver =
            Driver::new(WakeClock::default(), store).with_snooze_while_disabled(true);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        driver.turn_off();

        assert_eq!(driver.snooze(now), Some(local(1, 7, 9)));
        // the state still reports disabled
        assert_eq!(driver.clock().alarm_state(), AlarmState::Disabled);
    }

    #[test]
    fn recalc_leaves_a_disabled_alarm_inert() {
        let dir = tempfile::tempdir().unwrap();
        let mut driver = driver(&dir);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        driver.turn_off();
        let before = driver.clock().next_alarm();

        assert_eq!(driver.recalc_next(local(1, 9, 0)), before);
        assert_eq!(driver.clock().alarm_state(), AlarmState::Disabled);
    }

    #[test]
    fn tick_publishes_the_ringing_edge_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("state.toml"));
        let (tx, rx) = std::sync::mpsc::channel();
        let mut driver = Driver::new(WakeClock::default(), store).with_subscriber(tx);
        let now = local(1, 6, 0);

        driver.set_day_time(Weekday::Mon, "07:00", now);
        assert!(!driver.tick(local(1, 6, 59)));
        assert!(driver.tick(local(1, 7, 0)));
        assert!(!driver.tick(local(1, 7, 1)));
        assert_eq!(driver.clock().alarm_state(), AlarmState::Ringing);

        let ringing = rx
            .try_iter()
            .filter(|message| matches!(message.kind, MessageType::AlarmRinging { .. }))
            .count();
        assert_eq!(ringing, 1);

        // snooze is one of the two exits from ringing
        driver.snooze(local(1, 7, 1));
        assert_eq!(driver.clock().alarm_state(), AlarmState::Snoozed);
    }

    #[test]
    fn runtime_updates_reach_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("state.toml"));
        let (tx, rx) = std::sync::mpsc::channel();
        let mut driver = Driver::new(WakeClock::default(), store).with_subscriber(tx);

        driver.turn_off();
        let update = rx.try_recv().unwrap();
        assert!(matches!(
            update.kind,
            MessageType::RuntimeUpdated {
                alarm_state: AlarmState::Disabled,
                ..
            }
        ));
    }
}
