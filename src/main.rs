use std::error::Error;

use chrono::Local;
use clap::{Parser, Subcommand};
use wakeclock::{AlarmConfig, Driver, Record, Store, WakeClock, Weekday};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// create the state file with an initial schedule
    Init {
        /// overwrite an existing state file
        #[clap(long, short)]
        force: bool,
        /// snooze increment in minutes (1-60)
        #[clap(long, default_value_t = 9)]
        snooze: i64,
        #[clap(long)]
        mon: Option<String>,
        #[clap(long)]
        tue: Option<String>,
        #[clap(long)]
        wed: Option<String>,
        #[clap(long)]
        thu: Option<String>,
        #[clap(long)]
        fri: Option<String>,
        #[clap(long)]
        sat: Option<String>,
        #[clap(long)]
        sun: Option<String>,
    },
    /// show the schedule and the next alarm
    Status,
    /// enable the alarm and recompute the next occurrence
    On,
    /// disable the alarm, the stored next alarm stays visible
    Off,
    /// set or clear one day, e.g. `set-day wed 07:30` or `set-day wed`
    SetDay {
        day: Weekday,
        #[clap(default_value = "")]
        time: String,
    },
    /// update several days at once with DAY=TIME pairs, e.g. `mon=07:00 wed=`
    SetSchedule { entries: Vec<String> },
    /// set the snooze increment, clamped to 1-60 minutes
    SetSnooze { minutes: u32 },
    /// push the pending alarm forward by the snooze increment
    Snooze {
        /// move the stored timestamp even while the alarm is disabled
        #[clap(long)]
        while_disabled: bool,
    },
    /// stop snoozing and return to the weekly schedule
    Dismiss,
    /// recompute the next occurrence from the schedule
    Recalc,
    /// check whether the pending alarm came due
    Tick,
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_file_logger::init_logger!("wakeclock").expect("couldn't initialize logger");

    let args = Args::parse();
    let store = Store::new(Store::default_path()?);
    let now = Local::now();

    match args.command {
        Command::Init {
            force,
            snooze,
            mon,
            tue,
            wed,
            thu,
            fri,
            sat,
            sun,
        } => {
            if store.exists() && !force {
                return Err(format!(
                    "state file {} already exists, pass --force to overwrite",
                    store.path().display()
                )
                .into());
            }
            let times = [
                (Weekday::Mon, mon),
                (Weekday::Tue, tue),
                (Weekday::Wed, wed),
                (Weekday::Thu, thu),
                (Weekday::Fri, fri),
                (Weekday::Sat, sat),
                (Weekday::Sun, sun),
            ];
            let times: Vec<(Weekday, &str)> = times
                .iter()
                .map(|(day, time)| (*day, time.as_deref().unwrap_or("")))
                .collect();
            // the one place where bad input errors instead of self-correcting
            let config = AlarmConfig::validated(snooze, &times)?;

            let mut clock = WakeClock::new(config);
            clock.recalc_next(now);
            store.save(&Record::from(&clock))?;
            println!("initialized {}", store.path().display());
            print_status(&clock);
        }
        Command::Status => print_status(&WakeClock::from(store.load())),
        command => {
            let clock = WakeClock::from(store.load());
            let mut driver = Driver::new(clock, store);
            match command {
                Command::On => {
                    driver.turn_on(now);
                }
                Command::Off => driver.turn_off(),
                Command::SetDay { day, time } => driver.set_day_time(day, &time, now),
                Command::SetSchedule { entries } => {
                    let mut updates = Vec::new();
                    for entry in &entries {
                        let (day, time) = entry
                            .split_once('=')
                            .ok_or_else(|| format!("expected DAY=TIME, got {entry:?}"))?;
                        updates.push((day.parse::<Weekday>()?, time.to_string()));
                    }
                    driver.set_schedule(&updates, now);
                }
                Command::SetSnooze { minutes } => driver.set_snooze(minutes),
                Command::Snooze { while_disabled } => {
                    driver = driver.with_snooze_while_disabled(while_disabled);
                    if driver.snooze(now).is_none() {
                        println!("alarm is disabled, not snoozing");
                    }
                }
                Command::Dismiss => {
                    driver.dismiss(now);
                }
                Command::Recalc => {
                    driver.recalc_next(now);
                }
                Command::Tick => {
                    if driver.tick(now) {
                        println!("alarm is ringing");
                    }
                }
                Command::Init { .. } | Command::Status => unreachable!(),
            }
            print_status(driver.clock());
        }
    }

    Ok(())
}

fn print_status(clock: &WakeClock) {
    println!("enabled: {}", if clock.enabled() { "yes" } else { "no" });
    println!("state: {}", clock.alarm_state());
    println!("snooze: {} min", clock.snooze_minutes());
    match (clock.next_alarm_label(), clock.next_alarm()) {
        (Some(label), Some(next)) => println!("next alarm: {label} ({})", next.to_rfc3339()),
        _ => println!("next alarm: none"),
    }
    for (day, time) in clock.schedule().iter() {
        println!(
            "  {day} {}",
            time.map_or_else(|| "-".to_string(), |t| t.format("%H:%M").to_string())
        );
    }
}
