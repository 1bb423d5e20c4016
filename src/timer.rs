use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;
pub const MAX_WORK_MINUTES: u32 = 120;
pub const MAX_BREAK_MINUTES: u32 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl TimerSettings {
    pub fn clamped(work_minutes: u32, break_minutes: u32) -> Self {
        Self {
            work_minutes: work_minutes.clamp(1, MAX_WORK_MINUTES),
            break_minutes: break_minutes.clamp(1, MAX_BREAK_MINUTES),
        }
    }

    /// Parses user input, falling back to the defaults for anything that
    /// isn't a usable number of minutes.
    pub fn parse(work: &str, break_len: &str) -> Self {
        Self::clamped(
            parse_minutes(work).unwrap_or(DEFAULT_WORK_MINUTES),
            parse_minutes(break_len).unwrap_or(DEFAULT_BREAK_MINUTES),
        )
    }
}

/// Accepts bare minutes ("25") or a humantime duration ("25m", "1h 30m").
/// Zero and unparsable input yield `None`; negative minutes clamp up later.
pub fn parse_minutes(input: &str) -> Option<u32> {
    let input = input.trim();
    let minutes = match input.parse::<i64>() {
        Ok(m) => m,
        Err(_) => (humantime::parse_duration(input).ok()?.as_secs() / 60) as i64,
    };
    match minutes {
        0 => None,
        m if m < 0 => Some(0),
        m => Some(u32::try_from(m).unwrap_or(u32::MAX)),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    FocusCompleted { minutes: u32 },
    BreakCompleted,
}

/// What gets written to the local store so a countdown survives a restart.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub time_left_seconds: i64,
    pub is_break: bool,
    pub running: bool,
    pub saved_at: DateTime<Utc>,
}

/// Focus/break countdown.
///
/// Remaining time is derived from the wall clock (`started_at` against the
/// caller's `now`) rather than counted per tick, so a process that was
/// suspended or slow to redraw catches up on its next tick.
#[derive(Debug, Clone)]
pub struct Timer {
    settings: TimerSettings,
    phase: Phase,
    /// Remaining time when stopped, or at the moment of the last start.
    time_left: Duration,
    started_at: Option<DateTime<Utc>>,
}

impl Timer {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            settings,
            phase: Phase::Focus,
            time_left: minutes(settings.work_minutes),
            started_at: None,
        }
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_break(&self) -> bool {
        self.phase == Phase::Break
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.started_at {
            Some(start) => {
                let elapsed = (now - start).max(Duration::zero());
                (self.time_left - elapsed).max(Duration::zero())
            }
            None => self.time_left,
        }
    }

    /// Whole seconds left, rounded up so a fresh 25 minute timer reads 25:00.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let ms = self.remaining(now).num_milliseconds();
        (ms + 999) / 1000
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_some() {
            self.time_left = self.remaining(now);
            self.started_at = None;
        }
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.is_running() {
            self.pause(now);
        } else {
            self.start(now);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.phase = Phase::Focus;
        self.time_left = minutes(self.settings.work_minutes);
    }

    /// New lengths stop the timer and snap it back to a fresh focus interval.
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        self.reset();
    }

    /// Advances the countdown to `now`. Returns an event when the running
    /// interval has run out; the timer is stopped afterwards, so an interval
    /// expires at most once.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        if !self.is_running() || self.remaining(now) > Duration::zero() {
            return None;
        }
        Some(self.expire())
    }

    fn expire(&mut self) -> TimerEvent {
        self.started_at = None;
        match self.phase {
            Phase::Focus => {
                self.phase = Phase::Break;
                self.time_left = minutes(self.settings.break_minutes);
                TimerEvent::FocusCompleted {
                    minutes: self.settings.work_minutes,
                }
            }
            Phase::Break => {
                self.phase = Phase::Focus;
                self.time_left = minutes(self.settings.work_minutes);
                TimerEvent::BreakCompleted
            }
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            work_minutes: self.settings.work_minutes,
            break_minutes: self.settings.break_minutes,
            time_left_seconds: self.remaining_secs(now),
            is_break: self.is_break(),
            running: self.is_running(),
            saved_at: now,
        }
    }

    /// Rebuilds a timer from a snapshot. A running snapshot loses the time
    /// that passed since it was saved; if that exceeds what was left, the
    /// timer comes back at zero and still running, so the next `tick` expires.
    pub fn restore(snapshot: &TimerSnapshot, now: DateTime<Utc>) -> Self {
        let settings = TimerSettings::clamped(snapshot.work_minutes, snapshot.break_minutes);
        let (phase, full) = if snapshot.is_break {
            (Phase::Break, settings.break_minutes)
        } else {
            (Phase::Focus, settings.work_minutes)
        };
        let mut secs = snapshot.time_left_seconds.clamp(0, i64::from(full) * 60);

        let started_at = if snapshot.running {
            let elapsed_ms = (now - snapshot.saved_at).num_milliseconds().max(0);
            secs = (secs - (elapsed_ms + 500) / 1000).max(0);
            Some(now)
        } else {
            None
        };

        Self {
            settings,
            phase,
            time_left: Duration::seconds(secs),
            started_at,
        }
    }
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    fn settings(work: u32, brk: u32) -> TimerSettings {
        TimerSettings::clamped(work, brk)
    }

    #[test]
    fn test_new_timer_is_focus_stopped() {
        let timer = Timer::new(TimerSettings::default());
        assert_eq!(timer.phase(), Phase::Focus);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(t0()), 25 * 60);
    }

    #[test]
    fn test_run_to_expiry_records_exactly_once() {
        for work in [1, 25, 120] {
            let mut timer = Timer::new(settings(work, 5));
            timer.start(t0());

            let mut events = Vec::new();
            let mut now = t0();
            // Tick every second for a bit longer than the interval.
            for _ in 0..(work * 60 + 30) {
                now += Duration::seconds(1);
                if let Some(e) = timer.tick(now) {
                    events.push(e);
                }
            }

            assert_eq!(events, vec![TimerEvent::FocusCompleted { minutes: work }]);
            assert_eq!(timer.phase(), Phase::Break);
            assert!(!timer.is_running());
            assert_eq!(timer.remaining_secs(now), 5 * 60);
        }
    }

    #[test]
    fn test_break_expiry_returns_to_focus() {
        let mut timer = Timer::new(settings(1, 2));
        timer.start(t0());
        assert!(timer.tick(t0() + Duration::minutes(1)).is_some());

        let later = t0() + Duration::minutes(5);
        timer.start(later);
        assert_eq!(timer.tick(later + Duration::minutes(1)), None);
        assert_eq!(
            timer.tick(later + Duration::minutes(2)),
            Some(TimerEvent::BreakCompleted)
        );
        assert_eq!(timer.phase(), Phase::Focus);
        assert_eq!(timer.remaining_secs(later), 60);
    }

    #[test]
    fn test_pause_resume_only_counts_running_time() {
        let mut timer = Timer::new(settings(25, 5));
        timer.start(t0());
        timer.pause(t0() + Duration::seconds(100));
        assert_eq!(timer.remaining_secs(t0() + Duration::hours(3)), 1500 - 100);

        // A long pause doesn't eat into the interval and never records.
        let resume = t0() + Duration::hours(3);
        assert_eq!(timer.tick(resume), None);
        timer.start(resume);
        assert_eq!(timer.tick(resume + Duration::seconds(60)), None);
        timer.pause(resume + Duration::seconds(60));
        assert_eq!(timer.remaining_secs(resume + Duration::seconds(60)), 1500 - 160);
    }

    #[test]
    fn test_catches_up_after_a_long_gap_between_ticks() {
        let mut timer = Timer::new(settings(25, 5));
        timer.start(t0());
        // Nothing ticked for an hour, e.g. the terminal was suspended.
        assert_eq!(
            timer.tick(t0() + Duration::hours(1)),
            Some(TimerEvent::FocusCompleted { minutes: 25 })
        );
        assert_eq!(timer.tick(t0() + Duration::hours(2)), None);
    }

    #[test]
    fn test_reset_from_break() {
        let mut timer = Timer::new(settings(10, 5));
        timer.start(t0());
        timer.tick(t0() + Duration::minutes(10));
        timer.start(t0() + Duration::minutes(11));
        timer.reset();
        assert_eq!(timer.phase(), Phase::Focus);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(t0()), 600);
    }

    #[test]
    fn test_apply_settings_stops_and_snaps() {
        let mut timer = Timer::new(settings(25, 5));
        timer.start(t0());
        timer.apply_settings(settings(50, 10));
        assert!(!timer.is_running());
        assert_eq!(timer.phase(), Phase::Focus);
        assert_eq!(timer.remaining_secs(t0() + Duration::minutes(5)), 50 * 60);
    }

    #[test]
    fn test_settings_parse_and_clamp() {
        assert_eq!(TimerSettings::parse("50", "10"), settings(50, 10));
        assert_eq!(TimerSettings::parse("1h", "15m"), settings(60, 15));
        assert_eq!(TimerSettings::parse("abc", ""), TimerSettings::default());
        assert_eq!(TimerSettings::parse("0", "0"), TimerSettings::default());
        assert_eq!(TimerSettings::parse("500", "90"), settings(120, 60));
        assert_eq!(TimerSettings::parse("-3", "-1"), settings(1, 1));
    }

    #[test]
    fn test_restore_subtracts_elapsed_time() {
        let snapshot = TimerSnapshot {
            work_minutes: 25,
            break_minutes: 5,
            time_left_seconds: 90,
            is_break: false,
            running: true,
            saved_at: t0(),
        };
        let now = t0() + Duration::seconds(30);
        let timer = Timer::restore(&snapshot, now);
        let left = timer.remaining_secs(now);
        assert!((59..=61).contains(&left), "left = {left}");
        assert!(timer.is_running());
    }

    #[test]
    fn test_restore_deficit_expires_on_next_tick() {
        let snapshot = TimerSnapshot {
            work_minutes: 25,
            break_minutes: 5,
            time_left_seconds: 90,
            is_break: false,
            running: true,
            saved_at: t0(),
        };
        let now = t0() + Duration::minutes(10);
        let mut timer = Timer::restore(&snapshot, now);
        assert_eq!(timer.remaining_secs(now), 0);
        assert_eq!(
            timer.tick(now),
            Some(TimerEvent::FocusCompleted { minutes: 25 })
        );
    }

    #[test]
    fn test_restore_paused_keeps_time() {
        let mut timer = Timer::new(settings(30, 5));
        timer.start(t0());
        timer.pause(t0() + Duration::seconds(45));
        let snapshot = timer.snapshot(t0() + Duration::seconds(45));
        assert!(!snapshot.running);

        let restored = Timer::restore(&snapshot, t0() + Duration::days(1));
        assert!(!restored.is_running());
        assert_eq!(restored.remaining_secs(t0()), 30 * 60 - 45);
    }

    #[test]
    fn test_restore_clamps_out_of_range_values() {
        let snapshot = TimerSnapshot {
            work_minutes: 0,
            break_minutes: 500,
            time_left_seconds: 99_999,
            is_break: true,
            running: false,
            saved_at: t0(),
        };
        let timer = Timer::restore(&snapshot, t0());
        assert_eq!(timer.settings(), settings(1, 60));
        assert_eq!(timer.remaining_secs(t0()), 60 * 60);
    }
}
