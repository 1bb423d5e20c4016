use crate::models::Session;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const UNTAGGED: &str = "Untagged";
pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMinutes {
    pub unit: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct StudyStats {
    pub weekly_minutes: u32,
    pub streak: u32,
    pub units: Vec<UnitMinutes>,
    /// Minutes per local day over the trailing week, today included.
    pub daily_minutes: BTreeMap<NaiveDate, u32>,
    pub today: NaiveDate,
}

pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

fn in_week<'a>(sessions: &'a [Session], now: DateTime<Utc>) -> impl Iterator<Item = &'a Session> {
    let since = window_start(now);
    sessions.iter().filter(move |s| s.created_at >= since)
}

pub fn weekly_minutes(sessions: &[Session], now: DateTime<Utc>) -> u32 {
    in_week(sessions, now).map(|s| s.duration_minutes).sum()
}

/// Calendar days with at least one session, in the given time zone.
pub fn session_days<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> BTreeSet<NaiveDate> {
    sessions
        .iter()
        .map(|s| s.created_at.with_timezone(tz).date_naive())
        .collect()
}

/// Consecutive days with a session, counting back from `today`.
pub fn streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = today;
    while days.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    count
}

/// Trailing-week minutes per unit, largest first.
pub fn unit_breakdown(sessions: &[Session], now: DateTime<Utc>) -> Vec<UnitMinutes> {
    let mut totals: HashMap<&str, u32> = HashMap::new();
    for session in in_week(sessions, now) {
        let unit = session.unit.as_deref().unwrap_or(UNTAGGED);
        *totals.entry(unit).or_default() += session.duration_minutes;
    }

    let mut units: Vec<UnitMinutes> = totals
        .into_iter()
        .map(|(unit, minutes)| UnitMinutes {
            unit: unit.to_string(),
            minutes,
        })
        .collect();
    units.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.unit.cmp(&b.unit)));
    units
}

pub fn daily_minutes<Tz: TimeZone>(
    sessions: &[Session],
    today: NaiveDate,
    tz: &Tz,
) -> BTreeMap<NaiveDate, u32> {
    let first = today - Duration::days(WINDOW_DAYS - 1);
    let mut days: BTreeMap<NaiveDate, u32> = (0..WINDOW_DAYS)
        .map(|i| (first + Duration::days(i), 0))
        .collect();

    for session in sessions {
        let date = session.created_at.with_timezone(tz).date_naive();
        if let Some(total) = days.get_mut(&date) {
            *total += session.duration_minutes;
        }
    }
    days
}

/// Everything the dashboard shows for one user's sessions.
pub fn calculate_stats<Tz: TimeZone>(sessions: &[Session], now: DateTime<Tz>) -> StudyStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    StudyStats {
        weekly_minutes: weekly_minutes(sessions, now_utc),
        streak: streak(&session_days(sessions, &tz), today),
        units: unit_breakdown(sessions, now_utc),
        daily_minutes: daily_minutes(sessions, today, &tz),
        today,
    }
}
