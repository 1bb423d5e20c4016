use crate::backend::Backend;
use crate::models::{Profile, Session, UserId};
use crate::stats::window_start;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub const ALL_UNIVERSITIES: &str = "All";
pub const ANONYMOUS: &str = "Anonymous";
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    #[default]
    Weekly,
    Alltime,
}

impl View {
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            View::Weekly => Some(window_start(now)),
            View::Alltime => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            View::Weekly => View::Alltime,
            View::Alltime => View::Weekly,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Weekly => write!(f, "Weekly"),
            View::Alltime => write!(f, "All-time"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UniversityFilter {
    #[default]
    All,
    Named(String),
}

impl UniversityFilter {
    pub fn matches(&self, university: &str) -> bool {
        match self {
            UniversityFilter::All => true,
            UniversityFilter::Named(name) => name == university,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UniversityFilter::All => ALL_UNIVERSITIES,
            UniversityFilter::Named(name) => name,
        }
    }
}

impl From<&str> for UniversityFilter {
    fn from(value: &str) -> Self {
        if value == ALL_UNIVERSITIES || value.is_empty() {
            UniversityFilter::All
        } else {
            UniversityFilter::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub user_id: UserId,
    pub minutes: u32,
    pub display_name: String,
    pub university: String,
    pub major1: String,
    pub major2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<Entry>,
    /// 1-based position of the viewer among everyone who passed the filter.
    pub my_rank: Option<usize>,
    pub my_minutes: Option<u32>,
    pub ranked: usize,
}

/// Totals per user, in the order each user first appears.
fn totals(sessions: &[Session]) -> Vec<(UserId, u32)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(UserId, u32)> = Vec::new();
    for session in sessions {
        match index.get(session.user_id.as_str()) {
            Some(&i) => totals[i].1 += session.duration_minutes,
            None => {
                index.insert(&session.user_id, totals.len());
                totals.push((session.user_id.clone(), session.duration_minutes));
            }
        }
    }
    totals
}

/// Ranks users by total minutes across `sessions`.
///
/// Users without a profile show up as "Anonymous" with no university, so
/// only the `All` filter lets them through. Incognito users are left out,
/// except that viewers always see themselves.
pub fn rank(
    sessions: &[Session],
    profiles: &[Profile],
    filter: &UniversityFilter,
    viewer: Option<&str>,
    limit: usize,
) -> Leaderboard {
    let by_id: HashMap<&str, &Profile> = profiles.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut ranked: Vec<Entry> = totals(sessions)
        .into_iter()
        .filter_map(|(user_id, minutes)| {
            let profile = by_id.get(user_id.as_str()).copied();
            let is_viewer = viewer == Some(user_id.as_str());
            if profile.is_some_and(|p| p.incognito) && !is_viewer {
                return None;
            }
            let entry = Entry {
                minutes,
                display_name: profile
                    .map(|p| p.display_name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| ANONYMOUS.to_string()),
                university: profile.map(|p| p.university.clone()).unwrap_or_default(),
                major1: profile.map(|p| p.major1.clone()).unwrap_or_default(),
                major2: profile.and_then(|p| p.major2.clone()).unwrap_or_default(),
                user_id,
            };
            filter.matches(&entry.university).then_some(entry)
        })
        .collect();

    // Stable, so ties keep first-seen order.
    ranked.sort_by(|a, b| b.minutes.cmp(&a.minutes));

    let mine = viewer.and_then(|v| ranked.iter().position(|e| e.user_id == v));
    let my_minutes = mine.map(|i| ranked[i].minutes);
    let total = ranked.len();
    ranked.truncate(limit);

    Leaderboard {
        entries: ranked,
        my_rank: mine.map(|i| i + 1),
        my_minutes,
        ranked: total,
    }
}

pub fn fetch<B: Backend>(
    backend: &B,
    filter: &UniversityFilter,
    view: View,
    viewer: Option<&str>,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Leaderboard> {
    let sessions = backend.sessions_since(view.since(now))?;
    let ids: Vec<UserId> = totals(&sessions).into_iter().map(|(id, _)| id).collect();
    let profiles = backend.profiles(&ids)?;
    Ok(rank(&sessions, &profiles, filter, viewer, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Database;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 20, 10, 0, 0).unwrap()
    }

    fn session(user: &str, minutes: u32, days_ago: i64) -> Session {
        Session::new(user, minutes, now() - Duration::days(days_ago), None).unwrap()
    }

    fn profile(id: &str, name: &str, uni: &str) -> Profile {
        Profile::new(id, name, uni)
    }

    fn sample() -> (Vec<Session>, Vec<Profile>) {
        let sessions = vec![
            session("a", 25, 0),
            session("b", 50, 1),
            session("c", 30, 2),
            session("a", 40, 3),
            session("d", 10, 0),
        ];
        let profiles = vec![
            profile("a", "Alex", "Curtin University"),
            profile("b", "Bo", "Murdoch University"),
            profile("c", "Cam", "Curtin University"),
        ];
        (sessions, profiles)
    }

    #[test]
    fn test_all_contains_every_user() {
        let (sessions, profiles) = sample();
        let board = rank(&sessions, &profiles, &UniversityFilter::All, None, 10);
        let ids: Vec<&str> = board.entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(board.entries[0].minutes, 65);
        assert_eq!(board.entries[3].display_name, ANONYMOUS);
        assert_eq!(board.entries[3].university, "");
    }

    #[test]
    fn test_university_filter_is_exact() {
        let (sessions, profiles) = sample();
        let board = rank(
            &sessions,
            &profiles,
            &UniversityFilter::from("Curtin University"),
            None,
            10,
        );
        assert!(board.entries.iter().all(|e| e.university == "Curtin University"));
        assert_eq!(board.entries.len(), 2);

        let none = rank(&sessions, &profiles, &UniversityFilter::from("curtin university"), None, 10);
        assert!(none.entries.is_empty());
    }

    #[test]
    fn test_viewer_rank_outside_top_n() {
        let (sessions, profiles) = sample();
        let board = rank(&sessions, &profiles, &UniversityFilter::All, Some("c"), 2);
        assert_eq!(board.entries.len(), 2);
        assert_eq!(board.my_rank, Some(3));
        assert_eq!(board.my_minutes, Some(30));
        assert_eq!(board.ranked, 4);
    }

    #[test]
    fn test_viewer_rank_within_filtered_set() {
        let (sessions, profiles) = sample();
        let filter = UniversityFilter::Named("Curtin University".to_string());
        let board = rank(&sessions, &profiles, &filter, Some("c"), 10);
        assert_eq!(board.my_rank, Some(2));

        let board = rank(&sessions, &profiles, &filter, Some("b"), 10);
        assert_eq!(board.my_rank, None);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let sessions = vec![session("x", 20, 0), session("y", 20, 0), session("z", 20, 0)];
        let board = rank(&sessions, &[], &UniversityFilter::All, None, 10);
        let ids: Vec<&str> = board.entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_incognito_hidden_except_from_self() {
        let (sessions, mut profiles) = sample();
        profiles[0].incognito = true;

        let public = rank(&sessions, &profiles, &UniversityFilter::All, Some("b"), 10);
        assert!(public.entries.iter().all(|e| e.user_id != "a"));
        assert_eq!(public.my_rank, Some(1));

        let own = rank(&sessions, &profiles, &UniversityFilter::All, Some("a"), 10);
        assert_eq!(own.my_rank, Some(1));
    }

    #[test]
    fn test_fetch_applies_view_window() -> Result<()> {
        let mut db = Database::default();
        let (sessions, profiles) = sample();
        db.sessions = sessions;
        db.sessions.push(session("b", 500, 30));
        db.profiles = profiles;

        let weekly = fetch(&db, &UniversityFilter::All, View::Weekly, None, 10, now())?;
        assert_eq!(weekly.entries[0].user_id, "a");

        let alltime = fetch(&db, &UniversityFilter::All, View::Alltime, None, 10, now())?;
        assert_eq!(alltime.entries[0].user_id, "b");
        assert_eq!(alltime.entries[0].minutes, 550);
        Ok(())
    }
}
