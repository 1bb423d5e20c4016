use crate::leaderboard::{Leaderboard, UniversityFilter, View};
use crate::models::{Profile, Task};
use crate::stats::StudyStats;
use crate::utils::{format_minutes, plural_days};
use std::fmt::Write;

pub struct Reporter<'a> {
    viewer: &'a str,
}

impl<'a> Reporter<'a> {
    pub fn new(viewer: &'a str) -> Self {
        Self { viewer }
    }

    pub fn stats(&self, stats: &StudyStats) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "StudyGrind Report");
        let _ = writeln!(out, "=================");
        let _ = writeln!(out, "This Week:  {}", format_minutes(stats.weekly_minutes));
        let _ = writeln!(out, "Streak:     {} {}", stats.streak, plural_days(stats.streak));

        let _ = writeln!(out, "\nBy Unit (last 7 days)");
        let _ = writeln!(out, "---------------------");
        if stats.units.is_empty() {
            let _ = writeln!(out, "  No sessions yet.");
        }
        for unit in &stats.units {
            let _ = writeln!(out, "  {:<16} {}", unit.unit, format_minutes(unit.minutes));
        }

        let _ = writeln!(out, "\nDaily");
        let _ = writeln!(out, "-----");
        for (date, minutes) in &stats.daily_minutes {
            let label = if *date == stats.today {
                format!("{} (Today)", date.format("%a %d %b"))
            } else {
                date.format("%a %d %b").to_string()
            };
            let _ = writeln!(out, "  {:<18} {}", label, format_minutes(*minutes));
        }
        out
    }

    pub fn leaderboard(&self, board: &Leaderboard, filter: &UniversityFilter, view: View) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Leaderboard: {} / {}", view, filter.label());
        let _ = writeln!(out, "------------------------------");
        if board.entries.is_empty() {
            let _ = writeln!(out, "No results for this university yet.");
            return out;
        }

        for (i, entry) in board.entries.iter().enumerate() {
            let name = if entry.user_id == self.viewer {
                "You"
            } else {
                entry.display_name.as_str()
            };
            let mut detail = entry.university.clone();
            if !entry.major1.is_empty() {
                let _ = write!(detail, " · {}", entry.major1);
            }
            if !entry.major2.is_empty() {
                let _ = write!(detail, " & {}", entry.major2);
            }
            let _ = writeln!(out, "#{:<3} {:<24} {:>8}", i + 1, name, format_minutes(entry.minutes));
            if !detail.is_empty() {
                let _ = writeln!(out, "     {}", detail);
            }
        }

        if let (Some(rank), Some(minutes)) = (board.my_rank, board.my_minutes) {
            if rank > board.entries.len() {
                let _ = writeln!(
                    out,
                    "...\n#{:<3} {:<24} {:>8}",
                    rank,
                    "You",
                    format_minutes(minutes)
                );
            }
        }
        if board.ranked > board.entries.len() {
            let _ = writeln!(out, "\nTop {} of {}", board.entries.len(), board.ranked);
        }
        out
    }

    pub fn tasks(&self, tasks: &[Task], active: Option<&Task>) -> String {
        let mut out = String::new();
        if tasks.is_empty() {
            let _ = writeln!(out, "No tasks yet.");
        }
        for task in tasks {
            let marker = if active.is_some_and(|a| a.id == task.id) {
                "*"
            } else {
                " "
            };
            match &task.unit {
                Some(unit) => {
                    let _ = writeln!(out, "{} [{}] {} ({})", marker, task.id, task.title, unit);
                }
                None => {
                    let _ = writeln!(out, "{} [{}] {}", marker, task.id, task.title);
                }
            }
        }
        out
    }

    pub fn profile(&self, profile: &Profile) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", profile.display_name, profile.id);
        let _ = writeln!(out, "University: {}", profile.university);
        let majors = profile.majors_label();
        let _ = writeln!(
            out,
            "Majors:     {}",
            if majors.is_empty() { "-" } else { majors.as_str() }
        );
        let units = if profile.units.is_empty() {
            "-".to_string()
        } else {
            profile.units.join(", ")
        };
        let _ = writeln!(out, "Units:      {}", units);
        let _ = writeln!(
            out,
            "Incognito:  {}",
            if profile.incognito { "on" } else { "off" }
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::Entry;
    use crate::stats::UnitMinutes;
    use chrono::NaiveDate;

    fn entry(id: &str, name: &str, minutes: u32) -> Entry {
        Entry {
            user_id: id.to_string(),
            minutes,
            display_name: name.to_string(),
            university: "Curtin University".to_string(),
            major1: "Physics".to_string(),
            major2: String::new(),
        }
    }

    #[test]
    fn test_stats_report() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let stats = StudyStats {
            weekly_minutes: 125,
            streak: 1,
            units: vec![UnitMinutes {
                unit: "CITS2200".to_string(),
                minutes: 125,
            }],
            daily_minutes: [(today, 125)].into_iter().collect(),
            today,
        };
        let out = Reporter::new("u1").stats(&stats);
        assert!(out.contains("This Week:  2h 5m"));
        assert!(out.contains("Streak:     1 day\n"));
        assert!(out.contains("CITS2200"));
        assert!(out.contains("(Today)"));
    }

    #[test]
    fn test_leaderboard_marks_viewer_and_trailing_rank() {
        let board = Leaderboard {
            entries: vec![entry("a", "Alex", 90), entry("b", "Bo", 60)],
            my_rank: Some(4),
            my_minutes: Some(20),
            ranked: 5,
        };
        let out = Reporter::new("me").leaderboard(&board, &UniversityFilter::All, View::Weekly);
        assert!(out.contains("Weekly / All"));
        assert!(out.contains("Alex"));
        assert!(out.contains("Curtin University · Physics"));
        assert!(out.contains("#4   You"));

        let out = Reporter::new("a").leaderboard(&board, &UniversityFilter::All, View::Alltime);
        assert!(out.contains("#1   You"));
        assert!(!out.contains("Alex"));
    }

    #[test]
    fn test_empty_leaderboard() {
        let out = Reporter::new("me").leaderboard(
            &Leaderboard::default(),
            &UniversityFilter::Named("Bond University".to_string()),
            View::Weekly,
        );
        assert!(out.contains("No results for this university yet."));
    }
}
