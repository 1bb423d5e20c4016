use crate::error::FormError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type TaskId = u64;

/// One completed focus interval.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub duration_minutes: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Session {
    /// Builds a session tagged with the task's id and unit, if any.
    pub fn new(
        user_id: &str,
        duration_minutes: u32,
        created_at: DateTime<Utc>,
        task: Option<&Task>,
    ) -> Result<Self, FormError> {
        if duration_minutes == 0 {
            return Err(FormError::ZeroDuration);
        }
        Ok(Self {
            user_id: user_id.to_string(),
            duration_minutes,
            created_at,
            task_id: task.map(|t| t.id),
            unit: task.and_then(|t| t.unit.clone()),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: TaskId,
        user_id: &str,
        title: &str,
        unit: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, FormError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FormError::EmptyTaskTitle);
        }
        Ok(Self {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            unit: normalize_optional(unit),
            completed: false,
            created_at,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Profile {
    pub id: UserId,
    pub display_name: String,
    pub university: String,
    #[serde(default)]
    pub major1: String,
    #[serde(default)]
    pub major2: Option<String>,
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub incognito: bool,
}

impl Profile {
    pub fn new(id: &str, display_name: &str, university: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            university: university.to_string(),
            ..Self::default()
        }
    }

    /// "Computer Science & Physics", or just the first major.
    pub fn majors_label(&self) -> String {
        match &self.major2 {
            Some(m2) if !self.major1.is_empty() => format!("{} & {}", self.major1, m2),
            Some(m2) => m2.clone(),
            None => self.major1.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Database {
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub last_task_id: TaskId,
}

/// Trims a free-text field, treating blank input as absent.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_session_rejects_zero_minutes() {
        assert_eq!(
            Session::new("u1", 0, at(), None),
            Err(FormError::ZeroDuration)
        );
    }

    #[test]
    fn test_session_takes_task_tag() {
        let task = Task::new(7, "u1", "Read ch. 4", Some(" CITS2200 "), at()).unwrap();
        let session = Session::new("u1", 25, at(), Some(&task)).unwrap();
        assert_eq!(session.task_id, Some(7));
        assert_eq!(session.unit.as_deref(), Some("CITS2200"));
    }

    #[test]
    fn test_task_trims_and_drops_blank_unit() {
        let task = Task::new(1, "u1", "  Revise  ", Some("   "), at()).unwrap();
        assert_eq!(task.title, "Revise");
        assert!(task.unit.is_none());
        assert!(!task.completed);

        assert_eq!(
            Task::new(2, "u1", "   ", None, at()),
            Err(FormError::EmptyTaskTitle)
        );
    }

    #[test]
    fn test_majors_label() {
        let mut profile = Profile::new("u1", "Sam", "Curtin University");
        profile.major1 = "Physics".to_string();
        assert_eq!(profile.majors_label(), "Physics");
        profile.major2 = Some("Mathematics".to_string());
        assert_eq!(profile.majors_label(), "Physics & Mathematics");
    }

    #[test]
    fn test_database_tolerates_missing_fields() {
        let db: Database = serde_json::from_str(r#"{"sessions": []}"#).unwrap();
        assert!(db.tasks.is_empty());
        assert_eq!(db.last_task_id, 0);
    }
}
