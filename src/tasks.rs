use crate::backend::Backend;
use crate::local::{LocalStore, ACTIVE_TASK_KEY};
use crate::models::{Task, TaskId};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

pub fn add_task<B: Backend>(
    backend: &mut B,
    user_id: &str,
    title: &str,
    unit: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Task> {
    let task = backend.insert_task(user_id, title, unit, now)?;
    info!(user = user_id, id = task.id, "Added task");
    Ok(task)
}

/// Marks a task done, dropping the active designation if it pointed there.
pub fn complete_task<B: Backend>(
    backend: &mut B,
    local: &mut LocalStore,
    user_id: &str,
    id: TaskId,
) -> Result<()> {
    backend.complete_task(user_id, id)?;
    if active_task(local).is_some_and(|t| t.id == id) {
        local.remove(ACTIVE_TASK_KEY)?;
    }
    info!(user = user_id, id, "Completed task");
    Ok(())
}

pub fn active_task(local: &LocalStore) -> Option<Task> {
    local.get(ACTIVE_TASK_KEY)
}

/// Selecting the active task again clears it; anything else replaces it.
pub fn toggle_active(local: &mut LocalStore, task: &Task) -> Result<Option<Task>> {
    if active_task(local).is_some_and(|t| t.id == task.id) {
        local.remove(ACTIVE_TASK_KEY)?;
        Ok(None)
    } else {
        local.set(ACTIVE_TASK_KEY, task)?;
        Ok(Some(task.clone()))
    }
}

pub fn clear_active(local: &mut LocalStore) -> Result<()> {
    local.remove(ACTIVE_TASK_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Database;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_toggle_active() -> Result<()> {
        let dir = tempdir()?;
        let mut local = LocalStore::open(dir.path());
        let mut db = Database::default();
        let a = add_task(&mut db, "u1", "A", None, now())?;
        let b = add_task(&mut db, "u1", "B", Some("PHYS1001"), now())?;

        assert_eq!(toggle_active(&mut local, &a)?, Some(a.clone()));
        assert_eq!(toggle_active(&mut local, &b)?, Some(b.clone()));
        assert_eq!(active_task(&local), Some(b.clone()));
        assert_eq!(toggle_active(&mut local, &b)?, None);
        assert_eq!(active_task(&local), None);
        Ok(())
    }

    #[test]
    fn test_completing_active_task_clears_it() -> Result<()> {
        let dir = tempdir()?;
        let mut local = LocalStore::open(dir.path());
        let mut db = Database::default();
        let a = add_task(&mut db, "u1", "A", None, now())?;
        let b = add_task(&mut db, "u1", "B", None, now())?;
        toggle_active(&mut local, &a)?;

        complete_task(&mut db, &mut local, "u1", b.id)?;
        assert_eq!(active_task(&local).map(|t| t.id), Some(a.id));

        complete_task(&mut db, &mut local, "u1", a.id)?;
        assert!(active_task(&local).is_none());
        assert!(db.open_tasks("u1")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_task_validates() {
        let mut db = Database::default();
        assert!(add_task(&mut db, "u1", "", None, now()).is_err());
    }
}
