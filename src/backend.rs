//! The queryable store behind the app. `Database` answers queries in memory;
//! `JsonBackend` wraps it with a load-modify-save cycle on `db.json`, so two
//! processes writing at once resolve as last writer wins.

use crate::error::StoreError;
use crate::models::{Database, Profile, Session, Task, TaskId, UserId};
use crate::storage::Storage;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

pub trait Backend {
    fn insert_session(&mut self, session: Session) -> Result<()>;

    /// Sessions of one user, optionally only those created at or after `since`.
    fn user_sessions(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Session>>;

    /// Sessions of every user, optionally windowed.
    fn sessions_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Session>>;

    fn insert_task(
        &mut self,
        user_id: &str,
        title: &str,
        unit: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Task>;

    /// Uncompleted tasks of a user, oldest first.
    fn open_tasks(&self, user_id: &str) -> Result<Vec<Task>>;

    fn task(&self, id: TaskId) -> Result<Option<Task>>;

    fn complete_task(&mut self, user_id: &str, id: TaskId) -> Result<()>;

    fn profile(&self, user_id: &str) -> Result<Option<Profile>>;

    fn insert_profile(&mut self, profile: Profile) -> Result<()>;

    fn update_profile(&mut self, profile: &Profile) -> Result<()>;

    fn profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>>;
}

fn in_window(session: &Session, since: Option<DateTime<Utc>>) -> bool {
    since.map_or(true, |s| session.created_at >= s)
}

impl Backend for Database {
    fn insert_session(&mut self, session: Session) -> Result<()> {
        self.sessions.push(session);
        Ok(())
    }

    fn user_sessions(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && in_window(s, since))
            .cloned()
            .collect())
    }

    fn sessions_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| in_window(s, since))
            .cloned()
            .collect())
    }

    fn insert_task(
        &mut self,
        user_id: &str,
        title: &str,
        unit: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Task> {
        let task = Task::new(self.last_task_id + 1, user_id, title, unit, created_at)?;
        self.last_task_id = task.id;
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn open_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && !t.completed)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    fn task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn complete_task(&mut self, user_id: &str, id: TaskId) -> Result<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id && !t.completed)
            .ok_or(StoreError::TaskNotFound(id))?;
        task.completed = true;
        Ok(())
    }

    fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    fn insert_profile(&mut self, profile: Profile) -> Result<()> {
        if self.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StoreError::ProfileExists(profile.id).into());
        }
        self.profiles.push(profile);
        Ok(())
    }

    fn update_profile(&mut self, profile: &Profile) -> Result<()> {
        let existing = self
            .profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or_else(|| StoreError::ProfileMissing(profile.id.clone()))?;
        *existing = profile.clone();
        Ok(())
    }

    fn profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

pub struct JsonBackend {
    storage: Storage,
}

impl JsonBackend {
    pub fn open(dir: &Path) -> Self {
        Self {
            storage: Storage::in_dir(dir, "db.json"),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db: Database = self.storage.load()?;
        f(&db)
    }

    fn write<T>(&mut self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let mut db: Database = self.storage.load()?;
        let out = f(&mut db)?;
        self.storage.save(&db)?;
        Ok(out)
    }
}

impl Backend for JsonBackend {
    fn insert_session(&mut self, session: Session) -> Result<()> {
        self.write(|db| db.insert_session(session))
    }

    fn user_sessions(&self, user_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Session>> {
        self.read(|db| db.user_sessions(user_id, since))
    }

    fn sessions_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Session>> {
        self.read(|db| db.sessions_since(since))
    }

    fn insert_task(
        &mut self,
        user_id: &str,
        title: &str,
        unit: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Task> {
        self.write(|db| db.insert_task(user_id, title, unit, created_at))
    }

    fn open_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        self.read(|db| db.open_tasks(user_id))
    }

    fn task(&self, id: TaskId) -> Result<Option<Task>> {
        self.read(|db| db.task(id))
    }

    fn complete_task(&mut self, user_id: &str, id: TaskId) -> Result<()> {
        self.write(|db| db.complete_task(user_id, id))
    }

    fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.read(|db| db.profile(user_id))
    }

    fn insert_profile(&mut self, profile: Profile) -> Result<()> {
        self.write(|db| db.insert_profile(profile))
    }

    fn update_profile(&mut self, profile: &Profile) -> Result<()> {
        self.write(|db| db.update_profile(profile))
    }

    fn profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>> {
        self.read(|db| db.profiles(ids))
    }
}
