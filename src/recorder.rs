use crate::backend::Backend;
use crate::models::{Session, Task};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub session: Session,
    /// The active task snapshot was stale and should be dropped.
    pub task_cleared: bool,
}

/// Writes the session for a completed focus interval.
///
/// The active task is looked up again before tagging: a snapshot that points
/// at a task which has since been completed, removed, or belongs to someone
/// else is ignored and the session is stored untagged.
pub fn record_focus<B: Backend>(
    backend: &mut B,
    user_id: &str,
    minutes: u32,
    active: Option<&Task>,
    now: DateTime<Utc>,
) -> Result<Recorded> {
    let current = match active {
        Some(task) => backend
            .task(task.id)?
            .filter(|t| !t.completed && t.user_id == user_id),
        None => None,
    };
    let task_cleared = active.is_some() && current.is_none();

    let session = Session::new(user_id, minutes, now, current.as_ref())?;
    backend.insert_session(session.clone())?;
    info!(
        user = user_id,
        minutes,
        unit = session.unit.as_deref().unwrap_or("-"),
        "Recorded study session"
    );

    Ok(Recorded {
        session,
        task_cleared,
    })
}

/// Like [`record_focus`], but a failed write is only logged. Nothing is
/// retried and the caller skips refreshing its aggregates.
pub fn record_focus_or_warn<B: Backend>(
    backend: &mut B,
    user_id: &str,
    minutes: u32,
    active: Option<&Task>,
    now: DateTime<Utc>,
) -> Option<Recorded> {
    record_focus(backend, user_id, minutes, active, now)
        .map_err(|e| warn!("Failed to record study session: {e:#}"))
        .ok()
}
