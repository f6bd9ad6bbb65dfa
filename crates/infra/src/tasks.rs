//! Office task board.
//!
//! A small to-do list kept alongside the billing records. The board owns its
//! state in memory and flushes the whole snapshot to an injected
//! [`TaskStorage`] on every change; storage is a seam, not ambient global
//! state. The only provided backend serializes to JSON in memory, the same
//! snapshot shape a durable backend would persist.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::{Arc, RwLock};

use billdesk_core::{DomainError, DomainResult, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    Ongoing,
    Complete,
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::Ongoing => "Ongoing",
            TaskStatus::Complete => "Complete",
        };
        f.write_str(label)
    }
}

/// A single board entry. Ids are sequential per board, not global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub description: String,
    pub status: TaskStatus,
}

impl Entity for Task {
    type Id = u32;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Snapshot persistence seam for the task board.
pub trait TaskStorage: Send + Sync {
    fn load(&self) -> anyhow::Result<Vec<Task>>;
    fn save(&self, tasks: &[Task]) -> anyhow::Result<()>;
}

impl<S> TaskStorage for Arc<S>
where
    S: TaskStorage + ?Sized,
{
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        (**self).load()
    }

    fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        (**self).save(tasks)
    }
}

/// In-memory storage holding the serialized snapshot.
///
/// Round-trips through JSON on purpose so the snapshot format gets exercised
/// even without a durable backend.
#[derive(Debug, Default)]
pub struct InMemoryTaskStorage {
    snapshot: RwLock<Option<JsonValue>>,
}

impl InMemoryTaskStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStorage for InMemoryTaskStorage {
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| anyhow::anyhow!("task storage lock poisoned"))?;

        match snapshot.as_ref() {
            Some(value) => {
                serde_json::from_value(value.clone()).context("task snapshot deserialization")
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let value = serde_json::to_value(tasks).context("task snapshot serialization")?;
        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| anyhow::anyhow!("task storage lock poisoned"))?;
        *snapshot = Some(value);
        Ok(())
    }
}

/// The task board: load on construction, flush on every change.
#[derive(Debug)]
pub struct TaskBoard<S: TaskStorage> {
    storage: S,
    tasks: Vec<Task>,
}

impl<S: TaskStorage> TaskBoard<S> {
    /// Build a board from whatever the storage holds. A failed load starts
    /// the board empty rather than refusing to open the page.
    pub fn new(storage: S) -> Self {
        let tasks = storage.load().unwrap_or_else(|err| {
            tracing::warn!("task storage load failed, starting empty: {err:#}");
            Vec::new()
        });
        Self { storage, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Add a task with the next sequential id. Blank descriptions are
    /// rejected.
    pub fn add_task(&mut self, description: impl Into<String>) -> DomainResult<u32> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::validation("task description cannot be empty"));
        }

        let id = self.tasks.len() as u32 + 1;
        self.tasks.push(Task {
            id,
            description,
            status: TaskStatus::NotStarted,
        });
        self.flush();
        Ok(id)
    }

    pub fn update_status(&mut self, id: u32, status: TaskStatus) -> DomainResult<()> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(DomainError::not_found)?;
        task.status = status;
        self.flush();
        Ok(())
    }

    fn flush(&self) {
        // A failed flush loses durability, not the in-memory board.
        if let Err(err) = self.storage.save(&self.tasks) {
            tracing::warn!("task storage flush failed: {err:#}");
        }
    }
}
