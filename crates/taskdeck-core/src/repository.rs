use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{Database, StoreError};
use crate::task::{TaskId, TaskRecord, TaskStatus};
use crate::workspace::Workspace;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Task name must not be empty")]
    EmptyName,
    #[error("Failed to write task note {path}: {source}")]
    Note {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The fields an update may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskField {
    Name(String),
    Importance(i64),
    Status(TaskStatus),
}

impl TaskField {
    pub fn apply(&self, task: &mut TaskRecord) {
        match self {
            TaskField::Name(name) => task.task_name = name.clone(),
            TaskField::Importance(value) => task.set_importance(*value),
            TaskField::Status(status) => task.task_status = *status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedTask {
    pub environment: String,
    pub record: TaskRecord,
}

impl LocatedTask {
    pub fn note_path(&self) -> &Path {
        Path::new(&self.record.task_path)
    }
}

/// Creates a task in the current environment and returns its id.
///
/// The note file is written before the database; a failure in between
/// leaves an orphaned note and no record.
pub fn create_task(
    ws: &Workspace,
    name: &str,
    importance: Option<i64>,
    message: Option<&str>,
) -> Result<TaskId, RepositoryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RepositoryError::EmptyName);
    }
    let store = ws.store()?;
    let _lock = store.lock()?;
    let mut db = store.load()?;

    let task_id = db.next_task_id();
    let note_path = store.note_path(task_id);
    write_note(&note_path, message)?;

    let environment = ws.current_environment();
    insert_task(
        &mut db,
        environment,
        TaskRecord::new(
            task_id,
            name,
            importance,
            note_path.to_string_lossy().to_string(),
        ),
    );
    store.save(&db)?;
    info!(task_id, environment, "created task");
    Ok(task_id)
}

/// Appends a record, creating the environment on first use.
pub fn insert_task(db: &mut Database, environment: &str, record: TaskRecord) {
    db.environment_mut(environment).tasks.push(record);
}

/// Sets one field on the first task with `task_id`.
///
/// Returns `false` without writing when no task has that id.
pub fn update_task_field(
    ws: &Workspace,
    task_id: TaskId,
    field: TaskField,
) -> Result<bool, RepositoryError> {
    if let TaskField::Name(name) = &field {
        if name.trim().is_empty() {
            return Err(RepositoryError::EmptyName);
        }
    }
    let store = ws.store()?;
    let _lock = store.lock()?;
    let mut db = store.load()?;
    if !apply_update(&mut db, task_id, &field) {
        debug!(task_id, "no task with this id");
        return Ok(false);
    }
    store.save(&db)?;
    info!(task_id, ?field, "updated task");
    Ok(true)
}

pub fn apply_update(db: &mut Database, task_id: TaskId, field: &TaskField) -> bool {
    match db.find_task_mut(task_id) {
        Some(task) => {
            field.apply(task);
            true
        }
        None => false,
    }
}

pub fn locate_task(ws: &Workspace, task_id: TaskId) -> Result<Option<LocatedTask>, RepositoryError> {
    let db = ws.store()?.load()?;
    Ok(find_located(&db, task_id))
}

pub fn find_located(db: &Database, task_id: TaskId) -> Option<LocatedTask> {
    db.find_task(task_id).map(|(env, record)| LocatedTask {
        environment: env.name.clone(),
        record: record.clone(),
    })
}

fn write_note(path: &Path, message: Option<&str>) -> Result<(), RepositoryError> {
    touch_or_write(path, message).map_err(|source| RepositoryError::Note {
        path: path.to_path_buf(),
        source,
    })
}

fn touch_or_write(path: &Path, message: Option<&str>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match message.filter(|text| !text.is_empty()) {
        Some(text) => fs::write(path, text),
        None => {
            OpenOptions::new().create(true).append(true).open(path)?;
            Ok(())
        }
    }
}
