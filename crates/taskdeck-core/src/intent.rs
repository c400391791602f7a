//! The fixed set of things a user can ask for, and their dispatch.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::environment::{self, EnvironmentSummary};
use crate::query::{self, QueryError, Scope, StatusFilter, TaskView};
use crate::repository::{self, LocatedTask, RepositoryError, TaskField};
use crate::store::StoreError;
use crate::task::{TaskId, TaskStatus};
use crate::workspace::Workspace;

#[derive(Debug, Error)]
pub enum IntentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateTask {
        name: String,
        importance: Option<i64>,
        message: Option<String>,
    },
    OpenTask {
        id: TaskId,
    },
    UpdateStatus {
        id: TaskId,
        status: TaskStatus,
    },
    Rename {
        id: TaskId,
        name: String,
    },
    ListTasks {
        scope: Scope,
        filter: StatusFilter,
        sort: String,
    },
    ChangeEnvironment {
        name: String,
    },
    ChangeImportance {
        id: TaskId,
        importance: i64,
    },
    GetEnvironment {
        all: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created {
        id: TaskId,
        name: String,
        environment: String,
        note_path: PathBuf,
    },
    /// The caller opens `task.note_path()` in an editor.
    Located(LocatedTask),
    Updated {
        id: TaskId,
        field: TaskField,
    },
    NotFound {
        id: TaskId,
    },
    Tasks(Vec<TaskView>),
    EnvironmentChanged {
        name: String,
    },
    CurrentEnvironment {
        name: String,
    },
    Environments(Vec<EnvironmentSummary>),
}

pub fn execute(ws: &mut Workspace, intent: Intent) -> Result<Outcome, IntentError> {
    match intent {
        Intent::CreateTask {
            name,
            importance,
            message,
        } => {
            let id = repository::create_task(ws, &name, importance, message.as_deref())?;
            Ok(Outcome::Created {
                id,
                name: name.trim().to_string(),
                environment: environment::current_environment_name(ws),
                note_path: ws.store()?.note_path(id),
            })
        }
        Intent::OpenTask { id } => Ok(match repository::locate_task(ws, id)? {
            Some(task) => Outcome::Located(task),
            None => Outcome::NotFound { id },
        }),
        Intent::UpdateStatus { id, status } => update(ws, id, TaskField::Status(status)),
        Intent::Rename { id, name } => update(ws, id, TaskField::Name(name)),
        Intent::ChangeImportance { id, importance } => {
            update(ws, id, TaskField::Importance(importance))
        }
        Intent::ListTasks {
            scope,
            filter,
            sort,
        } => {
            let db = ws.store()?.load()?;
            let views = query::filter_tasks(&db, ws.current_environment(), scope, filter);
            Ok(Outcome::Tasks(query::sort_tasks_by(views, &sort)?))
        }
        Intent::ChangeEnvironment { name } => {
            environment::switch_environment(ws, &name)?;
            Ok(Outcome::EnvironmentChanged {
                name: environment::current_environment_name(ws),
            })
        }
        Intent::GetEnvironment { all: true } => Ok(Outcome::Environments(
            environment::list_environments(ws)?,
        )),
        Intent::GetEnvironment { all: false } => Ok(Outcome::CurrentEnvironment {
            name: environment::current_environment_name(ws),
        }),
    }
}

fn update(ws: &Workspace, id: TaskId, field: TaskField) -> Result<Outcome, IntentError> {
    if repository::update_task_field(ws, id, field.clone())? {
        Ok(Outcome::Updated { id, field })
    } else {
        Ok(Outcome::NotFound { id })
    }
}
