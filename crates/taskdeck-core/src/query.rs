use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::store::{Database, Environment};
use crate::task::{TaskId, TaskRecord, TaskStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid sort key `{0}` (expected id, importance or status)")]
    InvalidSortKey(String),
    #[error("Invalid scope `{0}` (expected current, all or a task id)")]
    InvalidScope(String),
}

/// Which tasks a listing considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Current,
    All,
    Task(TaskId),
}

impl FromStr for Scope {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "current" => Ok(Scope::Current),
            "all" => Ok(Scope::All),
            _ => trimmed
                .parse::<TaskId>()
                .map(Scope::Task)
                .map_err(|_| QueryError::InvalidScope(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFilter {
    pub include_completed: bool,
    pub include_deleted: bool,
}

impl StatusFilter {
    pub fn admits(&self, status: TaskStatus) -> bool {
        match status {
            TaskStatus::Pending => true,
            TaskStatus::Complete => self.include_completed,
            TaskStatus::Deleted => self.include_deleted,
        }
    }
}

/// A task flattened together with the environment that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub name: String,
    pub importance: i64,
    pub status: TaskStatus,
    pub environment: String,
}

impl TaskView {
    fn from_record(environment: &Environment, task: &TaskRecord) -> Self {
        Self {
            id: task.task_id,
            name: task.task_name.clone(),
            importance: task.importance(),
            status: task.task_status,
            environment: environment.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Importance,
    Status,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Importance => "importance",
            SortKey::Status => "status",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "importance" => Ok(SortKey::Importance),
            "status" => Ok(SortKey::Status),
            _ => Err(QueryError::InvalidSortKey(value.to_string())),
        }
    }
}

pub fn filter_tasks(
    db: &Database,
    current_environment: &str,
    scope: Scope,
    filter: StatusFilter,
) -> Vec<TaskView> {
    let candidates: Vec<TaskView> = match scope {
        Scope::Current => db
            .environment(current_environment)
            .map(|env| {
                env.tasks
                    .iter()
                    .map(|task| TaskView::from_record(env, task))
                    .collect()
            })
            .unwrap_or_default(),
        Scope::All => db
            .environments()
            .iter()
            .flat_map(|env| env.tasks.iter().map(move |task| TaskView::from_record(env, task)))
            .collect(),
        Scope::Task(task_id) => db
            .find_task(task_id)
            .map(|(env, task)| vec![TaskView::from_record(env, task)])
            .unwrap_or_default(),
    };
    candidates
        .into_iter()
        .filter(|view| filter.admits(view.status))
        .collect()
}

/// Id and status ascend; importance descends. Ties keep input order.
pub fn sort_tasks(mut views: Vec<TaskView>, key: SortKey) -> Vec<TaskView> {
    match key {
        SortKey::Id => views.sort_by_key(|view| view.id),
        SortKey::Importance => views.sort_by(|a, b| b.importance.cmp(&a.importance)),
        SortKey::Status => views.sort_by(|a, b| a.status.as_str().cmp(b.status.as_str())),
    }
    views
}

/// Sorts by a key given as text, failing on anything unrecognized.
pub fn sort_tasks_by(views: Vec<TaskView>, key: &str) -> Result<Vec<TaskView>, QueryError> {
    Ok(sort_tasks(views, key.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::insert_task;
    use pretty_assertions::assert_eq;

    fn record(id: TaskId, importance: i64, status: TaskStatus) -> TaskRecord {
        let mut task = TaskRecord::new(id, &format!("task {}", id), Some(importance), String::new());
        task.task_status = status;
        task
    }

    fn sample() -> Database {
        let mut db = Database::new();
        insert_task(&mut db, "default", record(1, 3, TaskStatus::Pending));
        insert_task(&mut db, "default", record(2, 8, TaskStatus::Complete));
        insert_task(&mut db, "work", record(3, 5, TaskStatus::Deleted));
        insert_task(&mut db, "work", record(4, 10, TaskStatus::Pending));
        db
    }

    fn ids(views: &[TaskView]) -> Vec<TaskId> {
        views.iter().map(|view| view.id).collect()
    }

    #[test]
    fn scope_parses_keywords_and_ids() {
        assert_eq!("current".parse::<Scope>(), Ok(Scope::Current));
        assert_eq!("ALL".parse::<Scope>(), Ok(Scope::All));
        assert_eq!("12".parse::<Scope>(), Ok(Scope::Task(12)));
        assert!(matches!("x".parse::<Scope>(), Err(QueryError::InvalidScope(_))));
    }

    #[test]
    fn current_scope_hides_finished_tasks_by_default() {
        let db = sample();
        let views = filter_tasks(&db, "default", Scope::Current, StatusFilter::default());
        assert_eq!(ids(&views), vec![1]);

        let filter = StatusFilter {
            include_completed: true,
            include_deleted: false,
        };
        let views = filter_tasks(&db, "default", Scope::Current, filter);
        assert_eq!(ids(&views), vec![1, 2]);
    }

    #[test]
    fn current_scope_on_unseen_environment_is_empty() {
        let db = sample();
        let views = filter_tasks(&db, "fresh", Scope::Current, StatusFilter::default());
        assert!(views.is_empty());
    }

    #[test]
    fn all_scope_spans_environments() {
        let db = sample();
        let filter = StatusFilter {
            include_completed: true,
            include_deleted: true,
        };
        let views = filter_tasks(&db, "default", Scope::All, filter);
        assert_eq!(ids(&views), vec![1, 2, 3, 4]);
        assert_eq!(views[3].environment, "work");
    }

    #[test]
    fn task_scope_respects_status_filter() {
        let db = sample();
        assert!(filter_tasks(&db, "default", Scope::Task(3), StatusFilter::default()).is_empty());
        let filter = StatusFilter {
            include_completed: false,
            include_deleted: true,
        };
        let views = filter_tasks(&db, "default", Scope::Task(3), filter);
        assert_eq!(ids(&views), vec![3]);
        assert!(filter_tasks(&db, "default", Scope::Task(99), filter).is_empty());
    }

    #[test]
    fn sort_directions() {
        let db = sample();
        let filter = StatusFilter {
            include_completed: true,
            include_deleted: true,
        };
        let views = filter_tasks(&db, "default", Scope::All, filter);

        let by_importance = sort_tasks(views.clone(), SortKey::Importance);
        assert_eq!(ids(&by_importance), vec![4, 2, 3, 1]);

        let by_status = sort_tasks(views.clone(), SortKey::Status);
        let statuses: Vec<&str> = by_status.iter().map(|v| v.status.as_str()).collect();
        assert_eq!(statuses, vec!["Complete", "Deleted", "Pending", "Pending"]);
        assert_eq!(ids(&by_status), vec![2, 3, 1, 4]);

        let by_id = sort_tasks(by_importance, SortKey::Id);
        assert_eq!(ids(&by_id), vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let err = sort_tasks_by(Vec::new(), "name").expect_err("invalid");
        assert_eq!(err, QueryError::InvalidSortKey("name".to_string()));
    }
}
