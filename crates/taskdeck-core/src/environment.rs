use serde::Serialize;

use crate::config::ConfigError;
use crate::store::{Database, StoreError};
use crate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSummary {
    pub name: String,
    pub task_count: usize,
}

pub fn list_environments(ws: &Workspace) -> Result<Vec<EnvironmentSummary>, StoreError> {
    let db = ws.store()?.load()?;
    Ok(summarize(&db))
}

/// One row per environment, counting every task regardless of status.
pub fn summarize(db: &Database) -> Vec<EnvironmentSummary> {
    db.environments()
        .iter()
        .map(|env| EnvironmentSummary {
            name: env.name.clone(),
            task_count: env.tasks.len(),
        })
        .collect()
}

pub fn current_environment_name(ws: &Workspace) -> String {
    ws.current_environment().to_string()
}

/// Unknown names are fine; the environment appears once a task lands in it.
/// Blank names are rejected.
pub fn switch_environment(ws: &mut Workspace, name: &str) -> Result<(), ConfigError> {
    ws.set_current_environment(name)
}
