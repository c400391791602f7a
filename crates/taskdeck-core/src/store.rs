use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::task::{note_file_name, TaskId, TaskRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize database: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Database IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named bucket of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub tasks: Vec<TaskRecord>,
}

/// Environment name -> task list, in document order.
///
/// Order matters: id lookups resolve duplicates by the first environment
/// encountered, so the map keeps the order keys appear in `db.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    environments: Vec<Environment>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|env| env.name == name)
    }

    /// Returns the named environment, appending an empty one if unseen.
    pub fn environment_mut(&mut self, name: &str) -> &mut Environment {
        let idx = match self.environments.iter().position(|env| env.name == name) {
            Some(idx) => idx,
            None => {
                self.environments.push(Environment {
                    name: name.to_string(),
                    tasks: Vec::new(),
                });
                self.environments.len() - 1
            }
        };
        &mut self.environments[idx]
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.environments.iter().map(|env| env.tasks.len()).sum()
    }

    /// `1 + number of tasks`, across every environment.
    pub fn next_task_id(&self) -> TaskId {
        self.task_count() as TaskId + 1
    }

    pub fn find_task(&self, task_id: TaskId) -> Option<(&Environment, &TaskRecord)> {
        self.environments.iter().find_map(|env| {
            env.tasks
                .iter()
                .find(|task| task.task_id == task_id)
                .map(|task| (env, task))
        })
    }

    pub fn find_task_mut(&mut self, task_id: TaskId) -> Option<&mut TaskRecord> {
        self.environments
            .iter_mut()
            .flat_map(|env| env.tasks.iter_mut())
            .find(|task| task.task_id == task_id)
    }
}

impl Serialize for Database {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.environments.len()))?;
        for env in &self.environments {
            map.serialize_entry(&env.name, &env.tasks)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Database {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DatabaseVisitor;

        impl<'de> Visitor<'de> for DatabaseVisitor {
            type Value = Database;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping environment names to task lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Database, A::Error> {
                let mut db = Database::new();
                while let Some((name, tasks)) = access.next_entry::<String, Vec<TaskRecord>>()? {
                    // Duplicate keys: last value wins, first position is kept.
                    db.environment_mut(&name).tasks = tasks;
                }
                Ok(db)
            }
        }

        deserializer.deserialize_map(DatabaseVisitor)
    }
}

/// Holds the exclusive advisory lock on the store until dropped.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// On-disk layout under the storage root.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("db.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("db.lock")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn note_path(&self, task_id: TaskId) -> PathBuf {
        self.tasks_dir().join(note_file_name(task_id))
    }

    /// Blocks until no other process holds the store lock.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(StoreLock { file })
    }

    pub fn load(&self) -> Result<Database, StoreError> {
        let path = self.db_path();
        if !path.exists() {
            debug!(path = %path.display(), "no database yet");
            return Ok(Database::new());
        }
        let raw = fs::read_to_string(&path)?;
        let db: Database =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        debug!(
            path = %path.display(),
            environments = db.environments().len(),
            tasks = db.task_count(),
            "loaded database"
        );
        Ok(db)
    }

    /// Writes the whole database to a sibling temp file, then renames it
    /// over `db.json`.
    pub fn save(&self, db: &Database) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let body = render_database(db)?;
        let path = self.db_path();
        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&body)?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), tasks = db.task_count(), "saved database");
        Ok(())
    }
}

/// Four-space indentation, the layout earlier versions wrote.
fn render_database(db: &Database) -> Result<Vec<u8>, StoreError> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    db.serialize(&mut serializer).map_err(StoreError::Serialize)?;
    Ok(body)
}
