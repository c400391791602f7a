use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{self, ConfigError, IniDocument, Settings};
use crate::store::{Store, StoreError};

/// Everything an operation needs to know about where data lives.
///
/// Built once per process from the config file and passed explicitly to
/// every repository, query and environment operation.
#[derive(Debug, Clone)]
pub struct Workspace {
    config_path: PathBuf,
    document: IniDocument,
    settings: Settings,
}

impl Workspace {
    pub fn open(config_path: &Path) -> Result<Self, ConfigError> {
        let document = config::load_document(config_path)?;
        let settings = Settings::from_document(&document, config_path)?;
        Ok(Self {
            config_path: config_path.to_path_buf(),
            document,
            settings,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn editor(&self) -> &str {
        &self.settings.editor
    }

    pub fn current_environment(&self) -> &str {
        &self.settings.current_environment
    }

    /// Persists the new current environment, keeping the rest of the file.
    pub fn set_current_environment(&mut self, name: &str) -> Result<(), ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyEnvironmentName);
        }
        self.settings.current_environment = name.to_string();
        self.settings.write_into(&mut self.document);
        config::write_document(&self.config_path, &self.document)?;
        info!(environment = name, "switched current environment");
        Ok(())
    }

    /// The storage root, created if it does not exist yet.
    pub fn storage_root(&self) -> Result<PathBuf, StoreError> {
        let root = self.settings.storage_path.clone();
        fs::create_dir_all(&root)?;
        Ok(root)
    }

    pub fn store(&self) -> Result<Store, StoreError> {
        Ok(Store::new(self.storage_root()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(temp: &TempDir) -> Workspace {
        let storage = temp.path().join("data");
        fs::create_dir_all(&storage).expect("storage");
        let path = temp.path().join("taskdeck.ini");
        config::create_config(&path, &storage, Some("vim")).expect("config");
        Workspace::open(&path).expect("open")
    }

    #[test]
    fn open_without_config_is_missing() {
        let temp = TempDir::new().expect("tempdir");
        let err = Workspace::open(&temp.path().join("taskdeck.ini")).expect_err("missing");
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn set_current_environment_persists() {
        let temp = TempDir::new().expect("tempdir");
        let mut ws = workspace(&temp);
        assert_eq!(ws.current_environment(), "default");

        ws.set_current_environment("errands").expect("switch");
        assert_eq!(ws.current_environment(), "errands");

        let reopened = Workspace::open(ws.config_path()).expect("reopen");
        assert_eq!(reopened.current_environment(), "errands");
        assert_eq!(reopened.editor(), "vim");
    }

    #[test]
    fn storage_root_is_created_on_demand() {
        let temp = TempDir::new().expect("tempdir");
        let ws = workspace(&temp);
        fs::remove_dir_all(temp.path().join("data")).expect("remove");
        let root = ws.storage_root().expect("root");
        assert!(root.is_dir());
    }
}
