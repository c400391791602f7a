use std::fs;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};
use thiserror::Error;
use tracing::debug;

pub const SETTINGS_SECTION: &str = "Settings";
pub const DEFAULT_ENVIRONMENT: &str = "default";
/// Editor value meaning "use the system editor".
pub const SYSTEM_EDITOR: &str = "default";

const KEY_EDITOR: &str = "editor";
const KEY_CURRENT_ENVIRONMENT: &str = "current_environment";
const KEY_STORAGE_PATH: &str = "storage_path";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config found at {0}; run `taskdeck setup` first")]
    Missing(PathBuf),
    #[error("Config at {0} does not set a storage_path; run `taskdeck setup` first")]
    MissingStoragePath(PathBuf),
    #[error("Config already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("Storage path does not exist: {0}")]
    InvalidStoragePath(PathBuf),
    #[error("Environment name must not be empty")]
    EmptyEnvironmentName,
    #[error("Unable to resolve home directory; set TASKDECK_HOME to an absolute path")]
    NoHome,
    #[error("Config at {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The config file as read from disk.
///
/// Wraps [`ini::Ini`] so sections and keys this tool does not manage are
/// written back untouched. Keys and section names match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    inner: Ini,
}

impl IniDocument {
    /// Parses Python ConfigParser style text: `=` or `:` delimiters, `#` and
    /// `;` comment lines, values taken literally.
    pub fn parse(text: &str) -> Result<Self, ini::ParseError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        Ok(Self {
            inner: Ini::load_from_str_opt(text, opt)?,
        })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.inner.get_from(Some(section), key)
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.inner.with_section(Some(section)).set(key, value);
    }

    /// Renders the layout ConfigParser writes: `key = value`, one blank line
    /// after every section.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (section, props) in self.inner.iter() {
            match section {
                Some(name) => out.push_str(&format!("[{}]\n", name)),
                None if props.is_empty() => continue,
                None => {}
            }
            for (key, value) in props.iter() {
                out.push_str(&format!("{} = {}\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

/// The `[Settings]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub editor: String,
    pub current_environment: String,
    pub storage_path: PathBuf,
}

impl Settings {
    pub fn from_document(doc: &IniDocument, config_path: &Path) -> Result<Self, ConfigError> {
        let storage_path = doc
            .get(SETTINGS_SECTION, KEY_STORAGE_PATH)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingStoragePath(config_path.to_path_buf()))?;
        let editor = doc
            .get(SETTINGS_SECTION, KEY_EDITOR)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(SYSTEM_EDITOR)
            .to_string();
        let current_environment = doc
            .get(SETTINGS_SECTION, KEY_CURRENT_ENVIRONMENT)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT)
            .to_string();
        Ok(Settings {
            editor,
            current_environment,
            storage_path,
        })
    }

    pub fn write_into(&self, doc: &mut IniDocument) {
        doc.set(SETTINGS_SECTION, KEY_EDITOR, &self.editor);
        doc.set(
            SETTINGS_SECTION,
            KEY_CURRENT_ENVIRONMENT,
            &self.current_environment,
        );
        doc.set(
            SETTINGS_SECTION,
            KEY_STORAGE_PATH,
            &self.storage_path.to_string_lossy(),
        );
    }
}

pub fn config_filename() -> &'static str {
    "taskdeck.ini"
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(config_filename())
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

pub fn resolve_taskdeck_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("TASKDECK_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".taskdeck"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_taskdeck_home_dir()
        .map(|home| config_path(&home))
        .ok_or(ConfigError::NoHome)
}

pub fn load_document(path: &Path) -> Result<IniDocument, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let doc = IniDocument::parse(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(doc)
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let doc = load_document(path)?;
    Settings::from_document(&doc, path)
}

pub fn write_document(path: &Path, doc: &IniDocument) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.render())?;
    Ok(())
}

/// First-run setup. Never overwrites an existing config.
pub fn create_config(
    path: &Path,
    storage_path: &Path,
    editor: Option<&str>,
) -> Result<Settings, ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    if !storage_path.is_dir() {
        return Err(ConfigError::InvalidStoragePath(storage_path.to_path_buf()));
    }
    let settings = Settings {
        editor: editor
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(SYSTEM_EDITOR)
            .to_string(),
        current_environment: DEFAULT_ENVIRONMENT.to_string(),
        storage_path: storage_path.to_path_buf(),
    };
    let mut doc = IniDocument::default();
    settings.write_into(&mut doc);
    write_document(path, &doc)?;
    Ok(settings)
}
