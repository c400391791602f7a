use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use taskdeck_core::config::{create_config, ConfigError, Settings};

/// Writes the first config, asking on stdin for anything not passed in.
pub fn run_setup(
    config_path: &Path,
    storage_path: Option<PathBuf>,
    editor: Option<String>,
) -> Result<Option<Settings>> {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(None);
    }
    let storage_path = match storage_path {
        Some(path) => path,
        None => PathBuf::from(prompt("\nWhere would you like to store your data?\nPath: ")?),
    };
    let editor = match editor {
        Some(editor) => editor,
        None => prompt(
            "\nWhat editor would you like to use? (Leave empty for default system editor)\nEditor: ",
        )?,
    };

    match create_config(config_path, &storage_path, Some(&editor)) {
        Ok(settings) => {
            println!("Config file created at {}", config_path.display());
            println!("You can open it with `taskdeck config`.");
            Ok(Some(settings))
        }
        Err(ConfigError::InvalidStoragePath(path)) => {
            println!("Invalid path given ({}). Please try again.", path.display());
            Ok(None)
        }
        Err(err) => Err(err).context("create config"),
    }
}

fn prompt(question: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", question)?;
    stdout.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
