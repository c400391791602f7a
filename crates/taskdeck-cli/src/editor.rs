use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use taskdeck_core::config::SYSTEM_EDITOR;
use tracing::debug;

const FALLBACK_EDITORS: [&str; 3] = ["nano", "vim", "vi"];

/// Resolves the editor command line.
///
/// Order: configured editor (unless empty or `default`), `$VISUAL`,
/// `$EDITOR`, then the first fallback editor found on `PATH`.
pub fn resolve_editor_command(
    configured: Option<&str>,
    env_map: Option<&HashMap<String, String>>,
) -> Result<Vec<String>> {
    let env_map = env_map.cloned().unwrap_or_else(|| env::vars().collect());
    let configured = configured
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != SYSTEM_EDITOR);
    let candidate = configured
        .map(str::to_string)
        .or_else(|| env_map.get("VISUAL").cloned())
        .or_else(|| env_map.get("EDITOR").cloned())
        .filter(|value| !value.trim().is_empty());

    if let Some(raw) = candidate {
        let parts = shell_words::split(&raw)
            .with_context(|| format!("parse editor command `{}`", raw))?;
        if parts.is_empty() {
            bail!("editor command is empty");
        }
        return Ok(parts);
    }

    for name in FALLBACK_EDITORS {
        if let Ok(path) = which::which(name) {
            return Ok(vec![path.to_string_lossy().to_string()]);
        }
    }
    Err(anyhow!(
        "No editor found; set `editor` in the config or the EDITOR variable"
    ))
}

pub fn open_in_editor(configured: Option<&str>, path: &Path) -> Result<()> {
    let parts = resolve_editor_command(configured, None)?;
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| anyhow!("editor command is empty"))?;
    debug!(editor = %program, path = %path.display(), "launching editor");
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("launch editor `{}`", program))?;
    if !status.success() {
        bail!("editor `{}` exited with {}", program, status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn configured_editor_wins_and_is_split() {
        let env = env_with(&[("EDITOR", "nano")]);
        let parts = resolve_editor_command(Some("code --wait"), Some(&env)).expect("resolve");
        assert_eq!(parts, vec!["code", "--wait"]);
    }

    #[test]
    fn default_editor_falls_back_to_visual_then_editor() {
        let env = env_with(&[("VISUAL", "hx"), ("EDITOR", "nano")]);
        let parts = resolve_editor_command(Some("default"), Some(&env)).expect("resolve");
        assert_eq!(parts, vec!["hx"]);

        let env = env_with(&[("EDITOR", "emacs -nw")]);
        let parts = resolve_editor_command(None, Some(&env)).expect("resolve");
        assert_eq!(parts, vec!["emacs", "-nw"]);
    }

    #[test]
    fn unbalanced_quotes_are_an_error() {
        let env = env_with(&[]);
        assert!(resolve_editor_command(Some("vim \"oops"), Some(&env)).is_err());
    }
}
