//! Resolve user-supplied mods/game folder paths.

use crate::ScanError;
use std::path::{Path, PathBuf};

/// Normalize a path typed or pasted by the user.
///
/// On Windows quotes are stripped (they only escape spaces there); elsewhere
/// shell-escaped spaces (`\ `) are unescaped. A leading `~/` expands to
/// `HOME` (or `USERPROFILE`).
pub fn normalize_user_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let mut path = if cfg!(windows) {
        trimmed.replace('"', "")
    } else {
        trimmed.replace("\\ ", " ")
    };

    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))
    {
        return PathBuf::from(home).join(rest);
    }

    if path.len() > 1 && path.ends_with(['/', '\\']) {
        path.pop();
    }
    PathBuf::from(path)
}

/// Resolve the `Mods` folder inside a game folder.
///
/// A path to a file inside the game folder (e.g. the game executable) is
/// accepted and resolved to its parent directory.
pub fn resolve_mods_dir(game_dir: &Path) -> Result<PathBuf, ScanError> {
    let game_dir = if game_dir.is_file() {
        game_dir.parent().unwrap_or(game_dir)
    } else {
        game_dir
    };
    if !game_dir.is_dir() {
        return Err(ScanError::GameDirNotFound(game_dir.to_path_buf()));
    }
    let mods = game_dir.join("Mods");
    if !mods.is_dir() {
        return Err(ScanError::NoModsFolder(game_dir.to_path_buf()));
    }
    Ok(mods)
}
