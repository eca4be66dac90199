/*!
 * Hands reports and folders to the platform's default application
 */

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::clipboard::{command_exists, get_platform};
use crate::error::{ProjDumpError, Result};

/// Open `path` with the default application for its type
pub fn open_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(launch_error(path, "path does not exist"));
    }
    spawn_opener(path)
}

/// Open the folder containing `path`
///
/// On macOS and Windows the file is selected in the file manager; elsewhere
/// the parent directory is opened.
pub fn reveal_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(launch_error(path, "path does not exist"));
    }

    match get_platform() {
        "macos" => run_detached(path, "open", &[OsStr::new("-R"), path.as_os_str()]),
        "windows" => {
            let select = format!("/select,{}", path.display());
            run_detached(path, "explorer", &[OsStr::new(&select)])
        }
        _ => spawn_opener(&containing_dir(path)),
    }
}

/// Directory shown by [`reveal_path`] on platforms without file selection
fn containing_dir(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn spawn_opener(path: &Path) -> Result<()> {
    let opener = match get_platform() {
        "macos" => "open",
        "windows" => "explorer",
        "wsl" if command_exists("wslview") => "wslview",
        "android" => "termux-open",
        _ => "xdg-open",
    };
    run_detached(path, opener, &[path.as_os_str()])
}

fn run_detached(path: &Path, program: &str, args: &[&OsStr]) -> Result<()> {
    debug!("Launching {} for {}", program, path.display());
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| launch_error(path, &format!("{}: {}", program, e)))
}

fn launch_error(path: &Path, reason: &str) -> ProjDumpError {
    ProjDumpError::Launch {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
