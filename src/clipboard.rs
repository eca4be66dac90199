/*!
 * Clipboard support for projdump
 *
 * Copies report contents or report paths to the system clipboard by piping
 * them into whichever clipboard command the platform provides.
 */

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::utils::format_file_size;

/// Reports above this size are refused unless the caller forces the copy
pub const MAX_CLIPBOARD_BYTES: u64 = 10 * 1024 * 1024;

/// Error type for clipboard operations
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Failed to execute the command
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No suitable clipboard mechanism was found
    #[error("No suitable clipboard mechanism found")]
    NoClipboardFound,

    /// The file to copy does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The file is larger than [`MAX_CLIPBOARD_BYTES`]
    #[error("File is too large for the clipboard ({0})")]
    TooLarge(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Trait for clipboard operations
pub trait Clipboard {
    /// Copy text to the clipboard
    fn copy_to_clipboard(&self, text: &str) -> Result<()>;
}

/// Available clipboard providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardProvider {
    /// tmux clipboard
    Tmux,
    /// X11 clipboard with xclip
    Xclip,
    /// X11 clipboard with xsel
    Xsel,
    /// Wayland clipboard
    Wayland,
    /// macOS clipboard
    MacOS,
    /// Windows clipboard (native or via WSL)
    Windows,
    /// Termux clipboard
    Termux,
}

impl ClipboardProvider {
    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Tmux => ("tmux", &["load-buffer", "-w", "-"]),
            Self::Xclip => ("xclip", &["-selection", "clipboard", "-in"]),
            Self::Xsel => ("xsel", &["-b", "-i"]),
            Self::Wayland => ("wl-copy", &[]),
            Self::MacOS => ("pbcopy", &[]),
            Self::Windows => ("clip.exe", &[]),
            Self::Termux => ("termux-clipboard-set", &[]),
        }
    }

    /// Command that offers stdin as a `text/uri-list` entry, if supported
    fn uri_list_command(self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            Self::Wayland => Some(("wl-copy", &["-t", "text/uri-list"])),
            Self::Xclip => Some((
                "xclip",
                &["-selection", "clipboard", "-t", "text/uri-list", "-in"],
            )),
            _ => None,
        }
    }
}

impl Clipboard for ClipboardProvider {
    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        let (cmd, args) = self.command();
        execute_clipboard_command(cmd, args, text)
    }
}

//--------------------------------------------------------------------
// Public API
//--------------------------------------------------------------------

/// Copy text to the clipboard
///
/// Uses the first clipboard mechanism available on this system.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let clipboard = get_clipboard()?;
    clipboard.copy_to_clipboard(text)
}

/// Copy the contents of a report file to the clipboard
///
/// Files larger than [`MAX_CLIPBOARD_BYTES`] are refused unless `force`.
pub fn copy_file_contents(path: &Path, force: bool) -> Result<()> {
    let text = read_for_clipboard(path, force)?;
    copy_to_clipboard(&text)
}

/// Copy a path, as text, to the clipboard
pub fn copy_path(path: &Path) -> Result<()> {
    copy_to_clipboard(&path.display().to_string())
}

/// Copy a file as a file object that file managers paste as the file itself
///
/// Uses a `text/uri-list` entry where the clipboard command supports one
/// and falls back to copying the path otherwise.
pub fn copy_file_as_uri(path: &Path) -> Result<()> {
    let absolute = match fs::canonicalize(path) {
        Ok(absolute) => absolute,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ClipboardError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let uri_list = file_uri_list(&absolute)?;

    let command = determine_clipboard_providers()
        .into_iter()
        .find_map(ClipboardProvider::uri_list_command);

    match command {
        Some((cmd, args)) => {
            debug!("Copying {} as a file object with {}", absolute.display(), cmd);
            execute_clipboard_command(cmd, args, &uri_list)
        }
        None => {
            warn!("No clipboard command here accepts file objects; copying the path instead");
            copy_path(&absolute)
        }
    }
}

/// Check if a command exists on the system
pub fn command_exists(command: &str) -> bool {
    if let Some(paths) = env::var_os("PATH") {
        if env::split_paths(&paths).any(|dir| dir.join(command).is_file()) {
            return true;
        }
    }

    // Try to run the command with '--version' flag as fallback
    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Platform name used to pick clipboard and opener commands (cached)
pub fn get_platform() -> &'static str {
    PLATFORM.get_or_init(|| {
        if cfg!(target_os = "macos") {
            "macos"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "android") {
            "android"
        } else if cfg!(target_os = "linux") {
            if env::var("WSL_DISTRO_NAME").is_ok() {
                "wsl"
            } else {
                "linux"
            }
        } else {
            "unknown"
        }
    })
}

//--------------------------------------------------------------------
// Internal Implementation
//--------------------------------------------------------------------

/// Read a file for the clipboard, enforcing the size limit
fn read_for_clipboard(path: &Path, force: bool) -> Result<String> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ClipboardError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.len() > MAX_CLIPBOARD_BYTES && !force {
        return Err(ClipboardError::TooLarge(format_file_size(metadata.len())));
    }

    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// One-entry `text/uri-list` body for an absolute path
fn file_uri_list(absolute: &Path) -> Result<String> {
    let uri = Url::from_file_path(absolute).map_err(|_| {
        ClipboardError::CommandFailed(format!("Not an absolute path: {}", absolute.display()))
    })?;
    Ok(format!("{}\r\n", uri))
}

/// Get the appropriate clipboard implementation based on the system
fn get_clipboard() -> Result<Box<dyn Clipboard>> {
    determine_clipboard_providers()
        .into_iter()
        .next()
        .map(|provider| {
            debug!("Using clipboard provider {:?}", provider);
            Box::new(provider) as Box<dyn Clipboard>
        })
        .ok_or(ClipboardError::NoClipboardFound)
}

/// Spawn `cmd`, write `text` to its stdin and wait for it
fn execute_clipboard_command(cmd: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|_| ClipboardError::CommandFailed(format!("Failed to spawn {}", cmd)))?;

    {
        let stdin = child.stdin.as_mut().ok_or_else(|| {
            ClipboardError::CommandFailed(format!("Failed to open stdin for {}", cmd))
        })?;

        stdin
            .write_all(text.as_bytes())
            .map_err(|_| ClipboardError::CommandFailed(format!("Failed to write to {}", cmd)))?;
    }
    // Close stdin so the command sees EOF
    drop(child.stdin.take());

    let status = child
        .wait()
        .map_err(|_| ClipboardError::CommandFailed(format!("Failed to wait for {}", cmd)))?;

    if status.success() {
        Ok(())
    } else {
        Err(ClipboardError::CommandFailed(format!(
            "{} exited with status: {}",
            cmd, status
        )))
    }
}

static PLATFORM: OnceLock<&'static str> = OnceLock::new();

/// Clipboard providers to try, in order of preference
fn determine_clipboard_providers() -> Vec<ClipboardProvider> {
    let mut providers = Vec::with_capacity(3);

    // Inside a tmux session the tmux buffer is preferred
    if env::var("TMUX").is_ok() && command_exists("tmux") {
        providers.push(ClipboardProvider::Tmux);
    }

    match get_platform() {
        "macos" => {
            if command_exists("pbcopy") {
                providers.push(ClipboardProvider::MacOS);
            }
        }
        "windows" | "wsl" => {
            if command_exists("clip.exe") {
                providers.push(ClipboardProvider::Windows);
            }
        }
        "linux" => {
            if env::var("WAYLAND_DISPLAY").is_ok() && command_exists("wl-copy") {
                providers.push(ClipboardProvider::Wayland);
            }
            if command_exists("xsel") {
                providers.push(ClipboardProvider::Xsel);
            }
            if command_exists("xclip") {
                providers.push(ClipboardProvider::Xclip);
            }
        }
        "android" => {
            if command_exists("termux-clipboard-set") {
                providers.push(ClipboardProvider::Termux);
            }
        }
        _ => {}
    }

    providers
}
