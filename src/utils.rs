/*!
 * Utility functions and preset filter lists for projdump
 */

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;

/// Count the lines of a text file such as a generated report
pub fn count_lines(path: &Path) -> io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Split comma or semicolon separated names, dropping blanks
pub fn split_names(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Directories skipped by the Python preset
pub static PYTHON_IGNORED_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "__pycache__",
        ".pytest_cache",
        ".venv",
        "venv",
        "env",
        ".env",
        "node_modules",
        ".git",
        ".idea",
        ".vscode",
        ".mypy_cache",
    ]
});

/// Files skipped by the Python preset
pub static PYTHON_IGNORED_FILES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        ".gitignore",
        "requirements.txt",
        "pyproject.toml",
        "setup.py",
        "*.pyc",
        "*.pyo",
        "*.pyd",
    ]
});

/// Extensions dumped by the Python preset
pub static PYTHON_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| vec![".py"]);

/// Directories skipped by the web preset
pub static WEB_IGNORED_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "node_modules",
        ".git",
        ".idea",
        ".vscode",
        "dist",
        "build",
    ]
});

/// Files skipped by the web preset
pub static WEB_IGNORED_FILES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        ".gitignore",
        "package.json",
        "package-lock.json",
        "yarn.lock",
        "webpack.config.js",
    ]
});

/// Extensions dumped by the web preset
pub static WEB_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![".html", ".css", ".js", ".jsx", ".ts", ".tsx", ".json"]
});

/// Directories skipped by the all-files preset
pub static ALL_FILES_IGNORED_DIRS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec![".git", ".idea", ".vscode", "node_modules"]);

/// Files skipped by the all-files preset
pub static ALL_FILES_IGNORED_FILES: Lazy<Vec<&'static str>> = Lazy::new(|| vec![".gitignore"]);
