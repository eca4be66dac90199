/*!
 * Tests for projdump functionality
 */

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};

use crate::analyzer::ProjectAnalyzer;
use crate::error::Result;
use crate::scanner::{Scanner, NO_ACCESS};
use crate::types::{EntryOutcome, FilterConfig, SkipReason};
use crate::writer::BINARY_PLACEHOLDER;

// Helper function to create a test project under a canonical temp dir
fn setup_project() -> Result<(TempDir, PathBuf)> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("project");

    fs::create_dir_all(root.join("src").join("pkg"))?;
    fs::create_dir_all(root.join(".git").join("objects"))?;
    fs::create_dir_all(root.join("node_modules").join("left-pad"))?;

    fs::write(root.join("README.md"), "# Project\n")?;
    fs::write(root.join("src").join("main.py"), "print('hi')\n")?;
    fs::write(root.join("src").join("pkg").join("util.py"), "def f():\n    return 1\n")?;
    fs::write(root.join(".git").join("config"), "[core]\n")?;
    fs::write(root.join(".git").join("objects").join("ab"), "blob")?;
    fs::write(root.join("node_modules").join("left-pad").join("index.js"), "module.exports = 1;\n")?;
    fs::write(root.join("Cargo.lock"), "# lock\n")?;

    Ok((temp_dir, root))
}

fn structure(root: &Path, filters: FilterConfig) -> Result<Vec<String>> {
    let scanner = Scanner::new(root, filters)?;
    Ok(scanner.structure().collect())
}

fn run_to_string(root: &Path, output: &Path, filters: FilterConfig) -> Result<String> {
    ProjectAnalyzer::new(root, output, filters)?.run()?;
    Ok(fs::read_to_string(output)?)
}

#[test]
fn test_excluded_dirs_never_appear() -> Result<()> {
    let (_temp_dir, root) = setup_project()?;
    let filters = FilterConfig::new([".git", "node_modules"], [""; 0], [""; 0]);

    let lines = structure(&root, filters.clone())?;
    assert_eq!(
        lines,
        vec![
            "└── project",
            "    ├── src",
            "    │   ├── pkg",
            "    │   │   └── util.py",
            "    │   └── main.py",
            "    ├── Cargo.lock",
            "    └── README.md",
        ]
    );

    // One line for the root plus one per surviving entry
    let surviving = 6;
    assert_eq!(lines.len(), 1 + surviving);

    let output = root.parent().unwrap().join("out.txt");
    let text = run_to_string(&root, &output, filters)?;
    assert!(!text.contains(".git"));
    assert!(!text.contains("node_modules"));
    assert!(!text.contains("left-pad"));
    Ok(())
}

#[test]
fn test_extension_allow_list_is_case_insensitive() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    fs::create_dir(&root)?;
    fs::write(root.join("a.py"), "alpha")?;
    fs::write(root.join("b.txt"), "bravo")?;
    fs::write(root.join("c.PY"), "charlie")?;

    let output = temp_dir.path().join("out.txt");
    let text = run_to_string(&root, &output, FilterConfig::new([""; 0], [""; 0], [".py"]))?;

    assert!(text.contains(&format!("Content of {}:\nalpha\n", root.join("a.py").display())));
    assert!(text.contains(&format!("Content of {}:\ncharlie\n", root.join("c.PY").display())));
    assert!(!text.contains("bravo"));
    assert!(!text.contains(&format!("Content of {}", root.join("b.txt").display())));
    // Still listed in the structure
    assert!(text.contains("├── b.txt"));
    Ok(())
}

#[test]
fn test_invalid_utf8_gets_placeholder() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    fs::create_dir(&root)?;
    File::create(root.join("image.bin"))?.write_all(&[0xff, 0xfe, 0x00, 0x80])?;

    let output = temp_dir.path().join("out.txt");
    let report = ProjectAnalyzer::new(&root, &output, FilterConfig::default())?.run()?;
    let text = fs::read_to_string(&output)?;

    assert!(text.contains(&format!(
        "\nContent of {}:\n{}\n",
        root.join("image.bin").display(),
        BINARY_PLACEHOLDER
    )));
    assert_eq!(report.files_skipped, 1);
    assert!(matches!(
        report.file_details[0].1,
        EntryOutcome::Skipped(SkipReason::Binary)
    ));
    Ok(())
}

#[test]
fn test_directories_first_then_case_insensitive_names() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    fs::create_dir_all(root.join("A"))?;
    fs::write(root.join("b"), "b")?;
    fs::write(root.join("c"), "c")?;

    let lines = structure(&root, FilterConfig::default())?;
    assert_eq!(lines, vec!["└── proj", "    ├── A", "    ├── b", "    └── c"]);

    // Content sections follow the same order
    let output = temp_dir.path().join("out.txt");
    let text = run_to_string(&root, &output, FilterConfig::default())?;
    let b_at = text.find(&format!("Content of {}", root.join("b").display()));
    let c_at = text.find(&format!("Content of {}", root.join("c").display()));
    assert!(b_at.is_some() && b_at < c_at);
    Ok(())
}

#[test]
fn test_repeated_runs_are_identical_with_output_inside_root() -> Result<()> {
    let (_temp_dir, root) = setup_project()?;
    let output = root.join("dump.txt");
    let filters = FilterConfig::new([".git", "node_modules"], [""; 0], [""; 0]);

    let first = run_to_string(&root, &output, filters.clone())?;
    let second = run_to_string(&root, &output, filters)?;

    assert_eq!(first, second);
    assert!(!first.contains("── dump.txt"));
    assert!(!first.contains(&format!("Content of {}", output.display())));
    assert!(first.ends_with(&format!(
        "\nAnalysis complete. Results saved to {}\n",
        output.display()
    )));
    Ok(())
}

#[test]
fn test_glob_patterns_in_ignored_files() -> Result<()> {
    let (_temp_dir, root) = setup_project()?;
    let filters = FilterConfig::new([".git", "node_modules"], ["*.lock", "READ??.md"], [""; 0]);

    let lines = structure(&root, filters)?;
    assert!(!lines.iter().any(|line| line.contains("Cargo.lock")));
    assert!(!lines.iter().any(|line| line.contains("README.md")));
    assert!(lines.iter().any(|line| line.contains("main.py")));
    Ok(())
}

#[test]
fn test_report_totals() -> Result<()> {
    let (temp_dir, root) = setup_project()?;
    let output = temp_dir.path().join("out.txt");
    let filters = FilterConfig::new([".git", "node_modules"], ["Cargo.lock"], [".py"]);

    let report = ProjectAnalyzer::new(&root, &output, filters)?.run()?;

    // util.py and main.py are dumped, README.md is listed only
    assert_eq!(report.files_included, 2);
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.total_lines, 3);
    assert_eq!(report.skipped_by_reason().get("extension_not_allowed"), Some(&1));
    assert_eq!(report.report_lines, crate::utils::count_lines(&output)?);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_renders_no_access() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    let locked = root.join("locked");
    fs::create_dir_all(&locked)?;
    fs::write(locked.join("hidden.txt"), "hidden")?;
    fs::write(root.join("open.txt"), "open")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can still list the directory
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let output = temp_dir.path().join("out.txt");
    let result = ProjectAnalyzer::new(&root, &output, FilterConfig::default()).and_then(|a| a.run());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;
    let report = result?;

    let text = fs::read_to_string(&output)?;
    assert!(text.contains(&format!("    ├── locked\n    │   └── {}\n", NO_ACCESS)));
    assert!(text.contains("open"));
    assert!(!text.contains("hidden"));
    assert_eq!(report.unreadable_dirs.len(), 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlink_escaping_root_is_pruned() -> Result<()> {
    let temp_dir = tempdir()?;
    let base = fs::canonicalize(temp_dir.path())?;
    let root = base.join("proj");
    let outside = base.join("outside");
    fs::create_dir_all(&root)?;
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("secret.txt"), "top secret")?;
    fs::write(root.join("inside.txt"), "inside")?;

    std::os::unix::fs::symlink(&outside, root.join("escape_dir"))?;
    std::os::unix::fs::symlink(outside.join("secret.txt"), root.join("escape_file"))?;

    let lines = structure(&root, FilterConfig::default())?;
    assert_eq!(lines, vec!["└── proj", "    └── inside.txt"]);

    let output = base.join("out.txt");
    let text = run_to_string(&root, &output, FilterConfig::default())?;
    assert!(!text.contains("escape"));
    assert!(!text.contains("top secret"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_inside_root_is_not_descended() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    fs::create_dir_all(root.join("real"))?;
    fs::write(root.join("real").join("data.txt"), "data")?;
    std::os::unix::fs::symlink(root.join("real"), root.join("alias"))?;

    let lines = structure(&root, FilterConfig::default())?;
    assert_eq!(
        lines,
        vec!["└── proj", "    ├── alias", "    └── real", "        └── data.txt"]
    );

    let output = temp_dir.path().join("out.txt");
    let text = run_to_string(&root, &output, FilterConfig::default())?;
    assert_eq!(text.matches("Content of").count(), 1);
    Ok(())
}

#[test]
fn test_bracketed_route_names_are_excluded_literally() -> Result<()> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("app");
    fs::create_dir_all(root.join("[slug]"))?;
    fs::write(root.join("[slug]").join("page.tsx"), "export default function Page() {}\n")?;
    fs::write(root.join("[id].tsx"), "export const id = 1;\n")?;
    fs::write(root.join("layout.tsx"), "export const layout = 1;\n")?;

    let filters = FilterConfig::new(["[slug]"], ["[id].tsx"], [""; 0]);
    let lines = structure(&root, filters.clone())?;
    assert_eq!(lines, vec!["└── app", "    └── layout.tsx"]);

    let output = temp_dir.path().join("out.txt");
    let text = run_to_string(&root, &output, filters)?;
    assert!(!text.contains("page.tsx"));
    assert!(!text.contains("export const id"));
    assert!(text.contains("export const layout"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_gets_inline_error() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?.join("proj");
    fs::create_dir(&root)?;
    let locked = root.join("locked.txt");
    fs::write(&locked, "locked content")?;
    fs::write(root.join("open.txt"), "open content")?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

    // Privileged users can still read the file
    if fs::read(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
        return Ok(());
    }

    let output = temp_dir.path().join("out.txt");
    let result = ProjectAnalyzer::new(&root, &output, FilterConfig::default()).and_then(|a| a.run());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644))?;
    let report = result?;

    let text = fs::read_to_string(&output)?;
    assert!(text.contains(&format!("\nError reading {}: ", locked.display())));
    assert!(!text.contains(&format!("Content of {}", locked.display())));
    assert!(text.contains(&format!("Content of {}:\nopen content\n", root.join("open.txt").display())));
    assert!(!text.contains("locked content"));

    let problems: Vec<_> = report.problems().collect();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].0, locked.as_path());
    assert!(matches!(problems[0].1, SkipReason::Unreadable(_)));
    assert_eq!(report.files_included, 1);
    Ok(())
}
