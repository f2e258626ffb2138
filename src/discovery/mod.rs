//! Locating maps, rule files, and the wrapped executables.
//!
//! Map collection mirrors what the menu prompts accept: nothing (current
//! directory), a directory, a trailing-`*` prefix wildcard, or a single
//! file. Executable discovery backs the first-run configuration: PATH
//! first, then a file-system sweep of platform search roots.

use std::env;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, RipkitError};

/// Kinds of files the CLI dispatches on by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A compiled map (`.bsp`).
    Map,
    /// An extracted entity list (`.ent`).
    EntityList,
    /// A lazyripent rule file (`.rule`).
    Rule,
}

/// Detect the file kind from a path extension.
pub fn detect_file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("bsp") {
        Some(FileKind::Map)
    } else if ext.eq_ignore_ascii_case("ent") {
        Some(FileKind::EntityList)
    } else if ext.eq_ignore_ascii_case("rule") {
        Some(FileKind::Rule)
    } else {
        None
    }
}

fn is_map(path: &Path) -> bool {
    detect_file_kind(path) == Some(FileKind::Map)
}

/// Collect the maps an operation should run over.
///
/// - empty input: every `.bsp` in the current directory
/// - a directory: every `.bsp` directly inside it
/// - a trailing `*`: every `.bsp` in the parent whose name starts with
///   the prefix
/// - anything else: that single file
pub fn collect_maps(input: &str) -> Result<Vec<PathBuf>> {
    let input = input.trim();

    if input.is_empty() {
        return maps_in(Path::new("."));
    }

    let path = Path::new(input);
    if path.is_dir() {
        return maps_in(path);
    }

    if let Some(prefix) = input.strip_suffix('*') {
        let prefix_path = Path::new(prefix);
        let dir = match prefix_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name_prefix = prefix_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut maps = Vec::new();
        for entry in read_dir_sorted(&dir)? {
            let name = entry.file_name().map(|n| n.to_string_lossy().into_owned());
            if let Some(name) = name {
                if name.starts_with(&name_prefix) && is_map(&entry) {
                    maps.push(entry);
                }
            }
        }
        return Ok(maps);
    }

    Ok(vec![path.to_path_buf()])
}

fn maps_in(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| is_map(p))
        .collect())
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| RipkitError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Collect every `.rule` file under a directory, recursively,
/// deduplicated and in stable order.
pub fn collect_rules(root: &Path) -> Vec<PathBuf> {
    let mut rules: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| detect_file_kind(p) == Some(FileKind::Rule))
        .collect();
    rules.sort();
    rules.dedup();
    rules
}

/// Find the first of the candidate executable names: on PATH, then by
/// sweeping the platform search roots.
pub fn find_executable(names: &[&str]) -> Option<PathBuf> {
    for name in names {
        if let Some(found) = find_on_path(name) {
            return Some(found);
        }
    }

    for root in search_roots() {
        if let Some(found) = find_on_roots(&root, names) {
            return Some(found);
        }
    }

    None
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn find_on_roots(root: &Path, names: &[&str]) -> Option<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .find(|e| {
            let file_name = e.file_name().to_string_lossy();
            names.iter().any(|n| file_name.eq_ignore_ascii_case(n))
        })
        .map(|e| e.into_path())
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy().to_lowercase();
    name == "$recycle.bin" || name == "recycler" || name == ".git" || name == "node_modules"
}

/// Roots swept when the executables are not on PATH.
#[cfg(windows)]
fn search_roots() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|d| PathBuf::from(format!("{}:\\", d)))
        .filter(|p| p.exists())
        .collect()
}

#[cfg(not(windows))]
fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home);
    }
    for candidate in ["/opt", "/usr/local/games", "/usr/local/bin"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            roots.push(path);
        }
    }
    roots
}
