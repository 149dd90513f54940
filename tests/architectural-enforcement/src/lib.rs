//! Architectural Enforcement Integration Tests
//!
//! Source-scanning checks that keep the codebase honest:
//! - No sleep() calls in production code (wait on I/O or deadlines instead)
//! - No blocking I/O inside async functions
//! - Session state is only transitioned by the conductor and workflow components
//! - The core crate stays free of terminal and GUI dependencies
//!
//! The scanning helpers live here so every test file shares one notion of
//! "production code": everything in a source file before its first
//! `#[cfg(test)]`, with line comments stripped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "cli/src"];

/// A scanned Rust source file
#[derive(Debug)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,
    /// Production lines (test module and beyond removed)
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Load a file, keeping only its production lines
    pub fn load(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            lines: production_lines(&content),
        })
    }

    /// Path relative to the workspace root, for readable reports
    pub fn display_path(&self) -> String {
        let root = workspace_root();
        self.path
            .strip_prefix(&root)
            .unwrap_or(&self.path)
            .display()
            .to_string()
    }
}

/// A rule violation at one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File, relative to the workspace root
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// What was found
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.file, self.line, self.message)
    }
}

/// Lines before the first `#[cfg(test)]`
pub fn production_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(str::to_string)
        .collect()
}

/// The code part of a line, without a trailing `//` comment
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Whether the nearest enclosing `fn` above `idx` is `async`
pub fn in_async_fn(lines: &[String], idx: usize) -> bool {
    for line in lines[..=idx].iter().rev() {
        let code = code_part(line);
        if code.contains("fn ") {
            return code.contains("async fn ");
        }
        if code.contains("async move {") || code.contains("async {") {
            return true;
        }
    }
    false
}

/// Every production `.rs` file under the workspace's production directories
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();
    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
                if let Some(file) = SourceFile::load(entry.path()) {
                    files.push(file);
                }
            }
        }
    }
    files
}

/// Print violations and panic if there are any
pub fn report(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!(
        "\nFound {} violation(s) of: {rule}\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests { fn b() {} }\n";
        assert_eq!(production_lines(content), vec!["fn a() {}".to_string()]);
    }

    #[test]
    fn test_code_part_strips_comment() {
        assert_eq!(code_part("let x = 1; // std::fs::read"), "let x = 1; ");
    }

    #[test]
    fn test_async_detection() {
        let src = lines(&[
            "fn sync_fn() {",
            "    std::fs::read_to_string(p);",
            "}",
            "pub async fn load() {",
            "    std::fs::read_to_string(p);",
            "}",
        ]);
        assert!(!in_async_fn(&src, 1));
        assert!(in_async_fn(&src, 4));
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
        assert!(workspace_root().join("conductor/core/src/lib.rs").exists());
    }
}
