//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions MUST NOT use blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::process`, `tokio::io` inside async code.
//! **Acceptable**: blocking calls in plain `fn`s (config loading before the
//! session starts, logging setup) and in test code.

use architectural_enforcement::{code_part, in_async_fn, production_sources, report, Violation};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("reqwest::blocking", "Blocking HTTP client"),
    ("std::io::stdin()", "Blocking stdin"),
];

fn blocking_call(code: &str) -> Option<&'static str> {
    FORBIDDEN
        .iter()
        .find(|(needle, _)| code.contains(needle))
        .map(|(_, what)| *what)
}

#[test]
fn test_no_blocking_io_in_async_code() {
    let mut violations = Vec::new();

    for file in production_sources() {
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            if code.trim_start().starts_with("use ") {
                continue;
            }
            if let Some(what) = blocking_call(code) {
                if in_async_fn(&file.lines, idx) {
                    violations.push(Violation {
                        file: file.display_path(),
                        line: idx + 1,
                        message: format!("{what}: {}", line.trim()),
                    });
                }
            }
        }
    }

    report("Blocking I/O found in async code", &violations);
}

#[test]
fn test_no_blocking_http_client_anywhere() {
    let mut violations = Vec::new();

    for file in production_sources() {
        for (idx, line) in file.lines.iter().enumerate() {
            if code_part(line).contains("reqwest::blocking") {
                violations.push(Violation {
                    file: file.display_path(),
                    line: idx + 1,
                    message: line.trim().to_string(),
                });
            }
        }
    }

    report("Blocking HTTP client used", &violations);
}

#[test]
fn test_blocking_detection() {
    assert_eq!(
        blocking_call("let s = std::fs::read_to_string(p)?;"),
        Some("Blocking file I/O")
    );
    assert_eq!(blocking_call("tokio::fs::read(p).await?"), None);
    assert_eq!(
        blocking_call("std::process::Command::new(\"xclip\")"),
        Some("Blocking process I/O")
    );
}
