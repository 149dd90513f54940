//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens on
//! channels, I/O, or an absolute deadline (`sleep_until`), never on a guessed
//! delay.
//! **Exceptions**: test code

use architectural_enforcement::{code_part, production_sources, report, Violation};

/// Whether a line of code calls a relative sleep
fn is_sleep_call(code: &str) -> bool {
    code.contains("thread::sleep(") || code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for file in production_sources() {
        for (idx, line) in file.lines.iter().enumerate() {
            if is_sleep_call(code_part(line)) {
                violations.push(Violation {
                    file: file.display_path(),
                    line: idx + 1,
                    message: line.trim().to_string(),
                });
            }
        }
    }

    report("Sleep calls found in production code", &violations);
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep_call("    tokio::time::sleep(Duration::from_millis(10)).await;"));
    assert!(is_sleep_call("std::thread::sleep(d);"));
    assert!(!is_sleep_call("tokio::time::sleep_until(deadline).await"));
    assert!(!is_sleep_call(code_part("let x = 1; // tokio::time::sleep(d)")));
}
