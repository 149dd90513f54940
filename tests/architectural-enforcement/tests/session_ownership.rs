//! Integration Test: Session Ownership
//!
//! **Policy**: the session record has one owner. Only the conductor and the
//! workflow components may call `SessionState` transitions; everything else
//! reads snapshots. The core crate must not depend on a terminal or GUI
//! toolkit.

use std::fs;

use architectural_enforcement::{code_part, production_sources, report, workspace_root, Violation};

/// `SessionState` methods that change the session
const TRANSITIONS: &[&str] = &[
    ".accept_upload(",
    ".remove_upload(",
    ".record_preview(",
    ".replace_summary(",
    ".replace_reply(",
    ".append_turn(",
    ".set_tone(",
    ".set_strategy(",
    ".set_followup_prompt(",
    ".begin_action(",
    ".restart_preview(",
    ".finish_action(",
    ".abandon_action(",
    ".expire_feedback(",
];

/// Files allowed to drive transitions
fn may_transition(path: &std::path::Path) -> bool {
    path.ends_with("conductor/core/src/session.rs")
        || path.ends_with("conductor/core/src/conductor.rs")
        || path
            .parent()
            .is_some_and(|dir| dir.ends_with("conductor/core/src/workflow"))
}

#[test]
fn test_session_transitions_only_from_owner() {
    let mut violations = Vec::new();

    for file in production_sources() {
        if may_transition(&file.path) {
            continue;
        }
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            if let Some(call) = TRANSITIONS.iter().find(|t| code.contains(*t)) {
                violations.push(Violation {
                    file: file.display_path(),
                    line: idx + 1,
                    message: format!("session transition {call} outside its owner"),
                });
            }
        }
    }

    report("Session state mutated outside the conductor", &violations);
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let manifest = workspace_root().join("conductor/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).expect("core manifest readable");

    let forbidden = ["ratatui", "crossterm", "termion", "egui", "gtk"];
    let found: Vec<&str> = forbidden
        .iter()
        .copied()
        .filter(|dep| {
            content.lines().any(|line| {
                line.trim_start()
                    .split(|c: char| c == '=' || c.is_whitespace())
                    .next()
                    == Some(*dep)
            })
        })
        .collect();

    assert!(
        found.is_empty(),
        "replydesk-core must stay UI-agnostic, found: {found:?}"
    );
}

#[test]
fn test_owner_detection() {
    let root = workspace_root();
    assert!(may_transition(&root.join("conductor/core/src/workflow/reply.rs")));
    assert!(may_transition(&root.join("conductor/core/src/conductor.rs")));
    assert!(!may_transition(&root.join("conductor/core/src/messages.rs")));
    assert!(!may_transition(&root.join("cli/src/main.rs")));
}
