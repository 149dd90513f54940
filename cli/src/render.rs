//! Snapshot rendering
//!
//! The conductor publishes a full snapshot after every event. Printing each
//! one would flood the terminal, so [`Renderer`] remembers the last snapshot
//! and reports only what changed.

use std::fmt::Write as _;

use replydesk_core::{SessionSnapshot, Slot};

fn file_line(snapshot: &SessionSnapshot, slot: Slot) -> String {
    match snapshot.file(slot) {
        Some(file) => format!(
            "{}: {} ({} bytes, {})",
            slot.label(),
            file.name,
            file.size,
            file.mime_type
        ),
        None => format!("{}: none", slot.label()),
    }
}

fn block(title: &str, body: &str) -> String {
    format!("--- {title} ---\n{body}")
}

/// Diffing renderer
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<SessionSnapshot>,
}

impl Renderer {
    /// Create a renderer that has seen nothing yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot, returning the lines worth printing
    pub fn update(&mut self, snapshot: SessionSnapshot) -> Vec<String> {
        let mut out = Vec::new();
        let Some(prev) = self.last.as_ref() else {
            out.push(format!("Session {} ready. Type `help` for commands.", snapshot.session_id.0));
            self.last = Some(snapshot);
            return out;
        };

        if snapshot.epoch != prev.epoch {
            out.push("Session reset.".to_string());
        }

        for slot in Slot::ALL {
            if snapshot.file(slot) != prev.file(slot) {
                out.push(file_line(&snapshot, slot));
            }
            if let Some(text) = snapshot.preview(slot) {
                if prev.preview(slot) != Some(text) {
                    out.push(block(&format!("{} preview", slot.label()), text));
                }
            }
        }

        if snapshot.settings != prev.settings {
            out.push(format!(
                "Tone: {}, Strategy: {}",
                snapshot.settings.tone, snapshot.settings.strategy
            ));
        }

        for kind in &snapshot.busy {
            if !prev.busy.contains(kind) {
                out.push(kind.busy_label().to_string());
            }
        }

        if let Some(summary) = snapshot.summary.as_deref() {
            if prev.summary.as_deref() != Some(summary) {
                out.push(block("Summary", summary));
            }
        }

        if snapshot.history.len() > prev.history.len() {
            for turn in &snapshot.history[prev.history.len()..] {
                out.push(format!("You: {}", turn.user_prompt()));
            }
        }

        if let Some(reply) = snapshot.active_reply.as_deref() {
            if prev.active_reply.as_deref() != Some(reply) {
                out.push(block("Reply", reply));
            }
        }

        if let Some(feedback) = snapshot.feedback.as_deref() {
            if prev.feedback.as_deref() != Some(feedback) {
                out.push(format!(">> {feedback}"));
            }
        }

        self.last = Some(snapshot);
        out
    }
}

/// Render a whole snapshot for `show`
#[must_use]
pub fn full(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session {} (epoch {})", snapshot.session_id.0, snapshot.epoch);
    for slot in Slot::ALL {
        let _ = writeln!(out, "{}", file_line(snapshot, slot));
        if let Some(text) = snapshot.preview(slot) {
            let _ = writeln!(out, "{}", block(&format!("{} preview", slot.label()), text));
        }
    }
    let _ = writeln!(
        out,
        "Tone: {}, Strategy: {}",
        snapshot.settings.tone, snapshot.settings.strategy
    );
    if let Some(summary) = snapshot.summary.as_deref() {
        let _ = writeln!(out, "{}", block("Summary", summary));
    }
    if let Some(reply) = snapshot.active_reply.as_deref() {
        let _ = writeln!(out, "{}", block("Reply", reply));
    }
    for (i, turn) in snapshot.history.iter().enumerate() {
        let _ = writeln!(out, "[{}] You: {}", i + 1, turn.user_prompt());
        let _ = writeln!(out, "[{}] Bot: {}", i + 1, turn.bot_reply());
    }
    if !snapshot.followup_prompt.is_empty() {
        let _ = writeln!(out, "Prompt: {}", snapshot.followup_prompt);
    }
    for kind in &snapshot.busy {
        let _ = writeln!(out, "{}", kind.busy_label());
    }
    let c = &snapshot.controls;
    let _ = write!(
        out,
        "Controls: generate={} summarize={} followup={} copy={} download={}",
        c.generate, c.summarize, c.followup, c.copy, c.download
    );
    out
}
