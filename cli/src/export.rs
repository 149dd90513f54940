//! Clipboard and download side effects
//!
//! The conductor only asks for these; the terminal surface carries them out.
//! Without a configured clipboard command, copied text is printed instead.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Where copied and downloaded replies go
#[derive(Clone, Debug)]
pub struct Exporter {
    download_dir: PathBuf,
    clipboard_command: Option<String>,
}

impl Exporter {
    /// Create an exporter
    pub fn new(download_dir: PathBuf, clipboard_command: Option<String>) -> Self {
        Self {
            download_dir,
            clipboard_command,
        }
    }

    /// Download directory
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Pipe `text` into the clipboard command
    ///
    /// Returns `false` when no command is configured and nothing was run.
    pub async fn copy(&self, text: &str) -> Result<bool> {
        let Some(command_line) = self.clipboard_command.as_deref() else {
            return Ok(false);
        };
        let mut parts = command_line.split_whitespace();
        let Some(program) = parts.next() else {
            return Ok(false);
        };

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to run clipboard command `{command_line}`"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("failed to write to clipboard command")?;
        }

        let status = child
            .wait()
            .await
            .context("clipboard command did not finish")?;
        if !status.success() {
            bail!("clipboard command `{command_line}` exited with {status}");
        }
        tracing::debug!(command = %command_line, bytes = text.len(), "Copied to clipboard");
        Ok(true)
    }

    /// Write `contents` to `file_name` inside the download directory
    pub async fn save(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .with_context(|| format!("failed to create {}", self.download_dir.display()))?;
        let path = self.download_dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "Saved reply");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_writes_into_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("out"), None);
        let path = exporter
            .save("generated_reply.txt", "Dear team,")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("out").join("generated_reply.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Dear team,");
    }

    #[tokio::test]
    async fn test_copy_without_command_does_nothing() {
        let exporter = Exporter::new(PathBuf::from("."), None);
        assert!(!exporter.copy("text").await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_reports_command_failure() {
        let ok = Exporter::new(PathBuf::from("."), Some("cat".into()));
        assert!(ok.copy("text").await.unwrap());

        let failing = Exporter::new(PathBuf::from("."), Some("false".into()));
        assert!(failing.copy("text").await.is_err());
    }
}
