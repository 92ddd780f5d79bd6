//! Pasteboard and clipboard capabilities.
//!
//! Each capability has a live implementation backed by a helper process and
//! an override implementation fed from a workflow variable. Alfred passes
//! `PBOARD_TYPES` and `CLIPBOARD` back in on reruns, so the helpers only run
//! once per session.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::infrastructure::traits::{ClipboardReader, CommandRunner, PasteboardInspector};

/// Separator of the `PBOARD_TYPES` workflow variable.
pub const TYPES_SEPARATOR: char = '|';

/// Pasteboard types from a pre-computed, pipe-delimited list.
#[derive(Debug, Clone)]
pub struct EnvPasteboardInspector {
    value: String,
}

impl EnvPasteboardInspector {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl PasteboardInspector for EnvPasteboardInspector {
    fn types(&self) -> io::Result<Vec<String>> {
        Ok(split_types(&self.value))
    }
}

/// Split a `PBOARD_TYPES` value, dropping empty segments.
pub fn split_types(value: &str) -> Vec<String> {
    value
        .split(TYPES_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Pasteboard types from a helper that prints a JSON array of strings.
pub struct HelperPasteboardInspector {
    cmd: Arc<dyn CommandRunner>,
    helper: PathBuf,
    timeout: Duration,
}

impl HelperPasteboardInspector {
    pub fn new(cmd: Arc<dyn CommandRunner>, helper: PathBuf, timeout: Duration) -> Self {
        Self {
            cmd,
            helper,
            timeout,
        }
    }
}

impl PasteboardInspector for HelperPasteboardInspector {
    fn types(&self) -> io::Result<Vec<String>> {
        let helper = self.helper.to_string_lossy();
        debug!("types: running {}", helper);
        let output = self.cmd.run_with_timeout(&helper, &[], self.timeout)?;
        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "exit status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        let mut types: Vec<String> = serde_json::from_slice(&output.stdout)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        dedup_in_order(&mut types);
        Ok(types)
    }
}

fn dedup_in_order(types: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    types.retain(|t| seen.insert(t.clone()));
}

/// Clipboard text from a pre-computed value.
#[derive(Debug, Clone)]
pub struct EnvClipboardReader {
    value: String,
}

impl EnvClipboardReader {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl ClipboardReader for EnvClipboardReader {
    fn text(&self) -> io::Result<String> {
        Ok(self.value.clone())
    }
}

/// Clipboard text from `pbpaste` (or any command printing the text).
pub struct CommandClipboardReader {
    cmd: Arc<dyn CommandRunner>,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClipboardReader {
    pub fn new(
        cmd: Arc<dyn CommandRunner>,
        program: impl Into<String>,
        args: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            cmd,
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl ClipboardReader for CommandClipboardReader {
    fn text(&self) -> io::Result<String> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        debug!("text: running {} {:?}", self.program, args);
        let output = self.cmd.run_with_timeout(&self.program, &args, self.timeout)?;
        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", self.program, output.status),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
