//! Copy-to-clipboard capability

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use std::fmt;
use std::io::{IsTerminal, Write};
use std::process::{Command, Stdio};
use tracing::debug;

/// Places text on the user's clipboard
pub trait Clipboard: Send + Sync + fmt::Debug {
    /// Copy `text`; returns whether it landed on the clipboard
    fn copy_text(&self, text: &str) -> bool;
}

/// Clipboard utilities tried in order, with their arguments
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip.exe", &[]),
];

/// Platform clipboard
///
/// Tries the platform's clipboard utilities first and falls back to an
/// OSC 52 escape sequence when stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct SystemClipboard {
    commands: &'static [(&'static str, &'static [&'static str])],
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self {
            commands: CLIPBOARD_COMMANDS,
        }
    }
}

impl SystemClipboard {
    /// Clipboard using the default utility list
    pub fn new() -> Self {
        Self::default()
    }

    fn pipe_to(program: &str, args: &[&str], text: &str) -> bool {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            return false;
        };

        let written = child
            .stdin
            .take()
            .is_some_and(|mut stdin| stdin.write_all(text.as_bytes()).is_ok());
        let exited = child.wait().is_ok_and(|status| status.success());
        debug!(program, written, exited, "clipboard utility finished");
        written && exited
    }

    fn osc52(text: &str) -> bool {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return false;
        }
        let sequence = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
        stdout
            .write_all(sequence.as_bytes())
            .and_then(|()| stdout.flush())
            .is_ok()
    }
}

impl Clipboard for SystemClipboard {
    fn copy_text(&self, text: &str) -> bool {
        self.commands
            .iter()
            .any(|(program, args)| Self::pipe_to(program, args, text))
            || Self::osc52(text)
    }
}

/// In-memory clipboard, optionally failing every copy
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    fail: bool,
}

impl MemoryClipboard {
    /// Clipboard that accepts every copy
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard that rejects every copy
    pub fn failing() -> Self {
        Self {
            contents: Mutex::new(None),
            fail: true,
        }
    }

    /// Last copied text
    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn copy_text(&self, text: &str) -> bool {
        if self.fail {
            return false;
        }
        *self.contents.lock() = Some(text.to_string());
        true
    }
}
