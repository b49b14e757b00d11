//! A rolling text buffer standing in for the terminal's visible screen.
//!
//! This is not an emulator: cursor movement is kept as raw escape
//! sequences. Clearing the screen drops everything before the clear, and
//! a carriage return inside a line keeps only what was written after it.

use regex::Regex;
use std::sync::LazyLock;

/// Bytes of history kept before the oldest half is discarded.
const MAX_BUFFER: usize = 64 * 1024;

const CLEAR_SEQUENCES: [&str; 3] = ["\x1b[2J", "\x1b[3J", "\x1bc"];

// CSI, OSC and two-byte escape sequences.
#[allow(clippy::expect_used)]
static ANSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("constant regex pattern is valid")
});

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_PATTERN.replace_all(text, "").into_owned()
}

#[derive(Debug, Default)]
pub struct Screen {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
        let bytes = std::mem::take(&mut self.pending);
        let keep_from = match std::str::from_utf8(&bytes) {
            Ok(text) => {
                self.buffer.push_str(text);
                bytes.len()
            }
            Err(e) if e.error_len().is_none() => {
                // Split multi-byte character; wait for the rest.
                self.buffer
                    .push_str(&String::from_utf8_lossy(&bytes[..e.valid_up_to()]));
                e.valid_up_to()
            }
            Err(_) => {
                self.buffer.push_str(&String::from_utf8_lossy(&bytes));
                bytes.len()
            }
        };
        self.pending = bytes[keep_from..].to_vec();

        let cleared = CLEAR_SEQUENCES
            .iter()
            .filter_map(|seq| self.buffer.rfind(seq).map(|idx| idx + seq.len()))
            .max();
        if let Some(end) = cleared {
            self.buffer.drain(..end);
        }
        self.trim();
    }

    fn trim(&mut self) {
        if self.buffer.len() <= MAX_BUFFER {
            return;
        }
        let mut cut = self.buffer.len() - MAX_BUFFER / 2;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        // Prefer to cut at a line start.
        if let Some(newline) = self.buffer[cut..].find('\n') {
            cut += newline + 1;
        }
        self.buffer.drain(..cut);
    }

    /// The last `rows` lines, escape sequences included.
    pub fn visible(&self, rows: u16) -> String {
        let lines: Vec<&str> = self
            .buffer
            .split('\n')
            .map(|line| {
                let line = line.trim_end_matches('\r');
                line.rsplit('\r').next().unwrap_or(line)
            })
            .collect();
        let start = lines.len().saturating_sub(usize::from(rows));
        lines[start..].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_keeps_last_rows() {
        let mut screen = Screen::new();
        screen.feed(b"one\r\ntwo\r\nthree\r\nfour");
        assert_eq!(screen.visible(2), "three\nfour");
        assert_eq!(screen.visible(10), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_clear_screen_drops_history() {
        let mut screen = Screen::new();
        screen.feed(b"old output\n\x1b[H\x1b[2Jfresh");
        assert_eq!(screen.visible(24), "fresh");
    }

    #[test]
    fn test_carriage_return_overwrites_line() {
        let mut screen = Screen::new();
        screen.feed(b"progress 10%\rprogress 90%\n$ ");
        assert_eq!(screen.visible(24), "progress 90%\n$ ");
    }

    #[test]
    fn test_split_utf8_sequence_is_reassembled() {
        let mut screen = Screen::new();
        let text = "caf\u{e9}".as_bytes();
        screen.feed(&text[..4]);
        screen.feed(&text[4..]);
        assert_eq!(screen.visible(1), "caf\u{e9}");
    }

    #[test]
    fn test_trim_respects_char_boundaries() {
        let mut screen = Screen::new();
        let line = "\u{2588}".repeat(100) + "\n";
        for _ in 0..400 {
            screen.feed(line.as_bytes());
        }
        assert!(screen.buffer.len() <= MAX_BUFFER);
        assert!(screen.visible(1).is_empty());
        assert_eq!(screen.visible(2).chars().count(), 100 + 1);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("\x1b]0;title\x07$ "), "$ ");
    }
}
