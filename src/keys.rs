//! Key tokens: the grammar of non-directive script lines and the mapping
//! from tmux-style key names to the bytes a terminal expects.
//!
//! A key line is split on whitespace. Each token is either a named key
//! (`Enter`, `C-c`, `M-Left`, ...) or literal text that is typed as-is.
//! A token may carry a timing override, `key@MS`, replacing the default
//! inter-key delay for that key only.

/// One key (or literal text) to send, with an optional per-key delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub delay_ms: Option<u64>,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            delay_ms: None,
        }
    }

    pub fn with_delay(key: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            key: key.into(),
            delay_ms: Some(delay_ms),
        }
    }

    /// Bytes to write to the terminal for this key.
    pub fn bytes(&self) -> Vec<u8> {
        encode(&self.key)
    }
}

/// Parse a key line into presses.
///
/// Every token is checked; all token errors on the line are returned
/// together. A line of exactly `<named key> <count>` repeats the key.
pub fn parse_key_line(text: &str) -> Result<Vec<KeyPress>, Vec<String>> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    if let [key, count] = tokens.as_slice() {
        if is_named(key) && count.bytes().all(|b| b.is_ascii_digit()) {
            return match count.parse::<usize>() {
                Ok(0) => Err(vec![format!("repeat count for '{key}' must be positive")]),
                Ok(n) => Ok(vec![KeyPress::new(*key); n]),
                Err(_) => Err(vec![format!("repeat count '{count}' is out of range")]),
            };
        }
    }

    let mut presses = Vec::with_capacity(tokens.len());
    let mut errors = Vec::new();
    for token in tokens {
        match parse_token(token) {
            Ok(press) => presses.push(press),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(presses)
    } else {
        Err(errors)
    }
}

/// Parse a single key token, handling the `key@MS` timing suffix.
pub fn parse_token(token: &str) -> Result<KeyPress, String> {
    if is_modifier_at(token) {
        return Ok(KeyPress::new(token));
    }
    let Some((name, suffix)) = token.rsplit_once('@') else {
        return Ok(KeyPress::new(token));
    };
    if name.is_empty() {
        return Err(format!("missing key before '@' in '{token}'"));
    }
    if name.contains('@') && !is_modifier_at(name) {
        return Err(format!("unexpected '@' in key '{token}'"));
    }
    if suffix.is_empty() {
        return Err(format!("missing delay after '@' in '{token}'"));
    }
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!(
            "invalid key delay '{suffix}' in '{token}': expected positive milliseconds"
        ));
    }
    match suffix.parse::<u64>() {
        Ok(0) => Err(format!("key delay in '{token}' must be positive")),
        Ok(ms) => Ok(KeyPress::with_delay(name, ms)),
        Err(_) => Err(format!("key delay '{suffix}' in '{token}' is out of range")),
    }
}

fn strip_modifiers(mut key: &str) -> (&str, bool) {
    let mut any = false;
    while let Some(rest) = key
        .strip_prefix("C-")
        .or_else(|| key.strip_prefix("M-"))
        .or_else(|| key.strip_prefix("S-"))
    {
        if rest.is_empty() {
            break;
        }
        key = rest;
        any = true;
    }
    (key, any)
}

/// `C-@`, `M-@`, `C-M-@`: modifier forms whose key is `@` itself.
fn is_modifier_at(token: &str) -> bool {
    matches!(strip_modifiers(token), ("@", true))
}

fn named_sequence(key: &str) -> Option<&'static [u8]> {
    let seq: &'static [u8] = match key {
        "Enter" => b"\r",
        "Tab" => b"\t",
        "BTab" => b"\x1b[Z",
        "BSpace" => b"\x7f",
        "Escape" => b"\x1b",
        "Space" => b" ",
        "Up" => b"\x1b[A",
        "Down" => b"\x1b[B",
        "Right" => b"\x1b[C",
        "Left" => b"\x1b[D",
        "Home" => b"\x1b[H",
        "End" => b"\x1b[F",
        "PPage" | "PageUp" => b"\x1b[5~",
        "NPage" | "PageDown" => b"\x1b[6~",
        "IC" | "Insert" => b"\x1b[2~",
        "DC" | "Delete" => b"\x1b[3~",
        "F1" => b"\x1bOP",
        "F2" => b"\x1bOQ",
        "F3" => b"\x1bOR",
        "F4" => b"\x1bOS",
        "F5" => b"\x1b[15~",
        "F6" => b"\x1b[17~",
        "F7" => b"\x1b[18~",
        "F8" => b"\x1b[19~",
        "F9" => b"\x1b[20~",
        "F10" => b"\x1b[21~",
        "F11" => b"\x1b[23~",
        "F12" => b"\x1b[24~",
        "S-Up" => b"\x1b[1;2A",
        "S-Down" => b"\x1b[1;2B",
        "S-Right" => b"\x1b[1;2C",
        "S-Left" => b"\x1b[1;2D",
        "M-Up" => b"\x1b[1;3A",
        "M-Down" => b"\x1b[1;3B",
        "M-Right" => b"\x1b[1;3C",
        "M-Left" => b"\x1b[1;3D",
        "C-Up" => b"\x1b[1;5A",
        "C-Down" => b"\x1b[1;5B",
        "C-Right" => b"\x1b[1;5C",
        "C-Left" => b"\x1b[1;5D",
        _ => return None,
    };
    Some(seq)
}

fn control_byte(ch: char) -> Option<u8> {
    match ch {
        'a'..='z' => Some(ch as u8 - b'a' + 1),
        'A'..='Z' => Some(ch as u8 - b'A' + 1),
        '@' | ' ' | '2' => Some(0),
        '[' | '3' => Some(0x1b),
        '\\' | '4' => Some(0x1c),
        ']' | '5' => Some(0x1d),
        '^' | '6' => Some(0x1e),
        '_' | '7' => Some(0x1f),
        '?' | '8' => Some(0x7f),
        _ => None,
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Whether `key` names a special key rather than literal text.
pub fn is_named(key: &str) -> bool {
    if named_sequence(key).is_some() {
        return true;
    }
    if let Some(rest) = key.strip_prefix("C-") {
        return rest == "Space"
            || single_char(rest).is_some_and(|c| control_byte(c).is_some())
            || rest.strip_prefix("M-").is_some_and(is_named_meta_target);
    }
    if let Some(rest) = key.strip_prefix("M-") {
        return is_named_meta_target(rest);
    }
    false
}

fn is_named_meta_target(rest: &str) -> bool {
    single_char(rest).is_some() || is_named(rest)
}

/// Encode a key name (or literal text) into terminal input bytes.
pub fn encode(key: &str) -> Vec<u8> {
    if let Some(seq) = named_sequence(key) {
        return seq.to_vec();
    }
    if let Some(rest) = key.strip_prefix("C-") {
        if rest == "Space" {
            return vec![0];
        }
        if let Some(byte) = single_char(rest).and_then(control_byte) {
            return vec![byte];
        }
        if let Some(meta) = rest.strip_prefix("M-").filter(|m| is_named_meta_target(m)) {
            let mut out = vec![0x1b];
            out.extend(encode(&format!("C-{meta}")));
            return out;
        }
    }
    if let Some(rest) = key.strip_prefix("M-").filter(|r| is_named_meta_target(r)) {
        let mut out = vec![0x1b];
        out.extend(encode(rest));
        return out;
    }
    key.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_tokens() {
        let presses = parse_key_line("echo hello Enter").unwrap();
        assert_eq!(
            presses,
            vec![
                KeyPress::new("echo"),
                KeyPress::new("hello"),
                KeyPress::new("Enter")
            ]
        );
    }

    #[test]
    fn test_parse_timing_override() {
        assert_eq!(parse_token("Enter@250"), Ok(KeyPress::with_delay("Enter", 250)));
        assert_eq!(parse_token("C-@"), Ok(KeyPress::new("C-@")));
        assert_eq!(parse_token("C-@@40"), Ok(KeyPress::with_delay("C-@", 40)));
        assert_eq!(parse_token("C-M-@"), Ok(KeyPress::new("C-M-@")));
    }

    #[test]
    fn test_parse_timing_errors() {
        assert!(parse_token("Enter@").unwrap_err().contains("missing delay"));
        assert!(parse_token("Enter@abc").unwrap_err().contains("invalid key delay"));
        assert!(parse_token("Enter@0").unwrap_err().contains("must be positive"));
        assert!(parse_token("@100").unwrap_err().contains("missing key"));
        assert!(parse_token("a@b@10").unwrap_err().contains("unexpected '@'"));
    }

    #[test]
    fn test_line_collects_every_token_error() {
        let errors = parse_key_line("ok Enter@ Tab@x").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_named_key_with_count_repeats() {
        assert_eq!(parse_key_line("Up 3").unwrap(), vec![KeyPress::new("Up"); 3]);
        assert!(parse_key_line("Up 0").is_err());
        assert_eq!(
            parse_key_line("echo 3").unwrap(),
            vec![KeyPress::new("echo"), KeyPress::new("3")]
        );
    }

    #[test]
    fn test_encode_named_keys() {
        assert_eq!(encode("Enter"), b"\r");
        assert_eq!(encode("BSpace"), b"\x7f");
        assert_eq!(encode("Up"), b"\x1b[A");
        assert_eq!(encode("C-Left"), b"\x1b[1;5D");
        assert_eq!(encode("F5"), b"\x1b[15~");
    }

    #[test]
    fn test_encode_modifiers() {
        assert_eq!(encode("C-c"), vec![0x03]);
        assert_eq!(encode("C-@"), vec![0x00]);
        assert_eq!(encode("C-["), vec![0x1b]);
        assert_eq!(encode("M-x"), b"\x1bx");
        assert_eq!(encode("C-M-a"), vec![0x1b, 0x01]);
        assert_eq!(encode("M-Enter"), b"\x1b\r");
    }

    #[test]
    fn test_encode_literal_text() {
        assert_eq!(encode("ls"), b"ls");
        assert_eq!(encode("C-"), b"C-");
        assert!(!is_named("hello"));
        assert!(is_named("C-d"));
        assert!(is_named("M-."));
    }
}
