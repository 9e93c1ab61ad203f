//! Sanitizer for raw interpreter output.
//!
//! Output from an untrusted process can carry colour codes, cursor movement
//! and terminal hyperlinks. None of that means anything once the text is
//! shown in a chat message, so it is removed before the text leaves the
//! runner.

use regex::Regex;

/// Strips ANSI/terminal control sequences from text.
pub struct Sanitizer {
    patterns: Vec<EscapePattern>,
}

struct EscapePattern {
    name: &'static str,
    regex: Regex,
}

impl Sanitizer {
    /// Create a sanitizer with the built-in pattern set.
    pub fn new() -> Self {
        let patterns = vec![
            // OSC strings terminated by ST, e.g. OSC 8 hyperlinks. Must run
            // before the general pattern, which only knows BEL terminators.
            EscapePattern {
                name: "osc_st",
                regex: Regex::new(r"\x1B\][^\x07\x1B]*(?:\x07|\x1B\\)")
                    .expect("osc pattern is a valid regex"),
            },
            // CSI / OSC-BEL / single-character escapes.
            EscapePattern {
                name: "ansi",
                regex: Regex::new(concat!(
                    r"[\x1B\x{9B}][\[\]()#;?]*(?:",
                    r"(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)",
                    r"|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
                ))
                .expect("ansi pattern is a valid regex"),
            },
        ];

        Self { patterns }
    }

    /// Remove every escape sequence from `raw`.
    ///
    /// Removing one sequence can splice its neighbours into a new one
    /// (`"\x1B" + "\x1B[1m" + "[2m"`), so patterns are applied until nothing
    /// matches. Each pass strictly shrinks the text, which bounds the loop.
    pub fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();

        loop {
            let mut changed = false;
            for pattern in &self.patterns {
                if pattern.regex.is_match(&text) {
                    tracing::trace!(pattern = pattern.name, "stripping escape sequences");
                    text = pattern.regex.replace_all(&text, "").into_owned();
                    changed = true;
                }
            }
            if !changed {
                return text;
            }
        }
    }

    /// Clean, trim and normalize line endings of one captured stream.
    pub fn clean_stream(&self, raw: &str) -> String {
        normalize_line_endings(self.clean(raw).trim())
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite `\r\n` to `\n`. Lone `\r` is left alone.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}
