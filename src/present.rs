//! Rendering of run results as chat messages.
//!
//! ````text
//! [**Executed in `12.34ms`**](<https://discord.com/channels/1/2/3>) (Last run: <t:1700000000>)
//! **Exit Code:** 0
//! **Stdout:**
//! ```
//! hi
//! ```
//! ````

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::sandbox::RunResult;

/// Default cap on a rendered message, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 2000;

/// Base URL for message links.
pub const DEFAULT_LINK_BASE: &str = "https://discord.com/channels";

const TRUNCATION_MARKER: char = '…';

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"channels/(\d+|@me)/(\d+)/(\d+)>").expect("link pattern is a valid regex")
});

/// Location of the message a snippet came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLink {
    /// Guild (server) id, `None` for direct messages.
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub message_id: String,
}

impl MessageLink {
    /// Create a link to a message in a direct-message channel.
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            guild_id: None,
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    /// Set the guild id.
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Absolute URL of the message under `base`.
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            base.trim_end_matches('/'),
            self.guild_id.as_deref().unwrap_or("@me"),
            self.channel_id,
            self.message_id
        )
    }

    /// Recover the source message link from a previously rendered result,
    /// e.g. to run the original snippet again.
    pub fn find_in(content: &str) -> Option<Self> {
        let captures = LINK_PATTERN.captures(content)?;
        let guild = captures.get(1)?.as_str();

        Some(Self {
            guild_id: (guild != "@me").then(|| guild.to_string()),
            channel_id: captures.get(2)?.as_str().to_string(),
            message_id: captures.get(3)?.as_str().to_string(),
        })
    }
}

/// Parses `<guild|@me>/<channel>/<message>`, optionally as the tail of a
/// full message URL.
impl FromStr for MessageLink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().trim_end_matches('/').rsplit('/').take(3).collect();
        let [message, channel, guild] = segments[..] else {
            return Err(format!("'{}' is not a <guild|@me>/<channel>/<message> link", s));
        };

        let is_id = |v: &str| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit());
        if !is_id(channel) || !is_id(message) || !(guild == "@me" || is_id(guild)) {
            return Err(format!("'{}' is not a <guild|@me>/<channel>/<message> link", s));
        }

        let link = Self::new(channel, message);
        Ok(if guild == "@me" { link } else { link.in_guild(guild) })
    }
}

/// A rendered result plus the affordances the host should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub content: String,
    /// False for anomalous results, whose timing cannot be trusted.
    pub rerun_enabled: bool,
}

/// Turns a [`RunResult`] into display text.
#[derive(Debug, Clone)]
pub struct ResultPresenter {
    max_len: usize,
    link_base: String,
}

impl ResultPresenter {
    /// Create a presenter that keeps messages within `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            link_base: DEFAULT_LINK_BASE.to_string(),
        }
    }

    /// Set the base URL used for message links.
    pub fn with_link_base(mut self, base: impl Into<String>) -> Self {
        self.link_base = base.into();
        self
    }

    /// Render a result. `now` is shown as the last-run time.
    pub fn format(
        &self,
        result: &RunResult,
        link: Option<&MessageLink>,
        now: DateTime<Utc>,
    ) -> Presentation {
        let mut content = self.banner(result, link, now);
        content.push_str(&format!("\n**Exit Code:** {}", result.status.label()));

        if let Some(detail) = result.status.error_detail() {
            let label = "\n**Error:** ";
            let available = self
                .max_len
                .saturating_sub(content.chars().count() + label.chars().count());
            content.push_str(label);
            content.push_str(&truncate_chars(detail, available));
        } else {
            let available = self.max_len.saturating_sub(content.chars().count());
            let stdout = result.stdout.as_deref().unwrap_or_default();
            let stderr = result.stderr.as_deref().unwrap_or_default();
            content.push_str(&render_streams(stdout, stderr, available));
        }

        // Only a limit smaller than the banner itself gets here.
        if content.chars().count() > self.max_len {
            content = truncate_chars(&content, self.max_len);
        }

        Presentation {
            content,
            rerun_enabled: !result.anomalous,
        }
    }

    fn banner(&self, result: &RunResult, link: Option<&MessageLink>, now: DateTime<Utc>) -> String {
        let timing = format!("**Executed in `{:.2}ms`**", result.elapsed_ms);
        let headline = match link {
            Some(link) => format!("[{}](<{}>)", timing, link.url(&self.link_base)),
            None => timing,
        };
        format!("{} (Last run: <t:{}>)", headline, now.timestamp())
    }
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_LEN)
    }
}

fn block_overhead(label: &str) -> usize {
    format!("\n**{}:**\n```\n\n```", label).chars().count()
}

fn render_streams(stdout: &str, stderr: &str, available: usize) -> String {
    // A block whose empty frame no longer fits is left out entirely.
    let mut overhead = 0;
    let blocks: Vec<(&str, String)> = [("Stdout", stdout), ("Stderr", stderr)]
        .into_iter()
        .filter(|(_, body)| !body.is_empty())
        .filter(|(label, _)| {
            let frame = block_overhead(label);
            if overhead + frame > available {
                return false;
            }
            overhead += frame;
            true
        })
        .map(|(label, body)| (label, escape_fences(body)))
        .collect();

    let mut budget = available.saturating_sub(overhead);

    // Shortest body first so any space it leaves goes to the longer one.
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by_key(|&i| blocks[i].1.chars().count());

    let mut limits = vec![0; blocks.len()];
    let mut remaining_blocks = blocks.len();
    for i in order {
        let share = budget / remaining_blocks;
        let len = blocks[i].1.chars().count();
        limits[i] = len.min(share);
        budget -= limits[i];
        remaining_blocks -= 1;
    }

    blocks
        .iter()
        .zip(limits)
        .map(|((label, body), limit)| {
            format!("\n**{}:**\n```\n{}\n```", label, truncate_chars(body, limit))
        })
        .collect()
}

/// Keep three backticks in output from closing the surrounding fence.
fn escape_fences(text: &str) -> String {
    text.replace("```", "`\u{200b}``")
}

/// Char-aware truncation to at most `limit` characters, marker included.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(limit - 1).collect();
    out.push(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sandbox::ExitStatus;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn completed(code: i32, stdout: &str, stderr: &str) -> RunResult {
        RunResult {
            status: ExitStatus::Completed(code),
            stdout: Some(stdout.to_string()),
            stderr: Some(stderr.to_string()),
            elapsed_ms: 42.4567,
            anomalous: false,
        }
    }

    #[test]
    fn test_format_success_with_link() {
        let link = MessageLink::new("222", "333").in_guild("111");
        let presentation =
            ResultPresenter::default().format(&completed(0, "hi", ""), Some(&link), at());

        assert_eq!(
            presentation.content,
            "[**Executed in `42.46ms`**](<https://discord.com/channels/111/222/333>) \
             (Last run: <t:1700000000>)\n\
             **Exit Code:** 0\n\
             **Stdout:**\n```\nhi\n```"
        );
        assert!(presentation.rerun_enabled);
    }

    #[test]
    fn test_format_both_streams_without_link() {
        let presentation =
            ResultPresenter::default().format(&completed(1, "out", "err"), None, at());

        assert_eq!(
            presentation.content,
            "**Executed in `42.46ms`** (Last run: <t:1700000000>)\n\
             **Exit Code:** 1\n\
             **Stdout:**\n```\nout\n```\n\
             **Stderr:**\n```\nerr\n```"
        );
    }

    #[test]
    fn test_format_empty_streams_omitted() {
        let presentation = ResultPresenter::default().format(&completed(0, "", ""), None, at());
        assert!(presentation.content.ends_with("**Exit Code:** 0"));
        assert!(!presentation.content.contains("Stdout"));
        assert!(!presentation.content.contains("Stderr"));
    }

    #[test]
    fn test_format_forced_kill() {
        let result = RunResult {
            status: ExitStatus::ForcedKill,
            stdout: None,
            stderr: None,
            elapsed_ms: 500.2,
            anomalous: false,
        };
        let presentation = ResultPresenter::default().format(&result, None, at());

        assert_eq!(
            presentation.content,
            "**Executed in `500.20ms`** (Last run: <t:1700000000>)\n\
             **Exit Code:** ForceExit\n\
             **Error:** Timeout"
        );
    }

    #[test]
    fn test_format_internal_error_and_anomaly() {
        let mut result = RunResult::internal_error("Imports are not allowed", 0.0);
        result.anomalous = true;
        let presentation = ResultPresenter::default().format(&result, None, at());

        assert!(presentation.content.contains("**Exit Code:** Error"));
        assert!(presentation.content.contains("**Error:** Imports are not allowed"));
        assert!(!presentation.rerun_enabled);
    }

    #[test]
    fn test_long_output_truncated_to_limit() {
        let stdout = "x".repeat(5000);
        let stderr = "short failure";
        let presenter = ResultPresenter::new(500);
        let presentation = presenter.format(&completed(1, &stdout, stderr), None, at());

        assert!(presentation.content.chars().count() <= 500);
        assert!(presentation.content.contains("short failure"));
        assert!(presentation.content.contains('…'));
    }

    #[test]
    fn test_long_error_detail_truncated_to_limit() {
        let message = format!("Failed to spawn interpreter /{}: not found", "deep/".repeat(500));
        let result = RunResult::internal_error(message, 1.5);
        let presentation = ResultPresenter::new(300).format(&result, None, at());

        assert_eq!(presentation.content.chars().count(), 300);
        assert!(presentation.content.contains("**Error:** Failed to spawn interpreter /deep/"));
        assert!(presentation.content.ends_with('…'));
    }

    #[test]
    fn test_stream_frames_dropped_when_no_room() {
        let link = MessageLink::new("222", "333").in_guild("111");
        let presenter = ResultPresenter::new(130);
        let presentation = presenter.format(&completed(1, "out", "err"), Some(&link), at());

        assert!(presentation.content.chars().count() <= 130);
        assert!(presentation.content.ends_with("**Exit Code:** 1"));
    }

    #[test]
    fn test_limit_below_banner_still_respected() {
        let presentation = ResultPresenter::new(20).format(&completed(0, "hi", ""), None, at());
        assert_eq!(presentation.content.chars().count(), 20);
    }

    #[test]
    fn test_fences_in_output_are_escaped() {
        let presentation =
            ResultPresenter::default().format(&completed(0, "a```b", ""), None, at());
        assert!(presentation.content.contains("a`\u{200b}``b"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "he…");
        assert_eq!(truncate_chars("héllo", 2), "h…");
        assert_eq!(truncate_chars("hello", 0), "");
    }

    #[test]
    fn test_link_parse() {
        assert_eq!(
            "111/222/333".parse::<MessageLink>(),
            Ok(MessageLink::new("222", "333").in_guild("111"))
        );
        assert_eq!(
            "https://discord.com/channels/@me/4/5/".parse::<MessageLink>(),
            Ok(MessageLink::new("4", "5"))
        );
        for bad in ["", "1/2", "a/2/3", "1/b/3", "1/2/", "me/2/3"] {
            assert!(bad.parse::<MessageLink>().is_err(), "input {:?}", bad);
        }
    }

    #[test]
    fn test_link_round_trip() {
        let guild = MessageLink::new("222", "333").in_guild("111");
        let dm = MessageLink::new("444", "555");

        let presenter = ResultPresenter::default();
        for link in [guild, dm] {
            let content = presenter
                .format(&completed(0, "hi", ""), Some(&link), at())
                .content;
            assert_eq!(MessageLink::find_in(&content), Some(link));
        }

        assert_eq!(MessageLink::find_in("no link here"), None);
        assert_eq!(
            MessageLink::new("2", "3").url("https://example.test/channels/"),
            "https://example.test/channels/@me/2/3"
        );
    }
}
