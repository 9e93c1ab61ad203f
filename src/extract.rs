//! Fenced code block extraction and language classification.
//!
//! Chat messages carry snippets as Markdown fences:
//!
//! ````text
//! ```ts
//! console.log(1 + 1);
//! ```
//! ````
//!
//! Only the two script dialects the interpreter understands are recognized.
//! Anything else is treated as "no code here" rather than guessed at.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ExtractError;

/// Opening fence with a recognized tag, a greedy body, and the last closing
/// fence that sits on its own line.
static FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(ts|js|typescript|javascript)\n(.*)\n```")
        .expect("fence pattern is a valid regex")
});

/// Script dialect a snippet is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Js,
    Ts,
}

impl Language {
    /// Canonical short tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Js => "js",
            Language::Ts => "ts",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "js" | "javascript" => Ok(Language::Js),
            "ts" | "typescript" => Ok(Language::Ts),
            _ => Err(format!(
                "unsupported language '{}', expected 'js', 'javascript', 'ts' or 'typescript'",
                s
            )),
        }
    }
}

/// A snippet pulled out of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Canonical language of the block.
    pub language: Language,
    /// Source text between the fences, verbatim.
    pub body: String,
}

/// Extract the fenced `js`/`ts` block from free-form message text.
pub fn extract(text: &str) -> Result<CodeBlock, ExtractError> {
    let captures = FENCE_PATTERN.captures(text).ok_or(ExtractError::NoMatch)?;

    // Exactly one tag capture and one body capture.
    let (Some(tag), Some(body)) = (captures.get(1), captures.get(2)) else {
        return Err(ExtractError::NoMatch);
    };

    let language = tag
        .as_str()
        .parse::<Language>()
        .map_err(|_| ExtractError::NoMatch)?;

    Ok(CodeBlock {
        language,
        body: body.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_js_block() {
        let block = extract("look:\n```js\nconsole.log(\"hi\")\n```").unwrap();
        assert_eq!(block.language, Language::Js);
        assert_eq!(block.body, "console.log(\"hi\")");
    }

    #[test]
    fn test_long_tags_resolve_to_canonical() {
        for (tag, expected) in [
            ("JavaScript", Language::Js),
            ("JAVASCRIPT", Language::Js),
            ("javascript", Language::Js),
            ("TypeScript", Language::Ts),
            ("typeSCRIPT", Language::Ts),
            ("TS", Language::Ts),
            ("Js", Language::Js),
        ] {
            let text = format!("```{}\nlet x = 1;\n```", tag);
            let block = extract(&text).unwrap();
            assert_eq!(block.language, expected, "tag {}", tag);
            assert_eq!(block.body, "let x = 1;");
        }
    }

    #[test]
    fn test_multiline_body_kept_verbatim() {
        let text = "```ts\nconst a: number = 1;\n\n  console.log(a);\n```\ntrailing words";
        let block = extract(text).unwrap();
        assert_eq!(block.language, Language::Ts);
        assert_eq!(block.body, "const a: number = 1;\n\n  console.log(a);");
    }

    #[test]
    fn test_no_match_cases() {
        let cases = [
            "",
            "just some text",
            "console.log(1)",
            "```\nconsole.log(1)\n```",
            "```python\nprint(1)\n```",
            "```rust\nfn main() {}\n```",
            "```js console.log(1) ```",
            "```js\nconsole.log(1)",
            "`js\nconsole.log(1)\n`",
        ];
        for text in cases {
            assert_eq!(extract(text), Err(ExtractError::NoMatch), "input {:?}", text);
        }
    }

    #[test]
    fn test_unrecognized_block_before_recognized_one() {
        let text = "```py\nprint(1)\n```\nand\n```js\nconsole.log(2)\n```";
        let block = extract(text).unwrap();
        assert_eq!(block.language, Language::Js);
        assert_eq!(block.body, "console.log(2)");
    }

    #[test]
    fn test_language_parse_and_display() {
        assert_eq!("typescript".parse::<Language>().unwrap(), Language::Ts);
        assert_eq!("JS".parse::<Language>().unwrap(), Language::Js);
        assert!("python".parse::<Language>().is_err());
        assert_eq!(Language::Ts.to_string(), "ts");
        assert_eq!(Language::Js.as_str(), "js");
    }
}
