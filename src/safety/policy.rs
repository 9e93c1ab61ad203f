//! Source policy rules checked before a snippet is executed.
//!
//! These are policy gates, not a security boundary: they stop accidental or
//! naive use of forbidden constructs. The interpreter's permission flags are
//! what actually constrain the child.

use regex::Regex;

/// A rule that rejects source text matching a pattern.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// Rule identifier.
    pub id: String,
    /// Message reported to the caller when the rule rejects a snippet.
    pub message: String,
    /// The pattern to match (regex).
    pattern: Regex,
}

impl PolicyRule {
    /// Create a new policy rule.
    pub fn new(id: impl Into<String>, message: impl Into<String>, pattern: &str) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            pattern: Regex::new(pattern).expect("Invalid policy regex"),
        }
    }

    /// Check if source matches this rule.
    pub fn matches(&self, source: &str) -> bool {
        self.pattern.is_match(source)
    }
}

/// Set of rules a snippet must pass before it is spawned.
#[derive(Debug, Clone)]
pub struct Policy {
    rules: Vec<PolicyRule>,
}

impl Policy {
    /// Create an empty policy that accepts everything.
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    /// Add a rule to the policy.
    pub fn add_rule(&mut self, rule: PolicyRule) {
        self.rules.push(rule);
    }

    /// First rule the source violates, if any.
    pub fn violation(&self, source: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.matches(source))
    }

    /// Number of rules in the policy.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the policy has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for Policy {
    fn default() -> Self {
        let mut policy = Self::new();

        // `import` followed by a brace, a parenthesis or a space. The space
        // branch also covers `import name` and `import "mod"`.
        policy.add_rule(PolicyRule::new(
            "imports",
            "Imports are not allowed",
            r"import(?: ?\{| ?\(| )",
        ));

        policy
    }
}
