//! Safety layer for untrusted snippets and their output.
//!
//! - The policy screens source text before anything is spawned
//! - The sanitizer strips terminal escape sequences from captured output

mod policy;
mod sanitizer;

pub use policy::{Policy, PolicyRule};
pub use sanitizer::{Sanitizer, normalize_line_endings};
