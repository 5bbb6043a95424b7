//! # Glob Matching
//!
//! A single metacharacter, `*`, matching zero or more characters (including
//! `/`). Translated to a regex by splitting on `*`, escaping the literal
//! segments, and joining them back with `.*`, anchored at both ends. An
//! empty pattern is treated as `*` (match everything).

use crate::error::Result;
use regex::Regex;

pub fn to_regex(pattern: &str) -> Result<Regex> {
    let pattern = if pattern.is_empty() { "*" } else { pattern };

    let mut out = String::from("^");
    for (i, part) in pattern.split('*').enumerate() {
        if i > 0 {
            out.push_str(".*");
        }
        out.push_str(&regex::escape(part));
    }
    out.push('$');

    Ok(Regex::new(&out)?)
}
