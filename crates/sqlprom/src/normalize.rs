//! SQL normalization into low-cardinality metric labels.
//!
//! [`normalize`] masks literals and collapses value lists so that every
//! execution of the same logical statement maps to the same label, no matter
//! which parameters were bound:
//!
//! ```
//! use sqlprom::normalize;
//!
//! assert_eq!(
//!     normalize("SELECT * FROM users WHERE id IN (1, 2, 3) AND name = 'bob'"),
//!     "select * from users where id in (?) and name = ?"
//! );
//! ```
//!
//! Matching is regex based, not a parser. Parenthesized `IN (...)` and
//! `VALUES (...)` bodies stop at the first `)`, so a nested call or sub-select
//! inside them is only partially collapsed.

use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Label returned when nothing is left after normalization.
pub const ERROR_SENTINEL: &str = "[error]";

struct Patterns {
    single_quoted: Regex,
    double_quoted: Regex,
    number: Regex,
    in_list: Regex,
    values_list: Regex,
    placeholder_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
        };
        Patterns {
            single_quoted: compile(r"'[^']*'"),
            double_quoted: compile(r#""[^"]*""#),
            number: compile(r"\b[0-9]+(?:\.[0-9]+)?\b"),
            in_list: compile(r"(?i)\bIN\s*\([^)]+\)"),
            values_list: compile(r"(?i)\bVALUES\s*\([^)]+\)(?:\s*,\s*\([^)]+\))*"),
            placeholder_run: compile(r"\?(?:\s*,\s*\?)+"),
        }
    })
}

/// Apply `re` to `input`, reusing the existing buffer when nothing matched.
fn replace<'a>(re: &Regex, input: Cow<'a, str>, replacement: &str) -> Cow<'a, str> {
    match input {
        Cow::Borrowed(s) => re.replace_all(s, NoExpand(replacement)),
        Cow::Owned(s) => {
            let replaced = match re.replace_all(&s, NoExpand(replacement)) {
                Cow::Owned(out) => Some(out),
                Cow::Borrowed(_) => None,
            };
            Cow::Owned(replaced.unwrap_or(s))
        }
    }
}

/// Normalize a parameter-bound SQL statement into a canonical label.
///
/// Literals become `?`, `IN (...)` and multi-row `VALUES (...)` lists collapse
/// to a single placeholder, whitespace is squeezed and the result is
/// lower-cased. Never fails: input with nothing left to label yields
/// [`ERROR_SENTINEL`].
///
/// The output is a fixed point: normalizing it again returns it unchanged.
pub fn normalize(sql: &str) -> String {
    let p = patterns();

    let masked = replace(&p.single_quoted, Cow::Borrowed(sql), "?");
    let masked = replace(&p.double_quoted, masked, "?");
    let masked = replace(&p.number, masked, "?");
    let masked = replace(&p.in_list, masked, "IN (?)");
    let masked = replace(&p.values_list, masked, "VALUES (?)");
    let masked = replace(&p.placeholder_run, masked, "?");

    let mut out = String::with_capacity(masked.len());
    for token in masked.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }

    if out.is_empty() {
        return ERROR_SENTINEL.to_string();
    }
    out.make_ascii_lowercase();
    out
}

/// The statement keyword used as the `query_type` label.
///
/// Upper-cased first whitespace-delimited token, or an empty string when the
/// statement has no tokens.
pub fn query_type(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(str::to_ascii_uppercase)
        .unwrap_or_default()
}
