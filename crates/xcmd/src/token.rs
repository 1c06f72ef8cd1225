//! Predicates and name conversions over raw argument tokens.
use std::borrow::Cow;

use heck::{ToKebabCase, ToLowerCamelCase};

/// `-f`, `--option`, `--option=value`, and also a lone `-`.
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

pub fn is_short_flag(token: &str) -> bool {
    is_flag(token) && !token[1..].starts_with('-')
}

pub fn is_long_flag(token: &str) -> bool {
    token.starts_with("--")
}

/// `--target` -> `target`, `-t` -> `t`.
pub fn strip_sigil(token: &str) -> &str {
    token.trim_start_matches('-')
}

/// `dry-run` -> `dryRun`. Already camel-cased input is returned unchanged.
pub fn to_camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

/// `dryRun` -> `dry-run`.
pub fn to_kebab_case(name: &str) -> String {
    name.to_kebab_case()
}

/// Whether `value` reads as a finite base-10 number.
///
/// Blank strings are not numbers, neither are `inf` or `NaN`.
pub fn is_numeric_like(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.parse::<f64>().map_or(false, f64::is_finite)
}

/// Drops ANSI escape sequences, so that colored names compare equal to
/// plain ones.
pub fn strip_styling(text: &str) -> Cow<'_, str> {
    console::strip_ansi_codes(text)
}
