//! Token normalization
//!
//! Rewrites a handful of convenience aliases into the programs that
//! implement them.

/// (alias, replacement) pairs, applied token-by-token.
const ALIASES: &[(&str, &str)] = &[("help", "man more"), ("environ", "printenv"), ("clr", "clear")];

/// Returns the replacement for `token` if it is an alias.
pub fn expand_alias(token: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|&&(alias, _)| alias == token)
        .map(|&(_, replacement)| replacement)
}

/// Collapses whitespace and rewrites alias tokens.
///
/// # Examples
///
/// ```
/// use myshell::core::normalize::normalize;
///
/// assert_eq!(normalize("  help   ls "), "man more ls");
/// assert_eq!(normalize("environ"), "printenv");
/// ```
pub fn normalize(line: &str) -> String {
    line.split_whitespace()
        .map(|token| expand_alias(token).unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes `line` and splits it back into tokens.
pub fn normalized_tokens(line: &str) -> Vec<String> {
    normalize(line)
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}
