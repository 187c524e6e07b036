// src/alignment/version.rs

use once_cell::sync::Lazy;
use regex::Regex;

static DOTTED_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)?").expect("version pattern is a valid regex"));

static MAJOR_MINOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)").expect("major.minor pattern is a valid regex"));

/// Reduces free-text version info to its first dotted number, e.g.
/// `"verrsion 51.01 (4306)"` becomes `"51.01"`.
///
/// Strings without a dotted number come back lower-cased and trimmed.
pub fn clean_version(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match DOTTED_VERSION.find(&lowered) {
        Some(m) => m.as_str().to_string(),
        None => lowered,
    }
}

/// First `major.minor` pair in the string, or `None` when there is no dotted number.
pub fn extract_major_minor(raw: &str) -> Option<String> {
    let caps = MAJOR_MINOR.captures(raw)?;
    Some(format!("{}.{}", &caps[1], &caps[2]))
}
