//! Line-based secret redaction.
//!
//! A deliberately blunt filter: any line mentioning a sensitive key name
//! loses its value before the content leaves the process.

/// Key fragments (lowercase) that mark a line as secret-bearing.
pub const SENSITIVE_KEYS: &[&str] = &[
    "secret",
    "password",
    "passwd",
    "token",
    "apikey",
    "access_key",
    "secret_key",
];

pub const REDACTED_VALUE: &str = "***REDACTED***";
pub const REDACTED_LINE: &str = "***REDACTED LINE***";

/// Redact every line that mentions a sensitive key.
///
/// `KEY=value` keeps `KEY=`, `key: value` keeps `key: `, and anything
/// without a separator is replaced wholesale. The earliest `=` or `:`
/// is the separator, so no part of the value survives.
pub fn redact(text: &str) -> String {
    text.lines().map(redact_line).collect::<Vec<_>>().join("\n")
}

fn redact_line(line: &str) -> String {
    if !is_sensitive(line) {
        return line.to_string();
    }
    match line.find(['=', ':']) {
        Some(idx) if line.as_bytes()[idx] == b'=' => {
            format!("{}={REDACTED_VALUE}", &line[..idx])
        }
        Some(idx) => format!("{}: {REDACTED_VALUE}", &line[..idx]),
        None => REDACTED_LINE.to_string(),
    }
}

fn is_sensitive(line: &str) -> bool {
    let lower = line.to_lowercase();
    SENSITIVE_KEYS.iter().any(|k| lower.contains(k))
}
