//! Content sanitizer: secret redaction, comment stripping and capping.
//!
//! Every file shown to the model goes through [`sanitize`]. Redaction runs
//! first, while `key=value` lines are still intact, then [`minify::minify`]
//! strips comments and enforces the byte ceilings.

pub mod minify;
pub mod redact;

use crate::config::LimitsConfig;

/// Appended to lines cut at the per-line character ceiling.
pub const LINE_ELLIPSIS: &str = " …";

/// Appended to snippets cut at a byte ceiling.
pub const TRUNCATION_MARKER: &str = "\n… [TRUNCATED]";

/// Ceilings applied to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeLimits {
    pub max_line_chars: usize,
    pub max_bytes_per_file: usize,
}

impl Default for SanitizeLimits {
    fn default() -> Self {
        Self {
            max_line_chars: crate::constants::MAX_LINE_CHARS,
            max_bytes_per_file: crate::constants::MAX_BYTES_PER_FILE,
        }
    }
}

impl From<&LimitsConfig> for SanitizeLimits {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_line_chars: limits.max_line_chars,
            max_bytes_per_file: limits.max_bytes_per_file,
        }
    }
}

/// Decode, redact and minify raw file bytes.
///
/// Invalid UTF-8 sequences become U+FFFD rather than failing the file.
pub fn sanitize(raw: &[u8], ext: &str, limits: &SanitizeLimits) -> String {
    let text = String::from_utf8_lossy(raw);
    let redacted = redact::redact(&text);
    minify::minify(&redacted, ext, limits)
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
