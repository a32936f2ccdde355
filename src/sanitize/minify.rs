//! Comment stripping and whitespace minification.

use std::sync::LazyLock;

use regex::Regex;

use super::{truncate_to_bytes, SanitizeLimits, LINE_ELLIPSIS, TRUNCATION_MARKER};

static C_LIKE_COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$|(?s:/\*.*?\*/)").unwrap());

static SCRIPT_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*#.*$|(?s:'''.*?'''|""".*?""")"#).unwrap()
});

static HASH_COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#.*$").unwrap());

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// How comments are written in a given file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// line` and `/* block */`.
    CLike,
    /// `# line` plus triple-quoted docstrings.
    Script,
    /// Full-line `#` comments only.
    Hash,
    /// Unknown file type; left alone.
    None,
}

impl CommentStyle {
    /// Pick the comment style for an extension (with or without the dot).
    pub fn for_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "java" | "kt" | "kts" | "go" | "c"
            | "h" | "cc" | "cpp" | "hpp" | "cs" | "rs" | "scala" | "swift" | "gradle"
            | "groovy" => CommentStyle::CLike,
            "py" => CommentStyle::Script,
            "sh" | "bash" | "zsh" | "yml" | "yaml" | "properties" | "toml" | "rb" | "conf" => {
                CommentStyle::Hash
            }
            _ => CommentStyle::None,
        }
    }

    fn regex(self) -> Option<&'static Regex> {
        match self {
            CommentStyle::CLike => Some(&C_LIKE_COMMENTS),
            CommentStyle::Script => Some(&SCRIPT_COMMENTS),
            CommentStyle::Hash => Some(&HASH_COMMENTS),
            CommentStyle::None => None,
        }
    }
}

/// Strip comments, collapse whitespace, drop blank lines and enforce the
/// per-line and per-file ceilings.
///
/// The output never exceeds `limits.max_bytes_per_file` bytes, truncation
/// marker included.
pub fn minify(text: &str, ext: &str, limits: &SanitizeLimits) -> String {
    let stripped = match CommentStyle::for_extension(ext).regex() {
        Some(re) => re.replace_all(text, ""),
        None => text.into(),
    };

    let mut lines = Vec::new();
    for line in stripped.lines() {
        let collapsed = WHITESPACE_RUN.replace_all(line, " ");
        let line = collapsed.trim();
        if line.is_empty() {
            continue;
        }
        if line.chars().count() > limits.max_line_chars {
            let head: String = line.chars().take(limits.max_line_chars).collect();
            lines.push(format!("{head}{LINE_ELLIPSIS}"));
        } else {
            lines.push(line.to_string());
        }
    }

    let out = lines.join("\n");
    if out.len() <= limits.max_bytes_per_file {
        return out;
    }
    if limits.max_bytes_per_file < TRUNCATION_MARKER.len() {
        return truncate_to_bytes(TRUNCATION_MARKER, limits.max_bytes_per_file).to_string();
    }
    let keep = limits
        .max_bytes_per_file
        .saturating_sub(TRUNCATION_MARKER.len());
    format!("{}{TRUNCATION_MARKER}", truncate_to_bytes(&out, keep))
}
