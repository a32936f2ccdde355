//! Path classification for archive entries.
//!
//! Everything here looks at the path string only, never at file content,
//! so every function is pure and deterministic.

/// Directory segments whose contents are never analysed.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".idea",
    ".vscode",
    "build",
    "dist",
    "target",
    ".gradle",
    ".next",
    ".cache",
    ".turbo",
    "__MACOSX",
];

/// macOS resource-fork prefix (`._foo`), also used by some tar/zip tools.
const RESOURCE_FORK_PREFIX: &str = "._";

/// Basenames whose containing directory is a project root.
const PROJECT_ROOT_MARKERS: &[&str] = &[
    // Build/dependency files
    "package.json",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
    "requirements.txt",
    "pyproject.toml",
    "go.mod",
    "Gemfile",
    "Cargo.toml",
    // Container/orchestration
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    // IaC
    "main.tf",
    "versions.tf",
];

/// Basenames that are always worth showing to the model.
const SIGNAL_BASENAMES: &[&str] = &[
    "package.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "Pipfile.lock",
    "go.mod",
    "Gemfile",
    "Cargo.toml",
    "Cargo.lock",
    "Dockerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    ".gitlab-ci.yml",
    ".travis.yml",
    "cdk.json",
];

const SIGNAL_SUFFIXES: &[&str] = &[
    ".tf",
    ".tfvars",
    ".tf.json",
    ".tfvars.json",
    ".yaml",
    ".yml",
    ".properties",
];

/// Infrastructure-as-code suffixes (highest ranking tier).
pub const IAC_SUFFIXES: &[&str] = &[".tf", ".tfvars", ".tf.json"];

/// Suffixes of Spring-style `application*` config files.
pub const APP_CONFIG_SUFFIXES: &[&str] = &[".yml", ".yaml", ".properties"];

/// Consecutive directory segments whose files are all signals.
const SIGNAL_DIRS: &[&[&str]] = &[&[".github", "workflows"], &["src", "main", "resources"]];

/// Normalize a POSIX-style path: drop empty and `.` segments, resolve `..`
/// and strip leading slashes. Returns an empty string for the archive root.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Final path segment.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Containing directory, or `""` for top-level entries.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// File extension without the dot (`main.tf.json` → `json`).
///
/// Leading dots belong to the name, so `.travis.yml` → `yml` but
/// `.bashrc` has no extension.
pub fn extension(path: &str) -> &str {
    let base = basename(path);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(idx) => &base[stem_start + idx + 1..],
        None => "",
    }
}

/// Whether an archive entry should be ignored entirely.
///
/// True for directory entries, entries under a build-artifact, VCS,
/// dependency-cache or IDE directory, and resource-fork files.
pub fn should_skip(path: &str) -> bool {
    if path.is_empty() || path.ends_with('/') {
        return true;
    }
    let norm = normalize(path);
    if norm.is_empty() || norm.starts_with(RESOURCE_FORK_PREFIX) {
        return true;
    }
    let segments: Vec<&str> = norm.split('/').collect();
    let (file, dirs) = match segments.split_last() {
        Some(split) => split,
        None => return true,
    };
    if dirs.iter().any(|d| SKIP_DIRS.contains(d)) {
        return true;
    }
    file.starts_with(RESOURCE_FORK_PREFIX)
}

/// Whether a basename marks its directory as a project root.
pub fn is_project_root_marker(basename: &str) -> bool {
    PROJECT_ROOT_MARKERS.contains(&basename)
}

/// Whether a file encodes build, deployment or infrastructure intent.
pub fn is_signal_file(path: &str) -> bool {
    let base = basename(path);
    if SIGNAL_BASENAMES.contains(&base) {
        return true;
    }
    if base.starts_with("Dockerfile") || base.to_lowercase().starts_with("readme") {
        return true;
    }
    if is_app_config_name(base) {
        return true;
    }
    if SIGNAL_SUFFIXES.iter().any(|s| base.ends_with(s)) {
        return true;
    }
    let segments: Vec<&str> = path.split('/').collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    SIGNAL_DIRS
        .iter()
        .any(|needle| dirs.windows(needle.len()).any(|w| w == *needle))
}

/// `application.yml`, `application-prod.properties` and friends.
fn is_app_config_name(base: &str) -> bool {
    base.starts_with("application") && APP_CONFIG_SUFFIXES.iter().any(|s| base.ends_with(s))
}
