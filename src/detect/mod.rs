//! Project detection: partition archive paths into logical sub-projects.
//!
//! A directory holding a root marker (`package.json`, `main.tf`, ...) is a
//! project root. Every remaining path belongs to the deepest root that
//! prefixes it; with no markers at all the whole archive is one project
//! rooted at `"."`.

use indexmap::IndexMap;

use crate::archive::paths;

/// Root used when a marker sits at the top of the archive, or when no
/// marker exists anywhere.
pub const SENTINEL_ROOT: &str = ".";

/// Root → paths assigned to it, both in first-seen archive order.
pub type ProjectMap = IndexMap<String, Vec<String>>;

/// Detect project roots and assign every non-skipped path to one of them.
///
/// Roots that end up with no paths are dropped.
pub fn detect<S: AsRef<str>>(all_paths: &[S]) -> ProjectMap {
    let candidates: Vec<&str> = all_paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !paths::should_skip(p))
        .collect();

    let mut roots: ProjectMap = IndexMap::new();
    for path in &candidates {
        if paths::is_project_root_marker(paths::basename(path)) {
            let dir = paths::dirname(path);
            let root = if dir.is_empty() { SENTINEL_ROOT } else { dir };
            roots.entry(root.to_string()).or_default();
        }
    }
    if roots.is_empty() {
        roots.insert(SENTINEL_ROOT.to_string(), Vec::new());
    }

    for path in candidates {
        if let Some(root) = deepest_root(roots.keys().map(String::as_str), path) {
            let root = root.to_string();
            roots.entry(root).or_default().push(path.to_string());
        }
    }

    roots.retain(|_, files| !files.is_empty());
    roots
}

/// Depth of a root: the sentinel is 0, `app` is 1, `svc/api` is 2.
pub fn root_depth(root: &str) -> usize {
    if root == SENTINEL_ROOT {
        0
    } else {
        root.split('/').count()
    }
}

/// Whether `path` lives under `root` (or is `root` itself).
pub fn is_under(root: &str, path: &str) -> bool {
    root == SENTINEL_ROOT
        || path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Strip the root prefix from a path; paths outside the root are returned
/// unchanged.
pub fn relative_path<'a>(root: &str, path: &'a str) -> &'a str {
    if root == SENTINEL_ROOT {
        return path;
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

/// Display name of a project: the root's last segment, or `root`.
pub fn project_name(root: &str) -> &str {
    if root == SENTINEL_ROOT {
        "root"
    } else {
        paths::basename(root)
    }
}

/// Deepest root containing `path`. Earlier roots win ties, which can only
/// happen between identical depths on different branches, where at most
/// one can match.
fn deepest_root<'a>(roots: impl Iterator<Item = &'a str>, path: &str) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for root in roots {
        if !is_under(root, path) {
            continue;
        }
        let depth = root_depth(root);
        if best.is_none_or(|(_, d)| depth > d) {
            best = Some((root, depth));
        }
    }
    best.map(|(root, _)| root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sibling_projects() {
        let paths = [
            "app/package.json",
            "app/src/index.js",
            "infra/main.tf",
            "infra/variables.tf",
        ];
        let projects = detect(&paths);
        assert_eq!(projects.len(), 2);
        assert_eq!(projects["app"], ["app/package.json", "app/src/index.js"]);
        assert_eq!(projects["infra"], ["infra/main.tf", "infra/variables.tf"]);
    }

    #[test]
    fn no_markers_means_one_sentinel_project() {
        let projects = detect(&["src/a.rs", "README.md"]);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[SENTINEL_ROOT], ["src/a.rs", "README.md"]);
    }

    #[test]
    fn top_level_marker_yields_sentinel_root() {
        let projects = detect(&["package.json", "index.js"]);
        assert_eq!(projects.keys().collect::<Vec<_>>(), ["."]);
        assert_eq!(projects["."].len(), 2);
    }

    #[test]
    fn nested_roots_prefer_deepest() {
        let paths = [
            "package.json",
            "services/api/package.json",
            "services/api/src/server.ts",
            "services/README.md",
            "web/index.html",
        ];
        let projects = detect(&paths);
        assert_eq!(projects["."], ["package.json", "services/README.md", "web/index.html"]);
        assert_eq!(
            projects["services/api"],
            ["services/api/package.json", "services/api/src/server.ts"]
        );
    }

    #[test]
    fn top_level_root_beats_sentinel() {
        let projects = detect(&["Dockerfile", "app/pom.xml", "app/src/Main.java"]);
        assert_eq!(projects["app"], ["app/pom.xml", "app/src/Main.java"]);
        assert_eq!(projects["."], ["Dockerfile"]);
    }

    #[test]
    fn paths_outside_every_root_are_dropped() {
        // Markers exist, so there is no catch-all sentinel root.
        let projects = detect(&["app/package.json", "docs/guide.md"]);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects["app"], ["app/package.json"]);
    }

    #[test]
    fn prefix_match_respects_segment_boundaries() {
        let projects = detect(&["app/package.json", "application/config.yml"]);
        assert_eq!(projects["app"], ["app/package.json"]);
        assert!(!projects.contains_key("application"));
    }

    #[test]
    fn skipped_paths_never_seed_or_join() {
        let projects = detect(&[
            "node_modules/left-pad/package.json",
            "app/package.json",
            "app/node_modules/x/index.js",
            "app/",
        ]);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects["app"], ["app/package.json"]);
    }

    #[test]
    fn every_path_assigned_exactly_once() {
        let paths = [
            "a/package.json",
            "a/b/go.mod",
            "a/b/c/main.tf",
            "a/x.txt",
            "a/b/y.txt",
            "a/b/c/z.txt",
            "a/b/c/d/w.txt",
        ];
        let projects = detect(&paths);
        let total: usize = projects.values().map(Vec::len).sum();
        assert_eq!(total, paths.len());
        for path in paths {
            let owners: Vec<_> = projects
                .iter()
                .filter(|(_, files)| files.iter().any(|f| f == path))
                .map(|(root, _)| root.as_str())
                .collect();
            assert_eq!(owners.len(), 1, "{path} owned by {owners:?}");
        }
        assert_eq!(projects["a/b/c"], ["a/b/c/main.tf", "a/b/c/z.txt", "a/b/c/d/w.txt"]);
    }

    #[test]
    fn helpers() {
        assert_eq!(root_depth("."), 0);
        assert_eq!(root_depth("app"), 1);
        assert_eq!(root_depth("svc/api"), 2);
        assert_eq!(relative_path("svc/api", "svc/api/src/main.rs"), "src/main.rs");
        assert_eq!(relative_path(".", "src/main.rs"), "src/main.rs");
        assert_eq!(project_name("svc/api"), "api");
        assert_eq!(project_name("."), "root");
    }
}
