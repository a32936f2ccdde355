//! Candidate ranking.

use std::cmp::Reverse;

use crate::archive::paths::{self, APP_CONFIG_SUFFIXES, IAC_SUFFIXES};

const BUILD_MANIFESTS: &[&str] = &["package.json", "pom.xml", "build.gradle", "build.gradle.kts"];

/// Priority tier of a candidate path. Higher goes first.
///
/// | tier | matches                                            |
/// |------|----------------------------------------------------|
/// | 100  | Terraform sources and variable files               |
/// | 90   | anything mentioning `docker` or `compose`          |
/// | 80   | top-level build manifests                          |
/// | 70   | `application*` yml/yaml/properties                 |
/// | 60   | READMEs                                            |
/// | 10   | everything else                                    |
pub fn score(path: &str) -> u32 {
    let lower = path.to_lowercase();
    let base = paths::basename(&lower);

    if IAC_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        100
    } else if lower.contains("docker") || lower.contains("compose") {
        90
    } else if BUILD_MANIFESTS.contains(&base) {
        80
    } else if lower.contains("application") && APP_CONFIG_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        70
    } else if base.starts_with("readme") {
        60
    } else {
        10
    }
}

/// Sort paths by descending score; equal scores keep their input order.
pub fn rank<'a, I>(candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked: Vec<&str> = candidates.into_iter().collect();
    ranked.sort_by_key(|p| Reverse(score(p)));
    ranked
}
