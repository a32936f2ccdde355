//! Budget allocation: pick the files each project may show the model.
//!
//! One [`BudgetAllocator`] lives for exactly one archive run. It owns the
//! running file and byte counters, so quotas span every project of the run
//! while each call to [`BudgetAllocator::allocate_project`] stays a plain
//! function of its inputs and the counters.

pub mod priority;

use tracing::{debug, info, warn};

use crate::archive::{paths, EntrySource, READ_HEADROOM};
use crate::config::LimitsConfig;
use crate::detect;
use crate::models::FileSummary;
use crate::sanitize::{self, SanitizeLimits, TRUNCATION_MARKER};

/// Files selected for one project.
#[derive(Debug, Clone, Default)]
pub struct ProjectAllocation {
    pub summaries: Vec<FileSummary>,
    /// Bytes charged against the global budget by this project.
    pub bytes: usize,
}

impl ProjectAllocation {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Running quota state for one archive.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    max_files_per_project: usize,
    max_total_files: usize,
    max_total_bytes: usize,
    sanitize_limits: SanitizeLimits,
    used_files: usize,
    used_bytes: usize,
}

impl BudgetAllocator {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_files_per_project: limits.max_files_per_project,
            max_total_files: limits.max_total_files,
            max_total_bytes: limits.max_total_bytes,
            sanitize_limits: SanitizeLimits::from(limits),
            used_files: 0,
            used_bytes: 0,
        }
    }

    pub fn used_files(&self) -> usize {
        self.used_files
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Whether the global file quota is spent.
    pub fn files_exhausted(&self) -> bool {
        self.used_files >= self.max_total_files
    }

    /// Whether the global byte quota is spent.
    pub fn bytes_exhausted(&self) -> bool {
        self.used_bytes >= self.max_total_bytes
    }

    /// Signal files of a project in the order they would be considered,
    /// before any quota is applied.
    pub fn ranked_candidates(files: &[String]) -> Vec<&str> {
        priority::rank(
            files
                .iter()
                .map(String::as_str)
                .filter(|p| paths::is_signal_file(p)),
        )
    }

    /// Select, sanitize and charge the files of one project.
    ///
    /// Unreadable entries are skipped. When a file would overflow the
    /// global byte quota it is cut to fit exactly, marked as truncated,
    /// and allocation stops.
    pub fn allocate_project(
        &mut self,
        root: &str,
        files: &[String],
        source: &mut dyn EntrySource,
    ) -> ProjectAllocation {
        let mut allocation = ProjectAllocation::default();
        if self.files_exhausted() {
            info!(limit = self.max_total_files, "total file limit reached");
            return allocation;
        }

        let remaining_files = self.max_total_files - self.used_files;
        let take = self.max_files_per_project.min(remaining_files);
        let candidates = Self::ranked_candidates(files);
        debug!(root, candidates = candidates.len(), take, "ranked candidates");

        let read_limit = self
            .sanitize_limits
            .max_bytes_per_file
            .saturating_mul(READ_HEADROOM);

        for name in candidates.into_iter().take(take) {
            if self.bytes_exhausted() {
                info!(limit = self.max_total_bytes, "total byte limit reached");
                break;
            }

            let raw = match source.read_entry(name, read_limit) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = name, "skipping unreadable entry: {e}");
                    continue;
                }
            };
            let ext = paths::extension(name);
            let mut content = sanitize::sanitize(&raw, ext, &self.sanitize_limits);
            let mut charged = content.len();

            let remaining_bytes = self.max_total_bytes - self.used_bytes;
            let overflow = charged > remaining_bytes;
            if overflow {
                let head = sanitize::truncate_to_bytes(&content, remaining_bytes);
                content = format!("{head}{TRUNCATION_MARKER}");
                charged = remaining_bytes;
            }

            allocation.summaries.push(FileSummary {
                path: detect::relative_path(root, name).to_string(),
                language_hint: ext.to_string(),
                content,
                charged_bytes: charged,
            });
            allocation.bytes += charged;
            self.used_bytes += charged;
            self.used_files += 1;

            if overflow {
                info!(path = name, "truncated to fit the total byte limit");
                break;
            }
        }

        allocation
    }
}
