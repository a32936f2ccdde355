//! CLI command definitions and terminal rendering.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use std::io::Write;

use colored::Colorize;

use iacforge::analysis::ProjectSelection;

/// About text for clap help output.
pub const ABOUT: &str =
    "Analyse a source archive and generate Terraform, CI workflows and deployment scripts.";

/// Render an offline selection as a per-project listing.
pub fn write_inspection(
    out: &mut impl Write,
    entries: usize,
    selections: &[ProjectSelection],
) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} entries, {} project(s)",
        "archive".bold(),
        entries,
        selections.len()
    )?;

    let mut files = 0;
    let mut bytes = 0;
    for sel in selections {
        writeln!(out)?;
        writeln!(
            out,
            "  {}  {}",
            sel.name.bold(),
            format!("root: {}", sel.root).dimmed()
        )?;
        if sel.summaries.is_empty() {
            writeln!(out, "    {}", "no signal files selected".yellow())?;
        }
        for summary in &sel.summaries {
            let truncated = summary.content.ends_with(iacforge::sanitize::TRUNCATION_MARKER);
            let flag = if truncated { " truncated".yellow().to_string() } else { String::new() };
            writeln!(
                out,
                "    {:>7}  {}{}",
                summary.charged_bytes.to_string().cyan(),
                summary.path,
                flag
            )?;
        }
        files += sel.summaries.len();
        bytes += sel.bytes;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} {} file(s), {} byte(s)",
        "selected".green().bold(),
        files,
        bytes
    )
}
