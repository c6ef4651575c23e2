//! CLI output formatting for the inspection commands.
//!
//! # Information-First Display
//!
//! Every entity (an asset from a catalog, a probed file) leads with its
//! positional index and identity. Sources, dimensions and paths follow as
//! indented context lines, so the output reads as an inventory while still
//! tracing back to URLs and files.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! ```text
//! 001 a1 (regular)
//!     Primary: r.webp (regular)
//!     Placeholder: t.jpg
//!     Fallback: r.jpg
//!     image/webp: s.webp 400w, r.webp 1080w
//!     image/jpeg: s.jpg 400w, r.jpg 1080w
//! 002 a2 (regular)
//!     No displayable source
//!
//! Resolved 2 assets, 1 unavailable
//! ```
//!
//! ## Classify
//!
//! ```text
//! 001 dawn: portrait (800x1200)
//!     Source: photos/dawn.jpg
//! 002 pier: landscape (1600x900)
//!     Source: photos/pier.avif
//!     Skipped: photos/broken.jpg (corrupt image data: ...)
//!
//! Classified 2 images: 1 portrait, 1 landscape, 0 square (1 skipped)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::orientation::Orientation;
use crate::resolver::ResolvedSources;
use crate::types::{AssetId, Dimensions};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_dimensions(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// resolve
// ============================================================================

/// Format resolved sources for each asset of a catalog, in catalog order.
pub fn format_resolved(resolved: &[(AssetId, ResolvedSources)]) -> Vec<String> {
    let mut lines = Vec::new();
    let ctx = indent(1);
    let mut unavailable = 0;

    for (i, (id, sources)) in resolved.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            id,
            sources.requested
        ));

        if !sources.is_displayable() {
            unavailable += 1;
            lines.push(format!("{ctx}No displayable source"));
            continue;
        }

        match sources.primary_bucket {
            Some(bucket) => lines.push(format!("{ctx}Primary: {} ({bucket})", sources.primary)),
            None => lines.push(format!("{ctx}Primary: {}", sources.primary)),
        }
        if let Some(placeholder) = &sources.placeholder {
            lines.push(format!("{ctx}Placeholder: {placeholder}"));
        }
        if !sources.fallback.is_empty() {
            lines.push(format!("{ctx}Fallback: {}", sources.fallback));
        }
        for set in &sources.source_sets {
            lines.push(format!("{ctx}{}: {}", set.format.mime_type(), set.srcset()));
        }
    }

    if !resolved.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Resolved {}, {} unavailable",
        plural(resolved.len(), "asset", "assets"),
        unavailable
    ));
    lines
}

/// Print resolve output to stdout.
pub fn print_resolved(resolved: &[(AssetId, ResolvedSources)]) {
    for line in format_resolved(resolved) {
        println!("{}", line);
    }
}

// ============================================================================
// classify
// ============================================================================

/// One probed file and the orientation the store settled on for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFile {
    pub id: AssetId,
    pub source: String,
    pub dimensions: Dimensions,
    pub orientation: Orientation,
}

/// A file that could not be probed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub source: String,
    pub reason: String,
}

pub fn format_classified(classified: &[ClassifiedFile], skipped: &[SkippedFile]) -> Vec<String> {
    let mut lines = Vec::new();
    let ctx = indent(1);

    for (i, file) in classified.iter().enumerate() {
        lines.push(format!(
            "{} {}: {} ({})",
            format_index(i + 1),
            file.id,
            file.orientation,
            format_dimensions(file.dimensions)
        ));
        lines.push(format!("{ctx}Source: {}", file.source));
    }
    for file in skipped {
        lines.push(format!("{ctx}Skipped: {} ({})", file.source, file.reason));
    }

    let count = |o: Orientation| classified.iter().filter(|f| f.orientation == o).count();
    let mut summary = format!(
        "Classified {}: {} portrait, {} landscape, {} square",
        plural(classified.len(), "image", "images"),
        count(Orientation::Portrait),
        count(Orientation::Landscape),
        count(Orientation::Square),
    );
    if !skipped.is_empty() {
        summary.push_str(&format!(" ({} skipped)", skipped.len()));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(summary);
    lines
}

/// Print classify output to stdout.
pub fn print_classified(classified: &[ClassifiedFile], skipped: &[SkippedFile]) {
    for line in format_classified(classified, skipped) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
