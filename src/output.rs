//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each asset leads with its positional index and source path, with the
//! chosen default and every variant shown as indented context lines. The
//! output reads as an inventory of what was produced.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! 001 hero/dawn.jpg (1280x720, jpeg)
//!     src: dawn.1280.jpg
//!     640w image/jpeg → dawn.640.jpg
//!     1280w image/jpeg → dawn.1280.jpg
//!     640w image/webp → dawn.640.webp
//!     1280w image/webp → dawn.1280.webp
//!     placeholder: 468 bytes inline
//! 002 logo.svg (120x40, svg)
//!     src: logo.svg (pass-through)
//!
//! Skipped
//!     broken.jpg: Failed to decode image: ...
//!
//! Built 2 assets, 5 artifacts, 1 skipped
//! ```
//!
//! ## Load (dry run)
//!
//! ```text
//! Artifacts
//!     dawn.640.jpg (48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::batch::{BatchReport, BuiltAsset};
use crate::descriptor::ImageDescriptor;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1280x720`, or `size unknown` for the `-1` sentinels.
fn format_dimensions(descriptor: &ImageDescriptor) -> String {
    if descriptor.width < 0 || descriptor.height < 0 {
        "size unknown".to_string()
    } else {
        format!("{}x{}", descriptor.width, descriptor.height)
    }
}

/// Header plus context lines for one descriptor.
pub fn format_descriptor(index: usize, source: &str, descriptor: &ImageDescriptor) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}, {})",
        format_index(index),
        source,
        format_dimensions(descriptor),
        descriptor.image_type
    )];

    let Some(images) = &descriptor.responsive_images else {
        lines.push(format!("{}src: {} (pass-through)", indent(1), descriptor.src));
        return lines;
    };

    if descriptor.src.is_empty() {
        lines.push(format!("{}src: (none)", indent(1)));
    } else {
        lines.push(format!("{}src: {}", indent(1), descriptor.src));
    }
    for image in images {
        lines.push(format!(
            "{}{}w {} \u{2192} {}",
            indent(1),
            image.width,
            image.mime_type,
            image.src
        ));
    }
    if let Some(placeholder) = &descriptor.placeholder {
        lines.push(format!(
            "{}placeholder: {} bytes inline",
            indent(1),
            placeholder.len()
        ));
    }
    lines
}

fn format_asset(index: usize, asset: &BuiltAsset) -> Vec<String> {
    format_descriptor(index, &asset.source, &asset.descriptor)
}

/// Format the result of a directory build.
pub fn format_build_report(report: &BatchReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .assets
        .iter()
        .enumerate()
        .flat_map(|(i, asset)| format_asset(i + 1, asset))
        .collect();

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &report.skipped {
            lines.push(format!("{}{}: {}", indent(1), skipped.source, skipped.error));
        }
    }

    lines.push(String::new());
    let mut summary = format!(
        "Built {} asset{}, {} artifact{}",
        report.assets.len(),
        plural(report.assets.len()),
        report.artifact_count(),
        plural(report.artifact_count())
    );
    if !report.skipped.is_empty() {
        summary.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    lines.push(summary);
    lines
}

pub fn print_build_report(report: &BatchReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

/// Format artifacts held by an in-memory host: `(name, size)` pairs.
pub fn format_artifacts(artifacts: &[(String, usize)]) -> Vec<String> {
    let mut lines = vec!["Artifacts".to_string()];
    if artifacts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (name, size) in artifacts {
        lines.push(format!("{}{} ({} bytes)", indent(1), name, size));
    }
    lines
}

/// Artifact listings go to stderr so stdout stays machine-readable.
pub fn print_artifacts(artifacts: &[(String, usize)]) {
    for line in format_artifacts(artifacts) {
        eprintln!("{}", line);
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SkippedAsset;
    use crate::descriptor::ResponsiveImage;

    fn raster() -> ImageDescriptor {
        ImageDescriptor {
            src: "dawn.1280.jpg".into(),
            width: 1280,
            height: 720,
            image_type: "jpeg".into(),
            placeholder: Some("data:image/png;base64,AAAA".into()),
            responsive_images: Some(vec![
                ResponsiveImage {
                    src: "dawn.640.jpg".into(),
                    width: 640,
                    mime_type: "image/jpeg".into(),
                },
                ResponsiveImage {
                    src: "dawn.1280.webp".into(),
                    width: 1280,
                    mime_type: "image/webp".into(),
                },
            ]),
        }
    }

    fn svg() -> ImageDescriptor {
        ImageDescriptor {
            src: "logo.svg".into(),
            width: -1,
            height: -1,
            image_type: "svg".into(),
            placeholder: None,
            responsive_images: None,
        }
    }

    fn asset(source: &str, descriptor: ImageDescriptor, artifacts: usize) -> BuiltAsset {
        BuiltAsset {
            source: source.into(),
            descriptor,
            artifacts: (0..artifacts).map(|i| format!("a{}", i)).collect(),
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn raster_descriptor_lines() {
        let lines = format_descriptor(1, "hero/dawn.jpg", &raster());
        assert_eq!(
            lines,
            vec![
                "001 hero/dawn.jpg (1280x720, jpeg)",
                "    src: dawn.1280.jpg",
                "    640w image/jpeg \u{2192} dawn.640.jpg",
                "    1280w image/webp \u{2192} dawn.1280.webp",
                "    placeholder: 26 bytes inline",
            ]
        );
    }

    #[test]
    fn passthrough_descriptor_lines() {
        let lines = format_descriptor(2, "logo.svg", &svg());
        assert_eq!(
            lines,
            vec![
                "002 logo.svg (size unknown, svg)",
                "    src: logo.svg (pass-through)"
            ]
        );
    }

    #[test]
    fn missing_default_is_shown() {
        let mut descriptor = raster();
        descriptor.src = String::new();
        let lines = format_descriptor(1, "a.jpg", &descriptor);
        assert_eq!(lines[1], "    src: (none)");
    }

    #[test]
    fn build_report_summary() {
        let report = BatchReport {
            assets: vec![asset("a.jpg", raster(), 4), asset("logo.svg", svg(), 1)],
            skipped: vec![],
        };
        let lines = format_build_report(&report);
        assert_eq!(lines.last().unwrap(), "Built 2 assets, 5 artifacts");
        assert!(lines.iter().any(|l| l.starts_with("002 logo.svg")));
        assert!(!lines.iter().any(|l| l == "Skipped"));
    }

    #[test]
    fn build_report_lists_skipped() {
        let report = BatchReport {
            assets: vec![asset("logo.svg", svg(), 1)],
            skipped: vec![SkippedAsset {
                source: "broken.jpg".into(),
                error: "Failed to decode image: eof".into(),
            }],
        };
        let lines = format_build_report(&report);
        assert!(lines.contains(&"Skipped".to_string()));
        assert!(lines.contains(&"    broken.jpg: Failed to decode image: eof".to_string()));
        assert_eq!(lines.last().unwrap(), "Built 1 asset, 1 artifact, 1 skipped");
    }

    #[test]
    fn artifact_listing() {
        assert_eq!(format_artifacts(&[]), vec!["Artifacts", "    (none)"]);
        assert_eq!(
            format_artifacts(&[("a.640.jpg".into(), 42)]),
            vec!["Artifacts", "    a.640.jpg (42 bytes)"]
        );
    }
}
