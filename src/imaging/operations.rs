//! Variant planning.
//!
//! These functions decide *which* re-encodes an invocation performs, without
//! running any of them. The loader turns each [`EncodeJob`] into one codec
//! call plus one name resolution.

use super::calculations::effective_widths;
use super::params::{EncodeParams, TargetFormat};

/// Width of the inline placeholder, in pixels.
pub const PLACEHOLDER_WIDTH: u32 = 20;

/// One cell of the planned (format × width) matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub format: TargetFormat,
    pub width: u32,
}

impl VariantSpec {
    /// File-name suffix appended to the name prefix, e.g. `640.jpg`.
    pub fn name_suffix(&self) -> String {
        format!("{}.{}", self.width, self.format.extension())
    }
}

/// A scheduled re-encode: either a matrix cell or the placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeJob {
    Variant { spec: VariantSpec, is_default: bool },
    Placeholder,
}

impl EncodeJob {
    pub fn params(&self) -> EncodeParams {
        match self {
            EncodeJob::Variant { spec, .. } => EncodeParams::for_format(spec.format, spec.width),
            EncodeJob::Placeholder => {
                EncodeParams::for_format(TargetFormat::Png, PLACEHOLDER_WIDTH)
            }
        }
    }

    pub fn name_suffix(&self) -> String {
        match self {
            EncodeJob::Variant { spec, .. } => spec.name_suffix(),
            EncodeJob::Placeholder => "placeholder.png".to_string(),
        }
    }
}

/// The format whose tag becomes the descriptor's top-level `type`.
///
/// JPEG when configured, otherwise the first configured format. Returns
/// `None` only for an empty list, which configuration validation rejects.
pub fn default_format(target_formats: &[TargetFormat]) -> Option<TargetFormat> {
    target_formats
        .iter()
        .copied()
        .find(|&f| f == TargetFormat::Jpeg)
        .or_else(|| target_formats.first().copied())
}

/// Whether a matrix cell is the default representation.
///
/// Only the JPEG variant at the source width qualifies. When JPEG is not a
/// target no cell is flagged, even though [`default_format`] falls back to
/// the first configured format.
pub fn is_default_variant(spec: &VariantSpec, source_width: u32) -> bool {
    spec.format == TargetFormat::Jpeg && spec.width == source_width
}

/// Plan the full matrix, format-major then width-minor.
pub fn plan_variants(
    target_formats: &[TargetFormat],
    widths: &[u32],
    source_width: u32,
) -> Vec<VariantSpec> {
    let widths = effective_widths(source_width, widths);
    target_formats
        .iter()
        .flat_map(|&format| widths.iter().map(move |&width| VariantSpec { format, width }))
        .collect()
}

/// Plan every job for one raster invocation: the matrix cells in order,
/// followed by the placeholder.
pub fn plan_jobs(
    target_formats: &[TargetFormat],
    widths: &[u32],
    source_width: u32,
) -> Vec<EncodeJob> {
    plan_variants(target_formats, widths, source_width)
        .into_iter()
        .map(|spec| EncodeJob::Variant {
            spec,
            is_default: is_default_variant(&spec, source_width),
        })
        .chain(std::iter::once(EncodeJob::Placeholder))
        .collect()
}
