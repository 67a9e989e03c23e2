//! Image codec seam and variant planning.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Inspect** | `image::guess_format` + header dimensions, SVG sniffing |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | `image` (JPEG, PNG), `webp` (lossy WebP) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for width/height math (unit testable)
//! - **Parameters**: Formats and per-format encode options
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: The (format × width) matrix and placeholder job

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
mod svg;

pub use backend::{CodecError, DetectedFormat, ImageCodec, SourceMetadata};
pub use calculations::{effective_widths, scaled_height};
pub use operations::{
    EncodeJob, PLACEHOLDER_WIDTH, VariantSpec, default_format, is_default_variant, plan_jobs,
    plan_variants,
};
pub use params::{ChromaSubsampling, EncodeOptions, EncodeParams, Quality, TargetFormat};
pub use rust_backend::RustCodec;
pub use svg::{SvgInfo, sniff_svg};
