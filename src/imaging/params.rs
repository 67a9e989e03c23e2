//! Parameter types for encode operations.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between the planner in [`operations`](super::operations), which
//! decides which variants exist, and the [`backend`](super::backend), which
//! does the pixel work. Swapping in a mock codec for tests therefore never
//! touches planning logic.
//!
//! ## Types
//!
//! - [`TargetFormat`]: Output encoding (`jpeg`, `webp`, `png`) with its file extension and MIME type.
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`ChromaSubsampling`]: JPEG chroma layout.
//! - [`EncodeOptions`]: Per-format fixed options.
//! - [`EncodeParams`]: Everything one re-encode needs: format, options, target width.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output encoding for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[serde(alias = "jpg")]
    Jpeg,
    Webp,
    Png,
}

impl TargetFormat {
    /// Tag used in configuration and in the descriptor's top-level `type`.
    pub fn tag(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Webp => "webp",
            TargetFormat::Png => "png",
        }
    }

    /// File extension used when naming emitted variants.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Webp => "webp",
            TargetFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Webp => "image/webp",
            TargetFormat::Png => "image/png",
        }
    }

    /// The fixed encode options every variant of this format is produced with.
    pub fn encode_options(self) -> EncodeOptions {
        match self {
            TargetFormat::Jpeg => EncodeOptions::Jpeg {
                quality: Quality::new(85),
                chroma: ChromaSubsampling::Cs444,
            },
            TargetFormat::Webp => EncodeOptions::Webp {
                quality: Quality::new(85),
            },
            TargetFormat::Png => EncodeOptions::Png,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// JPEG chroma subsampling layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// Full-resolution chroma (no subsampling).
    Cs444,
    Cs420,
}

/// Format-specific encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOptions {
    Jpeg {
        quality: Quality,
        chroma: ChromaSubsampling,
    },
    Webp {
        quality: Quality,
    },
    /// Encoder defaults.
    Png,
}

impl EncodeOptions {
    pub fn format(&self) -> TargetFormat {
        match self {
            EncodeOptions::Jpeg { .. } => TargetFormat::Jpeg,
            EncodeOptions::Webp { .. } => TargetFormat::Webp,
            EncodeOptions::Png => TargetFormat::Png,
        }
    }

    pub fn quality(&self) -> Option<Quality> {
        match self {
            EncodeOptions::Jpeg { quality, .. } | EncodeOptions::Webp { quality } => Some(*quality),
            EncodeOptions::Png => None,
        }
    }
}

/// Parameters for a single re-encode of the full source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeParams {
    pub options: EncodeOptions,
    /// Output width in pixels; height follows the source aspect ratio.
    pub width: u32,
}

impl EncodeParams {
    /// Params for `format` at `width`, using that format's fixed options.
    pub fn for_format(format: TargetFormat, width: u32) -> Self {
        Self {
            options: format.encode_options(),
            width,
        }
    }

    pub fn format(&self) -> TargetFormat {
        self.options.format()
    }
}
