//! # Responsive Loader
//!
//! The core of an asset-pipeline image loader. Given the bytes of one image,
//! it produces resized and re-encoded variants, registers them with the host
//! build pipeline, and returns a descriptor that calling code imports in
//! place of the original asset reference.
//!
//! # Flow
//!
//! ```text
//! bytes ─▶ inspect ─▶ plan (format × width) ─▶ reencode in parallel ─▶ join
//!                                                     │
//!                           names via PipelineContext ┘
//!       ─▶ emit variants ─▶ ImageDescriptor { src, width, height, type,
//!                                             placeholder, responsive_images }
//! ```
//!
//! SVG and unrecognized inputs skip the matrix: they are emitted unchanged
//! under one name.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | Orchestration: [`loader::load`] and [`loader::spawn_load`] |
//! | [`imaging`] | Codec seam ([`imaging::ImageCodec`]), the `image`/`webp` codec, variant planning |
//! | [`pipeline`] | Host capability ([`pipeline::PipelineContext`]) plus filesystem and in-memory hosts |
//! | [`naming`] | Output-name templates (`[name]`, `[hash:8]`, `[path]`, ...) |
//! | [`descriptor`] | The returned value and its JSON / CommonJS module serializations |
//! | [`config`] | `LoaderConfig`, validation, `responsive-loader.toml` loading and layering |
//! | [`batch`] | Directory builds with a `manifest.json` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Host Owns Names and Files
//!
//! The loader never writes files or picks directories. Every output name goes
//! through [`pipeline::PipelineContext::resolve_name`] and every artifact
//! through [`pipeline::PipelineContext::register_artifact`]. The same core runs
//! inside a bundler plugin, the bundled CLI, or a test with
//! [`pipeline::MemoryPipeline`].
//!
//! ## Join Before Emit
//!
//! All re-encodes of one invocation run on the rayon pool and are joined
//! before the first artifact is registered. A single failing job fails the
//! invocation and nothing from it is emitted.
//!
//! ## The Default Variant
//!
//! `src` is the JPEG variant at the source width. The top-level `type` is
//! `jpeg` when JPEG is a target and otherwise the first configured format;
//! in that case no variant is the default and `src` is empty.

pub mod batch;
pub mod config;
pub mod descriptor;
pub mod imaging;
pub mod loader;
pub mod naming;
pub mod output;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_helpers;
