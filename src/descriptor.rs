//! The value handed back to the caller of one invocation.
//!
//! An [`ImageDescriptor`] has two serializations, both derived from the same
//! fields:
//!
//! - **Structured**: [`to_json`](ImageDescriptor::to_json), the plain record.
//! - **Module source**: [`to_module_source`](ImageDescriptor::to_module_source),
//!   a CommonJS module whose `toString` yields only the URL, so stylesheet
//!   consumers interpolating the import get `url(...)`-ready text.
//!
//! `Display` also yields only the `src`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the responsive set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveImage {
    pub src: String,
    pub width: u32,
    /// MIME type, e.g. `image/webp`.
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Result of loading one image.
///
/// For raster inputs `placeholder` and `responsive_images` are always set.
/// Pass-through inputs (SVG, unrecognized) carry neither, and use `-1` for
/// unknown dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub src: String,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "type")]
    pub image_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub responsive_images: Option<Vec<ResponsiveImage>>,
}

impl ImageDescriptor {
    pub fn is_passthrough(&self) -> bool {
        self.responsive_images.is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render as a CommonJS module.
    ///
    /// Every `src` becomes `<public_path> + "<name>"`, where `public_path`
    /// is a JavaScript expression evaluated by the consumer.
    pub fn to_module_source(&self, public_path: &str) -> String {
        let url = |name: &str| format!("{} + {}", public_path, js_string(name));
        let src = url(&self.src);

        let mut fields = vec![
            format!("src: {}", src),
            format!("width: {}", self.width),
            format!("height: {}", self.height),
            format!("type: {}", js_string(&self.image_type)),
        ];
        if let Some(placeholder) = &self.placeholder {
            fields.push(format!("placeholder: {}", js_string(placeholder)));
        }
        if let Some(images) = &self.responsive_images {
            let entries: Vec<String> = images
                .iter()
                .map(|image| {
                    format!(
                        "{{ src: {}, width: {}, type: {} }}",
                        url(&image.src),
                        image.width,
                        js_string(&image.mime_type)
                    )
                })
                .collect();
            fields.push(format!("responsive_images: [{}]", entries.join(", ")));
        }

        format!(
            "module.exports = {{\n  {},\n}};\nmodule.exports.toString = function() {{\n  return {};\n}};\n",
            fields.join(",\n  "),
            src
        )
    }
}

impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}

/// Quote `s` as a JavaScript string literal. JSON string syntax is valid JS.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
