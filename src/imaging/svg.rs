//! SVG sniffing.
//!
//! The `image` crate has no vector support, so SVG inputs are recognized from
//! their text prefix and only the root element's intrinsic size is read.
//! Width and height come from the `width`/`height` attributes when they are
//! unitless or `px`, falling back to the `viewBox` extent.

use regex::Regex;
use std::sync::LazyLock;

/// How far into the input we look for the root `<svg>` element.
const SNIFF_LIMIT: usize = 64 * 1024;

static SVG_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^\s*(?:<\?xml[^>]*\?>\s*)?(?:(?:<!--.*?-->|<!DOCTYPE[^>\[]*(?:\[.*?\])?\s*>)\s*)*<svg\b([^>]*)>"#,
    )
    .expect("svg root pattern must compile")
});

static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)width\s*=\s*["']\s*([0-9]*\.?[0-9]+)\s*(?:px)?\s*["']"#)
        .expect("width pattern must compile")
});

static HEIGHT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)height\s*=\s*["']\s*([0-9]*\.?[0-9]+)\s*(?:px)?\s*["']"#)
        .expect("height pattern must compile")
});

static VIEW_BOX_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|\s)viewBox\s*=\s*["']\s*[-+0-9.eE]+[\s,]+[-+0-9.eE]+[\s,]+([0-9]*\.?[0-9]+)[\s,]+([0-9]*\.?[0-9]+)\s*["']"#,
    )
    .expect("viewBox pattern must compile")
});

/// Intrinsic size of an SVG document, when it declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Return `Some` if `bytes` look like an SVG document.
pub fn sniff_svg(bytes: &[u8]) -> Option<SvgInfo> {
    let head = &bytes[..bytes.len().min(SNIFF_LIMIT)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}');

    let attrs = SVG_ROOT.captures(text)?.get(1)?.as_str();

    let mut width = capture_px(&WIDTH_ATTR, attrs);
    let mut height = capture_px(&HEIGHT_ATTR, attrs);

    if (width.is_none() || height.is_none())
        && let Some(caps) = VIEW_BOX_ATTR.captures(attrs)
    {
        width = width.or_else(|| parse_px(&caps[1]));
        height = height.or_else(|| parse_px(&caps[2]));
    }

    Some(SvgInfo { width, height })
}

fn capture_px(pattern: &Regex, attrs: &str) -> Option<u32> {
    pattern.captures(attrs).and_then(|caps| parse_px(&caps[1]))
}

fn parse_px(value: &str) -> Option<u32> {
    let v: f64 = value.parse().ok()?;
    (v > 0.0).then(|| v.round() as u32)
}
