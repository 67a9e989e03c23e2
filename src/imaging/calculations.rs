//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate which widths to produce for a source image.
///
/// Keeps the configured widths strictly narrower than the source, adds the
/// source width itself, and returns them sorted ascending without duplicates.
/// The result is never empty and its maximum is always `source_width`.
///
/// # Examples
/// ```
/// # use responsive_loader::imaging::effective_widths;
/// assert_eq!(effective_widths(1280, &[640, 1280]), vec![640, 1280]);
/// assert_eq!(effective_widths(400, &[1280, 640]), vec![400]);
/// ```
pub fn effective_widths(source_width: u32, widths: &[u32]) -> Vec<u32> {
    let mut result: Vec<u32> = widths
        .iter()
        .copied()
        .filter(|&width| width < source_width)
        .collect();
    result.push(source_width);
    result.sort_unstable();
    result.dedup();
    result
}

/// Height of a resize to `target_width` that keeps the source aspect ratio.
///
/// Rounded to the nearest pixel and never below 1.
pub fn scaled_height(source: (u32, u32), target_width: u32) -> u32 {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return src_h.max(1);
    }
    let h = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    h.max(1)
}
