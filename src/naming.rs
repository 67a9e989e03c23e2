//! Output-name templates.
//!
//! Every emitted file name comes from a template such as `[name].[hash:7].640.jpg`.
//! Bracketed tokens are replaced from the resource path and the bytes being
//! named; everything else is copied through.
//!
//! ## Tokens
//!
//! | Token | Value |
//! |---|---|
//! | `[name]` | resource file stem (`photos/dawn.jpg` → `dawn`) |
//! | `[ext]` | resource extension without the dot |
//! | `[path]` | resource directory relative to the context, with a trailing `/` (empty at the root) |
//! | `[folder]` | name of the resource's parent directory |
//! | `[hash]`, `[contenthash]` | SHA-256 of the content, hex |
//! | `[hash:N]` | the same, truncated to `N` characters |
//! | `[<type>:hash:<digest>:<N>]` | `type` is `sha256` or `sha512`, `digest` is `hex`, `base64` (URL-safe, unpadded) or one of `base26` `base32` `base36` `base49` `base52` `base58` `base62`; each part optional |
//! | `[N]` | capture group `N` of the configured pattern matched against the resource path |
//!
//! Unknown tokens, and capture tokens the pattern did not fill, are left as-is.
//! Hash types other than `sha256` and `sha512` (`md4`, `md5`, `sha1`, ...) are
//! rejected with [`NamingError::UnsupportedHash`].

use base64::{Engine as _, engine::general_purpose};
use regex::{Captures, Regex};
use sha2::{Digest, Sha256, Sha512};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("Unsupported hash type in name template: {0}")]
    UnsupportedHash(String),
    #[error("Unsupported digest type in name template: {0}")]
    UnsupportedDigest(String),
    #[error("Invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("token pattern must compile"));

static HASH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<kind>[a-z0-9]+):)?(?:hash|contenthash)(?::(?P<digest>[a-z][a-z0-9]*))?(?::(?P<len>\d+))?$",
    )
    .expect("hash token pattern must compile")
});

/// Everything a template can draw from.
#[derive(Debug, Clone, Copy)]
pub struct NameSource<'a> {
    /// Path of the asset being loaded.
    pub resource: &'a Path,
    /// Base directory for `[path]`.
    pub context: &'a Path,
    /// Bytes the name is derived from (hash tokens).
    pub content: &'a [u8],
    /// Pattern whose captures fill `[N]` tokens.
    pub pattern: Option<&'a Regex>,
}

/// Replace every token in `template`.
pub fn interpolate_name(template: &str, source: &NameSource<'_>) -> Result<String, NamingError> {
    let resource = source.resource.to_string_lossy();
    let captures = source.pattern.and_then(|p| p.captures(&resource));

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in TOKEN.captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always present");
        out.push_str(&template[last..whole.start()]);
        match expand_token(&caps[1], source, captures.as_ref())? {
            Some(value) => out.push_str(&value),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

fn expand_token(
    token: &str,
    source: &NameSource<'_>,
    captures: Option<&Captures<'_>>,
) -> Result<Option<String>, NamingError> {
    let value = match token {
        "name" => source
            .resource
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned()),
        "ext" => Some(
            source
                .resource
                .extension()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ),
        "path" => Some(relative_dir(source.resource, source.context)),
        "folder" => source
            .resource
            .parent()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned()),
        t if t.bytes().all(|b| b.is_ascii_digit()) => {
            let index: usize = t.parse().unwrap_or(usize::MAX);
            captures
                .and_then(|c| c.get(index))
                .map(|m| m.as_str().to_string())
        }
        t => match HASH_TOKEN.captures(t) {
            Some(hash) => Some(content_hash(
                source.content,
                hash.name("kind").map_or("sha256", |m| m.as_str()),
                hash.name("digest").map_or("hex", |m| m.as_str()),
                hash.name("len").and_then(|m| m.as_str().parse().ok()),
            )?),
            None => None,
        },
    };
    Ok(value)
}

/// Directory of `resource` relative to `context`, `/`-separated with a
/// trailing slash. Empty when the resource sits directly in the context.
fn relative_dir(resource: &Path, context: &Path) -> String {
    let Some(parent) = resource.parent() else {
        return String::new();
    };
    let relative = parent.strip_prefix(context).unwrap_or(parent);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("{}/", parts.join("/"))
    }
}

/// Alphabets for the `baseN` digests.
const BASE_ALPHABETS: &[(&str, &str)] = &[
    ("base26", "abcdefghijklmnopqrstuvwxyz"),
    ("base32", "123456789abcdefghjkmnpqrstuvwxyz"),
    ("base36", "0123456789abcdefghijklmnopqrstuvwxyz"),
    ("base49", "abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ"),
    ("base52", "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"),
    ("base58", "123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ"),
    ("base62", "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"),
];

/// Render `bytes` as a number in the alphabet's base, most significant
/// digit first. The last byte is the most significant.
fn encode_base(bytes: &[u8], alphabet: &str) -> String {
    let symbols: Vec<char> = alphabet.chars().collect();
    let base = symbols.len() as u32;
    let mut number: Vec<u8> = bytes.iter().rev().copied().collect();
    let mut digits = Vec::new();
    while number.iter().any(|&b| b != 0) {
        let mut remainder = 0u32;
        for byte in number.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / base) as u8;
            remainder = acc % base;
        }
        digits.push(symbols[remainder as usize]);
    }
    if digits.is_empty() {
        digits.push(symbols[0]);
    }
    digits.iter().rev().collect()
}

/// Hash `content` and render it with the requested digest, optionally truncated.
pub fn content_hash(
    content: &[u8],
    kind: &str,
    digest: &str,
    max_len: Option<usize>,
) -> Result<String, NamingError> {
    let raw: Vec<u8> = match kind {
        "sha256" => Sha256::digest(content).to_vec(),
        "sha512" => Sha512::digest(content).to_vec(),
        other => return Err(NamingError::UnsupportedHash(other.to_string())),
    };
    let mut rendered = match digest {
        "hex" => raw.iter().map(|b| format!("{:02x}", b)).collect::<String>(),
        "base64" => general_purpose::URL_SAFE_NO_PAD.encode(&raw),
        other => match BASE_ALPHABETS.iter().find(|(name, _)| *name == other) {
            Some((_, alphabet)) => encode_base(&raw, alphabet),
            None => return Err(NamingError::UnsupportedDigest(other.to_string())),
        },
    };
    if let Some(len) = max_len {
        rendered.truncate(len);
    }
    Ok(rendered)
}
