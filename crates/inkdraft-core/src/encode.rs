//! Data-URI encoders for serialized SVG and PNG bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Control characters that stop an embedded SVG from rendering even when escaped.
pub const STRIP_CHARS: &str = "\x00\x01\x02\x03\x04\x05\x06\x07\x08\x0b\x0c\x0e\x0f\x10\x11\
\x12\x13\x14\x15\x16\x17\x18\x19\x1a\x1b\x1c\x1d\x1e\x1f";

/// Characters percent-escaped in UTF-8 data URIs regardless of caller choice.
///
/// `#` and `&` break URI parsing; an unescaped `%` would let text such as
/// `%50` decode to `P`.
pub const ALWAYS_ESCAPED: &str = "#&%";

pub const SVG_BASE64_PREFIX: &str = "data:image/svg+xml;base64,";
pub const SVG_UTF8_PREFIX: &str = "data:image/svg+xml;utf8,";
pub const PNG_BASE64_PREFIX: &str = "data:image/png;base64,";

/// Remove every character in `strip_chars` from `data`.
pub fn strip(data: &str, strip_chars: &str) -> String {
    data.chars().filter(|c| !strip_chars.contains(*c)).collect()
}

/// `data:image/svg+xml;base64,...` after stripping `strip_chars`.
pub fn svg_data_uri_base64(svg: &str, strip_chars: &str) -> String {
    let safe = strip(svg, strip_chars);
    let mut uri = String::with_capacity(SVG_BASE64_PREFIX.len() + safe.len() * 4 / 3 + 4);
    uri.push_str(SVG_BASE64_PREFIX);
    STANDARD.encode_string(safe.as_bytes(), &mut uri);
    uri
}

/// `data:image/svg+xml;utf8,...` with `unsafe_chars` and [`ALWAYS_ESCAPED`]
/// percent-encoded and `strip_chars` removed. A character listed in both
/// sets is stripped.
pub fn svg_data_uri_utf8(svg: &str, unsafe_chars: &str, strip_chars: &str) -> String {
    let mut uri = String::with_capacity(SVG_UTF8_PREFIX.len() + svg.len());
    uri.push_str(SVG_UTF8_PREFIX);
    let mut buf = [0u8; 4];
    for c in svg.chars() {
        if strip_chars.contains(c) {
            continue;
        }
        if ALWAYS_ESCAPED.contains(c) || unsafe_chars.contains(c) {
            for byte in c.encode_utf8(&mut buf).bytes() {
                uri.push_str(&format!("%{byte:02X}"));
            }
        } else {
            uri.push(c);
        }
    }
    uri
}

/// `data:image/png;base64,...`.
pub fn png_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(PNG_BASE64_PREFIX.len() + png.len() * 4 / 3 + 4);
    uri.push_str(PNG_BASE64_PREFIX);
    STANDARD.encode_string(png, &mut uri);
    uri
}
