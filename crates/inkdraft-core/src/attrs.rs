//! Attribute helpers shared by the canvas header and the element vocabulary.
//!
//! Names are accepted in Rust-friendly `snake_case` and normalized to the
//! hyphenated / namespaced form SVG expects.

/// Normalize an attribute name: `__` → `:`, `_` → `-`, one trailing `-` dropped.
///
/// `xlink__href` becomes `xlink:href`, `stroke_width` becomes `stroke-width`,
/// and `class_` (a keyword-dodging spelling) becomes `class`.
pub fn normalize_name(name: &str) -> String {
    let mut name = name.replace("__", ":").replace('_', "-");
    if name.ends_with('-') {
        name.pop();
    }
    name
}

/// Format a number for SVG output.
///
/// Integral values print without a fractional part and negative zero
/// prints as `0`, so `-0.0 - 100.0` and `-100.0` serialize identically.
pub fn format_num(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Escape text for use inside an attribute value or element body.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Write ` name="value"` pairs, escaping each value.
pub fn write_pairs<'a>(out: &mut String, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (name, value) in pairs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_xml(value));
        out.push('"');
    }
}
