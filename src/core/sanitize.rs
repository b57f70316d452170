// src/core/sanitize.rs

/// Minimal HTML entity decoding for the entities gradebook cells actually
/// carry: non-breaking spaces, ampersands, and check-mark glyphs used for
/// completed/collected markers.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#10003;", "\u{2713}")
        .replace("&#10004;", "\u{2714}")
        .replace("&check;", "\u{2713}")
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}
