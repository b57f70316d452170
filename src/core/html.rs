// src/core/html.rs
// Low-level HTML string manipulation helpers.
// These are deliberately naive but tailored to the gradebook table markup
// described in the page conventions. Case-insensitive on ASCII tag names.

/// Find the section between an opening tag (with attributes) and its matching
/// closing tag, case-insensitive. Returns the HTML *inside* the tags.
///
/// Example:
/// ```text
/// let table_inner = slice_between_ci(html, "<table class=assignments", "</table>");
/// ```
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = to_lowercase_fast(s);
    let open_lc = to_lowercase_fast(open_pat);
    let close_lc = to_lowercase_fast(close_pat);

    let open_idx = lc.find(&open_lc)?;
    // Jump past the '>' of the opening tag
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_idx_rel = lc[after_open..].find(&close_lc)?;
    Some(&s[after_open..after_open + close_idx_rel])
}

/// Find the next complete tag block from `from` onwards, case-insensitive.
/// A block runs from the start of the opening tag to the end of the closing tag,
/// e.g. `<tr ...> ... </tr>` or `<td ...> ... </td>`.
pub fn next_tag_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lowercase_fast(s);
    let open_lc = to_lowercase_fast(open_tag);
    let close_lc = to_lowercase_fast(close_tag);

    let start = lc.get(from..)?.find(&open_lc)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_lc)?;
    let end = open_end + end_rel + close_tag.len();
    Some((start, end))
}

/// Given a complete tag block like `<td ...>INNER</td>`,
/// return the INNER markup without the wrapping tags.
pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return block[open_end + 1..close_start].to_string();
            }
        }
    }
    String::new()
}

/// The opening tag of a block, lowercased: `<td class="score" ...`.
/// Used to match `class=` markers without caring about quoting style.
pub fn open_tag_lc(block: &str) -> String {
    let end = block.find('>').map(|i| i + 1).unwrap_or(block.len());
    to_lowercase_fast(&block[..end])
}

/// True if the opening tag of `block` carries the given class token,
/// in either `class=foo`, `class="foo"` or `class='foo'` form.
pub fn has_class(block: &str, class: &str) -> bool {
    let open = open_tag_lc(block);
    let class = to_lowercase_fast(class);
    open.contains(&format!("class={class}"))
        || open.contains(&format!(r#"class="{class}""#))
        || open.contains(&format!("class='{class}'"))
}

/// Remove every `<open>…</close>` block from the string, case-insensitive.
/// Used to drop interactive controls (edit buttons) embedded in score cells
/// before reading the visible text.
pub fn remove_tag_blocks_ci(s: &str, open_tag: &str, close_tag: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pos = 0usize;
    while let Some((b_s, b_e)) = next_tag_block_ci(s, open_tag, close_tag, pos) {
        out.push_str(&s[pos..b_s]);
        pos = b_e;
    }
    out.push_str(&s[pos..]);
    out
}

/// Remove all HTML tags `<...>` from the string, then collapse whitespace.
pub fn strip_tags(s: String) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Fast ASCII-only lowercasing for tag/attribute matching.
pub fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
