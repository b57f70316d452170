// src/page.rs
//
// The page adapter boundary. The engine never queries the host page
// directly; it consumes a capability interface that yields assignment rows,
// category weights, and the class key. HtmlPage is the concrete adapter for
// a saved gradebook page following the documented cell conventions.

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::core::{html, sanitize};
use crate::session::{ClassKey, RowId};

/// One assignment row as the page exposes it. The score cell is raw markup;
/// parsing happens on demand in the ledger.
#[derive(Clone, Debug)]
pub struct AssignmentRow {
    pub id: RowId,
    pub name: String,
    pub category: String,
    pub score_cell: String,
}

/// One weighted-grading bucket as the page declares it: label, percentage of
/// the final grade, and the saved original per-category score cell.
#[derive(Clone, Debug)]
pub struct CategoryWeight {
    pub label: String,
    pub weight: f64,
    pub original_cell: String,
}

/// Capability interface injected into the session. Implementations own all
/// knowledge of the host page's markup.
pub trait PageAdapter {
    fn class_key(&self) -> ClassKey;
    fn rows(&self) -> &[AssignmentRow];
    /// Empty when the class is not weighted.
    fn category_weights(&self) -> &[CategoryWeight];
}

/// Adapter over one saved gradebook page (HTML file or string).
///
/// Conventions: class key from `<title>` up to the first `|`; assignments in
/// `<table class=assignments>` rows carrying `class="assignment-row"` with
/// `td` cells classed `name`/`category`/`score`; weights in
/// `<table class=weights>` rows carrying `class="weight-row"` with `td`
/// cells classed `category`/`weight`/`points`.
pub struct HtmlPage {
    class: ClassKey,
    rows: Vec<AssignmentRow>,
    weights: Vec<CategoryWeight>,
}

impl HtmlPage {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let doc = fs::read_to_string(path)?;
        Self::from_html(&doc)
    }

    pub fn from_html(doc: &str) -> Result<Self, Box<dyn Error>> {
        let class = extract_class_key(doc);

        let table = find_table(doc, "assignments").ok_or("assignments table not found")?;
        let mut rows = Vec::new();
        let mut pos = 0usize;
        let mut next_id = 0u32;
        while let Some((tr_s, tr_e)) = html::next_tag_block_ci(table, "<tr", "</tr>", pos) {
            let tr = &table[tr_s..tr_e];
            pos = tr_e;
            if !html::has_class(tr, "assignment-row") { continue; }

            let mut name = s!();
            let mut category = s!();
            let mut score_cell = s!();
            let mut td_pos = 0usize;
            while let Some((td_s, td_e)) = html::next_tag_block_ci(tr, "<td", "</td>", td_pos) {
                let block = &tr[td_s..td_e];
                td_pos = td_e;
                let inner = html::inner_after_open_tag(block);
                if html::has_class(block, "name") {
                    name = html::strip_tags(sanitize::normalize_entities(&inner));
                } else if html::has_class(block, "category") {
                    category = html::strip_tags(sanitize::normalize_entities(&inner));
                } else if html::has_class(block, "score") {
                    // Keep markup: the parser strips buttons/tags itself.
                    score_cell = inner;
                }
            }
            rows.push(AssignmentRow {
                id: RowId::Original(next_id),
                name,
                category,
                score_cell,
            });
            next_id += 1;
        }

        let mut weights = Vec::new();
        if let Some(wt) = find_table(doc, "weights") {
            let mut pos = 0usize;
            while let Some((tr_s, tr_e)) = html::next_tag_block_ci(wt, "<tr", "</tr>", pos) {
                let tr = &wt[tr_s..tr_e];
                pos = tr_e;
                if !html::has_class(tr, "weight-row") { continue; }

                let mut label = s!();
                let mut weight = 0.0f64;
                let mut original_cell = s!();
                let mut td_pos = 0usize;
                while let Some((td_s, td_e)) = html::next_tag_block_ci(tr, "<td", "</td>", td_pos) {
                    let block = &tr[td_s..td_e];
                    td_pos = td_e;
                    let text = html::strip_tags(sanitize::normalize_entities(
                        &html::inner_after_open_tag(block),
                    ));
                    if html::has_class(block, "category") {
                        label = text;
                    } else if html::has_class(block, "weight") {
                        weight = leading_number(&text).unwrap_or(0.0);
                    } else if html::has_class(block, "points") {
                        original_cell = text;
                    }
                }
                if label.is_empty() { continue; }
                weights.push(CategoryWeight { label, weight, original_cell });
            }
        }

        logf!("page: class '{}', {} rows, {} weighted categories",
            class, rows.len(), weights.len());
        Ok(Self { class, rows, weights })
    }
}

impl PageAdapter for HtmlPage {
    fn class_key(&self) -> ClassKey {
        self.class.clone()
    }

    fn rows(&self) -> &[AssignmentRow] {
        &self.rows
    }

    fn category_weights(&self) -> &[CategoryWeight] {
        &self.weights
    }
}

/// Locate `<table class=NAME ...>…</table>` regardless of quoting style.
fn find_table<'a>(doc: &'a str, name: &str) -> Option<&'a str> {
    for open in [
        format!("<table class={name}"),
        format!(r#"<table class="{name}""#),
        format!("<table class='{name}'"),
    ] {
        if let Some(inner) = html::slice_between_ci(doc, &open, "</table>") {
            return Some(inner);
        }
    }
    None
}

fn extract_class_key(doc: &str) -> ClassKey {
    if let Some(title) = html::slice_between_ci(doc, "<title", "</title>") {
        let t = sanitize::normalize_ws(&sanitize::normalize_entities(title));
        let t = t.split('|').next().unwrap_or("").trim();
        if !t.is_empty() {
            return ClassKey::new(t);
        }
    }
    ClassKey::new("Class")
}

/// First number in the text, e.g. "50%" -> 50.
fn leading_number(t: &str) -> Option<f64> {
    let b = t.as_bytes();
    let start = b.iter().position(|c| c.is_ascii_digit())?;
    let mut end = start;
    let mut seen_dot = false;
    while end < b.len() {
        if b[end].is_ascii_digit() {
            end += 1;
        } else if b[end] == b'.' && !seen_dot {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    t[start..end].parse().ok()
}
