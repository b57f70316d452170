// src/present.rs
//
// Presentation contract: what the engine hands to whatever renders the
// overlay. Plain serializable data; no rendering logic beyond a compact
// text form for terminal output.

use serde::Serialize;

use crate::score;

/// The injected grade display for one class.
#[derive(Clone, Debug, Serialize)]
pub struct GradeDisplay {
    /// Non-negative integer; may exceed 100 under pure extra credit.
    pub percent: u32,
    pub letter: char,
}

/// One weighted-category overlay line.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryLine {
    pub label: String,
    pub weight: f64,
    pub earned: f64,
    pub total: f64,
    /// None when the category has no real contribution.
    pub percent: Option<u32>,
    pub letter: Option<char>,
}

/// Render state for one row: the literal earned/total pair plus the
/// modified flag driving highlighting.
#[derive(Clone, Debug, Serialize)]
pub struct RowRender {
    pub row: String,
    pub name: String,
    pub category: String,
    pub display: String,
    pub modified: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassReport {
    pub class: String,
    pub mode: String,
    pub grade: GradeDisplay,
    pub categories: Vec<CategoryLine>,
    pub rows: Vec<RowRender>,
}

impl ClassReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Compact terminal rendering of the report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} ({}): {}% {}\n",
            self.class, self.mode, self.grade.percent, self.grade.letter
        ));
        for c in &self.categories {
            let pct = match (c.percent, c.letter) {
                (Some(p), Some(l)) => format!("{p}% {l}"),
                _ => s!("--"),
            };
            out.push_str(&format!(
                "  {:<16} {:>5}%  {:>8}  {}\n",
                c.label,
                score::fmt_points(c.weight),
                format!("{}/{}", score::fmt_points(c.earned), score::fmt_points(c.total)),
                pct
            ));
        }
        for r in &self.rows {
            let mark = if r.modified { "*" } else { " " };
            out.push_str(&format!(
                " {mark}{:<20} {:<14} {:<12} {}\n",
                r.row, r.category, r.display, r.name
            ));
        }
        out
    }
}
