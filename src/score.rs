// src/score.rs
//
// Score-cell parsing. Gradebook score cells are loosely structured: plain
// fractions ("40 / 50"), bare numbers, completion marks, and a family of
// excluded markers (NG, Z, X, *, EXC, check-marks) that mean the assignment
// is not currently counted. This module turns any such cell into a
// normalized ScoreSnapshot, and owns the fixed letter-grade tables.

use crate::core::{VisChars, html, sanitize};

/// As-displayed state of one score cell, captured once and treated as
/// immutable ground truth for that row thereafter.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreSnapshot {
    pub earned_text: String,
    pub total_text: String,
    pub earned: Option<f64>,
    pub total: Option<f64>,
    pub was_excluded: bool,
}

impl ScoreSnapshot {
    /// True when the cell held no recoverable numeric data at all.
    pub fn is_blank(&self) -> bool {
        self.earned.is_none() && self.total.is_none()
    }

    /// Earned/total as numbers, for cells that carry a countable score.
    pub fn points(&self) -> Option<(f64, f64)> {
        match (self.earned, self.total) {
            (Some(e), Some(t)) => Some((e, t)),
            _ => None,
        }
    }
}

const CHECK_MARKS: [char; 3] = ['\u{2713}', '\u{2714}', '\u{2611}'];

/// Parse one raw score cell (text or markup) into a ScoreSnapshot.
///
/// Priority order: strip embedded controls, test the excluded-marker set,
/// then fall through increasingly permissive numeric readings. A cell with
/// no usable denominator is always flagged excluded so that downstream
/// aggregation never divides by zero.
pub fn parse_score_cell(raw: &str) -> ScoreSnapshot {
    // Edit buttons live inside the cell on some themes; drop them first.
    let no_buttons = html::remove_tag_blocks_ci(raw, "<button", "</button>");
    let text: String = VisChars::new(&sanitize::normalize_entities(&no_buttons)).collect();
    let text = sanitize::normalize_ws(&text);
    let upper = text.to_uppercase();

    let mut snap = ScoreSnapshot {
        earned_text: text.clone(),
        total_text: s!(),
        earned: None,
        total: None,
        was_excluded: false,
    };

    let fraction = find_fraction(&upper);

    if matches_excluded(&upper) && fraction.is_none() {
        // Not counted. Earned is 0 by convention; the denominator may still
        // be recoverable from a trailing "/ N" ("NG / 100").
        snap.was_excluded = true;
        snap.earned = Some(0.0);
        snap.total = trailing_denominator(&upper);
        if let Some(t) = snap.total {
            snap.total_text = fmt_points(t);
        }
        logd!("score: excluded cell '{}' total={:?}", text, snap.total);
    } else if let Some((e, t)) = fraction {
        snap.earned = Some(e);
        snap.total = Some(t);
        snap.earned_text = fmt_points(e);
        snap.total_text = fmt_points(t);
    } else {
        let nums = standalone_numbers(&upper);
        match nums.len() {
            0 => {
                // No numeric information at all. Leave both sides None and
                // let the caller surface the failure.
                loge!("score: unparseable cell '{}'", text);
            }
            1 => {
                let n = nums[0];
                if upper.contains('/') {
                    // "/ 50" style: a denominator with nothing earned yet.
                    snap.was_excluded = true;
                    snap.earned = Some(0.0);
                    snap.total = Some(n);
                    snap.total_text = fmt_points(n);
                } else {
                    // Percent-complete literal: earned == total.
                    snap.earned = Some(n);
                    snap.total = Some(n);
                    snap.earned_text = fmt_points(n);
                    snap.total_text = fmt_points(n);
                }
            }
            _ => {
                snap.earned = Some(nums[0]);
                snap.total = Some(nums[1]);
                snap.earned_text = fmt_points(nums[0]);
                snap.total_text = fmt_points(nums[1]);
            }
        }
    }

    if snap.total.is_none() && snap.earned.is_some() && !snap.was_excluded {
        snap.total = snap.earned;
        snap.total_text = snap.earned_text.clone();
    }

    // Guard divide-by-zero downstream: no positive total means excluded.
    match snap.total {
        Some(t) if t > 0.0 => {}
        _ => snap.was_excluded = true,
    }

    snap
}

fn matches_excluded(upper: &str) -> bool {
    let t = upper.trim_start();
    t.starts_with("NG")
        || t.starts_with('Z')
        || t.starts_with('X')
        || upper.contains('*')
        || upper.contains("EXC")
        || t.chars().next().map(|c| CHECK_MARKS.contains(&c)).unwrap_or(false)
}

// -------- numeric scanning --------

struct Num {
    v: f64,
    s: usize,
    e: usize,
}

/// All `digits[.digits]` groups in the text with their byte spans.
fn scan_numbers(t: &str) -> Vec<Num> {
    let b = t.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < b.len() {
        if b[i].is_ascii_digit() {
            let s = i;
            let mut seen_dot = false;
            while i < b.len() {
                if b[i].is_ascii_digit() {
                    i += 1;
                } else if b[i] == b'.' && !seen_dot && i + 1 < b.len() && b[i + 1].is_ascii_digit() {
                    seen_dot = true;
                    i += 1;
                } else {
                    break;
                }
            }
            if let Ok(v) = t[s..i].parse::<f64>() {
                out.push(Num { v, s, e: i });
            }
        } else {
            i += 1;
        }
    }
    out
}

fn standalone_numbers(t: &str) -> Vec<f64> {
    scan_numbers(t).into_iter().map(|n| n.v).collect()
}

/// `number / number` with only a slash (and spaces) between the two groups.
pub fn find_fraction(t: &str) -> Option<(f64, f64)> {
    let nums = scan_numbers(t);
    for w in nums.windows(2) {
        if t[w[0].e..w[1].s].trim() == "/" {
            return Some((w[0].v, w[1].v));
        }
    }
    None
}

/// Denominator recovered from the last `/ N` group, e.g. "NG / 100".
fn trailing_denominator(t: &str) -> Option<f64> {
    let slash = t.rfind('/')?;
    scan_numbers(&t[slash + 1..]).first().map(|n| n.v)
}

/// Compact display form for point values: integers without a trailing ".0",
/// everything else with up to two decimals.
pub fn fmt_points(x: f64) -> String {
    if (x - x.round()).abs() < 1e-9 {
        format!("{}", x.round() as i64)
    } else {
        let s = format!("{x:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// -------- letter grades --------

/// Percent written back when the user types a letter grade into a cell.
const LETTER_PERCENTS: [(&str, f64); 13] = [
    ("A+", 97.0), ("A-", 90.0), ("A", 93.0),
    ("B+", 87.0), ("B-", 80.0), ("B", 83.0),
    ("C+", 77.0), ("C-", 70.0), ("C", 73.0),
    ("D+", 67.0), ("D-", 60.0), ("D", 63.0),
    ("F", 50.0),
];

pub fn percent_for_letter(letter: &str) -> Option<f64> {
    let l = letter.trim().to_uppercase();
    LETTER_PERCENTS.iter().find(|(k, _)| *k == l).map(|(_, v)| *v)
}

/// Letter is a pure function of the final integer percent.
pub fn letter_for_percent(percent: u32) -> char {
    match percent {
        p if p >= 90 => 'A',
        p if p >= 80 => 'B',
        p if p >= 70 => 'C',
        p if p >= 60 => 'D',
        _ => 'F',
    }
}
