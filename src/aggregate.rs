// src/aggregate.rs
//
// Grade aggregation. Pure functions over three inputs: the page's real rows
// (as captured snapshots), the per-class edit overlay, and the hypothetical
// assignments. Two algorithms: unweighted pooled points, and weighted
// per-category averaging against the page's saved original category totals.
// Rounding happens once, at the end.

use std::collections::HashMap;

use crate::score::{self, ScoreSnapshot};
use crate::session::RowId;
use crate::session::hypo::HypotheticalAssignment;
use crate::session::ledger::Modification;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradeMode {
    Unweighted,
    Weighted,
}

impl GradeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeMode::Unweighted => "unweighted",
            GradeMode::Weighted => "weighted",
        }
    }
}

/// One real page row as aggregation sees it.
#[derive(Clone, Debug)]
pub struct RowInput {
    pub row: RowId,
    pub category: String,
    pub snapshot: ScoreSnapshot,
}

/// One weighted category as the page declares it: weight percentage plus the
/// saved original per-category totals (never live re-parsed, so edits cannot
/// compound across recalculations).
#[derive(Clone, Debug)]
pub struct CategoryInput {
    pub label: String,
    pub weight: f64,
    pub earned: f64,
    pub total: f64,
}

/// Per-category working state, rebuilt from scratch on every calculation.
#[derive(Clone, Debug)]
pub struct CategoryAggregate {
    pub label: String,
    pub weight: f64,
    pub earned: f64,
    pub total: f64,
    pub has_hypotheticals: bool,
}

impl CategoryAggregate {
    /// Fraction earned, if the category carries any real contribution.
    /// An extra-credit-only category (total 0, earned > 0) is full credit.
    pub fn average(&self) -> Option<f64> {
        if self.total > 0.0 {
            Some(self.earned / self.total)
        } else if self.earned > 0.0 {
            Some(1.0)
        } else {
            None
        }
    }
}

/// Result of one full aggregation pass.
#[derive(Clone, Debug)]
pub struct GradeOutcome {
    pub percent: u32,
    pub letter: char,
    pub earned: f64,
    pub total: f64,
    pub categories: Vec<CategoryAggregate>,
}

fn round_percent(fraction: f64) -> u32 {
    let p = (fraction * 100.0).round();
    if p <= 0.0 { 0 } else { p as u32 }
}

fn overlay_hypothetical(earned: &mut f64, total: &mut f64, h: &HypotheticalAssignment) {
    // total == 0 with earned > 0 is pure extra credit: numerator only.
    *earned += h.earned;
    if h.total != 0.0 {
        *total += h.total;
    }
}

/// Pool earned and total points across every countable row, overlay edits and
/// hypotheticals, divide once.
pub fn unweighted(
    rows: &[RowInput],
    mods: &[Modification],
    hypos: &[HypotheticalAssignment],
) -> GradeOutcome {
    let edited: HashMap<RowId, &Modification> = mods.iter().map(|m| (m.row, m)).collect();

    let mut earned = 0.0f64;
    let mut total = 0.0f64;

    for r in rows {
        if let Some(m) = edited.get(&r.row) {
            // The entered numerator replaces the original. The denominator is
            // the original total, except for excluded rows, whose baseline is
            // 0/0 and whose entered total makes them count as a real 0/N
            // assignment.
            earned += m.modified_earned;
            if m.was_excluded {
                total += m.modified_total;
            } else {
                total += m.original_total;
            }
        } else if !r.snapshot.was_excluded {
            if let Some((e, t)) = r.snapshot.points() {
                earned += e;
                total += t;
            }
        }
        // Unedited excluded rows contribute exactly 0/0.
    }

    for h in hypos {
        overlay_hypothetical(&mut earned, &mut total, h);
    }

    earned = earned.max(0.0);
    total = total.max(0.0);

    let percent = if total > 0.0 { round_percent(earned / total) } else { 0 };
    logd!("aggregate: unweighted {}/{} -> {}%",
        score::fmt_points(earned), score::fmt_points(total), percent);

    GradeOutcome {
        percent,
        letter: score::letter_for_percent(percent),
        earned,
        total,
        categories: Vec::new(),
    }
}

/// Weighted per-category averaging. Baselines come from the page's saved
/// original category cells; the same edit/hypothetical overlay rules apply
/// within each category.
pub fn weighted(
    categories: &[CategoryInput],
    mods: &[Modification],
    hypos: &[HypotheticalAssignment],
) -> GradeOutcome {
    let mut aggregates = Vec::with_capacity(categories.len());
    let mut final_fraction = 0.0f64;
    let mut used_weight = 0.0f64;
    let mut earned_sum = 0.0f64;
    let mut total_sum = 0.0f64;

    for cat in categories {
        let mut agg = CategoryAggregate {
            label: cat.label.clone(),
            weight: cat.weight,
            earned: cat.earned,
            total: cat.total,
            has_hypotheticals: false,
        };

        for m in mods.iter().filter(|m| same_category(&m.category, &cat.label)) {
            // The category baseline already contains the original points for
            // non-excluded rows; swap the numerator. Excluded rows were never
            // in the baseline, so their entered total joins the denominator.
            agg.earned += m.modified_earned - m.original_earned;
            if m.was_excluded {
                agg.total += m.modified_total;
            }
        }

        for h in hypos.iter().filter(|h| same_category(&h.category, &cat.label)) {
            overlay_hypothetical(&mut agg.earned, &mut agg.total, h);
            agg.has_hypotheticals = true;
        }

        agg.earned = agg.earned.max(0.0);
        agg.total = agg.total.max(0.0);

        if let Some(avg) = agg.average() {
            final_fraction += avg * (agg.weight / 100.0);
            used_weight += agg.weight;
        }
        earned_sum += agg.earned;
        total_sum += agg.total;
        aggregates.push(agg);
    }

    let percent = if used_weight > 0.0 {
        round_percent(final_fraction / (used_weight / 100.0))
    } else {
        100
    };
    logd!("aggregate: weighted used_weight={} -> {}%", used_weight, percent);

    GradeOutcome {
        percent,
        letter: score::letter_for_percent(percent),
        earned: earned_sum,
        total: total_sum,
        categories: aggregates,
    }
}

fn same_category(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
