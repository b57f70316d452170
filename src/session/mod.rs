// src/session/mod.rs
//
// GradeSession: one per page context, owning all per-class what-if state.
// The page adapter is injected as a capability; nothing in here touches the
// host page directly. Per class the session is either Pristine (nothing
// overlaid) or Active (at least one hypothetical or edit).

pub mod hypo;
pub mod ledger;

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::aggregate::{self, CategoryInput, GradeMode, GradeOutcome, RowInput};
use crate::error::CoreError;
use crate::page::{AssignmentRow, PageAdapter};
use crate::present::{CategoryLine, ClassReport, GradeDisplay, RowRender};
use crate::score::{self, ScoreSnapshot};

use hypo::{HypotheticalAssignment, HypotheticalStore};
use ledger::{EditLedger, EditOutcome};

/// Opaque identifier for the currently displayed class. Scopes all session
/// state; operations on one class never touch another's entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey(String);

impl ClassKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier for a score row. Original rows come from the page in
/// document order; hypothetical rows are numbered by the session. Unique
/// within a page view, propagated end-to-end so lookups never have to guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowId {
    Original(u32),
    Hypothetical(u32),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Original(n) => write!(f, "original-row-{n}"),
            RowId::Hypothetical(n) => write!(f, "hypothetical-row-{n}"),
        }
    }
}

impl RowId {
    /// Inverse of Display, for persisted row attributes and CLI references.
    pub fn parse(s: &str) -> Option<RowId> {
        let s = s.trim();
        if let Some(n) = s.strip_prefix("original-row-") {
            return n.parse().ok().map(RowId::Original);
        }
        if let Some(n) = s.strip_prefix("hypothetical-row-") {
            return n.parse().ok().map(RowId::Hypothetical);
        }
        None
    }
}

/// Per-class overlay state, as a first-class tag rather than something
/// inferred from collection lengths at each call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Pristine,
    Active,
}

/// Explicit coalescing contract for recomputation: recompute is scheduled,
/// bursts within the window collapse into one due point, and a class switch
/// cancels whatever is pending.
pub struct RecalcScheduler {
    window: Duration,
    due: Option<Instant>,
}

pub const RECALC_WINDOW: Duration = Duration::from_millis(100);

impl RecalcScheduler {
    pub fn new(window: Duration) -> Self {
        Self { window, due: None }
    }

    /// Request a recompute. Requests landing while one is already pending
    /// coalesce into the existing due point.
    pub fn mark(&mut self, now: Instant) {
        if self.due.is_none() {
            self.due = Some(now + self.window);
        }
    }

    /// True exactly once per scheduled batch, when the window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(d) if now >= d => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }
}

impl Default for RecalcScheduler {
    fn default() -> Self {
        Self::new(RECALC_WINDOW)
    }
}

struct ClassState {
    phase: Phase,
    ledger: EditLedger,
    hypos: HypotheticalStore,
}

impl ClassState {
    fn new(class: ClassKey) -> Self {
        Self {
            phase: Phase::Pristine,
            ledger: EditLedger::new(class.clone()),
            hypos: HypotheticalStore::new(class),
        }
    }

    fn refresh_phase(&mut self) {
        self.phase = if self.ledger.is_empty() && self.hypos.is_empty() {
            Phase::Pristine
        } else {
            Phase::Active
        };
    }
}

pub struct GradeSession {
    page: Box<dyn PageAdapter>,
    classes: BTreeMap<ClassKey, ClassState>,
    current: ClassKey,
    recalc: RecalcScheduler,
    hypo_seq: u32,
}

impl GradeSession {
    pub fn new(page: Box<dyn PageAdapter>) -> Self {
        let current = page.class_key();
        let mut classes = BTreeMap::new();
        classes.insert(current.clone(), ClassState::new(current.clone()));
        logf!("session: start on class '{current}'");
        Self {
            page,
            classes,
            current,
            recalc: RecalcScheduler::default(),
            hypo_seq: 0,
        }
    }

    pub fn current_class(&self) -> &ClassKey {
        &self.current
    }

    pub fn phase(&self) -> Phase {
        self.classes.get(&self.current).map(|s| s.phase).unwrap_or(Phase::Pristine)
    }

    pub fn recalc(&mut self) -> &mut RecalcScheduler {
        &mut self.recalc
    }

    fn state_mut(&mut self) -> &mut ClassState {
        self.classes
            .entry(self.current.clone())
            .or_insert_with(|| ClassState::new(self.current.clone()))
    }

    fn find_row(&self, row: RowId) -> Result<AssignmentRow, CoreError> {
        self.page
            .rows()
            .iter()
            .find(|r| r.id == row)
            .cloned()
            .ok_or_else(|| CoreError::LookupFailure { what: format!("{row}") })
    }

    fn touch(&mut self) {
        self.recalc.mark(Instant::now());
    }

    // ---- hypotheticals ----

    /// Add a fictitious assignment to the current class. Returns its RowId.
    pub fn add_hypothetical(
        &mut self,
        name: &str,
        category: &str,
        earned: f64,
        total: f64,
    ) -> Result<RowId, CoreError> {
        if !earned.is_finite() || earned < 0.0 {
            return Err(CoreError::ValidationFailure {
                input: score::fmt_points(earned),
                reason: s!("earned points must be a number >= 0"),
            });
        }
        if !total.is_finite() || total < 0.0 {
            return Err(CoreError::ValidationFailure {
                input: score::fmt_points(total),
                reason: s!("point total must be a number >= 0"),
            });
        }
        let id = RowId::Hypothetical(self.hypo_seq);
        self.hypo_seq += 1;
        let class = self.current.clone();
        let state = self.state_mut();
        state.hypos.add(HypotheticalAssignment {
            id,
            class,
            name: name.to_string(),
            category: category.to_string(),
            earned,
            total,
        });
        // Redo is one per-class concept across both stores: any new action
        // invalidates the other store's redo list too.
        state.ledger.clear_redo();
        state.refresh_phase();
        self.touch();
        Ok(id)
    }

    pub fn remove_hypothetical(&mut self, id: RowId) -> Result<(), CoreError> {
        let state = self.state_mut();
        state.hypos.remove(id)?;
        state.refresh_phase();
        self.touch();
        Ok(())
    }

    /// Score-based removal fallback for callers without a RowId in hand.
    pub fn remove_hypothetical_matching(
        &mut self,
        earned: f64,
        total: f64,
    ) -> Result<RowId, CoreError> {
        let state = self.state_mut();
        let removed = state.hypos.remove_by_match(earned, total)?;
        state.refresh_phase();
        self.touch();
        Ok(removed.id)
    }

    // ---- edits ----

    /// Edit a row's score cell. `input` is the literal user entry for the
    /// earned side; the denominator comes from the row itself. Rows whose
    /// denominator cannot be discovered report MissingDenominator, and the
    /// caller retries through `edit_score_with_total`.
    pub fn edit_score(&mut self, row: RowId, input: &str) -> Result<EditOutcome, CoreError> {
        let (snap, category) = self.capture_row(row)?;
        let earned = parse_earned_input(input, &snap)?;
        let total = self.resolve_total(row, &snap)?;
        self.finish_edit(row, earned, total, &category)
    }

    /// Same as `edit_score`, with an explicitly supplied denominator. This is
    /// the retry path after MissingDenominator.
    pub fn edit_score_with_total(
        &mut self,
        row: RowId,
        input: &str,
        total: f64,
    ) -> Result<EditOutcome, CoreError> {
        let (snap, category) = self.capture_row(row)?;
        let earned = parse_earned_input(input, &snap)?;
        self.finish_edit(row, earned, total, &category)
    }

    /// Edit through the percent cell: back-computes the numerator and writes
    /// through to the same entry as a score edit.
    pub fn edit_percent(&mut self, row: RowId, percent: f64) -> Result<EditOutcome, CoreError> {
        validate_percent(percent)?;
        let (snap, category) = self.capture_row(row)?;
        let total = self.resolve_total(row, &snap)?;
        let earned = percent / 100.0 * total;
        self.finish_edit(row, earned, total, &category)
    }

    /// Same as `edit_percent`, with an explicitly supplied denominator. The
    /// retry path after MissingDenominator, mirroring `edit_score_with_total`.
    pub fn edit_percent_with_total(
        &mut self,
        row: RowId,
        percent: f64,
        total: f64,
    ) -> Result<EditOutcome, CoreError> {
        validate_percent(percent)?;
        let (_, category) = self.capture_row(row)?;
        let earned = percent / 100.0 * total;
        self.finish_edit(row, earned, total, &category)
    }

    /// Edit through the letter-grade cell, using the fixed letter table.
    pub fn edit_letter(&mut self, row: RowId, letter: &str) -> Result<EditOutcome, CoreError> {
        self.edit_percent(row, letter_percent(letter)?)
    }

    /// Letter-cell counterpart of `edit_percent_with_total`.
    pub fn edit_letter_with_total(
        &mut self,
        row: RowId,
        letter: &str,
        total: f64,
    ) -> Result<EditOutcome, CoreError> {
        self.edit_percent_with_total(row, letter_percent(letter)?, total)
    }

    /// Revert one row to its original display state.
    pub fn revert_row(&mut self, row: RowId) -> Option<ScoreSnapshot> {
        let state = self.state_mut();
        let snap = state.ledger.revert(row);
        state.refresh_phase();
        self.touch();
        snap
    }

    fn capture_row(&mut self, row: RowId) -> Result<(ScoreSnapshot, String), CoreError> {
        let page_row = self.find_row(row)?;
        let snap = self.state_mut().ledger.capture(row, &page_row.score_cell);
        if snap.is_blank() {
            return Err(CoreError::ParseFailure { cell: snap.earned_text });
        }
        Ok((snap, page_row.category))
    }

    /// Denominator policy: a prompted total stored on a prior edit wins, then
    /// the captured snapshot's total. Excluded rows with neither must be
    /// asked for one.
    fn resolve_total(&mut self, row: RowId, snap: &ScoreSnapshot) -> Result<f64, CoreError> {
        if let Some(entry) = self.state_mut().ledger.entry(row) {
            return Ok(entry.modified_total);
        }
        snap.total
            .filter(|t| *t > 0.0)
            .ok_or(CoreError::MissingDenominator { row })
    }

    fn finish_edit(
        &mut self,
        row: RowId,
        earned: f64,
        total: f64,
        category: &str,
    ) -> Result<EditOutcome, CoreError> {
        let state = self.state_mut();
        let outcome = state.ledger.apply_edit(row, earned, total, category)?;
        state.hypos.clear_redo();
        state.refresh_phase();
        self.touch();
        Ok(outcome)
    }

    // ---- undo/redo ----

    /// Undo the most recent action for the current class. Score edits take
    /// priority; hypothetical removal is attempted only when no edit history
    /// is pending. Returns the affected row, or None when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Option<RowId> {
        let state = self.state_mut();
        let row = if state.ledger.has_history() {
            state.ledger.undo()
        } else {
            state.hypos.undo()
        };
        state.refresh_phase();
        if row.is_some() {
            self.touch();
        }
        row
    }

    /// Mirror of `undo`: score-edit redo is checked first.
    pub fn redo(&mut self) -> Option<RowId> {
        let state = self.state_mut();
        let row = if state.ledger.has_redo() {
            state.ledger.redo()
        } else {
            state.hypos.redo()
        };
        state.refresh_phase();
        if row.is_some() {
            self.touch();
        }
        row
    }

    // ---- lifecycle ----

    /// Explicit reset of one class: bulk revert plus history purge.
    pub fn reset_class(&mut self, key: &ClassKey) {
        if let Some(state) = self.classes.get_mut(key) {
            state.ledger.clear();
            state.hypos.clear();
            state.refresh_phase();
        }
        if *key == self.current {
            self.recalc.cancel();
        }
        logf!("session: reset class '{key}'");
    }

    pub fn reset_all(&mut self) {
        let keys: Vec<ClassKey> = self.classes.keys().cloned().collect();
        for k in &keys {
            self.reset_class(k);
        }
    }

    /// Class switch: runs to completion ahead of any pending recalculation
    /// (the pending timer is cancelled), and preserves the departing class's
    /// state so returning to it restores the prior scenario.
    pub fn switch_class(&mut self, key: ClassKey) {
        self.recalc.cancel();
        logf!("session: switch '{}' -> '{}'", self.current, key);
        self.current = key;
        self.state_mut();
    }

    // ---- calculation ----

    /// Run one aggregation pass for the current class. Cheap, synchronous,
    /// idempotent; safe to re-run at any time.
    pub fn compute(&mut self, mode: GradeMode) -> GradeOutcome {
        let rows = self.row_inputs();
        let state = self.state_mut();
        let mods = state.ledger.list_modifications();
        let hypos = state.hypos.items().to_vec();

        match mode {
            GradeMode::Unweighted => aggregate::unweighted(&rows, &mods, &hypos),
            GradeMode::Weighted => {
                let cats = self.category_inputs();
                aggregate::weighted(&cats, &mods, &hypos)
            }
        }
    }

    fn row_inputs(&mut self) -> Vec<RowInput> {
        let page_rows: Vec<AssignmentRow> = self.page.rows().to_vec();
        let state = self.state_mut();
        page_rows
            .iter()
            .map(|r| RowInput {
                row: r.id,
                category: r.category.clone(),
                snapshot: state.ledger.capture(r.id, &r.score_cell),
            })
            .collect()
    }

    fn category_inputs(&self) -> Vec<CategoryInput> {
        self.page
            .category_weights()
            .iter()
            .map(|w| {
                let (earned, total) =
                    score::find_fraction(&w.original_cell).unwrap_or((0.0, 0.0));
                CategoryInput {
                    label: w.label.clone(),
                    weight: w.weight,
                    earned,
                    total,
                }
            })
            .collect()
    }

    /// Full presentation contract for the current class: final grade,
    /// per-category lines, and per-row render state.
    pub fn report(&mut self, mode: GradeMode) -> ClassReport {
        let outcome = self.compute(mode);

        let categories = outcome
            .categories
            .iter()
            .map(|c| {
                let avg = c.average();
                CategoryLine {
                    label: c.label.clone(),
                    weight: c.weight,
                    earned: c.earned,
                    total: c.total,
                    percent: avg.map(|a| {
                        let p = (a * 100.0).round();
                        if p <= 0.0 { 0 } else { p as u32 }
                    }),
                    letter: avg.map(|a| {
                        let p = (a * 100.0).round().max(0.0) as u32;
                        score::letter_for_percent(p)
                    }),
                }
            })
            .collect();

        let page_rows: Vec<AssignmentRow> = self.page.rows().to_vec();
        let state = self.state_mut();
        let mut rows: Vec<RowRender> = page_rows
            .iter()
            .map(|r| {
                let snap = state.ledger.capture(r.id, &r.score_cell);
                match state.ledger.entry(r.id) {
                    Some(e) => RowRender {
                        row: r.id.to_string(),
                        name: r.name.clone(),
                        category: r.category.clone(),
                        display: format!(
                            "{}/{}",
                            score::fmt_points(e.modified_earned),
                            score::fmt_points(e.modified_total)
                        ),
                        modified: true,
                    },
                    None => RowRender {
                        row: r.id.to_string(),
                        name: r.name.clone(),
                        category: r.category.clone(),
                        display: match snap.points() {
                            Some((e, t)) => {
                                format!("{}/{}", score::fmt_points(e), score::fmt_points(t))
                            }
                            None => snap.earned_text.clone(),
                        },
                        modified: false,
                    },
                }
            })
            .collect();

        for h in state.hypos.items() {
            rows.push(RowRender {
                row: h.id.to_string(),
                name: h.name.clone(),
                category: h.category.clone(),
                display: format!(
                    "{}/{}",
                    score::fmt_points(h.earned),
                    score::fmt_points(h.total)
                ),
                modified: true,
            });
        }

        ClassReport {
            class: self.current.to_string(),
            mode: mode.as_str().to_string(),
            grade: GradeDisplay { percent: outcome.percent, letter: outcome.letter },
            categories,
            rows,
        }
    }
}

fn validate_percent(percent: f64) -> Result<(), CoreError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(CoreError::ValidationFailure {
            input: score::fmt_points(percent),
            reason: s!("percent must be between 0 and 100"),
        });
    }
    Ok(())
}

fn letter_percent(letter: &str) -> Result<f64, CoreError> {
    score::percent_for_letter(letter).ok_or_else(|| CoreError::ValidationFailure {
        input: letter.to_string(),
        reason: s!("unrecognized letter grade"),
    })
}

/// Literal user entry for the earned side. Empty input means 0 only for
/// rows that were originally excluded; anywhere else it is a user error.
fn parse_earned_input(input: &str, snap: &ScoreSnapshot) -> Result<f64, CoreError> {
    let t = input.trim();
    if t.is_empty() {
        if snap.was_excluded {
            return Ok(0.0);
        }
        return Err(CoreError::ValidationFailure {
            input: input.to_string(),
            reason: s!("enter a number of points earned"),
        });
    }
    t.parse::<f64>().map_err(|_| CoreError::ValidationFailure {
        input: t.to_string(),
        reason: s!("not a number"),
    })
}
