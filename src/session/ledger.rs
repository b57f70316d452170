// src/session/ledger.rs
//
// Per-class ledger of user score overrides. Single source of truth for
// "what did the user change": each edited row owns exactly one EditEntry,
// regardless of whether the user typed into the score, percent, or letter
// cell. History is a strict LIFO of before/after entry states.

use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use crate::error::CoreError;
use crate::score::{self, ScoreSnapshot};
use crate::session::{ClassKey, RowId};

/// Two user entries closer than this are the same number. Also the
/// revert-to-original detection threshold.
pub const EDIT_EPSILON: f64 = 1e-4;

/// The ledger record of a user's override of one row's score.
#[derive(Clone, Debug, PartialEq)]
pub struct EditEntry {
    pub class: ClassKey,
    pub row: RowId,
    pub original: ScoreSnapshot,
    /// Always the literal user-entered numerator.
    pub modified_earned: f64,
    pub modified_total: f64,
    pub was_excluded: bool,
    pub category: String,
}

/// What one edited row reports into aggregation. Originals are zeroed for
/// excluded rows, so their unedited contribution is 0/0 by convention.
#[derive(Clone, Debug)]
pub struct Modification {
    pub row: RowId,
    pub original_earned: f64,
    pub original_total: f64,
    pub modified_earned: f64,
    pub modified_total: f64,
    pub was_excluded: bool,
    pub category: String,
}

#[derive(Clone, Debug)]
struct EditEvent {
    row: RowId,
    before: Option<EditEntry>,
    after: Option<EditEntry>,
    #[allow(dead_code)]
    at: SystemTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new or updated entry is in place.
    Applied,
    /// The entered values matched the original; the entry was removed.
    Reverted,
}

pub struct EditLedger {
    class: ClassKey,
    /// Exactly-once captures of the as-displayed cell, keyed by row.
    snapshots: HashMap<RowId, ScoreSnapshot>,
    entries: BTreeMap<RowId, EditEntry>,
    history: Vec<EditEvent>,
    redo: Vec<EditEvent>,
}

impl EditLedger {
    pub fn new(class: ClassKey) -> Self {
        Self {
            class,
            snapshots: HashMap::new(),
            entries: BTreeMap::new(),
            history: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Memoized snapshot capture: parses the raw cell at most once per row
    /// for the lifetime of the class state.
    pub fn capture(&mut self, row: RowId, raw_cell: &str) -> ScoreSnapshot {
        if let Some(s) = self.snapshots.get(&row) {
            return s.clone();
        }
        let snap = score::parse_score_cell(raw_cell);
        logd!("ledger[{}]: captured {} -> {:?}/{:?} excluded={}",
            self.class, row, snap.earned, snap.total, snap.was_excluded);
        self.snapshots.insert(row, snap.clone());
        snap
    }

    pub fn snapshot(&self, row: RowId) -> Option<&ScoreSnapshot> {
        self.snapshots.get(&row)
    }

    pub fn entry(&self, row: RowId) -> Option<&EditEntry> {
        self.entries.get(&row)
    }

    /// Store or update the override for a row. The snapshot must have been
    /// captured first. Entering values equal to the original (within
    /// EDIT_EPSILON, and only for rows that were not originally excluded)
    /// deletes the entry instead: a revert-to-original.
    pub fn apply_edit(
        &mut self,
        row: RowId,
        entered_earned: f64,
        total: f64,
        category: &str,
    ) -> Result<EditOutcome, CoreError> {
        if !entered_earned.is_finite() || entered_earned < 0.0 {
            return Err(CoreError::ValidationFailure {
                input: score::fmt_points(entered_earned),
                reason: s!("earned points must be a number >= 0"),
            });
        }
        if !total.is_finite() || total <= 0.0 {
            return Err(CoreError::ValidationFailure {
                input: score::fmt_points(total),
                reason: s!("point total must be a number > 0"),
            });
        }
        let snap = self
            .snapshots
            .get(&row)
            .cloned()
            .ok_or_else(|| CoreError::LookupFailure { what: format!("snapshot for {row}") })?;

        let before = self.entries.get(&row).cloned();

        let matches_original = !snap.was_excluded
            && matches!(snap.points(), Some((oe, ot))
                if (entered_earned - oe).abs() < EDIT_EPSILON && (total - ot).abs() < EDIT_EPSILON);

        let (after, outcome) = if matches_original {
            self.entries.remove(&row);
            logd!("ledger[{}]: {} reverted to original", self.class, row);
            (None, EditOutcome::Reverted)
        } else {
            let entry = EditEntry {
                class: self.class.clone(),
                row,
                original: snap.clone(),
                modified_earned: entered_earned,
                modified_total: total,
                was_excluded: snap.was_excluded,
                category: category.to_string(),
            };
            self.entries.insert(row, entry.clone());
            logd!("ledger[{}]: {} edited to {}/{}",
                self.class, row, score::fmt_points(entered_earned), score::fmt_points(total));
            (Some(entry), EditOutcome::Applied)
        };

        // A revert that matches a row nobody edited is a no-op; don't record it.
        if before.is_none() && after.is_none() {
            return Ok(EditOutcome::Reverted);
        }

        self.history.push(EditEvent { row, before, after, at: SystemTime::now() });
        self.redo.clear();
        Ok(outcome)
    }

    /// Drop the override for a row and hand back the original snapshot so the
    /// caller can restore the display. Not recorded in history; the bulk
    /// paths that use this purge history themselves.
    pub fn revert(&mut self, row: RowId) -> Option<ScoreSnapshot> {
        self.entries.remove(&row).map(|e| e.original)
    }

    /// Bulk revert plus history purge. Captured snapshots are kept: they are
    /// ground truth for the page view, not user state.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.history.clear();
        self.redo.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Invalidate redo without touching entries or history. The session calls
    /// this when a new action lands in the class's other store; redo state is
    /// a single per-class concept even though two stores hold it.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Roll back the most recent edit event. Returns the affected row.
    pub fn undo(&mut self) -> Option<RowId> {
        let ev = self.history.pop()?;
        match &ev.before {
            Some(entry) => { self.entries.insert(ev.row, entry.clone()); }
            None => { self.entries.remove(&ev.row); }
        }
        let row = ev.row;
        self.redo.push(ev);
        logd!("ledger[{}]: undo {}", self.class, row);
        Some(row)
    }

    /// Re-apply the most recently undone edit event.
    pub fn redo(&mut self) -> Option<RowId> {
        let ev = self.redo.pop()?;
        match &ev.after {
            Some(entry) => { self.entries.insert(ev.row, entry.clone()); }
            None => { self.entries.remove(&ev.row); }
        }
        let row = ev.row;
        self.history.push(ev);
        logd!("ledger[{}]: redo {}", self.class, row);
        Some(row)
    }

    /// Entries as aggregation sees them: zeroed originals for excluded rows,
    /// literal entered values for the modified side.
    pub fn list_modifications(&self) -> Vec<Modification> {
        self.entries
            .values()
            .map(|e| {
                let (oe, ot) = if e.was_excluded {
                    (0.0, 0.0)
                } else {
                    e.original.points().unwrap_or((0.0, 0.0))
                };
                Modification {
                    row: e.row,
                    original_earned: oe,
                    original_total: ot,
                    modified_earned: e.modified_earned,
                    modified_total: e.modified_total,
                    was_excluded: e.was_excluded,
                    category: e.category.clone(),
                }
            })
            .collect()
    }
}
