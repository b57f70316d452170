// src/session/hypo.rs
//
// Ordered collection of user-added fictitious assignments for one class.
// Entries are never mutated in place: changing one is delete + re-add.

use crate::error::CoreError;
use crate::score;
use crate::session::{ClassKey, RowId};

/// A synthetic, non-persisted assignment the user adds to preview its
/// grade impact.
#[derive(Clone, Debug, PartialEq)]
pub struct HypotheticalAssignment {
    pub id: RowId,
    pub class: ClassKey,
    pub name: String,
    pub category: String,
    pub earned: f64,
    /// A total of 0 with earned > 0 is pure extra credit.
    pub total: f64,
}

pub struct HypotheticalStore {
    class: ClassKey,
    items: Vec<HypotheticalAssignment>,
    redo: Vec<HypotheticalAssignment>,
}

impl HypotheticalStore {
    pub fn new(class: ClassKey) -> Self {
        Self { class, items: Vec::new(), redo: Vec::new() }
    }

    pub fn add(&mut self, a: HypotheticalAssignment) {
        logd!("hypo[{}]: add {} '{}' {}/{}",
            self.class, a.id, a.name, score::fmt_points(a.earned), score::fmt_points(a.total));
        self.items.push(a);
        self.redo.clear();
    }

    /// Identity-based removal. The preferred path: RowIds are propagated
    /// end-to-end, so callers normally know exactly which entry to drop.
    pub fn remove(&mut self, id: RowId) -> Result<HypotheticalAssignment, CoreError> {
        match self.items.iter().position(|a| a.id == id) {
            Some(ix) => Ok(self.items.remove(ix)),
            None => Err(CoreError::LookupFailure { what: format!("hypothetical {id}") }),
        }
    }

    /// Score-based removal for callers that only know the displayed numbers.
    /// Exact match first, then epsilon-fuzzy (float residue from percent and
    /// letter edits), then most-recent as a best-effort last resort. The
    /// final tier can pick the wrong entry when several share a score; it is
    /// logged and must not be relied on for correctness.
    pub fn remove_by_match(&mut self, earned: f64, total: f64) -> Result<HypotheticalAssignment, CoreError> {
        const EPS: f64 = 1e-4;

        if let Some(ix) = self.items.iter().rposition(|a| a.earned == earned && a.total == total) {
            return Ok(self.items.remove(ix));
        }
        if let Some(ix) = self.items.iter().rposition(|a| {
            (a.earned - earned).abs() < EPS && (a.total - total).abs() < EPS
        }) {
            return Ok(self.items.remove(ix));
        }
        if self.items.is_empty() {
            return Err(CoreError::LookupFailure {
                what: format!("hypothetical scoring {}/{}",
                    score::fmt_points(earned), score::fmt_points(total)),
            });
        }
        logf!("hypo[{}]: no match for {}/{}, removing most recent",
            self.class, score::fmt_points(earned), score::fmt_points(total));
        Ok(self.items.pop().unwrap())
    }

    /// LIFO transfer to the redo list (undo of the most recent add).
    pub fn undo(&mut self) -> Option<RowId> {
        let a = self.items.pop()?;
        let id = a.id;
        self.redo.push(a);
        logd!("hypo[{}]: undo {}", self.class, id);
        Some(id)
    }

    /// LIFO transfer back from the redo list.
    pub fn redo(&mut self) -> Option<RowId> {
        let a = self.redo.pop()?;
        let id = a.id;
        self.items.push(a);
        logd!("hypo[{}]: redo {}", self.class, id);
        Some(id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.redo.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Invalidate redo only; counterpart of `EditLedger::clear_redo` for
    /// cross-store actions.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn items(&self) -> &[HypotheticalAssignment] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HypotheticalStore {
        HypotheticalStore::new(ClassKey::new("Algebra"))
    }

    fn hypo(id: u32, earned: f64, total: f64) -> HypotheticalAssignment {
        HypotheticalAssignment {
            id: RowId::Hypothetical(id),
            class: ClassKey::new("Algebra"),
            name: format!("What-if {id}"),
            category: s!("Tests"),
            earned,
            total,
        }
    }

    #[test]
    fn remove_by_id_is_exact() {
        let mut s = store();
        s.add(hypo(0, 10.0, 10.0));
        s.add(hypo(1, 10.0, 10.0));
        let removed = s.remove(RowId::Hypothetical(0)).unwrap();
        assert_eq!(removed.id, RowId::Hypothetical(0));
        assert_eq!(s.items().len(), 1);
        assert!(s.remove(RowId::Hypothetical(7)).is_err());
    }

    #[test]
    fn match_fallback_prefers_exact_then_fuzzy() {
        let mut s = store();
        s.add(hypo(0, 9.7, 10.0));
        s.add(hypo(1, 8.0, 10.0));
        // Fuzzy: 9.70001 should find the 9.7 entry, not the most recent.
        let removed = s.remove_by_match(9.70001, 10.0).unwrap();
        assert_eq!(removed.id, RowId::Hypothetical(0));
    }

    #[test]
    fn match_fallback_last_resort_is_most_recent() {
        // Documents the best-effort tier: with no score match at all, the
        // most recent entry goes. This is ambiguity, not a contract.
        let mut s = store();
        s.add(hypo(0, 5.0, 5.0));
        s.add(hypo(1, 6.0, 6.0));
        let removed = s.remove_by_match(99.0, 99.0).unwrap();
        assert_eq!(removed.id, RowId::Hypothetical(1));
    }

    #[test]
    fn match_on_empty_store_is_lookup_failure() {
        let mut s = store();
        assert!(s.remove_by_match(1.0, 1.0).is_err());
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut s = store();
        s.add(hypo(0, 10.0, 10.0));
        s.add(hypo(1, 5.0, 10.0));
        assert_eq!(s.undo(), Some(RowId::Hypothetical(1)));
        assert_eq!(s.items().len(), 1);
        assert_eq!(s.redo(), Some(RowId::Hypothetical(1)));
        assert_eq!(s.items().len(), 2);
        assert_eq!(s.redo(), None);
    }

    #[test]
    fn add_clears_redo() {
        let mut s = store();
        s.add(hypo(0, 10.0, 10.0));
        s.undo();
        assert!(s.has_redo());
        s.add(hypo(1, 5.0, 10.0));
        assert!(!s.has_redo());
    }
}
