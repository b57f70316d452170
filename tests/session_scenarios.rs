// tests/session_scenarios.rs
//
// Minimal PageAdapter impl to exercise GradeSession end to end without a
// real page.
//
use gb_whatif::aggregate::GradeMode;
use gb_whatif::error::CoreError;
use gb_whatif::page::{AssignmentRow, CategoryWeight, PageAdapter};
use gb_whatif::session::{ClassKey, GradeSession, Phase, RowId};

struct TestPage {
    class: ClassKey,
    rows: Vec<AssignmentRow>,
}

impl TestPage {
    fn new(class: &str, cells: &[(&str, &str)]) -> Self {
        let rows = cells
            .iter()
            .enumerate()
            .map(|(i, (category, cell))| AssignmentRow {
                id: RowId::Original(i as u32),
                name: format!("Assignment {i}"),
                category: category.to_string(),
                score_cell: cell.to_string(),
            })
            .collect();
        Self { class: ClassKey::new(class), rows }
    }
}

impl PageAdapter for TestPage {
    fn class_key(&self) -> ClassKey {
        self.class.clone()
    }
    fn rows(&self) -> &[AssignmentRow] {
        &self.rows
    }
    fn category_weights(&self) -> &[CategoryWeight] {
        &[]
    }
}

fn session(cells: &[(&str, &str)]) -> GradeSession {
    GradeSession::new(Box::new(TestPage::new("Algebra", cells)))
}

#[test]
fn hypothetical_moves_the_grade() {
    let mut s = session(&[("Tests", "40 / 50")]);
    assert_eq!(s.phase(), Phase::Pristine);

    s.add_hypothetical("Retake", "Tests", 10.0, 10.0).unwrap();
    assert_eq!(s.phase(), Phase::Active);

    let out = s.compute(GradeMode::Unweighted);
    assert_eq!(out.percent, 83);
    assert_eq!(out.letter, 'B');
}

#[test]
fn extra_credit_hypothetical_adds_numerator_only() {
    let mut s = session(&[("Tests", "40 / 50")]);
    s.add_hypothetical("Bonus", "Tests", 5.0, 0.0).unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (45.0, 50.0));
    assert_eq!(out.percent, 90);
}

#[test]
fn excluded_row_needs_a_denominator_once() {
    let mut s = session(&[("Tests", "NG")]);
    let row = RowId::Original(0);

    match s.edit_score(row, "15") {
        Err(CoreError::MissingDenominator { row: r }) => assert_eq!(r, row),
        other => panic!("expected MissingDenominator, got {other:?}"),
    }
    // No state was mutated by the failed attempt.
    assert_eq!(s.phase(), Phase::Pristine);

    s.edit_score_with_total(row, "15", 20.0).unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (15.0, 20.0));
    assert_eq!(out.percent, 75);

    // The prompted denominator sticks for subsequent edits.
    s.edit_score(row, "18").unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (18.0, 20.0));
}

#[test]
fn excluded_row_with_trailing_denominator_counts_when_edited() {
    let mut s = session(&[("Tests", "40 / 50"), ("Tests", "NG / 100")]);

    // Unedited, the excluded row contributes 0/0.
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (40.0, 50.0));

    s.edit_score(RowId::Original(1), "80").unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (120.0, 150.0));
    assert_eq!(out.percent, 80);
}

#[test]
fn revert_round_trip_restores_pristine() {
    let mut s = session(&[("Tests", "40 / 50")]);
    let row = RowId::Original(0);

    s.edit_score(row, "45").unwrap();
    assert_eq!(s.phase(), Phase::Active);
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 90);

    // Entering the original value again is a revert, not a new edit.
    s.edit_score(row, "40").unwrap();
    assert_eq!(s.phase(), Phase::Pristine);
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 80);
}

#[test]
fn empty_input_rules() {
    let mut s = session(&[("Tests", "40 / 50"), ("Tests", "NG / 10")]);

    assert!(matches!(
        s.edit_score(RowId::Original(0), "  "),
        Err(CoreError::ValidationFailure { .. })
    ));

    // Empty entry on an originally-excluded row means 0.
    s.edit_score(RowId::Original(1), "").unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (40.0, 60.0));
}

#[test]
fn unparseable_cell_surfaces_parse_failure() {
    let mut s = session(&[("Tests", "Turned in")]);
    assert!(matches!(
        s.edit_score(RowId::Original(0), "5"),
        Err(CoreError::ParseFailure { .. })
    ));
    assert_eq!(s.phase(), Phase::Pristine);
}

#[test]
fn percent_and_letter_edit_through_the_same_entry() {
    let mut s = session(&[("Tests", "40 / 50")]);
    let row = RowId::Original(0);

    s.edit_percent(row, 90.0).unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (45.0, 50.0));

    // The letter edit overwrites the same entry: A+ = 97%.
    s.edit_letter(row, "A+").unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!(out.earned, 48.5);
    assert_eq!(out.percent, 97);

    assert!(s.edit_percent(row, 120.0).is_err());
    assert!(s.edit_letter(row, "E").is_err());
}

#[test]
fn three_edits_undo_redo_in_order() {
    let mut s = session(&[("T", "10/20"), ("T", "10/20"), ("T", "10/20")]);
    for (i, v) in ["11", "12", "13"].iter().enumerate() {
        s.edit_score(RowId::Original(i as u32), v).unwrap();
    }
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 36.0);

    assert_eq!(s.undo(), Some(RowId::Original(2)));
    assert_eq!(s.undo(), Some(RowId::Original(1)));
    assert_eq!(s.undo(), Some(RowId::Original(0)));
    assert_eq!(s.undo(), None);
    assert_eq!(s.phase(), Phase::Pristine);
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 30.0);

    // Redo restores the three edits in their original order.
    assert_eq!(s.redo(), Some(RowId::Original(0)));
    assert_eq!(s.redo(), Some(RowId::Original(1)));
    assert_eq!(s.redo(), Some(RowId::Original(2)));
    assert_eq!(s.redo(), None);
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 36.0);
}

#[test]
fn score_edit_undo_takes_priority_over_hypotheticals() {
    let mut s = session(&[("Tests", "40 / 50")]);
    let hypo = s.add_hypothetical("What-if", "Tests", 10.0, 10.0).unwrap();
    s.edit_score(RowId::Original(0), "45").unwrap();

    // The hypothetical was added first, but the pending score edit wins.
    assert_eq!(s.undo(), Some(RowId::Original(0)));
    assert_eq!(s.undo(), Some(hypo));
    assert_eq!(s.phase(), Phase::Pristine);

    // Redo mirrors the priority.
    assert_eq!(s.redo(), Some(RowId::Original(0)));
    assert_eq!(s.redo(), Some(hypo));
}

#[test]
fn new_score_edit_clears_stale_hypothetical_redo() {
    let mut s = session(&[("Tests", "40 / 50")]);
    s.add_hypothetical("What-if", "Tests", 10.0, 10.0).unwrap();
    assert_eq!(s.undo(), Some(RowId::Hypothetical(0)));

    // A fresh edit invalidates the undone hypothetical; redoing must not
    // resurrect it.
    s.edit_score(RowId::Original(0), "45").unwrap();
    assert_eq!(s.redo(), None);
    assert_eq!(s.compute(GradeMode::Unweighted).total, 50.0);
}

#[test]
fn new_hypothetical_clears_stale_edit_redo() {
    let mut s = session(&[("Tests", "40 / 50")]);
    s.edit_score(RowId::Original(0), "45").unwrap();
    assert_eq!(s.undo(), Some(RowId::Original(0)));

    s.add_hypothetical("What-if", "Tests", 10.0, 10.0).unwrap();
    assert_eq!(s.redo(), None);
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 50.0);
}

#[test]
fn percent_and_letter_edits_accept_a_prompted_denominator() {
    let mut s = session(&[("Tests", "NG")]);
    let row = RowId::Original(0);

    assert!(matches!(
        s.edit_percent(row, 75.0),
        Err(CoreError::MissingDenominator { row: r }) if r == row
    ));

    s.edit_percent_with_total(row, 75.0, 20.0).unwrap();
    let out = s.compute(GradeMode::Unweighted);
    assert_eq!((out.earned, out.total), (15.0, 20.0));

    // The prompted denominator sticks for plain percent/letter edits too.
    s.edit_percent(row, 90.0).unwrap();
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 18.0);

    s.edit_letter_with_total(row, "F", 20.0).unwrap();
    assert_eq!(s.compute(GradeMode::Unweighted).earned, 10.0);
}

#[test]
fn class_isolation_and_scenario_restore() {
    let mut s = session(&[("Tests", "40 / 50")]);
    s.add_hypothetical("Retake", "Tests", 10.0, 10.0).unwrap();
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 83);

    // Another class starts pristine; the first class's overlay is invisible.
    s.switch_class(ClassKey::new("History"));
    assert_eq!(s.phase(), Phase::Pristine);
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 80);

    // Mutating History never leaks into Algebra.
    s.add_hypothetical("Essay", "Tests", 0.0, 10.0).unwrap();
    s.switch_class(ClassKey::new("Algebra"));
    assert_eq!(s.phase(), Phase::Active);
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 83);
}

#[test]
fn remove_hypothetical_by_id_and_lookup_failure() {
    let mut s = session(&[("Tests", "40 / 50")]);
    let id = s.add_hypothetical("A", "Tests", 10.0, 10.0).unwrap();
    s.remove_hypothetical(id).unwrap();
    assert_eq!(s.phase(), Phase::Pristine);

    assert!(matches!(
        s.remove_hypothetical(id),
        Err(CoreError::LookupFailure { .. })
    ));
}

#[test]
fn reset_class_clears_everything() {
    let mut s = session(&[("Tests", "40 / 50")]);
    s.add_hypothetical("A", "Tests", 10.0, 10.0).unwrap();
    s.edit_score(RowId::Original(0), "45").unwrap();

    let key = s.current_class().clone();
    s.reset_class(&key);
    assert_eq!(s.phase(), Phase::Pristine);
    assert_eq!(s.compute(GradeMode::Unweighted).percent, 80);
    assert_eq!(s.undo(), None);
}

#[test]
fn report_marks_modified_and_hypothetical_rows() {
    let mut s = session(&[("Tests", "40 / 50"), ("Tests", "9/10")]);
    s.edit_score(RowId::Original(0), "45").unwrap();
    s.add_hypothetical("What-if", "Tests", 10.0, 10.0).unwrap();

    let report = s.report(GradeMode::Unweighted);
    assert_eq!(report.class, "Algebra");
    assert_eq!(report.rows.len(), 3);

    let edited = &report.rows[0];
    assert!(edited.modified);
    assert_eq!(edited.display, "45/50");

    let untouched = &report.rows[1];
    assert!(!untouched.modified);
    assert_eq!(untouched.display, "9/10");

    let hypo = &report.rows[2];
    assert!(hypo.modified);
    assert_eq!(hypo.display, "10/10");
    assert!(hypo.row.starts_with("hypothetical-row-"));
}

#[test]
fn compute_is_idempotent() {
    let mut s = session(&[("Tests", "40 / 50"), ("HW", "NG / 10")]);
    s.add_hypothetical("A", "Tests", 3.0, 5.0).unwrap();
    s.edit_score(RowId::Original(1), "8").unwrap();
    let a = s.compute(GradeMode::Unweighted);
    let b = s.compute(GradeMode::Unweighted);
    assert_eq!(a.percent, b.percent);
    assert_eq!((a.earned, a.total), (b.earned, b.total));
}
