// tests/weighted_grades.rs
//
// Weighted-mode session scenarios: category baselines come from the page's
// saved original category cells, with the edit/hypothetical overlay applied
// per category.
//
use gb_whatif::aggregate::GradeMode;
use gb_whatif::page::{AssignmentRow, CategoryWeight, PageAdapter};
use gb_whatif::session::{ClassKey, GradeSession, RowId};

struct WeightedPage {
    rows: Vec<AssignmentRow>,
    weights: Vec<CategoryWeight>,
}

impl WeightedPage {
    fn new(cells: &[(&str, &str)], weights: &[(&str, f64, &str)]) -> Self {
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
        let weights = weights
            .iter()
            .map(|(label, weight, cell)| CategoryWeight {
                label: label.to_string(),
                weight: *weight,
                original_cell: cell.to_string(),
            })
            .collect();
        Self { rows, weights }
    }
}

impl PageAdapter for WeightedPage {
    fn class_key(&self) -> ClassKey {
        ClassKey::new("Chemistry")
    }
    fn rows(&self) -> &[AssignmentRow] {
        &self.rows
    }
    fn category_weights(&self) -> &[CategoryWeight] {
        &self.weights
    }
}

fn half_and_half() -> GradeSession {
    GradeSession::new(Box::new(WeightedPage::new(
        &[("Tests", "40/50"), ("Homework", "8/10")],
        &[("Tests", 50.0, "90/100"), ("Homework", 50.0, "8/10")],
    )))
}

#[test]
fn weighted_baseline() {
    let mut s = half_and_half();
    let out = s.compute(GradeMode::Weighted);
    // round((0.9*0.5 + 0.8*0.5) / 1 * 100) = 85
    assert_eq!(out.percent, 85);
    assert_eq!(out.letter, 'B');
}

#[test]
fn zero_point_hypothetical_is_a_noop() {
    let mut s = half_and_half();
    s.add_hypothetical("Nothing", "Tests", 0.0, 0.0).unwrap();
    assert_eq!(s.compute(GradeMode::Weighted).percent, 85);
}

#[test]
fn edit_overlays_the_saved_category_baseline() {
    let mut s = half_and_half();
    // The Tests baseline 90/100 contains the original 40/50 row; editing the
    // row to 45 moves the category to 95/100.
    s.edit_score(RowId::Original(0), "45").unwrap();
    let out = s.compute(GradeMode::Weighted);
    let tests = &out.categories[0];
    assert_eq!((tests.earned, tests.total), (95.0, 100.0));
    assert_eq!(out.percent, 88);
}

#[test]
fn excluded_edit_joins_the_category_denominator() {
    let mut s = GradeSession::new(Box::new(WeightedPage::new(
        &[("Tests", "90/100"), ("Homework", "NG")],
        &[("Tests", 50.0, "90/100"), ("Homework", 50.0, "8/10")],
    )));
    // NG row was never in the Homework baseline; after the prompted edit it
    // counts as a real 2/10 assignment alongside the saved 8/10.
    s.edit_score_with_total(RowId::Original(1), "2", 10.0).unwrap();
    let out = s.compute(GradeMode::Weighted);
    let hw = &out.categories[1];
    assert_eq!((hw.earned, hw.total), (10.0, 20.0));
    // round((0.9*0.5 + 0.5*0.5) * 100) = 70
    assert_eq!(out.percent, 70);
    assert_eq!(out.letter, 'C');
}

#[test]
fn hypothetical_lands_in_its_category_only() {
    let mut s = half_and_half();
    s.add_hypothetical("Retake", "Tests", 10.0, 10.0).unwrap();
    let out = s.compute(GradeMode::Weighted);
    assert_eq!((out.categories[0].earned, out.categories[0].total), (100.0, 110.0));
    assert_eq!((out.categories[1].earned, out.categories[1].total), (8.0, 10.0));
    assert!(out.categories[0].has_hypotheticals);
    assert!(!out.categories[1].has_hypotheticals);
}

#[test]
fn empty_category_renormalizes_the_weights() {
    let mut s = GradeSession::new(Box::new(WeightedPage::new(
        &[("Tests", "90/100")],
        &[("Tests", 60.0, "90/100"), ("Final", 40.0, "0/0")],
    )));
    // Final has no contribution yet, so Tests carries the whole grade.
    assert_eq!(s.compute(GradeMode::Weighted).percent, 90);

    // A hypothetical final brings its weight into play.
    s.add_hypothetical("Final exam", "Final", 50.0, 100.0).unwrap();
    // round((0.9*0.6 + 0.5*0.4) / 1 * 100) = 74
    assert_eq!(s.compute(GradeMode::Weighted).percent, 74);
}

#[test]
fn weighted_report_carries_category_lines() {
    let mut s = half_and_half();
    let report = s.report(GradeMode::Weighted);
    assert_eq!(report.mode, "weighted");
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].label, "Tests");
    assert_eq!(report.categories[0].percent, Some(90));
    assert_eq!(report.categories[0].letter, Some('A'));
    assert_eq!(report.categories[1].percent, Some(80));
}

#[test]
fn report_json_round_trips_through_serde() {
    let mut s = half_and_half();
    let json = s.report(GradeMode::Weighted).to_json().unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["grade"]["percent"], 85);
    assert_eq!(v["grade"]["letter"], "B");
    assert_eq!(v["categories"][0]["label"], "Tests");
}
