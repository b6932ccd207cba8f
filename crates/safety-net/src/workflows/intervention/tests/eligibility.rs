use std::sync::Arc;

use super::common::*;

use crate::workflows::intervention::eligibility::{EligibilityMatcher, SchemeTable};
use crate::workflows::intervention::repository::RepositoryError;

#[test]
fn overlapping_schemes_resolve_to_lowest_id_every_time() {
    let catalog = Arc::new(ReversedCatalog::new(vec![
        scheme(3, "District Girls Bursary", "Any"),
        scheme(9, "State Merit Award", "Any"),
        scheme(5, "OBC Support Grant", "OBC"),
    ]));
    let matcher = EligibilityMatcher::new(catalog.clone());
    let student = demographics(8, Some(45_000), "OBC", "Female");

    for _ in 0..5 {
        let matched = matcher.match_scheme(&student).expect("catalog reachable");
        assert_eq!(matched.map(|scheme| scheme.id), Some(3));
    }
    assert_eq!(catalog.lookups(), 5);
}

#[test]
fn matcher_rechecks_rules_the_catalog_skipped() {
    let mut restricted = scheme(1, "Tribal Hostel Grant", "ST");
    restricted.max_grade = 5;
    let catalog = Arc::new(ReversedCatalog::new(vec![
        restricted,
        scheme(2, "Open Rural Grant", "Any"),
    ]));
    let matcher = EligibilityMatcher::new(catalog);

    let matched = matcher
        .match_scheme(&demographics(8, Some(45_000), "ST", "Male"))
        .expect("catalog reachable");

    assert_eq!(matched.map(|scheme| scheme.id), Some(2));
}

#[test]
fn undeclared_income_skips_the_catalog() {
    let catalog = Arc::new(ReversedCatalog::new(vec![scheme(1, "Open Grant", "Any")]));
    let matcher = EligibilityMatcher::new(catalog.clone());

    let matched = matcher
        .match_scheme(&demographics(8, None, "SC", "Male"))
        .expect("no lookup needed");

    assert!(matched.is_none());
    assert_eq!(catalog.lookups(), 0);
}

#[test]
fn no_matching_row_is_not_an_error() {
    let matcher = EligibilityMatcher::new(Arc::new(SchemeTable::standard()));

    let matched = matcher
        .match_scheme(&demographics(7, Some(150_000), "General", "Male"))
        .expect("table reachable");

    assert!(matched.is_none());
}

#[test]
fn standard_table_prefers_category_scheme_for_raju() {
    let matcher = EligibilityMatcher::new(Arc::new(SchemeTable::standard()));

    let matched = matcher
        .match_scheme(&scenario_a_demographics())
        .expect("table reachable")
        .expect("raju qualifies");

    assert_eq!(matched.id, 4);
    assert_eq!(matched.name, "Pre-Matric Scholarship for OBC Students");
}

#[test]
fn income_ceiling_is_inclusive() {
    let matcher = EligibilityMatcher::new(Arc::new(SchemeTable::standard()));

    let at_limit = matcher
        .match_scheme(&demographics(4, Some(100_000), "General", "Female"))
        .expect("table reachable");
    let above_limit = matcher
        .match_scheme(&demographics(4, Some(100_001), "General", "Female"))
        .expect("table reachable");

    assert_eq!(at_limit.map(|scheme| scheme.id), Some(6));
    assert!(above_limit.is_none());
}

#[test]
fn catalog_outage_is_surfaced() {
    let matcher = EligibilityMatcher::new(Arc::new(UnavailableCatalog));

    let result = matcher.match_scheme(&scenario_a_demographics());

    assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
}
