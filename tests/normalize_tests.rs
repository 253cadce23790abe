//! Header normalization tests

use bronze_loader::normalize_headers;
use bronze_loader::staging::clean_column_name;
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_percent_and_hyphen_headers() {
    assert_eq!(
        normalize_headers(&["Win %", "Win %", "Win-Rate"]),
        vec!["WinPercent", "WinPercent_1", "Win_Rate"]
    );
}

#[test]
fn test_fight_stat_headers() {
    let raw = [
        "Full Name",
        "Sig. Str. Landed",
        "Sig. Str. %",
        "Td %",
        "Sub. Att",
        "W/L/D",
        "Full Name",
    ];
    assert_eq!(
        normalize_headers(&raw),
        vec![
            "Full_Name",
            "Sig_Str_Landed",
            "Sig_StrPercent",
            "TdPercent",
            "Sub_Att",
            "WLD",
            "Full_Name_1",
        ]
    );
}

#[test]
fn test_generated_name_collision_keeps_counting() {
    assert_eq!(
        normalize_headers(&["a", "a", "a_1"]),
        vec!["a", "a_1", "a_1_1"]
    );
    assert_eq!(
        normalize_headers(&["a_1", "a", "a"]),
        vec!["a_1", "a", "a_2"]
    );
}

#[test]
fn test_empty_names_deduplicated() {
    assert_eq!(normalize_headers(&["", "???", " "]), vec!["", "_1", "_2"]);
}

#[test]
fn test_clean_is_idempotent_on_identifiers() {
    for name in ["Event_Name", "Date", "R1_Sig_Str", "_x"] {
        assert_eq!(clean_column_name(name), name);
    }
}

proptest! {
    #[test]
    fn prop_normalized_headers_are_unique_identifiers(
        raw in proptest::collection::vec(".{0,12}", 0..24)
    ) {
        let names = normalize_headers(&raw);

        prop_assert_eq!(names.len(), raw.len());

        let unique: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(unique.len(), names.len());

        for name in &names {
            prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn prop_first_occurrence_keeps_clean_name(
        raw in proptest::collection::vec("[A-Za-z %.-]{1,8}", 1..10)
    ) {
        let names = normalize_headers(&raw);
        prop_assert_eq!(&names[0], &clean_column_name(&raw[0]));
    }
}
