use super::table::BatchTable;
use super::validate::{missing_columns, validate_columns};
use crate::logic::features::layout::LEXICAL_LAYOUT;
use crate::logic::features::{assemble, FeatureSchema};
use proptest::prelude::*;

fn lexical_csv(drop: Option<&str>) -> String {
    let headers: Vec<&str> = LEXICAL_LAYOUT.iter().copied().filter(|h| Some(*h) != drop).collect();
    let row = vec!["1"; headers.len()];
    format!("{}\n{}\n", headers.join(","), row.join(","))
}

#[test]
fn test_missing_followers_column_fails() {
    let schema = FeatureSchema::lexical();
    let table = BatchTable::from_csv_str(&lexical_csv(Some("#followers"))).unwrap();
    let before = table.clone();

    let err = validate_columns(&table, &schema).unwrap_err();
    assert_eq!(err.missing, vec!["#followers".to_string()]);
    assert_eq!(table, before);
}

#[test]
fn test_complete_table_passes() {
    let schema = FeatureSchema::lexical();
    let table = BatchTable::from_csv_str(&lexical_csv(None)).unwrap();
    assert!(validate_columns(&table, &schema).is_ok());

    // Every row assembles once the columns are present
    for record in table.records() {
        assert_eq!(assemble(&record, &schema).unwrap().len(), schema.len());
    }
}

#[test]
fn test_missing_reported_in_schema_order() {
    let schema = FeatureSchema::new(["z", "a", "m"]).unwrap();
    let table = BatchTable::from_csv_str("a,other\n1,2\n").unwrap();
    assert_eq!(missing_columns(&table, &schema), vec!["z", "m"]);
}

#[test]
fn test_column_names_match_exactly() {
    let schema = FeatureSchema::new(["#followers"]).unwrap();
    let table = BatchTable::from_csv_str("followers\n1\n").unwrap();
    assert!(validate_columns(&table, &schema).is_err());
}

proptest! {
    #[test]
    fn prop_extra_columns_never_change_outcome(
        present in proptest::collection::vec(any::<bool>(), 4),
        extras in proptest::collection::vec("[x-z]{1,6}", 0..4),
    ) {
        let schema = FeatureSchema::new(["a", "b", "c", "d"]).unwrap();
        let mut headers: Vec<String> = schema
            .iter()
            .zip(&present)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| name.to_string())
            .collect();

        let base = BatchTable::new(headers.clone(), Vec::new()).unwrap();
        headers.extend(extras);
        let widened = BatchTable::new(headers, Vec::new()).unwrap();

        let expected_ok = present.iter().all(|p| *p);
        prop_assert_eq!(validate_columns(&base, &schema).is_ok(), expected_ok);
        prop_assert_eq!(validate_columns(&widened, &schema).is_ok(), expected_ok);
    }
}
