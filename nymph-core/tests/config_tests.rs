// Tests for order table loading

use nymph_core::config::{OrderDescriptor, OrderTable};
use nymph_core::error::TrawlError;
use std::io::Write;
use tempfile::NamedTempFile;

// ============================================================================
// Record List Tests
// ============================================================================

#[test]
fn test_load_record_list() {
    let table = OrderTable::from_json(
        r#"[
            {"order": "Insect-Plecoptera", "tn_num": 13, "directory": "stoneflies"},
            {"order": "Insect-Ephemeroptera", "tn_num": 2, "directory": "mayflies"}
        ]"#,
    )
    .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.names(), vec!["Insect-Plecoptera", "Insect-Ephemeroptera"]);
    assert_eq!(table.site_ids(), vec![13, 2]);
    assert_eq!(table.directory_for("Insect-Ephemeroptera"), Some("mayflies"));
    assert_eq!(table.directory_for("Insect-Odonata"), None);
}

#[test]
fn test_load_record_list_with_aliases() {
    let table =
        OrderTable::from_json(r#"[{"name": "Plecoptera", "id": 13, "directory": "stoneflies"}]"#)
            .unwrap();

    assert_eq!(
        table.row(0),
        Some(&OrderDescriptor {
            order: "Plecoptera".to_string(),
            tn_num: 13,
            directory: "stoneflies".to_string(),
        })
    );
}

// ============================================================================
// Column Table Tests
// ============================================================================

#[test]
fn test_load_column_table_orders_rows_numerically() {
    let table = OrderTable::from_json(
        r#"{
            "orders": {"0": "Insect-Plecoptera", "10": "Insect-Odonata", "2": "Insect-Trichoptera"},
            "tn_nums": {"0": 13, "10": 40, "2": 11},
            "directory": {"0": "stoneflies", "10": "dragonflies", "2": "caddisflies"}
        }"#,
    )
    .unwrap();

    assert_eq!(
        table.names(),
        vec!["Insect-Plecoptera", "Insect-Trichoptera", "Insect-Odonata"]
    );
    assert_eq!(table.site_ids(), vec![13, 11, 40]);
    assert_eq!(table.row(2).unwrap().directory, "dragonflies");
}

#[test]
fn test_column_table_with_missing_cell() {
    let result = OrderTable::from_json(
        r#"{
            "orders": {"0": "Insect-Plecoptera", "1": "Insect-Odonata"},
            "tn_nums": {"0": 13},
            "directory": {"0": "stoneflies", "1": "dragonflies"}
        }"#,
    );
    assert!(matches!(result, Err(TrawlError::Config(_))));
}

#[test]
fn test_column_table_with_extra_cell() {
    let result = OrderTable::from_json(
        r#"{
            "orders": {"0": "Insect-Plecoptera"},
            "tn_nums": {"0": 13, "1": 40},
            "directory": {"0": "stoneflies"}
        }"#,
    );
    assert!(matches!(result, Err(TrawlError::Config(_))));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_empty_table_is_rejected() {
    assert!(matches!(OrderTable::from_json("[]"), Err(TrawlError::Config(_))));
}

#[test]
fn test_duplicate_order_is_rejected() {
    let result = OrderTable::from_json(
        r#"[
            {"order": "Plecoptera", "tn_num": 13, "directory": "a"},
            {"order": "Plecoptera", "tn_num": 14, "directory": "b"}
        ]"#,
    );
    assert!(matches!(result, Err(TrawlError::Config(_))));
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(matches!(
        OrderTable::from_json("{not json"),
        Err(TrawlError::Config(_))
    ));
}

#[test]
fn test_missing_file_is_rejected() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let result = OrderTable::load(&temp_dir.path().join("urlinfo.json"));
    assert!(matches!(result, Err(TrawlError::Config(_))));
}

#[test]
fn test_load_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(
        temp_file,
        r#"[{{"order": "Plecoptera", "tn_num": 13, "directory": "stoneflies"}}]"#
    )?;

    let table = OrderTable::load(temp_file.path())?;
    assert_eq!(table.directory_for("Plecoptera"), Some("stoneflies"));
    Ok(())
}
