//! FILENAME: tests/test_cells.rs
//! Integration tests for cell and range tools.

mod common;

use common::TestHarness;
use serde_json::{json, Value};
use server_lib::{commands, SheetRef};

// ============================================================================
// SINGLE CELLS
// ============================================================================

#[test]
fn test_formula_reads_calculated_value_and_formula() {
    let mut harness = TestHarness::new();
    harness.write("Sheet1", "A1", json!(5));
    harness.write("Sheet1", "A2", json!(10));
    let written = harness.write("Sheet1", "A3", json!("=SUM(A1:A2)"));
    assert_eq!(written, json!(15.0));

    let read = commands::read_cell(&harness.state, &harness.handle, &SheetRef::from("Sheet1"), "A3").unwrap();
    assert_eq!(read.address, "A3");
    assert_eq!(read.calculated_value, json!(15.0));
    assert_eq!(read.formula.as_deref(), Some("=SUM(A1:A2)"));
    assert_eq!(harness.formula("Sheet1", "A3").as_deref(), Some("=SUM(A1:A2)"));
}

#[test]
fn test_dependents_follow_later_writes() {
    let mut harness = TestHarness::new();
    harness.write("Sheet1", "B1", json!("=A1*2"));
    assert_eq!(harness.value("Sheet1", "B1"), json!(0.0));

    harness.write("Sheet1", "A1", json!(21));
    assert_eq!(harness.value("Sheet1", "B1"), json!(42.0));
}

#[test]
fn test_literal_types() {
    let mut harness = TestHarness::new();
    harness.write("Sheet1", "A1", json!("hello"));
    harness.write("Sheet1", "A2", json!(true));
    harness.write("Sheet1", "A3", json!({"date": "2024-01-01T12:00:00"}));

    assert_eq!(harness.value("Sheet1", "A1"), json!("hello"));
    assert_eq!(harness.value("Sheet1", "A2"), json!(true));
    // the engine sees dates as serial numbers
    assert_eq!(harness.value("Sheet1", "A3"), json!(45292.5));

    let read = commands::read_cell(&harness.state, &harness.handle, &SheetRef::from(1), "A3").unwrap();
    assert_eq!(read.value, json!("2024-01-01T12:00:00"));
}

#[test]
fn test_null_clears_cell() {
    let mut harness = TestHarness::new();
    harness.write("Sheet1", "C3", json!(9));
    harness.write("Sheet1", "C3", Value::Null);
    assert_eq!(harness.value("Sheet1", "C3"), Value::Null);
    assert_eq!(harness.formula("Sheet1", "C3"), None);
}

#[test]
fn test_formula_errors_are_values_not_failures() {
    let mut harness = TestHarness::new();
    assert_eq!(harness.write("Sheet1", "A1", json!("=1/0")), json!("#DIV/0!"));
    assert_eq!(harness.write("Sheet1", "A2", json!("=NOSUCH(1)")), json!("#NAME?"));
    assert_eq!(harness.write("Sheet1", "A3", json!("=A3+1")), json!("#CYCLE!"));
}

#[test]
fn test_cross_sheet_reference() {
    let mut harness = TestHarness::new();
    harness.create_sheet("Rates");
    harness.write("Rates", "A1", json!(0.25));
    harness.write("Sheet1", "A1", json!(200));
    assert_eq!(harness.write("Sheet1", "B1", json!("=A1*Rates!A1")), json!(50.0));
}

#[test]
fn test_invalid_addresses() {
    let mut harness = TestHarness::new();
    let sheet = SheetRef::from("Sheet1");
    for bad in ["1A", "A0", "", "A1B"] {
        let result = commands::read_cell(&harness.state, &harness.handle, &sheet, bad);
        assert_eq!(TestHarness::code(result), "InvalidAddress", "address {:?}", bad);
    }
    let result = commands::write_cell(&mut harness.state, &harness.handle, &sheet, "ZZ", &json!(1));
    assert_eq!(TestHarness::code(result), "InvalidAddress");
}

#[test]
fn test_write_outside_limits_is_rejected() {
    let mut harness = TestHarness::new();
    let result = commands::write_cell(
        &mut harness.state,
        &harness.handle,
        &SheetRef::from("Sheet1"),
        "A1048577",
        &json!(1),
    );
    assert_eq!(TestHarness::code(result), "InvalidArgument");
}

// ============================================================================
// RANGES
// ============================================================================

#[test]
fn test_write_range_then_read_calculated() {
    let mut harness = TestHarness::new();
    let written = harness.write_range("Sheet1", "A1", vec![vec![json!(2), json!(3), json!("=A1*B1")]]);
    assert_eq!(written, 3);
    assert_eq!(harness.range("Sheet1", "A1:C1"), vec![vec![json!(2.0), json!(3.0), json!(6.0)]]);
}

#[test]
fn test_write_range_reports_span() {
    let mut harness = TestHarness::new();
    let result = commands::write_range(
        &mut harness.state,
        &harness.handle,
        &SheetRef::from("Sheet1"),
        "B2",
        &[vec![json!(1), json!(2)], vec![json!(3)], vec![json!(4), json!(5), json!(6)]],
    )
    .unwrap();
    assert_eq!(result.range, "B2:D4");
    assert_eq!(result.cells_written, 6);
    assert_eq!(harness.value("Sheet1", "D4"), json!(6.0));
    assert_eq!(harness.value("Sheet1", "C3"), Value::Null);
}

#[test]
fn test_write_range_rejects_empty_and_bad_values() {
    let mut harness = TestHarness::new();
    let sheet = SheetRef::from("Sheet1");
    let result = commands::write_range(&mut harness.state, &harness.handle, &sheet, "A1", &[vec![]]);
    assert_eq!(TestHarness::code(result), "InvalidArgument");

    let result = commands::write_range(
        &mut harness.state,
        &harness.handle,
        &sheet,
        "A1",
        &[vec![json!(1), json!([1, 2])]],
    );
    assert_eq!(TestHarness::code(result), "InvalidArgument");
    // nothing from the rejected batch was stored
    assert_eq!(harness.value("Sheet1", "A1"), Value::Null);
}

#[test]
fn test_reversed_range_is_normalized() {
    let mut harness = TestHarness::new();
    harness.write_range("Sheet1", "A1", vec![vec![json!(1), json!(2)], vec![json!(3), json!(4)]]);

    let result = commands::read_range(&harness.state, &harness.handle, &SheetRef::from("Sheet1"), "B2:A1").unwrap();
    assert_eq!(result.range, "A1:B2");
    assert_eq!(
        result.values,
        vec![vec![json!(1.0), json!(2.0)], vec![json!(3.0), json!(4.0)]]
    );
}

#[test]
fn test_invalid_range_text() {
    let harness = TestHarness::new();
    let sheet = SheetRef::from("Sheet1");
    for bad in ["A1", "A1:B2:C3", "A1:", "1A:B2"] {
        let result = commands::read_range(&harness.state, &harness.handle, &sheet, bad);
        assert_eq!(TestHarness::code(result), "InvalidRange", "range {:?}", bad);
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

#[test]
fn test_list_columns_uses_header_row() {
    let harness = TestHarness::with_item_data();
    let columns = commands::list_columns(&harness.state, &harness.handle, &SheetRef::from(1), None).unwrap();

    let headers: Vec<(String, u32, String)> = columns
        .into_iter()
        .map(|c| (c.column, c.index, c.header))
        .collect();
    assert_eq!(
        headers,
        vec![
            ("A".to_string(), 1, "Item".to_string()),
            ("B".to_string(), 2, "Price".to_string()),
            ("C".to_string(), 3, "Qty".to_string()),
        ]
    );

    let second_row = commands::list_columns(&harness.state, &harness.handle, &SheetRef::from(1), Some(2)).unwrap();
    assert_eq!(second_row[1].header, "25");
}
