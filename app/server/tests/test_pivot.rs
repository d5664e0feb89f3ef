//! FILENAME: tests/test_pivot.rs
//! Integration tests for the createPivotTable command.

mod common;

use common::TestHarness;
use pivot_engine::{AggregationType, ValueField};
use serde_json::{json, Value};
use server_lib::{commands, dispatch, PivotTableArgs, SheetRef};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn pivot_args(
    harness: &TestHarness,
    range: &str,
    rows: &[&str],
    values: &[(&str, AggregationType)],
    dest_sheet: Option<&str>,
    dest_cell: Option<&str>,
) -> PivotTableArgs {
    PivotTableArgs {
        handle: harness.handle.clone(),
        source_sheet: SheetRef::from("Sheet1"),
        source_range: range.to_string(),
        row_fields: rows.iter().map(|r| r.to_string()).collect(),
        data_fields: values.iter().map(|(f, a)| ValueField::new(*f, *a)).collect(),
        dest_sheet: dest_sheet.map(str::to_string),
        dest_cell: dest_cell.map(str::to_string),
    }
}

// ============================================================================
// AGGREGATION TESTS
// ============================================================================

#[test]
fn test_groups_keep_first_seen_order() {
    let mut harness = TestHarness::with_item_data();
    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Price", AggregationType::Sum)], Some("Out"), None);
    let result = commands::create_pivot_table(&mut harness.state, args).unwrap();
    assert_eq!(result.sheet, "Out");
    assert_eq!(result.cell, "A1");

    assert_eq!(
        harness.range("Out", "A1:B3"),
        vec![
            vec![json!("Item"), json!("SUM(Price)")],
            vec![json!("Widget"), json!(30.0)],
            vec![json!("Gadget"), json!(15.5)],
        ]
    );
}

#[test]
fn test_non_numeric_values_count_but_do_not_aggregate() {
    let mut harness = TestHarness::with_item_data();
    harness.write("Sheet1", "B4", json!("n/a"));
    let args = pivot_args(
        &harness,
        "A1:C4",
        &["Item"],
        &[
            ("Price", AggregationType::Count),
            ("Price", AggregationType::Sum),
            ("Price", AggregationType::Average),
            ("Price", AggregationType::Min),
            ("Price", AggregationType::Max),
        ],
        Some("Out"),
        None,
    );
    commands::create_pivot_table(&mut harness.state, args).unwrap();

    assert_eq!(
        harness.range("Out", "A1:F2"),
        vec![
            vec![
                json!("Item"),
                json!("COUNT(Price)"),
                json!("SUM(Price)"),
                json!("AVERAGE(Price)"),
                json!("MIN(Price)"),
                json!("MAX(Price)"),
            ],
            vec![json!("Widget"), json!(2.0), json!(25.0), json!(25.0), json!(25.0), json!(25.0)],
        ]
    );
}

#[test]
fn test_formula_cells_contribute_calculated_values() {
    let mut harness = TestHarness::with_item_data();
    harness.write_range(
        "Sheet1",
        "D1",
        vec![
            vec![json!("Total")],
            vec![json!("=B2*C2")],
            vec![json!("=B3*C3")],
            vec![json!("=B4*C4")],
        ],
    );
    let args = pivot_args(&harness, "A1:D4", &["Item"], &[("Total", AggregationType::Sum)], Some("Out"), Some("C5"));
    let result = commands::create_pivot_table(&mut harness.state, args).unwrap();
    assert_eq!(result.cell, "C5");

    assert_eq!(harness.range("Out", "C6:D7"), vec![vec![json!("Widget"), json!(265.0)], vec![json!("Gadget"), json!(310.0)]]);
}

#[test]
fn test_composite_keys() {
    let mut harness = TestHarness::with_sales_data();
    let args = pivot_args(
        &harness,
        "A1:E13",
        &["Region", "Product"],
        &[("Sales", AggregationType::Sum), ("Quantity", AggregationType::Max)],
        Some("ByRegion"),
        None,
    );
    commands::create_pivot_table(&mut harness.state, args).unwrap();

    let grid = harness.range("ByRegion", "A1:D9");
    assert_eq!(grid[0], vec![json!("Region"), json!("Product"), json!("SUM(Sales)"), json!("MAX(Quantity)")]);
    assert_eq!(grid[1], vec![json!("North"), json!("Widget"), json!(2100.0), json!(11.0)]);
    assert_eq!(grid[2], vec![json!("North"), json!("Gadget"), json!(3100.0), json!(16.0)]);
    assert_eq!(grid[8], vec![json!("West"), json!("Gadget"), json!(900.0), json!(9.0)]);
}

// ============================================================================
// DESTINATION TESTS
// ============================================================================

#[test]
fn test_existing_destination_sheet_is_reused() {
    let mut harness = TestHarness::with_item_data();
    harness.create_sheet("Report");
    harness.write("Report", "A1", json!("title"));

    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Qty", AggregationType::Sum)], Some("Report"), Some("A3"));
    commands::create_pivot_table(&mut harness.state, args).unwrap();

    assert_eq!(harness.sheet_names(), vec!["Sheet1", "Report"]);
    assert_eq!(harness.value("Report", "A1"), json!("title"));
    assert_eq!(harness.value("Report", "B4"), json!(13.0));
}

#[test]
fn test_synthesized_destination_sheet() {
    let mut harness = TestHarness::with_item_data();
    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Qty", AggregationType::Average)], None, None);
    let first = commands::create_pivot_table(&mut harness.state, args.clone()).unwrap();
    let second = commands::create_pivot_table(&mut harness.state, args).unwrap();

    assert!(first.sheet.starts_with("Pivot_"));
    assert_ne!(first.sheet, second.sheet);
    assert_eq!(harness.sheet_names().len(), 3);
    assert_eq!(harness.value(&first.sheet, "B2"), json!(6.5));
}

#[test]
fn test_pivot_into_sheet_with_far_corner_cell() {
    let mut harness = TestHarness::with_item_data();
    harness.create_sheet("Out");
    harness.write("Out", "XFD1048576", json!("note"));

    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Qty", AggregationType::Sum)], Some("Out"), None);
    commands::create_pivot_table(&mut harness.state, args).unwrap();

    assert_eq!(harness.value("Out", "B2"), json!(13.0));
    assert_eq!(harness.value("Out", "XFD1048576"), json!("note"));
    let info = commands::get_sheet_info(&harness.state, &harness.handle, &SheetRef::from("Out")).unwrap();
    assert_eq!((info.row_count, info.column_count), (1_048_576, 16_384));
}

#[test]
fn test_rejected_pivot_leaves_no_new_sheet() {
    let mut harness = TestHarness::with_item_data();
    let args = pivot_args(
        &harness,
        "A1:C4",
        &["Item"],
        &[("Qty", AggregationType::Sum)],
        Some("Out"),
        Some("A1048576"),
    );
    let result = commands::create_pivot_table(&mut harness.state, args);
    assert_eq!(TestHarness::code(result), "InvalidArgument");
    assert_eq!(harness.sheet_names(), vec!["Sheet1"]);
}

#[test]
fn test_pivot_results_feed_formulas() {
    let mut harness = TestHarness::with_item_data();
    harness.create_sheet("Out");
    harness.write("Out", "E1", json!("=SUM(B2:B3)"));

    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Price", AggregationType::Sum)], Some("Out"), None);
    commands::create_pivot_table(&mut harness.state, args).unwrap();
    assert_eq!(harness.value("Out", "E1"), json!(45.5));
}

// ============================================================================
// ERROR TESTS
// ============================================================================

#[test]
fn test_invalid_source_and_destination() {
    let mut harness = TestHarness::with_item_data();

    let args = pivot_args(&harness, "A1-C4", &["Item"], &[("Price", AggregationType::Sum)], None, None);
    assert_eq!(TestHarness::code(commands::create_pivot_table(&mut harness.state, args)), "InvalidRange");

    let args = pivot_args(&harness, "A1:C4", &["Item"], &[("Price", AggregationType::Sum)], None, Some("5E"));
    assert_eq!(TestHarness::code(commands::create_pivot_table(&mut harness.state, args)), "InvalidAddress");

    let mut args = pivot_args(&harness, "A1:C4", &["Item"], &[("Price", AggregationType::Sum)], None, None);
    args.source_sheet = SheetRef::from(9);
    assert_eq!(TestHarness::code(commands::create_pivot_table(&mut harness.state, args)), "SheetNotFound");

    // failed requests create no sheets
    assert_eq!(harness.sheet_names(), vec!["Sheet1"]);
}

#[test]
fn test_unknown_aggregation_through_dispatch() {
    let mut harness = TestHarness::with_item_data();
    let arguments = json!({
        "handle": harness.handle,
        "sourceSheet": "Sheet1",
        "sourceRange": "A1:C4",
        "rowFields": ["Item"],
        "dataFields": [{"field": "Price", "aggregation": "median"}],
    });
    let err = dispatch(&mut harness.state, "createPivotTable", arguments).unwrap_err();
    assert_eq!(err.code(), "InvalidArgument");

    let arguments = json!({
        "handle": harness.handle,
        "sourceSheet": 1,
        "sourceRange": "A1:C4",
        "rowFields": ["Item"],
        "dataFields": [{"field": "Price", "aggregation": "SUM"}],
        "destSheet": "Out",
    });
    let result: Value = dispatch(&mut harness.state, "createPivotTable", arguments).unwrap();
    assert_eq!(result, json!({"sheet": "Out", "cell": "A1"}));
}
