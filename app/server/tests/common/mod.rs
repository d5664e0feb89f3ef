//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for tool server integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use server_lib::{commands, create_app_state, AppState, SheetRef, ToolError};

/// Test harness holding app state and one open workbook.
pub struct TestHarness {
    pub state: AppState,
    pub handle: String,
}

impl TestHarness {
    /// Create a harness with a fresh workbook (one empty Sheet1).
    pub fn new() -> Self {
        let mut state = create_app_state();
        let handle = commands::create_workbook(&mut state).unwrap().handle;
        TestHarness { state, handle }
    }

    /// Create a harness with the Item/Price/Qty table at Sheet1!A1:C4.
    pub fn with_item_data() -> Self {
        let mut harness = Self::new();
        harness.write_range("Sheet1", "A1", ItemFixture::rows());
        harness
    }

    /// Create a harness with the sales table at Sheet1!A1:E13.
    pub fn with_sales_data() -> Self {
        let mut harness = Self::new();
        let mut rows = vec![SalesFixture::headers().iter().map(|h| json!(h)).collect::<Vec<_>>()];
        for (region, product, quarter, sales, quantity) in SalesFixture::data() {
            rows.push(vec![
                json!(region),
                json!(product),
                json!(quarter),
                json!(sales),
                json!(quantity),
            ]);
        }
        harness.write_range("Sheet1", "A1", rows);
        harness
    }

    /// Create a harness whose workbook has `count` sheets named Sheet1..SheetN.
    pub fn with_multiple_sheets(count: usize) -> Self {
        let mut harness = Self::new();
        for i in 2..=count {
            harness.create_sheet(&format!("Sheet{}", i));
        }
        harness
    }

    // ========================================================================
    // HELPER METHODS
    // ========================================================================

    pub fn write(&mut self, sheet: &str, address: &str, value: Value) -> Value {
        commands::write_cell(&mut self.state, &self.handle, &SheetRef::from(sheet), address, &value)
            .unwrap()
            .calculated_value
    }

    pub fn write_range(&mut self, sheet: &str, start: &str, values: Vec<Vec<Value>>) -> usize {
        commands::write_range(&mut self.state, &self.handle, &SheetRef::from(sheet), start, &values)
            .unwrap()
            .cells_written
    }

    /// Calculated value of a cell.
    pub fn value(&self, sheet: &str, address: &str) -> Value {
        commands::read_cell(&self.state, &self.handle, &SheetRef::from(sheet), address)
            .unwrap()
            .calculated_value
    }

    pub fn range(&self, sheet: &str, range: &str) -> Vec<Vec<Value>> {
        commands::read_range(&self.state, &self.handle, &SheetRef::from(sheet), range)
            .unwrap()
            .values
    }

    pub fn formula(&self, sheet: &str, address: &str) -> Option<String> {
        commands::get_formula(&self.state, &self.handle, &SheetRef::from(sheet), address)
            .unwrap()
            .formula
    }

    pub fn create_sheet(&mut self, name: &str) -> usize {
        commands::create_sheet(&mut self.state, &self.handle, name)
            .unwrap()
            .index
    }

    pub fn sheet_names(&self) -> Vec<String> {
        commands::list_sheets(&self.state, &self.handle)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect()
    }

    /// Error code of a failed call.
    pub fn code<T: std::fmt::Debug>(result: Result<T, ToolError>) -> &'static str {
        result.unwrap_err().code()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub struct ItemFixture;

impl ItemFixture {
    pub fn rows() -> Vec<Vec<Value>> {
        vec![
            vec![json!("Item"), json!("Price"), json!("Qty")],
            vec![json!("Widget"), json!(25), json!(10)],
            vec![json!("Gadget"), json!(15.5), json!(20)],
            vec![json!("Widget"), json!(5), json!(3)],
        ]
    }
}

/// Sales data fixture for pivot tests.
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Region", "Product", "Quarter", "Sales", "Quantity"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 1000.0, 10.0),
            ("North", "Gadget", "Q1", 1500.0, 15.0),
            ("South", "Widget", "Q1", 800.0, 8.0),
            ("South", "Gadget", "Q1", 1200.0, 12.0),
            ("North", "Widget", "Q2", 1100.0, 11.0),
            ("North", "Gadget", "Q2", 1600.0, 16.0),
            ("South", "Widget", "Q2", 900.0, 9.0),
            ("South", "Gadget", "Q2", 1300.0, 13.0),
            ("East", "Widget", "Q1", 700.0, 7.0),
            ("East", "Gadget", "Q1", 1000.0, 10.0),
            ("West", "Widget", "Q1", 600.0, 6.0),
            ("West", "Gadget", "Q1", 900.0, 9.0),
        ]
    }
}
