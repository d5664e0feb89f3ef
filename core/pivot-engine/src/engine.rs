//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - groups source records and aggregates each group.
//!
//! Records are partitioned by a composite key: the display text of each row
//! field's value joined with '|'. Groups are emitted in the order their key
//! is first seen. Value fields aggregate over the numeric subset of the
//! field in the group, except COUNT which counts rows.

use crate::cache::{AggregateAccumulator, PivotCache};
use crate::definition::{FieldIndex, PivotDefinition};
use crate::view::{PivotRow, PivotView};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

const KEY_SEPARATOR: &str = "|";

/// Result of a calculation: the view plus any non-fatal warnings
/// (field names missing from the header vocabulary).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotOutput {
    pub view: PivotView,
    pub warnings: Vec<String>,
}

struct Group {
    segments: SmallVec<[String; 4]>,
    accumulators: SmallVec<[AggregateAccumulator; 4]>,
}

/// Calculates a pivot table view from definition and cache.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(definition: &PivotDefinition, cache: &PivotCache) -> PivotOutput {
    let mut warnings = Vec::new();
    let mut resolve = |name: &str| -> Option<FieldIndex> {
        let index = cache.field_index(name);
        if index.is_none() {
            warnings.push(format!("Unknown pivot field '{}' treated as empty", name));
        }
        index
    };

    let row_fields: Vec<Option<FieldIndex>> =
        definition.row_fields.iter().map(|f| resolve(f)).collect();
    let value_fields: Vec<Option<FieldIndex>> = definition
        .value_fields
        .iter()
        .map(|v| resolve(&v.field))
        .collect();

    let mut index_by_key: FxHashMap<String, usize> = FxHashMap::default();
    let mut groups: Vec<Group> = Vec::new();

    for record in 0..cache.record_count() {
        let segments: SmallVec<[String; 4]> = row_fields
            .iter()
            .map(|field| cache.record_value(record, *field).to_string())
            .collect();
        let key = segments.join(KEY_SEPARATOR);

        let group_index = *index_by_key.entry(key).or_insert_with(|| {
            groups.push(Group {
                segments,
                accumulators: value_fields
                    .iter()
                    .map(|_| AggregateAccumulator::new())
                    .collect(),
            });
            groups.len() - 1
        });

        let group = &mut groups[group_index];
        for (acc, field) in group.accumulators.iter_mut().zip(&value_fields) {
            acc.add(cache.record_value(record, *field));
        }
    }

    let header = definition
        .row_fields
        .iter()
        .cloned()
        .chain(definition.value_fields.iter().map(|v| v.header()))
        .collect();

    let rows = groups
        .into_iter()
        .map(|group| PivotRow {
            labels: group.segments.into_vec(),
            values: group
                .accumulators
                .iter()
                .zip(&definition.value_fields)
                .map(|(acc, field)| acc.compute(field.aggregation))
                .collect(),
        })
        .collect();

    PivotOutput {
        view: PivotView { header, rows },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AggregationType, ValueField};
    use engine::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn create_test_cache() -> PivotCache {
        PivotCache::new(
            &[text("Item"), text("Price"), text("Qty")],
            vec![
                vec![text("Widget"), num(25.0), num(10.0)],
                vec![text("Gadget"), num(15.5), num(20.0)],
                vec![text("Widget"), num(5.0), num(3.0)],
            ],
        )
    }

    fn definition(rows: &[&str], values: &[(&str, AggregationType)]) -> PivotDefinition {
        PivotDefinition::new(
            rows.iter().map(|s| s.to_string()).collect(),
            values
                .iter()
                .map(|(f, a)| ValueField::new(*f, *a))
                .collect(),
        )
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let cache = create_test_cache();
        let output = calculate_pivot(&definition(&["Item"], &[("Price", AggregationType::Sum)]), &cache);

        assert!(output.warnings.is_empty());
        assert_eq!(output.view.header, vec!["Item", "SUM(Price)"]);
        assert_eq!(
            output.view.rows,
            vec![
                PivotRow {
                    labels: vec!["Widget".to_string()],
                    values: vec![30.0],
                },
                PivotRow {
                    labels: vec!["Gadget".to_string()],
                    values: vec![15.5],
                },
            ]
        );
    }

    #[test]
    fn test_all_aggregations() {
        let cache = create_test_cache();
        let def = definition(
            &["Item"],
            &[
                ("Qty", AggregationType::Count),
                ("Qty", AggregationType::Average),
                ("Qty", AggregationType::Min),
                ("Qty", AggregationType::Max),
            ],
        );
        let output = calculate_pivot(&def, &cache);
        assert_eq!(output.view.rows[0].values, vec![2.0, 6.5, 3.0, 10.0]);
        assert_eq!(output.view.rows[1].values, vec![1.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_non_numeric_counts_but_does_not_sum() {
        let cache = PivotCache::new(
            &[text("Item"), text("Price")],
            vec![
                vec![text("Widget"), num(10.0)],
                vec![text("Widget"), text("n/a")],
                vec![text("Widget"), num(20.0)],
            ],
        );
        let def = definition(
            &["Item"],
            &[
                ("Price", AggregationType::Sum),
                ("Price", AggregationType::Count),
                ("Price", AggregationType::Average),
            ],
        );
        let output = calculate_pivot(&def, &cache);
        assert_eq!(output.view.rows[0].values, vec![30.0, 3.0, 15.0]);
    }

    #[test]
    fn test_composite_keys_and_empty_segments() {
        let cache = PivotCache::new(
            &[text("Region"), text("Product"), text("Sales")],
            vec![
                vec![text("North"), text("Apples"), num(100.0)],
                vec![text("North"), CellValue::Empty, num(50.0)],
                vec![text("North"), text("Apples"), num(25.0)],
                vec![text("South"), text("Apples"), num(200.0)],
            ],
        );
        let def = definition(&["Region", "Product"], &[("Sales", AggregationType::Sum)]);
        let output = calculate_pivot(&def, &cache);

        let labels: Vec<Vec<String>> = output.view.rows.iter().map(|r| r.labels.clone()).collect();
        assert_eq!(
            labels,
            vec![
                vec!["North".to_string(), "Apples".to_string()],
                vec!["North".to_string(), String::new()],
                vec!["South".to_string(), "Apples".to_string()],
            ]
        );
        assert_eq!(output.view.rows[0].values, vec![125.0]);
    }

    #[test]
    fn test_no_row_fields_makes_one_group() {
        let cache = create_test_cache();
        let output = calculate_pivot(&definition(&[], &[("Price", AggregationType::Sum)]), &cache);
        assert_eq!(output.view.header, vec!["SUM(Price)"]);
        assert_eq!(output.view.rows.len(), 1);
        assert_eq!(output.view.rows[0].values, vec![45.5]);
    }

    #[test]
    fn test_unknown_fields_warn_and_read_empty() {
        let cache = create_test_cache();
        let def = definition(
            &["Colour"],
            &[("Price", AggregationType::Sum), ("Weight", AggregationType::Max)],
        );
        let output = calculate_pivot(&def, &cache);
        assert_eq!(output.warnings.len(), 2);
        assert_eq!(output.view.rows.len(), 1);
        assert_eq!(output.view.rows[0].labels, vec![String::new()]);
        assert_eq!(output.view.rows[0].values, vec![45.5, 0.0]);
    }

    #[test]
    fn test_numbers_group_by_display_text() {
        let cache = PivotCache::new(
            &[text("Year"), text("Sales")],
            vec![
                vec![num(2024.0), num(1.0)],
                vec![text("2024"), num(2.0)],
            ],
        );
        let output = calculate_pivot(&definition(&["Year"], &[("Sales", AggregationType::Sum)]), &cache);
        assert_eq!(output.view.rows.len(), 1);
        assert_eq!(output.view.rows[0].values, vec![3.0]);
    }

    #[test]
    fn test_grid_output() {
        let cache = create_test_cache();
        let output = calculate_pivot(&definition(&["Item"], &[("Price", AggregationType::Sum)]), &cache);
        let grid = output.view.to_grid();
        assert_eq!(output.view.size(), (3, 2));
        assert_eq!(grid[0], vec![text("Item"), text("SUM(Price)")]);
        assert_eq!(grid[2], vec![text("Gadget"), num(15.5)]);
    }
}
