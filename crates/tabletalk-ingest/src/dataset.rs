//! Normalized tabular data produced by ingestion.

use serde::{Deserialize, Serialize};

/// A parsed dataset: an ordered header plus rows of string cells.
///
/// Every row holds exactly `columns.len()` cells. Missing cells normalize to
/// the empty string so downstream formatting is total — there is no null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Name derived from the source file stem; later used as the relational
    /// table name.
    pub name: String,
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Row cells, one Vec per source row, in source order.
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the dataset parsed but carries no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows as (column, cell) pairs.
    pub fn iter_cells(&self, row: usize) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.rows[row].iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset {
            name: "listings".to_string(),
            columns: vec!["Address".to_string(), "Unit".to_string()],
            rows: vec![
                vec!["12 Main St".to_string(), "2B".to_string()],
                vec!["12 Main St".to_string(), "".to_string()],
            ],
        }
    }

    #[test]
    fn test_row_count() {
        assert_eq!(sample().row_count(), 2);
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_iter_cells_pairs_in_order() {
        let ds = sample();
        let cells: Vec<(&str, &str)> = ds.iter_cells(0).collect();
        assert_eq!(cells, vec![("Address", "12 Main St"), ("Unit", "2B")]);
    }

    #[test]
    fn test_empty_cell_is_empty_string_not_absent() {
        let ds = sample();
        let cells: Vec<(&str, &str)> = ds.iter_cells(1).collect();
        assert_eq!(cells[1], ("Unit", ""));
    }
}
