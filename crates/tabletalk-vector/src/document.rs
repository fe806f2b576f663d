//! Row document rendering.
//!
//! One comprehensive document per source row gives the model clean,
//! unambiguous context for structured data. Documents are immutable once
//! built and regenerated wholesale on re-ingestion.

use tabletalk_ingest::Dataset;

/// Fixed label prefixed to every row document.
const DOC_LABEL: &str = "Record";

/// Render one row's `(column, cell)` pairs as a flat document.
///
/// Empty cells are skipped so the document only carries real data.
pub fn render_document<'a>(cells: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    let parts: Vec<String> = cells
        .filter(|(_, value)| !value.is_empty())
        .map(|(col, value)| format!("{}: {}", col, value))
        .collect();
    format!("{} -> {}.", DOC_LABEL, parts.join(", "))
}

/// Render every row of a dataset, in source order.
pub fn render_all(dataset: &Dataset) -> Vec<String> {
    (0..dataset.rows.len())
        .map(|row| render_document(dataset.iter_cells(row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn doc(columns: &[&str], row: &[&str]) -> String {
        render_document(columns.iter().copied().zip(row.iter().copied()))
    }

    #[test]
    fn test_render_document_basic() {
        let doc = doc(&["Address", "Unit", "Rent"], &["12 Main St", "2B", "2400"]);
        assert_eq!(doc, "Record -> Address: 12 Main St, Unit: 2B, Rent: 2400.");
    }

    #[test]
    fn test_render_document_skips_empty_cells() {
        let doc = doc(&["Address", "Unit", "Rent"], &["12 Main St", "", "2400"]);
        assert_eq!(doc, "Record -> Address: 12 Main St, Rent: 2400.");
    }

    #[test]
    fn test_render_document_all_empty() {
        assert_eq!(doc(&["A", "B"], &["", ""]), "Record -> .");
    }

    #[test]
    fn test_render_all_preserves_order() {
        let dataset = Dataset {
            name: "listings".to_string(),
            columns: cols(&["Unit"]),
            rows: vec![cols(&["1A"]), cols(&["2B"])],
        };
        let docs = render_all(&dataset);
        assert_eq!(docs.len(), 2);
        assert!(docs[0].contains("1A"));
        assert!(docs[1].contains("2B"));
    }

    #[test]
    fn test_identical_rows_render_identically() {
        assert_eq!(doc(&["Unit"], &["2B"]), doc(&["Unit"], &["2B"]));
    }
}
