//! Identifier sanitization and the cached schema descriptor.

use tabletalk_ingest::Dataset;

/// Declared SQLite column affinity for a projected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Real,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
        }
    }
}

/// Textual capture of the loaded table's column names and types.
///
/// Produced at ingestion time and cached; query-time SQL generation requires
/// it. Its absence means "knowledge base not loaded", which is distinct from
/// a loaded table that happens to be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub table: String,
    pub columns: Vec<(String, ColumnType)>,
}

impl SchemaDescriptor {
    /// Render the schema for prompt construction:
    /// `table listings (Address TEXT, Rent REAL)`.
    pub fn to_prompt_text(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty.as_sql()))
            .collect();
        format!("table {} ({})", self.table, cols.join(", "))
    }
}

/// Sanitize a column or table name into a safe identifier.
///
/// Spaces and slashes become underscores; parentheses are stripped; any other
/// non-alphanumeric character becomes an underscore. A leading digit gets a
/// `t_` guard so the result is always a valid bare identifier.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            '(' | ')' => {}
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            _ => out.push('_'),
        }
    }
    if out.is_empty() {
        out.push_str("unnamed");
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert_str(0, "t_");
    }
    out
}

/// Infer a column's type: REAL when every non-empty cell parses as a float,
/// otherwise TEXT. All-empty columns stay TEXT.
pub fn infer_column_type(dataset: &Dataset, column: usize) -> ColumnType {
    let mut saw_value = false;
    for row in &dataset.rows {
        let cell = row[column].trim();
        if cell.is_empty() {
            continue;
        }
        saw_value = true;
        if cell.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }
    if saw_value {
        ColumnType::Real
    } else {
        ColumnType::Text
    }
}
