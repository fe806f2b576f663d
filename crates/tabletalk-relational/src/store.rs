//! SQLite-backed relational knowledge store.

use std::path::Path;
use std::sync::{Mutex, RwLock};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::{info, warn};

use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_ingest::Dataset;

use crate::schema::{infer_column_type, sanitize_identifier, ColumnType, SchemaDescriptor};

/// Response text when a query matches nothing.
const EMPTY_RESULT_TEXT: &str = "The query returned no rows.";

/// A single-table relational projection of the ingested dataset.
///
/// The table is replaced wholesale on each successful load, never merged.
/// Query execution is read-scoped: only SELECT-shaped statements run, and
/// execution failures are rendered as descriptive text rather than errors,
/// because a misgenerated query is a retryable condition for the caller.
pub struct SqlKnowledgeStore {
    conn: Mutex<Connection>,
    schema: RwLock<Option<SchemaDescriptor>>,
}

impl SqlKnowledgeStore {
    /// Open (or create) the knowledge database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| TabletalkError::Storage(format!("failed to open database: {}", e)))?;
        info!("Knowledge database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            schema: RwLock::new(None),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TabletalkError::Storage(format!("failed to open in-memory db: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            schema: RwLock::new(None),
        })
    }

    /// Materialize the dataset into a single table and cache its schema.
    ///
    /// Runs DROP + CREATE + INSERT inside one transaction: a failure rolls
    /// back, leaving the previously loaded table and cached descriptor
    /// untouched. The caller sees overwrite as all-or-nothing.
    pub fn load(&self, dataset: &Dataset) -> Result<SchemaDescriptor> {
        let table = sanitize_identifier(&dataset.name);
        let columns: Vec<(String, ColumnType)> = dataset
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (sanitize_identifier(name), infer_column_type(dataset, i)))
            .collect();

        let descriptor = SchemaDescriptor {
            table: table.clone(),
            columns: columns.clone(),
        };

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| TabletalkError::Storage(format!("lock poisoned: {}", e)))?;
        let tx = conn
            .transaction()
            .map_err(|e| TabletalkError::Load(e.to_string()))?;

        let col_defs: Vec<String> = columns
            .iter()
            .map(|(name, ty)| format!("\"{}\" {}", name, ty.as_sql()))
            .collect();

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{}\"; CREATE TABLE \"{}\" ({});",
            table,
            table,
            col_defs.join(", ")
        ))
        .map_err(|e| TabletalkError::Load(format!("failed to create table: {}", e)))?;

        {
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let insert_sql = format!(
                "INSERT INTO \"{}\" VALUES ({})",
                table,
                placeholders.join(", ")
            );
            let mut stmt = tx
                .prepare(&insert_sql)
                .map_err(|e| TabletalkError::Load(e.to_string()))?;

            for row in &dataset.rows {
                let params = rusqlite::params_from_iter(row.iter().zip(columns.iter()).map(
                    |(cell, (_, ty))| match ty {
                        // Empty cells in numeric columns become NULL so
                        // aggregates behave; text columns keep "".
                        ColumnType::Real if cell.trim().is_empty() => {
                            rusqlite::types::Value::Null
                        }
                        ColumnType::Real => cell
                            .trim()
                            .parse::<f64>()
                            .map(rusqlite::types::Value::Real)
                            .unwrap_or(rusqlite::types::Value::Null),
                        ColumnType::Text => rusqlite::types::Value::Text(cell.clone()),
                    },
                ));
                stmt.execute(params)
                    .map_err(|e| TabletalkError::Load(format!("failed to insert row: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| TabletalkError::Load(format!("failed to commit load: {}", e)))?;

        // Cache only after a committed load.
        {
            let mut cached = self
                .schema
                .write()
                .map_err(|e| TabletalkError::Storage(format!("lock poisoned: {}", e)))?;
            *cached = Some(descriptor.clone());
        }

        info!(
            table = %table,
            columns = columns.len(),
            rows = dataset.rows.len(),
            "Dataset loaded into relational store"
        );
        Ok(descriptor)
    }

    /// The cached schema descriptor, or None when nothing has ever loaded.
    pub fn schema(&self) -> Option<SchemaDescriptor> {
        self.schema.read().ok().and_then(|s| s.clone())
    }

    /// Execute a generated query and render its result as text.
    ///
    /// One row and one column short-circuits to the scalar's text. Any
    /// execution error is converted to a descriptive string returned to the
    /// caller: the query pipeline treats that string as content to reason
    /// over, not a hard failure.
    pub fn execute(&self, query: &str) -> String {
        match self.try_execute(query) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Generated query failed to execute");
                format!("SQL execution failed: {}", e)
            }
        }
    }

    fn try_execute(&self, query: &str) -> std::result::Result<String, String> {
        let trimmed = query.trim().trim_end_matches(';');
        let lowered = trimmed.to_ascii_lowercase();
        if !(lowered.starts_with("select") || lowered.starts_with("with")) {
            return Err("only SELECT queries are supported".to_string());
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("lock poisoned: {}", e))?;
        let mut stmt = conn.prepare(trimmed).map_err(|e| e.to_string())?;

        let column_count = stmt.column_count();
        let headers: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
        let mut rendered: Vec<Vec<String>> = Vec::new();
        while let Some(row) = rows.next().map_err(|e| e.to_string())? {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value = row.get_ref(i).map_err(|e| e.to_string())?;
                cells.push(render_value(value));
            }
            rendered.push(cells);
        }

        if rendered.is_empty() {
            return Ok(EMPTY_RESULT_TEXT.to_string());
        }

        // Aggregate-query ergonomics: a lone scalar comes back bare.
        if rendered.len() == 1 && column_count == 1 {
            return Ok(rendered[0][0].clone());
        }

        let mut out = headers.join(" | ");
        for row in rendered {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for SqlKnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlKnowledgeStore")
            .field("schema", &self.schema())
            .finish()
    }
}

/// Render one SQLite value as text.
fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => {
            // Whole-valued reals print without the trailing ".0".
            if r.fract() == 0.0 && r.abs() < 1e15 {
                format!("{}", r as i64)
            } else {
                r.to_string()
            }
        }
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(_) => "<blob>".to_string(),
    }
}
