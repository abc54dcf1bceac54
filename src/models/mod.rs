use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// A single scalar value of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Types a raw text field: integer, then float, then boolean, else text.
    /// Only the empty field is missing; `NA` and friends are plain text.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Cell::Missing;
        }
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return Cell::Float(v);
        }
        match trimmed {
            "true" | "True" | "TRUE" => Cell::Bool(true),
            "false" | "False" | "FALSE" => Cell::Bool(false),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Key under which two cells group together. Cells of different kinds
    /// never share a key, so `Int(1)` and `Text("1")` stay apart.
    pub(crate) fn group_key(&self) -> String {
        match self {
            Cell::Missing => "m:".to_string(),
            Cell::Int(v) => format!("i:{v}"),
            Cell::Float(v) => format!("f:{}", v.to_bits()),
            Cell::Bool(v) => format!("b:{v}"),
            Cell::Text(v) => format!("t:{v}"),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            // `{:?}` keeps the decimal point, so `3.0` reads back as a float.
            Cell::Float(v) => write!(f, "{v:?}"),
            Cell::Bool(v) => write!(f, "{v}"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Int(v) => serializer.serialize_i64(*v),
            Cell::Float(v) => serializer.serialize_f64(*v),
            Cell::Bool(v) => serializer.serialize_bool(*v),
            Cell::Text(v) => serializer.serialize_str(v),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("duplicate column name {0:?}")]
    DuplicateColumn(String),

    #[error("column {column:?} has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Columnar, in-memory view of a parsed file. Column names are unique and
/// every column holds exactly `row_count()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(bad) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(TableError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    found: bad.cells.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Builds a table from a header and row-major cells.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column {
                name,
                cells: Vec::with_capacity(rows.len()),
            })
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }

        Self::new(columns)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// Rewrites every cell in place. Shape is untouched, so the
    /// equal-length invariant holds.
    pub(crate) fn map_cells(&mut self, mut f: impl FnMut(&mut Cell)) {
        for column in &mut self.columns {
            column.cells.iter_mut().for_each(&mut f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse_types() {
        assert_eq!(Cell::parse("10"), Cell::Int(10));
        assert_eq!(Cell::parse("-2.5"), Cell::Float(-2.5));
        assert_eq!(Cell::parse("True"), Cell::Bool(true));
        assert_eq!(Cell::parse("A"), Cell::Text("A".to_string()));
        assert_eq!(Cell::parse(""), Cell::Missing);
    }

    #[test]
    fn test_cell_parse_keeps_na_spellings_as_text() {
        for raw in ["NA", "N/A", "None", "null", "n/a", "#N/A"] {
            assert_eq!(Cell::parse(raw), Cell::Text(raw.to_string()), "{raw}");
        }
    }

    #[test]
    fn test_float_display_reparses_as_float() {
        assert_eq!(Cell::Float(3.0).to_string(), "3.0");
        assert_eq!(Cell::Float(5.25).to_string(), "5.25");
        assert_eq!(Cell::parse(&Cell::Float(3.0).to_string()), Cell::Float(3.0));
        assert_eq!(Cell::parse(&Cell::Int(3).to_string()), Cell::Int(3));
    }

    #[test]
    fn test_cell_serializes_as_plain_json() {
        let cells = vec![
            Cell::Missing,
            Cell::Int(13),
            Cell::Float(1.5),
            Cell::Bool(false),
            Cell::Text("A".to_string()),
        ];
        assert_eq!(
            serde_json::to_string(&cells).unwrap(),
            r#"[null,13,1.5,false,"A"]"#
        );
    }

    #[test]
    fn test_group_key_separates_kinds() {
        assert_ne!(
            Cell::Int(1).group_key(),
            Cell::Text("1".to_string()).group_key()
        );
        assert_eq!(Cell::Int(1).group_key(), Cell::parse("1").group_key());
    }

    #[test]
    fn test_table_rejects_duplicate_columns() {
        let err = Table::from_rows(
            vec!["a".to_string(), "a".to_string()],
            vec![vec![Cell::Int(1), Cell::Int(2)]],
        )
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let err = Table::new(vec![
            Column {
                name: "a".to_string(),
                cells: vec![Cell::Int(1), Cell::Int(2)],
            },
            Column {
                name: "b".to_string(),
                cells: vec![Cell::Int(1)],
            },
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedColumn { found: 1, expected: 2, .. }));
    }

    #[test]
    fn test_from_rows_is_columnar() {
        let table = Table::from_rows(
            vec!["category".to_string(), "sales".to_string()],
            vec![
                vec![Cell::parse("A"), Cell::parse("10")],
                vec![Cell::parse("B"), Cell::parse("5")],
            ],
        )
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["category", "sales"]);
        assert_eq!(table.column("sales").unwrap(), &[Cell::Int(10), Cell::Int(5)]);
        assert!(table.column("missing").is_none());
    }
}
