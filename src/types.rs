// Presentation tables handed to the Word and Excel renderers, plus the small
// row types printed by the CLI.
use crate::fetch::NO_APLICA;
use crate::util::{format_number, format_percent, round2};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Empty => Ok(()),
        }
    }
}

/// How a column's numbers are shown in the Word document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Label,
    Amount,
    Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn label(name: impl Into<String>) -> Column {
        Column { name: name.into(), kind: ColumnKind::Label }
    }

    pub fn amount(name: impl Into<String>) -> Column {
        Column { name: name.into(), kind: ColumnKind::Amount }
    }

    pub fn percent(name: impl Into<String>) -> Column {
        Column { name: name.into(), kind: ColumnKind::Percent }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Table {
        Table { columns, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Drop the column named `name`, if present.
    pub fn without_column(mut self, name: &str) -> Table {
        if let Some(idx) = self.columns.iter().position(|c| c.name == name) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                if idx < row.len() {
                    row.remove(idx);
                }
            }
        }
        self
    }

    /// Word view: amounts with `decimals` and Spanish separators, shares as
    /// `12,3%`. Text passes through untouched.
    pub fn for_word(&self, decimals: usize) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, col)| match (cell, col.kind) {
                        (Cell::Number(n), ColumnKind::Percent) => Cell::Text(format_percent(*n)),
                        (Cell::Number(n), _) => Cell::Text(format_number(*n, decimals)),
                        (other, _) => other.clone(),
                    })
                    .collect()
            })
            .collect();
        Table { columns: self.columns.clone(), rows }
    }

    /// Excel view: numbers rounded to two decimals, "No aplica" left blank.
    pub fn for_excel(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Number(n) => Cell::Number(round2(*n)),
                        Cell::Text(s) if s == NO_APLICA => Cell::Empty,
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();
        Table { columns: self.columns.clone(), rows }
    }
}

/// One verifier marker as printed by `tres_ejes flags`.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FlagRow {
    #[serde(rename = "Clave")]
    #[tabled(rename = "Clave")]
    pub clave: String,
    #[serde(rename = "Estado")]
    #[tabled(rename = "Estado")]
    pub estado: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OptionRow {
    #[serde(rename = "Opción")]
    #[tabled(rename = "Opción")]
    pub opcion: String,
}
