// Data-access boundary.
//
// Every stage receives a `&dyn Warehouse` instead of a global session. The
// DuckDB implementation lives in `duck.rs`; `MemoryWarehouse` serves canned
// frames to tests.
use crate::error::{ReportError, Result};
use std::borrow::Cow;
use std::cell::RefCell;

/// A single cell of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => crate::util::parse_f64_safe(Some(s)),
            Value::Null => None,
        }
    }

    /// Text form used for codes and labels. Integral numbers print without a
    /// fractional part so numeric codes (`170`, `5`) compare equal to text.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

/// Column-named rows as returned by the warehouse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: &[&str]) -> Self {
        Frame {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let idx = self.column_index(column)?;
        Ok(self.rows.get(row).and_then(|r| r.get(idx)).unwrap_or(&Value::Null))
    }

    /// Numeric cell; nulls and unparsable text read as zero.
    pub fn number(&self, row: usize, column: &str) -> Result<f64> {
        Ok(self.value(row, column)?.as_f64().unwrap_or(0.0))
    }

    /// Text cell; nulls read as an empty string.
    pub fn text(&self, row: usize, column: &str) -> Result<String> {
        Ok(self.value(row, column)?.as_key().unwrap_or_default())
    }

    pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(idx).and_then(Value::as_f64).unwrap_or(0.0))
            .collect())
    }

    pub fn texts(&self, column: &str) -> Result<Vec<Option<String>>> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(idx).and_then(Value::as_key))
            .collect())
    }

    /// Distinct non-null values in first-seen order.
    pub fn unique(&self, column: &str) -> Result<Vec<String>> {
        let mut out: Vec<String> = Vec::new();
        for v in self.texts(column)?.into_iter().flatten() {
            if !out.contains(&v) {
                out.push(v);
            }
        }
        Ok(out)
    }

    /// Rows whose `column` (as text) satisfies `keep`.
    pub fn filter<F>(&self, column: &str, keep: F) -> Result<Frame>
    where
        F: Fn(Option<&str>) -> bool,
    {
        let idx = self.column_index(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|r| {
                let key = r.get(idx).and_then(Value::as_key);
                keep(key.as_deref())
            })
            .cloned()
            .collect();
        Ok(Frame {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Two-column lookup, e.g. code → display name. Later duplicates lose.
    pub fn lookup(&self, key: &str, value: &str) -> Result<Vec<(String, String)>> {
        let keys = self.texts(key)?;
        let values = self.texts(value)?;
        let mut out: Vec<(String, String)> = Vec::new();
        for (k, v) in keys.into_iter().zip(values) {
            if let (Some(k), Some(v)) = (k, v) {
                if !out.iter().any(|(seen, _)| *seen == k) {
                    out.push((k, v));
                }
            }
        }
        Ok(out)
    }
}

/// Injected data-access capability.
pub trait Warehouse {
    /// Run a SELECT and collect every row.
    fn query(&self, sql: &str) -> Result<Frame>;

    /// Run a statement that returns no rows (audit inserts).
    fn execute(&self, sql: &str) -> Result<()>;
}

/// Catalog name every query is written against.
pub const CATALOG: &str = "DOCUMENTOS_COLOMBIA";

/// Point `CATALOG`-qualified names in `sql` at `catalog`.
pub fn qualify<'a>(sql: &'a str, catalog: &str) -> Cow<'a, str> {
    if catalog == CATALOG {
        return Cow::Borrowed(sql);
    }
    Cow::Owned(sql.replace(&format!("{CATALOG}."), &format!("{catalog}.")))
}

/// Render a list of strings as the body of a SQL `IN (...)` clause.
///
/// Quotes are doubled. An empty list renders as `NULL`, which matches nothing.
pub fn sql_list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "NULL".to_string();
    }
    items
        .iter()
        .map(|s| format!("'{}'", s.as_ref().replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape a single literal for interpolation.
pub fn sql_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

struct Route {
    patterns: Vec<String>,
    frame: Frame,
}

/// Warehouse double that answers by substring routing.
///
/// A query is served by the route whose patterns all occur in the SQL; when
/// several match, the one with the most patterns wins. Unrouted queries
/// return an empty frame. Patterns registered with `fail_on` raise an error.
#[derive(Default)]
pub struct MemoryWarehouse {
    routes: Vec<Route>,
    failures: Vec<String>,
    queries: RefCell<Vec<String>>,
    executed: RefCell<Vec<String>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, patterns: &[&str], frame: Frame) -> Self {
        self.add_route(patterns, frame);
        self
    }

    pub fn add_route(&mut self, patterns: &[&str], frame: Frame) {
        self.routes.push(Route {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            frame,
        });
    }

    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl Warehouse for MemoryWarehouse {
    fn query(&self, sql: &str) -> Result<Frame> {
        self.queries.borrow_mut().push(sql.to_string());
        if let Some(p) = self.failures.iter().find(|p| sql.contains(p.as_str())) {
            return Err(ReportError::Warehouse(format!("simulated failure on {p}")));
        }
        let best = self
            .routes
            .iter()
            .filter(|r| r.patterns.iter().all(|p| sql.contains(p.as_str())))
            .max_by_key(|r| r.patterns.len());
        Ok(best.map(|r| r.frame.clone()).unwrap_or_default())
    }

    fn execute(&self, sql: &str) -> Result<()> {
        if let Some(p) = self.failures.iter().find(|p| sql.contains(p.as_str())) {
            return Err(ReportError::Warehouse(format!("simulated failure on {p}")));
        }
        self.executed.borrow_mut().push(sql.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(&["CODE", "NAME"])
            .with_row(vec![Value::Number(170.0), "Colombia".into()])
            .with_row(vec!["249".into(), "Estados Unidos".into()])
            .with_row(vec![Value::Null, "Sin código".into()])
            .with_row(vec!["249".into(), "Duplicado".into()])
    }

    #[test]
    fn keys_print_integral_numbers_without_fraction() {
        assert_eq!(Value::Number(5.0).as_key().as_deref(), Some("5"));
        assert_eq!(Value::Number(2.5).as_key().as_deref(), Some("2.5"));
        assert_eq!(Value::Null.as_key(), None);
    }

    #[test]
    fn unique_drops_nulls_and_keeps_order() {
        let f = sample();
        assert_eq!(f.unique("code").unwrap(), vec!["170".to_string(), "249".to_string()]);
        let lookup = f.lookup("CODE", "NAME").unwrap();
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[1].1, "Estados Unidos");
    }

    #[test]
    fn missing_column_is_an_error() {
        assert!(matches!(sample().numbers("VALOR"), Err(ReportError::MissingColumn(_))));
        assert_eq!(sample().number(10, "CODE").unwrap(), 0.0);
    }

    #[test]
    fn sql_lists_escape_quotes() {
        assert_eq!(sql_list(&["Côte d'Ivoire", "Perú"]), "'Côte d''Ivoire', 'Perú'");
        assert_eq!(sql_list::<&str>(&[]), "NULL");
    }

    #[test]
    fn routes_prefer_most_specific_match() {
        let wh = MemoryWarehouse::new()
            .route(&["ST_CATEGORIAS_CERRADO"], Frame::new(&["A"]))
            .route(&["ST_CATEGORIAS_CERRADO", "TIPOS"], Frame::new(&["B"]))
            .fail_on("SEGUIMIENTO");
        let f = wh.query("SELECT * FROM ST_CATEGORIAS_CERRADO WHERE TABLA = 'TIPOS'").unwrap();
        assert_eq!(f.columns, vec!["B".to_string()]);
        assert!(wh.query("SELECT 1").unwrap().is_empty());
        assert!(wh.execute("INSERT INTO SEGUIMIENTO").is_err());
        assert_eq!(wh.queries().len(), 2);
    }

    #[test]
    fn qualify_rewrites_only_the_catalog_prefix() {
        let sql = "SELECT A.X FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.T AS A WHERE A.Y = 'DOCUMENTOS'";
        assert_eq!(qualify(sql, CATALOG), sql);
        assert_eq!(
            qualify(sql, "DW"),
            "SELECT A.X FROM DW.GEOGRAFIA.T AS A WHERE A.Y = 'DOCUMENTOS'"
        );
    }
}
