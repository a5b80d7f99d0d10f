// DuckDB implementation of the warehouse boundary.
//
// The warehouse file is attached under the configured catalog name. Queries
// are written against `DOCUMENTOS_COLOMBIA` and re-qualified before they run.
use crate::config::Config;
use crate::error::Result;
use crate::warehouse::{qualify, sql_str, Frame, Value, Warehouse, CATALOG};
use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use log::{debug, info};

pub struct DuckWarehouse {
    conn: Connection,
    catalog: String,
}

impl DuckWarehouse {
    /// Open an in-memory DuckDB and attach the configured warehouse file.
    pub fn open(config: &Config) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let path = config.warehouse_path.to_string_lossy();
        let mode = if config.read_only { " (READ_ONLY)" } else { "" };
        conn.execute_batch(&format!(
            "ATTACH {} AS {}{};",
            sql_str(&path),
            config.catalog,
            mode
        ))?;
        info!("Attached warehouse {} as {}", path, config.catalog);
        Ok(DuckWarehouse { conn, catalog: config.catalog.clone() })
    }

    /// Wrap an existing connection, e.g. one already holding the catalog.
    pub fn from_connection(conn: Connection) -> Self {
        DuckWarehouse { conn, catalog: CATALOG.to_string() }
    }

    /// Resolve `DOCUMENTOS_COLOMBIA.*` names against `catalog` instead.
    pub fn with_catalog(mut self, catalog: &str) -> Self {
        self.catalog = catalog.to_string();
        self
    }
}

fn convert(v: DuckValue) -> Value {
    match v {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Number(if b { 1.0 } else { 0.0 }),
        DuckValue::TinyInt(n) => Value::Number(n as f64),
        DuckValue::SmallInt(n) => Value::Number(n as f64),
        DuckValue::Int(n) => Value::Number(n as f64),
        DuckValue::BigInt(n) => Value::Number(n as f64),
        DuckValue::HugeInt(n) => Value::Number(n as f64),
        DuckValue::UTinyInt(n) => Value::Number(n as f64),
        DuckValue::USmallInt(n) => Value::Number(n as f64),
        DuckValue::UInt(n) => Value::Number(n as f64),
        DuckValue::UBigInt(n) => Value::Number(n as f64),
        DuckValue::Float(n) => Value::Number(n as f64),
        DuckValue::Double(n) => Value::Number(n),
        DuckValue::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => Value::Text(d.to_string()),
        },
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Enum(s) => Value::Text(s),
        other => Value::Text(format!("{other:?}")),
    }
}

impl Warehouse for DuckWarehouse {
    fn query(&self, sql: &str) -> Result<Frame> {
        let sql = qualify(sql, &self.catalog);
        debug!("query: {}", sql.split_whitespace().collect::<Vec<_>>().join(" "));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let columns = rows.as_ref().map(|s| s.column_names()).unwrap_or_default();
        let width = columns.len();
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let v: DuckValue = row.get(i)?;
                values.push(convert(v));
            }
            out.push(values);
        }
        Ok(Frame { columns, rows: out })
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(&qualify(sql, &self.catalog))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DuckWarehouse {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE SCHEMA GEOGRAFIA;
             CREATE TABLE GEOGRAFIA.DIAN_DEPARTAMENTOS (COD_DIAN_DEPARTAMENTO INTEGER, DEPARTAMENTO_DIAN VARCHAR, PESO DECIMAL(10,2));
             INSERT INTO GEOGRAFIA.DIAN_DEPARTAMENTOS VALUES (5, 'Antioquia', 12.50), (11, 'Bogotá', NULL);",
        )
        .unwrap();
        DuckWarehouse::from_connection(conn)
    }

    #[test]
    fn query_maps_types_and_columns() {
        let wh = seeded();
        let f = wh
            .query("SELECT * FROM GEOGRAFIA.DIAN_DEPARTAMENTOS ORDER BY COD_DIAN_DEPARTAMENTO")
            .unwrap();
        assert_eq!(f.columns, vec!["COD_DIAN_DEPARTAMENTO", "DEPARTAMENTO_DIAN", "PESO"]);
        assert_eq!(f.len(), 2);
        assert_eq!(f.text(0, "COD_DIAN_DEPARTAMENTO").unwrap(), "5");
        assert_eq!(f.number(0, "PESO").unwrap(), 12.5);
        assert!(f.value(1, "PESO").unwrap().is_null());
    }

    #[test]
    fn execute_and_errors() {
        let wh = seeded();
        wh.execute("INSERT INTO GEOGRAFIA.DIAN_DEPARTAMENTOS VALUES (8, 'Atlántico', 1)")
            .unwrap();
        let f = wh.query("SELECT COUNT(*) AS N FROM GEOGRAFIA.DIAN_DEPARTAMENTOS").unwrap();
        assert_eq!(f.number(0, "N").unwrap(), 3.0);
        assert!(wh.query("SELECT * FROM NO_EXISTE").is_err());
    }

    #[test]
    fn queries_follow_the_configured_catalog() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "ATTACH ':memory:' AS DW;
             CREATE SCHEMA DW.PARAMETROS;
             CREATE TABLE DW.PARAMETROS.PARAMETROS (PARAMETRO VARCHAR, VALOR VARCHAR);
             INSERT INTO DW.PARAMETROS.PARAMETROS VALUES ('Año cerrado (T)', '2023');
             CREATE SCHEMA DW.SEGUIMIENTO;
             CREATE TABLE DW.SEGUIMIENTO.SEGUIMIENTO_EVENTOS (TIPO_EVENTO VARCHAR, DETALLE_EVENTO VARCHAR, UNIDAD VARCHAR, FECHA_HORA VARCHAR);",
        )
        .unwrap();
        let wh = DuckWarehouse::from_connection(conn).with_catalog("DW");

        let f = wh
            .query("SELECT VALOR FROM DOCUMENTOS_COLOMBIA.PARAMETROS.PARAMETROS WHERE PARAMETRO = 'Año cerrado (T)'")
            .unwrap();
        assert_eq!(f.text(0, "VALOR").unwrap(), "2023");

        let config = Config { catalog: "DW".to_string(), ..Config::default() };
        crate::download::record_event(&wh, &config, "Selección", "Selección de Colombia", "Colombia");
        let n = wh.query("SELECT COUNT(*) AS N FROM DW.SEGUIMIENTO.SEGUIMIENTO_EVENTOS").unwrap();
        assert_eq!(n.number(0, "N").unwrap(), 1.0);
    }
}
