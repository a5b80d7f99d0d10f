// Error type shared by every stage of the report pipeline.
//
// Messages for parameter problems are kept in Spanish because they are shown
// to the people requesting the documents.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// A filter was supplied with something other than a list or null.
    #[error("Todos los parámetros deben ser listas o None")]
    InvalidParameters,

    #[error("Agrupación no reconocida: {0}")]
    UnknownGrouping(String),

    /// The warehouse rejected a statement or the connection failed.
    #[error("warehouse error: {0}")]
    Warehouse(String),

    /// A query result did not carry a column the pipeline reads.
    #[error("column '{0}' not found in query result")]
    MissingColumn(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("Se produjo un error durante la generación del documento: {0}")]
    Generation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl From<duckdb::Error> for ReportError {
    fn from(e: duckdb::Error) -> Self {
        ReportError::Warehouse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ReportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ReportError::Render(e.to_string())
    }
}
