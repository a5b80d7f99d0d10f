// Console previews and side exports of processed tables.
use crate::error::{ReportError, Result};
use crate::excel;
use crate::process::{ProcessedReport, TableKey};
use crate::types::Table;
use serde::Serialize;
use std::path::Path;
use tabled::builder::Builder;
use tabled::{settings::Style, Tabled};

pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let csv_err = |e: csv::Error| ReportError::Render(e.to_string());
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(table.headers()).map_err(csv_err)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.to_string())).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Named, Word-formatted tables of `report`: summaries first, then the
/// workbook sheets.
pub fn named_tables(report: &ProcessedReport) -> Vec<(String, Table)> {
    let summaries = [
        (TableKey::ResumenExportaciones, "RESUMEN_EXPORTACIONES"),
        (TableKey::ResumenInversion, "RESUMEN_INVERSION"),
        (TableKey::ResumenTurismo, "RESUMEN_TURISMO"),
        (TableKey::Conectividad, "CONECTIVIDAD"),
    ];
    let mut out: Vec<(String, Table)> = summaries
        .into_iter()
        .filter_map(|(key, name)| report.table(key).map(|t| (name.to_string(), t.word())))
        .collect();
    out.extend(
        excel::sheet_plan()
            .into_iter()
            .filter_map(|(key, name)| report.table(key).map(|t| (name, t.word()))),
    );
    out.retain(|(_, t)| !t.is_empty());
    out
}

pub fn render_grid(table: &Table, max_rows: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(|c| c.to_string()));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_grid(title: &str, table: &Table, max_rows: usize) {
    println!("\n{}\n", title);
    if table.is_empty() {
        println!("(sin filas)\n");
        return;
    }
    println!("{}\n", render_grid(table, max_rows));
}

pub fn preview_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(sin filas)\n");
        return;
    }
    let table_str = tabled::Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
