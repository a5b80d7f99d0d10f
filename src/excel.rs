// .xlsx rendering: one sheet per detail table, in a fixed order.
use crate::error::Result;
use crate::fetch::{ExportCategory, Flow, TourismDim};
use crate::params::Period;
use crate::process::{ProcessedReport, TableKey};
use crate::types::{Cell, Table};
use log::debug;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;

/// Excel rejects longer sheet names.
pub const MAX_SHEET_NAME: usize = 31;

fn category_sheet(cat: ExportCategory) -> &'static str {
    match cat {
        ExportCategory::Continente => "EXPO_CONTINENTE",
        ExportCategory::Departamentos => "EXPO_DPTO",
        ExportCategory::Hubs => "EXPO_HUB",
        ExportCategory::Pais => "EXPO_PAIS",
        ExportCategory::Sectores => "EXPO_SECTOR",
        ExportCategory::Subsectores => "EXPO_SUBSECTOR",
        ExportCategory::Tlcs => "EXPO_TLC",
    }
}

fn tourism_sheet(dim: TourismDim) -> &'static str {
    match dim {
        TourismDim::Paises => "TURISMO_PAIS",
        TourismDim::Departamentos => "TURISMO_DPTO",
        TourismDim::Ciudades => "TURISMO_MUN",
        TourismDim::Genero => "TURISMO_GEN",
        TourismDim::Motivo => "TURISMO_MOV",
    }
}

fn per_period(out: &mut Vec<(TableKey, String)>, base: &str, key: impl Fn(Period) -> TableKey) {
    for p in Period::BOTH {
        out.push((key(p), format!("{base}_{}", p.suffix())));
    }
}

/// Truncate to the Excel limit and make the name unique among `taken`.
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    let base: String = name.chars().take(MAX_SHEET_NAME).collect();
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        let suffix = format!("_{n}");
        let keep = MAX_SHEET_NAME - suffix.len();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Every sheet a workbook can carry, in workbook order.
pub fn sheet_plan() -> Vec<(TableKey, String)> {
    let mut plan = Vec::new();
    per_period(&mut plan, "EXPO_TOTAL", TableKey::Totales);
    per_period(&mut plan, "EXPO_TIPOS", TableKey::Tipos);
    per_period(&mut plan, "EXPO_PESO", TableKey::TotalesPeso);
    per_period(&mut plan, "EXPO_TIPOS_PESO", TableKey::TiposPeso);
    for p in Period::BOTH {
        plan.push((TableKey::MediosMinero(p), format!("EXPO_MEDIOS_MINERO_PESO_{}", p.suffix())));
        plan.push((TableKey::MediosNoMinero(p), format!("EXPO_MEDIOS_NME_PESO_{}", p.suffix())));
    }
    for p in Period::BOTH {
        for cat in ExportCategory::ALL {
            plan.push((TableKey::Categoria(p, cat), format!("{}_{}", category_sheet(cat), p.suffix())));
        }
    }
    per_period(&mut plan, "NIT", TableKey::Empresas);
    per_period(&mut plan, "CONTEO", TableKey::Conteo);
    per_period(&mut plan, "IED_TOTAL", |p| TableKey::InversionTotal(Flow::Ied, p));
    per_period(&mut plan, "IED_ACTIVIDADES", TableKey::IedActividades);
    per_period(&mut plan, "IED_PAISES", |p| TableKey::InversionPaises(Flow::Ied, p));
    per_period(&mut plan, "ICE_TOTAL", |p| TableKey::InversionTotal(Flow::Ice, p));
    per_period(&mut plan, "ICE_PAISES", |p| TableKey::InversionPaises(Flow::Ice, p));
    for p in Period::BOTH {
        for dim in TourismDim::for_period(p) {
            plan.push((TableKey::Turismo(p, *dim), format!("{}_{}", tourism_sheet(*dim), p.suffix())));
        }
    }

    let mut taken = HashSet::new();
    plan.into_iter().map(|(key, name)| (key, unique_name(&name, &mut taken))).collect()
}

/// Sheets with data for `report`, Excel-formatted.
pub fn sheets(report: &ProcessedReport) -> Vec<(String, Table)> {
    sheet_plan()
        .into_iter()
        .filter_map(|(key, name)| {
            let t = report.table(key)?;
            (!t.table.is_empty()).then(|| (name, t.excel()))
        })
        .collect()
}

pub fn write_workbook(sheets: &[(String, Table)]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (name, table) in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(name)?;
        for (c, h) in table.headers().iter().enumerate() {
            ws.write_string_with_format(0, c as u16, *h, &header)?;
        }
        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Number(n) => {
                        ws.write_number(r, c as u16, *n)?;
                    }
                    Cell::Text(s) => {
                        ws.write_string(r, c as u16, s)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    let bytes = workbook.save_to_buffer()?;
    debug!("xlsx: {} hojas, {} bytes", sheets.len(), bytes.len());
    Ok(bytes)
}

pub fn render(report: &ProcessedReport) -> Result<Vec<u8>> {
    write_workbook(&sheets(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;
    use pretty_assertions::assert_eq;

    #[test]
    fn sheet_names_fit_and_are_unique() {
        let plan = sheet_plan();
        let names: HashSet<_> = plan.iter().map(|(_, n)| n.clone()).collect();
        assert_eq!(names.len(), plan.len());
        assert!(plan.iter().all(|(_, n)| n.chars().count() <= MAX_SHEET_NAME));
        assert!(names.contains("EXPO_MEDIOS_MINERO_PESO_CORRIDO"));
        assert!(names.contains("IED_TOTAL_CERRADO"));
        assert!(names.contains("ICE_TOTAL_CORRIDO"));
    }

    #[test]
    fn plan_follows_workbook_order() {
        let plan = sheet_plan();
        assert_eq!(plan[0].1, "EXPO_TOTAL_CERRADO");
        assert_eq!(plan[1].1, "EXPO_TOTAL_CORRIDO");
        let pos = |name: &str| plan.iter().position(|(_, n)| n == name).unwrap();
        assert!(pos("EXPO_TLC_CERRADO") < pos("EXPO_CONTINENTE_CORRIDO"));
        assert!(pos("CONTEO_CORRIDO") < pos("IED_TOTAL_CERRADO"));
        assert_eq!(plan.last().unwrap().1, "TURISMO_MUN_CORRIDO");
        assert!(!plan.iter().any(|(_, n)| n == "TURISMO_GEN_CORRIDO"));
    }

    #[test]
    fn long_names_are_truncated_without_collisions() {
        let mut taken = HashSet::new();
        let long = "EXPO_MEDIOS_NO_MINERO_PESO_CORRIDO_EXTRA";
        let a = unique_name(long, &mut taken);
        let b = unique_name(long, &mut taken);
        assert_eq!(a.len(), MAX_SHEET_NAME);
        assert_eq!(b.len(), MAX_SHEET_NAME);
        assert!(b.ends_with("_2"));
        assert!(a != b);
    }

    #[test]
    fn workbook_bytes_are_a_zip_package() {
        let mut t = Table::new(vec![Column::label("País"), Column::amount("2023 (USD FOB)")]);
        t.push(vec![Cell::text("Perú"), Cell::Number(10.5)]);
        t.push(vec![Cell::text("Total"), Cell::Empty]);
        let bytes = write_workbook(&[("EXPO_PAIS_CERRADO".to_string(), t)]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
