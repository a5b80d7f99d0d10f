// Processor: labels the fetched metric tables for presentation, joins codes
// to display names, and derives the summary tables and narrative sentences.
use crate::error::Result;
use crate::fetch::{Data, ExportCategory, Flow, MetricRow, MetricTable, Opportunity, Share, TourismDim, NO_APLICA};
use crate::params::{document_params, load_periods, DocumentParams, GeoParams, Grouping, Period, PeriodPair, Periods};
use crate::types::{Cell, Column, Table};
use crate::util::{
    capitalize_words, format_no_decimal, format_number, inversion_palabra, transform_year_column_name, variacion_palabra,
};
use crate::verify::{FlagKey, Flags};
use crate::warehouse::{Frame, Value, Warehouse};
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Every presentation table a report can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKey {
    Totales(Period),
    Tipos(Period),
    TotalesPeso(Period),
    TiposPeso(Period),
    MediosMinero(Period),
    MediosNoMinero(Period),
    Categoria(Period, ExportCategory),
    Empresas(Period),
    Conteo(Period),
    IedActividades(Period),
    InversionPaises(Flow, Period),
    InversionTotal(Flow, Period),
    Turismo(Period, TourismDim),
    ResumenExportaciones,
    ResumenInversion,
    ResumenTurismo,
    Conectividad,
}

/// A table plus the number of decimals its amounts get in Word.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub table: Table,
    pub decimals: usize,
}

impl ReportTable {
    pub fn new(table: Table, decimals: usize) -> Self {
        ReportTable { table, decimals }
    }

    pub fn word(&self) -> Table {
        self.table.for_word(self.decimals)
    }

    pub fn excel(&self) -> Table {
        self.table.for_excel()
    }
}

/// Code to display-name maps from the geography tables.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub paises_exportacion: HashMap<String, String>,
    pub paises_inversion: HashMap<String, String>,
    pub paises_turismo: HashMap<String, String>,
    pub departamentos: HashMap<String, String>,
    pub municipios: HashMap<String, String>,
}

fn lookup_map(frame: &Frame, key: &str, value: &str) -> Result<HashMap<String, String>> {
    if frame.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(frame.lookup(key, value)?.into_iter().collect())
}

pub fn load_lookups(wh: &dyn Warehouse) -> Result<Lookups> {
    let paises = wh.query(
        "SELECT A.CODIGO_DIAN,
            A.COUNTRY_OR_AREA_UNSD,
            A.PAIS_LLAVE_EXPORTACIONES,
            A.PAIS_INVERSION_BANREP,
            A.PAIS_CODIGO_TURISMO
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.COUNTRY_OR_AREA_UNSD IS NOT NULL;",
    )?;
    let departamentos = wh.query(
        "SELECT A.COD_DIAN_DEPARTAMENTO, A.DEPARTAMENTO_DIAN
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.DIAN_DEPARTAMENTOS AS A;",
    )?;
    let municipios = wh.query(
        "SELECT A.COD_DANE_MUNICIPIO, A.MUNICIPIO_DANE
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.DIVIPOLA_MUNICIPIOS AS A;",
    )?;
    Ok(Lookups {
        paises_exportacion: lookup_map(&paises, "PAIS_LLAVE_EXPORTACIONES", "COUNTRY_OR_AREA_UNSD")?,
        paises_inversion: lookup_map(&paises, "PAIS_INVERSION_BANREP", "COUNTRY_OR_AREA_UNSD")?,
        paises_turismo: lookup_map(&paises, "PAIS_CODIGO_TURISMO", "COUNTRY_OR_AREA_UNSD")?,
        departamentos: lookup_map(&departamentos, "COD_DIAN_DEPARTAMENTO", "DEPARTAMENTO_DIAN")?,
        municipios: lookup_map(&municipios, "COD_DANE_MUNICIPIO", "MUNICIPIO_DANE")?,
    })
}

/// Unmatched codes keep their raw value.
fn joined(map: &HashMap<String, String>, code: &str) -> String {
    map.get(code).cloned().unwrap_or_else(|| code.to_string())
}

/// Header names and scale of one metric table.
struct Layout {
    label: String,
    details: Vec<String>,
    prev: String,
    cur: String,
    variation: Option<String>,
    share_prev: Option<String>,
    share: Option<String>,
    divisor: f64,
}

fn share_cell(share: Option<Share>) -> Cell {
    match share {
        Some(Share::Pct(v)) => Cell::Number(v),
        Some(Share::NotApplicable) => Cell::text(NO_APLICA),
        None => Cell::Empty,
    }
}

fn metric_table(metric: &MetricTable, layout: &Layout, name: impl Fn(&str) -> String) -> Table {
    let share_prev = layout
        .share_prev
        .as_ref()
        .filter(|_| metric.rows.iter().any(|r| r.share_prev.is_some()));
    let share = layout
        .share
        .as_ref()
        .filter(|_| metric.rows.iter().any(|r| r.share.is_some()));

    let mut columns = vec![Column::label(&layout.label)];
    columns.extend(layout.details.iter().map(Column::label));
    columns.push(Column::amount(&layout.prev));
    columns.push(Column::amount(&layout.cur));
    if let Some(v) = &layout.variation {
        columns.push(Column::percent(v));
    }
    columns.extend(share_prev.map(Column::percent));
    columns.extend(share.map(Column::percent));

    let mut table = Table::new(columns);
    for row in &metric.rows {
        let mut cells = vec![Cell::text(name(&row.label))];
        cells.extend(row.details.iter().map(Cell::text));
        cells.push(Cell::Number(row.prev / layout.divisor));
        cells.push(Cell::Number(row.cur / layout.divisor));
        if layout.variation.is_some() {
            cells.push(row.variation.map(Cell::Number).unwrap_or_else(|| Cell::text(NO_APLICA)));
        }
        if share_prev.is_some() {
            cells.push(share_cell(row.share_prev));
        }
        if share.is_some() {
            cells.push(share_cell(row.share));
        }
        table.push(cells);
    }
    table
}

/// Closed periods print as stored; year-to-date labels move the year last.
fn period_labels(pair: &PeriodPair, p: Period) -> (String, String) {
    match p {
        Period::Cerrado => (pair.t_1.clone(), pair.t.clone()),
        Period::Corrido => (transform_year_column_name(&pair.t_1), transform_year_column_name(&pair.t)),
    }
}

fn export_layout(pair: &PeriodPair, p: Period, label: &str) -> Layout {
    let (a, b) = period_labels(pair, p);
    Layout {
        label: label.to_string(),
        details: Vec::new(),
        prev: format!("{a} (USD FOB)"),
        cur: format!("{b} (USD FOB)"),
        variation: Some("Variación (%)".to_string()),
        share_prev: None,
        share: Some(format!("Participación (%) {b}")),
        divisor: 1.0,
    }
}

/// Weights are stored in kilograms and shown in tonnes.
fn weight_layout(pair: &PeriodPair, p: Period, label: &str) -> Layout {
    let (a, b) = period_labels(pair, p);
    Layout {
        prev: format!("{a} (TONELADAS)"),
        cur: format!("{b} (TONELADAS)"),
        divisor: 1000.0,
        ..export_layout(pair, p, label)
    }
}

fn transport_layout(pair: &PeriodPair, p: Period) -> Layout {
    let (a, b) = period_labels(pair, p);
    Layout {
        variation: None,
        share_prev: Some(format!("Participación (%) {a}")),
        share: Some(format!("Participación (%) {b}")),
        ..weight_layout(pair, p, "Medio de transporte")
    }
}

fn investment_layout(pair: &PeriodPair, p: Period, label: &str) -> Layout {
    let (a, b) = period_labels(pair, p);
    let variation = match p {
        Period::Cerrado => format!("Variación (%) {b}"),
        Period::Corrido => "Variación (%)".to_string(),
    };
    Layout {
        label: label.to_string(),
        details: Vec::new(),
        prev: format!("{a} (USD millones)"),
        cur: format!("{b} (USD millones)"),
        variation: Some(variation),
        share_prev: None,
        share: Some(format!("Participación (%) {b}")),
        divisor: 1.0,
    }
}

fn tourism_labels(periods: &Periods, p: Period) -> (String, String) {
    let t = &periods.tourism;
    match p {
        Period::Cerrado => (t.cerrado.t_1.clone(), t.cerrado.t.clone()),
        Period::Corrido => (
            format!("Ene - {} {}", t.month_abbr, t.corrido.t_1),
            format!("Ene - {} {}", t.month_abbr, t.corrido.t),
        ),
    }
}

fn tourism_layout(periods: &Periods, p: Period, label: &str) -> Layout {
    let (a, b) = tourism_labels(periods, p);
    Layout {
        label: label.to_string(),
        details: Vec::new(),
        variation: Some(format!("Variación (%) {b}")),
        share: Some(format!("Participación (%) {b}")),
        prev: a,
        cur: b,
        share_prev: None,
        divisor: 1.0,
    }
}

pub fn category_column(cat: ExportCategory) -> &'static str {
    match cat {
        ExportCategory::Continente => "Continente",
        ExportCategory::Departamentos => "Departamento de origen",
        ExportCategory::Hubs => "HUB",
        ExportCategory::Pais => "País destino",
        ExportCategory::Sectores => "Sector",
        ExportCategory::Subsectores => "Subsector",
        ExportCategory::Tlcs => "Tratados de Libre Comercio",
    }
}

pub fn tourism_column(dim: TourismDim) -> &'static str {
    match dim {
        TourismDim::Paises => "País de residencia",
        TourismDim::Departamentos => "Departamento de hospedaje",
        TourismDim::Ciudades => "Ciudad de hospedaje",
        TourismDim::Genero => "Género",
        TourismDim::Motivo => "Motivo de viaje",
    }
}

/// Sentences of one narrative bullet, one per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodText {
    pub cerrado: String,
    pub corrido: String,
}

impl PeriodText {
    pub fn get(&self, p: Period) -> &str {
        match p {
            Period::Cerrado => &self.cerrado,
            Period::Corrido => &self.corrido,
        }
    }

    fn set(&mut self, p: Period, text: String) {
        match p {
            Period::Cerrado => self.cerrado = text,
            Period::Corrido => self.corrido = text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Narrative {
    pub exportaciones: PeriodText,
    pub no_minero: PeriodText,
    pub empresas: PeriodText,
    pub ied: PeriodText,
    pub ice: PeriodText,
    pub turismo: PeriodText,
}

/// Everything the document and workbook builders read.
#[derive(Debug, Clone, Default)]
pub struct ProcessedReport {
    pub geo: GeoParams,
    pub flags: Flags,
    pub periods: Periods,
    pub document: DocumentParams,
    pub tables: BTreeMap<TableKey, ReportTable>,
    /// Exporting companies above the threshold in the earliest year listed.
    pub conteo: BTreeMap<Period, usize>,
    pub narrative: Narrative,
    pub oportunidades_exportacion: Vec<(String, String)>,
    pub oportunidades_inversion: Vec<(String, String)>,
    pub turismo_principal: String,
    pub turismo_nichos: String,
}

impl ProcessedReport {
    pub fn table(&self, key: TableKey) -> Option<&ReportTable> {
        self.tables.get(&key)
    }
}

/// Read periods, lookups and data, then build the processed report.
pub fn process(wh: &dyn Warehouse, geo: GeoParams, flags: Flags) -> Result<ProcessedReport> {
    let periods = load_periods(wh)?;
    let document = document_params(wh)?;
    let lookups = load_lookups(wh)?;
    let data = crate::fetch::fetch_all(wh, &geo, &flags)?;
    let report = build(&data, &lookups, geo, flags, periods, document)?;
    info!("{} tablas procesadas", report.tables.len());
    Ok(report)
}

pub fn build(
    data: &Data,
    lookups: &Lookups,
    geo: GeoParams,
    flags: Flags,
    periods: Periods,
    document: DocumentParams,
) -> Result<ProcessedReport> {
    let mut tables = BTreeMap::new();
    export_tables(data, lookups, &periods, &mut tables);
    investment_tables(data, lookups, &geo, &periods, &mut tables);
    tourism_tables(data, lookups, &periods, &mut tables);

    if let Some(frame) = data.conectividad.as_ref().filter(|f| !f.is_empty()) {
        tables.insert(TableKey::Conectividad, ReportTable::new(frame_table(frame, &["Frecuencias"]), 0));
    }

    tables.insert(
        TableKey::ResumenExportaciones,
        ReportTable::new(export_summary(data, &flags, &periods), 1),
    );
    if geo.grouping() != Grouping::Departamentos {
        tables.insert(
            TableKey::ResumenInversion,
            ReportTable::new(investment_summary(data, &geo, &flags, &periods), 1),
        );
    }
    tables.insert(
        TableKey::ResumenTurismo,
        ReportTable::new(tourism_summary(data, &flags, &periods), 0),
    );

    let conteo: BTreeMap<Period, usize> = Period::BOTH
        .iter()
        .map(|&p| {
            let n = if flags.has(FlagKey::Conteo(p)) {
                data.export.conteo.get(&p).and_then(|c| c.values().next().copied()).unwrap_or(0)
            } else {
                0
            };
            (p, n)
        })
        .collect();

    let narrative = narrative(data, &geo, &flags, &periods, &conteo);
    let (turismo_principal, turismo_nichos) = tourism_dictionary(data.oportunidades.get(&Opportunity::Turismo))?;
    debug!("{} tablas, {} empresas cerrado", tables.len(), conteo[&Period::Cerrado]);

    Ok(ProcessedReport {
        oportunidades_exportacion: chain_dictionary(data.oportunidades.get(&Opportunity::Exportacion))?,
        oportunidades_inversion: chain_dictionary(data.oportunidades.get(&Opportunity::Inversion))?,
        turismo_principal,
        turismo_nichos,
        geo,
        flags,
        periods,
        document,
        tables,
        conteo,
        narrative,
    })
}

fn export_tables(data: &Data, lookups: &Lookups, periods: &Periods, tables: &mut BTreeMap<TableKey, ReportTable>) {
    let export = &data.export;
    let raw = |s: &str| s.to_string();
    for p in Period::BOTH {
        let pair = match p {
            Period::Cerrado => &periods.export.cerrado,
            Period::Corrido => &periods.export.corrido,
        };
        let tipo = "Tipo de exportación";
        let mut put = |key: TableKey, source: Option<&MetricTable>, layout: Layout| {
            if let Some(metric) = source {
                tables.insert(key, ReportTable::new(metric_table(metric, &layout, raw), 0));
            }
        };
        put(TableKey::Totales(p), export.totales.get(&p), export_layout(pair, p, tipo));
        put(TableKey::Tipos(p), export.tipos.get(&p), export_layout(pair, p, tipo));
        put(TableKey::TotalesPeso(p), export.totales_peso.get(&p), weight_layout(pair, p, tipo));
        put(TableKey::TiposPeso(p), export.tipos_peso.get(&p), weight_layout(pair, p, tipo));
        put(TableKey::MediosMinero(p), export.medios_minero.get(&p), transport_layout(pair, p));
        put(TableKey::MediosNoMinero(p), export.medios_no_minero.get(&p), transport_layout(pair, p));

        if let Some(metric) = export.empresas.get(&p) {
            let layout = Layout {
                details: vec!["Razón Social".to_string(), "Sector".to_string()],
                ..export_layout(pair, p, "NIT")
            };
            tables.insert(TableKey::Empresas(p), ReportTable::new(metric_table(metric, &layout, raw), 0));
        }

        for cat in ExportCategory::ALL {
            let Some(metric) = export.categorias.get(&(p, cat)) else { continue };
            let layout = export_layout(pair, p, category_column(cat));
            let table = if cat == ExportCategory::Pais {
                metric_table(metric, &layout, |code| joined(&lookups.paises_exportacion, code))
            } else {
                metric_table(metric, &layout, raw)
            };
            tables.insert(TableKey::Categoria(p, cat), ReportTable::new(table, 0));
        }

        if let Some(counts) = export.conteo.get(&p) {
            let mut table = Table::new(vec![Column::label("Año"), Column::amount("Número de empresas exportadoras")]);
            for (year, n) in counts {
                table.push(vec![Cell::text(year), Cell::Number(*n as f64)]);
            }
            tables.insert(TableKey::Conteo(p), ReportTable::new(table, 0));
        }
    }
}

fn investment_tables(
    data: &Data,
    lookups: &Lookups,
    geo: &GeoParams,
    periods: &Periods,
    tables: &mut BTreeMap<TableKey, ReportTable>,
) {
    let inv = &data.investment;
    let unidad = geo.display_name();
    for p in Period::BOTH {
        let pair = match p {
            Period::Cerrado => &periods.investment.cerrado,
            Period::Corrido => &periods.investment.corrido,
        };
        if let Some(metric) = inv.actividades.get(&p) {
            let layout = investment_layout(pair, p, "Actividad económica");
            tables.insert(
                TableKey::IedActividades(p),
                ReportTable::new(metric_table(metric, &layout, |s| s.to_string()), 1),
            );
        }
        for flow in Flow::BOTH {
            if let Some(metric) = inv.paises.get(&(flow, p)) {
                let layout = investment_layout(pair, p, "País");
                let table = metric_table(metric, &layout, |code| capitalize_words(&joined(&lookups.paises_inversion, code)));
                tables.insert(TableKey::InversionPaises(flow, p), ReportTable::new(table, 1));
            }
            if let Some(metric) = inv.total.get(&(flow, p)) {
                let label = "Agrupación de países";
                let mut metric = metric.clone();
                if let Some(first) = metric.rows.first_mut() {
                    first.label = match flow {
                        Flow::Ied => format!("Total IED de {unidad} en Colombia"),
                        Flow::Ice => format!("Total ICE de Colombia en {unidad}"),
                    };
                }
                let mut table = metric_table(&metric, &investment_layout(pair, p, label), |s| s.to_string());
                if geo.grouping() == Grouping::Paises {
                    table.rows.truncate(1);
                    table = table.without_column(label);
                }
                tables.insert(TableKey::InversionTotal(flow, p), ReportTable::new(table, 1));
            }
        }
    }
}

fn tourism_tables(data: &Data, lookups: &Lookups, periods: &Periods, tables: &mut BTreeMap<TableKey, ReportTable>) {
    for (&(p, dim), metric) in &data.tourism.tables {
        let layout = tourism_layout(periods, p, tourism_column(dim));
        let map = match dim {
            TourismDim::Paises => Some(&lookups.paises_turismo),
            TourismDim::Departamentos => Some(&lookups.departamentos),
            TourismDim::Ciudades => Some(&lookups.municipios),
            TourismDim::Genero | TourismDim::Motivo => None,
        };
        let table = metric_table(metric, &layout, |code| {
            let name = map.map(|m| joined(m, code)).unwrap_or_else(|| code.to_string());
            capitalize_words(&name)
        });
        tables.insert(TableKey::Turismo(p, dim), ReportTable::new(table, 0));
    }
}

/// A raw warehouse frame as a table. `amounts` names the numeric columns.
fn frame_table(frame: &Frame, amounts: &[&str]) -> Table {
    let columns = frame
        .columns
        .iter()
        .map(|c| {
            if amounts.contains(&c.as_str()) {
                Column::amount(c)
            } else {
                Column::label(c)
            }
        })
        .collect();
    let mut table = Table::new(columns);
    for row in &frame.rows {
        table.push(
            row.iter()
                .map(|v| match v {
                    Value::Text(s) => Cell::text(s),
                    Value::Number(n) => Cell::Number(*n),
                    Value::Null => Cell::Empty,
                })
                .collect(),
        );
    }
    table
}

fn zero() -> MetricRow {
    MetricRow::new("", 0.0, 0.0, Some(0.0))
}

fn export_figure(data: &Data, flags: &Flags, key: FlagKey, p: Period, label: &str) -> MetricRow {
    if !flags.has(key) {
        return zero();
    }
    data.export
        .tipos
        .get(&p)
        .and_then(|t| t.row(label))
        .cloned()
        .unwrap_or_else(zero)
}

/// Headline investment figure of the slice for one flow and period.
fn investment_figure(data: &Data, geo: &GeoParams, flags: &Flags, flow: Flow, p: Period) -> MetricRow {
    if !flags.has(flow.flag(p)) {
        return zero();
    }
    let inv = &data.investment;
    let row = match geo.grouping() {
        Grouping::Paises => inv.paises.get(&(flow, p)).and_then(MetricTable::first),
        Grouping::Colombia => inv.paises.get(&(flow, p)).and_then(|t| t.row("TOTAL")),
        _ => inv.total.get(&(flow, p)).and_then(MetricTable::first),
    };
    row.cloned().unwrap_or_else(zero)
}

fn tourism_figure(data: &Data, flags: &Flags, p: Period) -> MetricRow {
    if !flags.has(FlagKey::Turismo(p)) {
        return zero();
    }
    data.tourism
        .get(p, TourismDim::Paises)
        .and_then(|t| t.row("TOTAL"))
        .cloned()
        .unwrap_or_else(zero)
}

fn summary_row(label: &str, cerrado: &MetricRow, corrido: &MetricRow, divisor: f64) -> Vec<Cell> {
    vec![
        Cell::text(label),
        Cell::Number(cerrado.prev / divisor),
        Cell::Number(cerrado.cur / divisor),
        Cell::Number(cerrado.variation.unwrap_or(0.0)),
        Cell::Number(corrido.prev / divisor),
        Cell::Number(corrido.cur / divisor),
        Cell::Number(corrido.variation.unwrap_or(0.0)),
    ]
}

fn summary_columns(label: &str, cerrado: (String, String), corrido: (String, String), unit: &str) -> Vec<Column> {
    let with_unit = |s: &str| {
        if unit.is_empty() {
            s.to_string()
        } else {
            format!("{s} ({unit})")
        }
    };
    vec![
        Column::label(label),
        Column::amount(with_unit(&cerrado.0)),
        Column::amount(with_unit(&cerrado.1)),
        Column::percent(format!("Variación (%) {}", cerrado.1)),
        Column::amount(with_unit(&corrido.0)),
        Column::amount(with_unit(&corrido.1)),
        Column::percent(format!("Variación (%) {}", corrido.1)),
    ]
}

/// Mining split of both periods, in USD FOB millions.
fn export_summary(data: &Data, flags: &Flags, periods: &Periods) -> Table {
    let e = &periods.export;
    let mut table = Table::new(summary_columns(
        "Tipo de exportación",
        period_labels(&e.cerrado, Period::Cerrado),
        period_labels(&e.corrido, Period::Corrido),
        "USD FOB millones",
    ));
    for label in ["No Mineras", "Mineras", "Total"] {
        let cerrado = export_figure(data, flags, FlagKey::ExportTotals(Period::Cerrado), Period::Cerrado, label);
        let corrido = export_figure(data, flags, FlagKey::ExportTotals(Period::Corrido), Period::Corrido, label);
        table.push(summary_row(label, &cerrado, &corrido, 1e6));
    }
    table
}

fn investment_summary(data: &Data, geo: &GeoParams, flags: &Flags, periods: &Periods) -> Table {
    let i = &periods.investment;
    let mut table = Table::new(summary_columns(
        "Tipo de inversión",
        period_labels(&i.cerrado, Period::Cerrado),
        period_labels(&i.corrido, Period::Corrido),
        "USD millones",
    ));
    for flow in Flow::BOTH {
        let cerrado = investment_figure(data, geo, flags, flow, Period::Cerrado);
        let corrido = investment_figure(data, geo, flags, flow, Period::Corrido);
        table.push(summary_row(flow.code(), &cerrado, &corrido, 1.0));
    }
    table
}

fn tourism_summary(data: &Data, flags: &Flags, periods: &Periods) -> Table {
    let mut table = Table::new(summary_columns(
        "Variable",
        tourism_labels(periods, Period::Cerrado),
        tourism_labels(periods, Period::Corrido),
        "",
    ));
    let cerrado = tourism_figure(data, flags, Period::Cerrado);
    let corrido = tourism_figure(data, flags, Period::Corrido);
    table.push(summary_row("Viajeros", &cerrado, &corrido, 1.0));
    table
}

fn millions(row: &MetricRow) -> (String, String, &'static str) {
    let var = row.variation.unwrap_or(0.0);
    (format_number(row.cur / 1e6, 1), format_number(var.abs(), 1), variacion_palabra(var))
}

fn narrative(
    data: &Data,
    geo: &GeoParams,
    flags: &Flags,
    periods: &Periods,
    conteo: &BTreeMap<Period, usize>,
) -> Narrative {
    let mut out = Narrative::default();
    let grouping = geo.grouping();
    let national = matches!(grouping, Grouping::Colombia | Grouping::Departamentos);
    let unidad = geo.display_name();
    let umbral = format_no_decimal(geo.umbral);

    let e = &periods.export;
    let mes = e.mes_t.to_lowercase();
    for p in Period::BOTH {
        let total = export_figure(data, flags, FlagKey::ExportTotals(p), p, "Total");
        let nme = export_figure(data, flags, FlagKey::ExportNme(p), p, "No Mineras");
        let empresas = format_no_decimal(conteo.get(&p).copied().unwrap_or(0) as f64);
        let (v, var, word) = millions(&total);
        let (nv, nvar, nword) = millions(&nme);
        let (t_1, t) = (&e.cerrado.t_1, &e.cerrado.t);
        let (y1, y) = (&e.t_1_year, &e.t_year);

        let (b1, b2, b3) = match (p, national) {
            (Period::Cerrado, true) => (
                format!("En {t}, {unidad} exportó al Mundo USD {v} millones, {var}% {word} que en {t_1}."),
                format!(
                    "Las exportaciones no minero-energéticas de {unidad} al Mundo en {t} registraron USD {nv} millones, {nvar}% {nword} que en {t_1}."
                ),
                format!(
                    "Durante {t}, {empresas} empresas colombianas exportaron productos no minero-energéticos por montos superiores a USD {umbral}."
                ),
            ),
            (Period::Corrido, true) => (
                format!(
                    "Entre enero y {mes} de {y} las exportaciones totales de {unidad} al Mundo suman USD {v} millones, {var}% {word} que en el mismo periodo de {y1}."
                ),
                format!(
                    "Entre enero y {mes} de {y} las exportaciones no minero-energéticas de {unidad} al Mundo suman USD {nv} millones, {nvar}% {nword} que en el mismo periodo de {y1}."
                ),
                format!(
                    "Entre enero y {mes} de {y}, {empresas} empresas colombianas exportaron productos no minero-energéticos por montos superiores a USD {umbral}."
                ),
            ),
            (Period::Cerrado, false) => (
                format!("En {t}, Colombia exportó a {unidad} USD {v} millones, {var}% {word} que en {t_1}."),
                format!(
                    "Las exportaciones no minero-energéticas de Colombia a {unidad} en {t} registraron USD {nv} millones, {nvar}% {nword} que en {t_1}."
                ),
                format!(
                    "Durante {t}, {empresas} empresas colombianas exportaron productos no minero-energéticos a {unidad} por montos superiores a USD {umbral}."
                ),
            ),
            (Period::Corrido, false) => (
                format!(
                    "Entre enero y {mes} de {y} las exportaciones totales a {unidad} suman USD {v} millones, {var}% {word} que en el mismo periodo de {y1}."
                ),
                format!(
                    "Entre enero y {mes} de {y} las exportaciones no minero-energéticas de Colombia a {unidad} suman USD {nv} millones, {nvar}% {nword} que en el mismo periodo de {y1}."
                ),
                format!(
                    "Entre enero y {mes} de {y}, {empresas} empresas colombianas exportaron productos no minero-energéticos a {unidad} por montos superiores a USD {umbral}."
                ),
            ),
        };
        out.exportaciones.set(p, b1);
        out.no_minero.set(p, b2);
        out.empresas.set(p, b3);
    }

    if grouping != Grouping::Departamentos {
        let i = &periods.investment;
        let (origen, destino) = if grouping == Grouping::Colombia {
            ("del Mundo".to_string(), "en el Mundo".to_string())
        } else {
            (format!("de {unidad}"), format!("en {unidad}"))
        };
        for p in Period::BOTH {
            for flow in Flow::BOTH {
                let row = investment_figure(data, geo, flags, flow, p);
                let var = row.variation.unwrap_or(0.0);
                let (v, pct, word, signo) = (
                    format_number(row.cur, 1),
                    format_number(var.abs(), 1),
                    variacion_palabra(var),
                    inversion_palabra(row.cur),
                );
                let (t_1, t) = (&i.cerrado.t_1, &i.cerrado.t);
                let (tri, y, y1) = (&i.t_trimester_name, &i.t_year, &i.t_1_year);
                let text = match (flow, p) {
                    (Flow::Ied, Period::Cerrado) => format!(
                        "En {t}, Colombia registró flujos {signo} de inversión extranjera directa (IED) {origen} por USD {v} millones, {pct}% {word} con respecto al {t_1}."
                    ),
                    (Flow::Ied, Period::Corrido) => format!(
                        "En el {tri} trimestre de {y}, Colombia registró flujos {signo} de IED {origen} por USD {v} millones, {pct}% {word} con respecto al mismo periodo de {y1}."
                    ),
                    (Flow::Ice, Period::Cerrado) => format!(
                        "En {t}, se registraron flujos {signo} de inversión directa de Colombia en el exterior (ICE) {destino} por USD {v} millones, {pct}% {word} con respecto al {t_1}."
                    ),
                    (Flow::Ice, Period::Corrido) => format!(
                        "En el {tri} trimestre de {y}, Colombia registró flujos {signo} de ICE {destino} por USD {v} millones, {pct}% {word} con respecto al mismo periodo de {y1}."
                    ),
                };
                match flow {
                    Flow::Ied => out.ied.set(p, text),
                    Flow::Ice => out.ice.set(p, text),
                }
            }
        }
    }

    let tp = &periods.tourism;
    let mes_turismo = tp.month_full.to_lowercase();
    for p in Period::BOTH {
        let row = tourism_figure(data, flags, p);
        let var = row.variation.unwrap_or(0.0);
        let (n, pct, word) = (format_no_decimal(row.cur), format_number(var.abs(), 1), variacion_palabra(var));
        let pair = match p {
            Period::Cerrado => &tp.cerrado,
            Period::Corrido => &tp.corrido,
        };
        let (t_1, t) = (&pair.t_1, &pair.t);
        let inicio = match p {
            Period::Cerrado => format!("En {t}"),
            Period::Corrido => format!("Entre enero y {mes_turismo} de {t}"),
        };
        let text = if national {
            format!("{inicio}, {unidad} registró {n} llegadas de turistas extranjeros, {pct}% {word} con respecto a {t_1}.")
        } else {
            format!(
                "{inicio}, Colombia registró {n} llegadas de turistas extranjeros provenientes de {unidad}, {pct}% {word} con respecto a {t_1}."
            )
        };
        out.turismo.set(p, text);
    }
    out
}

/// Value chain to "subsector, subsector." in first-seen order.
fn chain_dictionary(frame: Option<&Frame>) -> Result<Vec<(String, String)>> {
    let Some(frame) = frame.filter(|f| !f.is_empty()) else {
        return Ok(Vec::new());
    };
    let mut chains: Vec<(String, Vec<String>)> = Vec::new();
    for (cadena, subsector) in frame.texts("CADENA")?.into_iter().zip(frame.texts("SUBSECTOR")?) {
        let (Some(cadena), Some(subsector)) = (cadena, subsector) else { continue };
        match chains.iter_mut().find(|(name, _)| *name == cadena) {
            Some((_, subs)) => {
                if !subs.contains(&subsector) {
                    subs.push(subsector);
                }
            }
            None => chains.push((cadena, vec![subsector])),
        }
    }
    Ok(chains
        .into_iter()
        .map(|(cadena, subs)| (cadena, format!("{}.", subs.join(", "))))
        .collect())
}

/// Main tourism products and niches as two sentences.
fn tourism_dictionary(frame: Option<&Frame>) -> Result<(String, String)> {
    let Some(frame) = frame.filter(|f| !f.is_empty()) else {
        return Ok((String::new(), String::new()));
    };
    let sentence = |items: Vec<String>| {
        if items.is_empty() {
            String::new()
        } else {
            format!("{}.", items.join(", "))
        }
    };
    Ok((sentence(frame.unique("SECTOR")?), sentence(frame.unique("SUBSECTOR")?)))
}
