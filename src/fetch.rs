// Data fetcher: the fixed battery of warehouse queries behind every report
// table, with the derived "Otros" and "Total" rows and percentage shares.
//
// Every gated battery reads its flag first and issues no query when the
// probe said SIN, so absent tables are never touched downstream.
use crate::error::Result;
use crate::params::{GeoParams, Grouping, Period};
use crate::verify::{FlagKey, Flags};
use crate::warehouse::{sql_list, sql_str, Frame, Warehouse};
use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const NO_APLICA: &str = "No aplica";
pub const OTROS: &str = "Otros";
pub const TOP_N: usize = 5;

/// Percentage share of a row in its table total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Share {
    Pct(f64),
    /// The total is zero.
    NotApplicable,
}

impl Share {
    pub fn value(&self) -> Option<f64> {
        match self {
            Share::Pct(v) => Some(*v),
            Share::NotApplicable => None,
        }
    }
}

/// Variation between two periods.
///
/// A series that appears from zero reads as +100 and one that drops to zero
/// as -100; two zeros read as 0.
pub fn percent_change(prev: f64, cur: f64) -> f64 {
    if prev == 0.0 && cur > 0.0 {
        100.0
    } else if prev == 0.0 && cur == 0.0 {
        0.0
    } else if cur == 0.0 && prev > 0.0 {
        -100.0
    } else {
        (cur - prev) / prev * 100.0
    }
}

pub fn participation(value: f64, total: f64) -> Share {
    if total == 0.0 {
        Share::NotApplicable
    } else if value == 0.0 {
        Share::Pct(0.0)
    } else {
        Share::Pct(value / total * 100.0)
    }
}

/// One line of a metric table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub label: String,
    /// Extra text columns (company name and sector).
    pub details: Vec<String>,
    pub prev: f64,
    pub cur: f64,
    pub variation: Option<f64>,
    pub share_prev: Option<Share>,
    pub share: Option<Share>,
}

impl MetricRow {
    pub fn new(label: &str, prev: f64, cur: f64, variation: Option<f64>) -> Self {
        MetricRow {
            label: label.to_string(),
            details: Vec::new(),
            prev,
            cur,
            variation,
            share_prev: None,
            share: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn relabel(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Column sums of `rows` with the variation recomputed.
    pub fn sum_of(label: &str, rows: &[MetricRow]) -> Self {
        let prev = rows.iter().map(|r| r.prev).sum();
        let cur = rows.iter().map(|r| r.cur).sum();
        MetricRow::new(label, prev, cur, Some(percent_change(prev, cur)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricTable {
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn new(rows: Vec<MetricRow>) -> Self {
        MetricTable { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, label: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn first(&self) -> Option<&MetricRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&MetricRow> {
        self.rows.last()
    }

    /// Shares of the current-period column over `total`, for every row.
    pub fn with_shares(mut self, total: f64) -> Self {
        for r in &mut self.rows {
            r.share = Some(participation(r.cur, total));
        }
        self
    }

    pub fn with_prev_shares(mut self, total: f64) -> Self {
        for r in &mut self.rows {
            r.share_prev = Some(participation(r.prev, total));
        }
        self
    }
}

/// Keep the first `n` rows, which arrive ordered by the current value. When
/// the source had more than `n` rows an "Otros" remainder is appended, then
/// `total` closes the table.
pub fn top_with_rest(mut rows: Vec<MetricRow>, total: &MetricRow, n: usize) -> Vec<MetricRow> {
    let original = rows.len();
    rows.truncate(n);
    if original > n {
        let prev = total.prev - rows.iter().map(|r| r.prev).sum::<f64>();
        let cur = total.cur - rows.iter().map(|r| r.cur).sum::<f64>();
        let otros = MetricRow::new(OTROS, prev, cur, Some(percent_change(prev, cur)))
            .with_details(vec![NO_APLICA.to_string(); total.details.len()]);
        rows.push(otros);
    }
    rows.push(total.clone());
    rows
}

/// Column names of one metric query.
struct Columns<'a> {
    label: &'a str,
    details: &'a [&'a str],
    prev: &'a str,
    cur: &'a str,
    variation: Option<&'a str>,
}

const USD: Columns<'static> = Columns {
    label: "CATEGORIA",
    details: &[],
    prev: "SUMA_USD_T_1",
    cur: "SUMA_USD_T",
    variation: Some("DIFERENCIA_PORCENTUAL"),
};

const NIT: Columns<'static> = Columns {
    details: &["RAZON_SOCIAL", "SECTOR_ESTRELLA"],
    ..USD
};

const PESO: Columns<'static> = Columns {
    label: "CATEGORIA",
    details: &[],
    prev: "SUMA_PESO_T_1",
    cur: "SUMA_PESO_T",
    variation: Some("DIFERENCIA_PORCENTUAL"),
};

const MEDIOS: Columns<'static> = Columns { variation: None, ..PESO };

const INVERSION: Columns<'static> = Columns {
    label: "UNIDAD",
    details: &[],
    prev: "SUMA_INVERSION_T_1",
    cur: "SUMA_INVERSION_T",
    variation: Some("DIFERENCIA_PORCENTUAL"),
};

const TURISMO: Columns<'static> = Columns {
    label: "",
    details: &[],
    prev: "SUMA_TURISMO_T_1",
    cur: "SUMA_TURISMO_T",
    variation: Some("DIFERENCIA_PORCENTUAL"),
};

fn read_rows(frame: &Frame, cols: &Columns) -> Result<Vec<MetricRow>> {
    if frame.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::with_capacity(frame.len());
    for i in 0..frame.len() {
        let mut details = Vec::with_capacity(cols.details.len());
        for d in cols.details {
            details.push(frame.text(i, d)?);
        }
        let variation = match cols.variation {
            Some(c) => frame.value(i, c)?.as_f64(),
            None => None,
        };
        out.push(
            MetricRow::new(&frame.text(i, cols.label)?, frame.number(i, cols.prev)?, frame.number(i, cols.cur)?, variation)
                .with_details(details),
        );
    }
    Ok(out)
}

fn query_rows(wh: &dyn Warehouse, sql: &str, cols: &Columns) -> Result<Vec<MetricRow>> {
    let frame = wh.query(sql)?;
    read_rows(&frame, cols)
}

/// The single row of an aggregate query, or zeros when nothing came back.
fn single_row(rows: Vec<MetricRow>, label: &str) -> MetricRow {
    rows.into_iter()
        .next()
        .unwrap_or_else(|| MetricRow::new(label, 0.0, 0.0, Some(0.0)))
}

/// Export category tables of `ST_CATEGORIAS_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ExportCategory {
    Continente,
    Departamentos,
    Hubs,
    Pais,
    Sectores,
    Subsectores,
    Tlcs,
}

impl ExportCategory {
    pub const ALL: [ExportCategory; 7] = [
        ExportCategory::Continente,
        ExportCategory::Departamentos,
        ExportCategory::Hubs,
        ExportCategory::Pais,
        ExportCategory::Sectores,
        ExportCategory::Subsectores,
        ExportCategory::Tlcs,
    ];

    pub fn tabla(&self) -> &'static str {
        match self {
            ExportCategory::Continente => "CONTINENTE",
            ExportCategory::Departamentos => "DEPARTAMENTOS",
            ExportCategory::Hubs => "HUBS",
            ExportCategory::Pais => "PAIS",
            ExportCategory::Sectores => "SECTORES",
            ExportCategory::Subsectores => "SUBSECTORES",
            ExportCategory::Tlcs => "TLCS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportData {
    pub totales: BTreeMap<Period, MetricTable>,
    /// Mining / non-mining split followed by the total row.
    pub tipos: BTreeMap<Period, MetricTable>,
    pub categorias: BTreeMap<(Period, ExportCategory), MetricTable>,
    pub empresas: BTreeMap<Period, MetricTable>,
    /// Distinct exporting companies above the threshold, per year.
    pub conteo: BTreeMap<Period, BTreeMap<String, usize>>,
    pub totales_peso: BTreeMap<Period, MetricTable>,
    pub tipos_peso: BTreeMap<Period, MetricTable>,
    pub medios_minero: BTreeMap<Period, MetricTable>,
    pub medios_no_minero: BTreeMap<Period, MetricTable>,
}

pub fn fetch_exports(wh: &dyn Warehouse, geo: &GeoParams, flags: &Flags) -> Result<ExportData> {
    let agr = geo.grouping().as_str();
    let unidad = sql_str(geo.unit());
    let mut data = ExportData::default();

    for p in Period::BOTH {
        let s = p.suffix();
        if flags.has(FlagKey::ExportTotals(p)) {
            let totales = query_rows(
                wh,
                &format!(
                    "SELECT 'Total' AS CATEGORIA, A.SUMA_USD_T_1, A.SUMA_USD_T, A.DIFERENCIA_PORCENTUAL
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD IN ({unidad})
                        AND A.TABLA = 'TOTAL';"
                ),
                &USD,
            )?;
            let mut tipos = query_rows(
                wh,
                &format!(
                    "SELECT A.CATEGORIA, A.SUMA_USD_T_1, A.SUMA_USD_T, A.DIFERENCIA_PORCENTUAL
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD = {unidad}
                        AND A.TABLA = 'TIPOS';"
                ),
                &USD,
            )?;
            let total_t: f64 = totales.iter().map(|r| r.cur).sum();
            tipos.extend(totales.iter().cloned());
            data.tipos.insert(p, MetricTable::new(tipos).with_shares(total_t));
            data.totales.insert(p, MetricTable::new(totales));

            let totales_peso = query_rows(
                wh,
                &format!(
                    "SELECT 'Total' AS CATEGORIA, A.SUMA_PESO_T_1, A.SUMA_PESO_T, A.DIFERENCIA_PORCENTUAL
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_PESO_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD = {unidad}
                        AND A.TABLA = 'TOTAL';"
                ),
                &PESO,
            )?;
            let mut tipos_peso = query_rows(
                wh,
                &format!(
                    "SELECT A.CATEGORIA, A.SUMA_PESO_T_1, A.SUMA_PESO_T, A.DIFERENCIA_PORCENTUAL
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_PESO_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD = {unidad}
                        AND A.TABLA = 'TIPOS';"
                ),
                &PESO,
            )?;
            let peso_t: f64 = totales_peso.iter().map(|r| r.cur).sum();
            tipos_peso.extend(totales_peso.iter().cloned());
            data.tipos_peso.insert(p, MetricTable::new(tipos_peso).with_shares(peso_t));
            data.totales_peso.insert(p, MetricTable::new(totales_peso));
        }

        // Category and company tables close on the non-mining row of TIPOS.
        let nme_total = data
            .tipos
            .get(&p)
            .and_then(|t| t.row("No Mineras"))
            .cloned()
            .map(|r| MetricRow { share: None, ..r }.relabel("Total"))
            .unwrap_or_else(|| MetricRow::new("Total", 0.0, 0.0, Some(0.0)));

        if flags.has(FlagKey::ExportNme(p)) {
            for cat in ExportCategory::ALL {
                let rows = query_rows(
                    wh,
                    &format!(
                        "SELECT A.CATEGORIA, A.SUMA_USD_T_1, A.SUMA_USD_T, A.DIFERENCIA_PORCENTUAL
                        FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_{s} AS A
                        WHERE A.AGRUPACION = '{agr}'
                            AND A.UNIDAD = {unidad}
                            AND A.TABLA = '{tabla}'
                        ORDER BY A.SUMA_USD_T DESC;",
                        tabla = cat.tabla()
                    ),
                    &USD,
                )?;
                let table = MetricTable::new(top_with_rest(rows, &nme_total, TOP_N)).with_shares(nme_total.cur);
                data.categorias.insert((p, cat), table);
            }
        }

        if flags.has(FlagKey::Empresas(p)) {
            let rows = query_rows(
                wh,
                &format!(
                    "SELECT A.CATEGORIA, A.RAZON_SOCIAL, A.SECTOR_ESTRELLA, A.SUMA_USD_T_1, A.SUMA_USD_T, A.DIFERENCIA_PORCENTUAL
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_NIT_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD = {unidad}
                    ORDER BY SUMA_USD_T DESC;"
                ),
                &NIT,
            )?;
            let total = nme_total
                .clone()
                .with_details(vec![NO_APLICA.to_string(), NO_APLICA.to_string()]);
            let table = MetricTable::new(top_with_rest(rows, &total, TOP_N)).with_shares(total.cur);
            data.empresas.insert(p, table);
        }

        if flags.has(FlagKey::Conteo(p)) {
            let frame = wh.query(&format!(
                "SELECT A.NIT_EXPORTADOR, A.YEAR
                FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CONTEO_EMPRESAS_{s} AS A
                WHERE A.AGRUPACION = '{agr}'
                    AND A.UNIDAD = {unidad}
                    AND A.VALOR_USD > {umbral}
                ORDER BY A.YEAR ASC;",
                umbral = geo.umbral
            ))?;
            data.conteo.insert(p, count_companies(&frame)?);
        }

        for (key, tabla, target) in [
            (FlagKey::PesosMinero(p), "MEDIO MINERAS", &mut data.medios_minero),
            (FlagKey::PesosNoMinero(p), "MEDIO NO MINERAS", &mut data.medios_no_minero),
        ] {
            if !flags.has(key) {
                continue;
            }
            let mut rows = query_rows(
                wh,
                &format!(
                    "SELECT A.CATEGORIA, A.SUMA_PESO_T_1, A.SUMA_PESO_T
                    FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_PESO_{s} AS A
                    WHERE A.AGRUPACION = '{agr}'
                        AND A.UNIDAD = {unidad}
                        AND A.TABLA = '{tabla}';"
                ),
                &MEDIOS,
            )?;
            let total = MetricRow {
                variation: None,
                ..MetricRow::sum_of("Total", &rows)
            };
            let (prev, cur) = (total.prev, total.cur);
            rows.push(total);
            target.insert(p, MetricTable::new(rows).with_prev_shares(prev).with_shares(cur));
        }
    }
    Ok(data)
}

/// Distinct NITs per year, years in ascending order.
fn count_companies(frame: &Frame) -> Result<BTreeMap<String, usize>> {
    if frame.is_empty() {
        return Ok(BTreeMap::new());
    }
    let mut seen: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (year, nit) in frame.texts("YEAR")?.into_iter().zip(frame.texts("NIT_EXPORTADOR")?) {
        if let (Some(year), Some(nit)) = (year, nit) {
            seen.entry(year).or_default().insert(nit);
        }
    }
    Ok(seen.into_iter().map(|(y, nits)| (y, nits.len())).collect())
}

/// Inbound (IED) or outbound (ICE) direct investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Flow {
    Ied,
    Ice,
}

impl Flow {
    pub const BOTH: [Flow; 2] = [Flow::Ied, Flow::Ice];

    pub fn code(&self) -> &'static str {
        match self {
            Flow::Ied => "IED",
            Flow::Ice => "ICE",
        }
    }

    pub fn world_label(&self) -> &'static str {
        match self {
            Flow::Ied => "Total IED del Mundo en Colombia",
            Flow::Ice => "Total ICE de Colombia en el Mundo",
        }
    }

    pub fn flag(&self, p: Period) -> FlagKey {
        match self {
            Flow::Ied => FlagKey::Ied(p),
            Flow::Ice => FlagKey::Ice(p),
        }
    }
}

/// Investment tables name their variation column differently per period.
fn investment_variation(p: Period) -> &'static str {
    match p {
        Period::Cerrado => "DIFERENCIA_PORCENTUAL_T",
        Period::Corrido => "DIFERENCIA_PORCENTUAL",
    }
}

pub const ACTIVIDADES_IED: [&str; 8] = [
    "Servicios financieros y empresariales",
    "Industrias manufactureras",
    "Comercio al por mayor y al por menor, restaurantes y hoteles",
    "Transportes, almacenamiento y comunicaciones",
    "Electricidad, gas y agua",
    "Servicios comunales sociales y personales",
    "Construcción",
    "Agricultura, caza, silvicultura y pesca",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvestmentData {
    /// National IED by economic activity.
    pub actividades: BTreeMap<Period, MetricTable>,
    pub paises: BTreeMap<(Flow, Period), MetricTable>,
    /// Slice total against the world total (groups and countries).
    pub total: BTreeMap<(Flow, Period), MetricTable>,
}

pub fn fetch_investment(wh: &dyn Warehouse, geo: &GeoParams, flags: &Flags) -> Result<InvestmentData> {
    let grouping = geo.grouping();
    let mut data = InvestmentData::default();

    if grouping == Grouping::Colombia {
        for p in Period::BOTH {
            let sql = format!(
                "SELECT A.UNIDAD, A.SUMA_INVERSION_T_1, A.SUMA_INVERSION_T, A.{var} AS DIFERENCIA_PORCENTUAL
                FROM DOCUMENTOS_COLOMBIA.INVERSION.ST_ACTIVIDADES_{s} AS A
                WHERE A.AGRUPACION = 'ACTIVIDADES'
                    AND A.UNIDAD NOT IN ('TOTAL')
                    AND A.UNIDAD IN ({units})
                    AND A.TABLA = 'INVERSIÓN ACTIVIDADES'
                    AND A.CATEGORIA = 'IED';",
                var = investment_variation(p),
                s = p.suffix(),
                units = sql_list(&ACTIVIDADES_IED)
            );
            let mut rows = query_rows(wh, &sql, &INVERSION)?;
            let total = MetricRow::sum_of("Total", &rows);
            let total_t = total.cur;
            rows.push(total);
            data.actividades.insert(p, MetricTable::new(rows).with_shares(total_t));
        }
    }

    if grouping == Grouping::Departamentos {
        return Ok(data);
    }

    for flow in Flow::BOTH {
        for p in Period::BOTH {
            if !flags.has(flow.flag(p)) {
                continue;
            }
            let (paises, total) = investment_countries(wh, geo, flow, p)?;
            data.paises.insert((flow, p), paises);
            if let Some(total) = total {
                data.total.insert((flow, p), total);
            }
        }
    }
    Ok(data)
}

fn investment_countries(
    wh: &dyn Warehouse,
    geo: &GeoParams,
    flow: Flow,
    p: Period,
) -> Result<(MetricTable, Option<MetricTable>)> {
    let grouping = geo.grouping();
    let s = p.suffix();
    let var = investment_variation(p);
    let cat = flow.code();
    let codes = sql_list(&geo.paises_inversion);

    let mut sql = format!(
        "SELECT A.UNIDAD, A.SUMA_INVERSION_T_1, A.SUMA_INVERSION_T, A.{var} AS DIFERENCIA_PORCENTUAL
        FROM DOCUMENTOS_COLOMBIA.INVERSION.ST_PAISES_{s} AS A
        WHERE A.AGRUPACION = 'PAISES'
            AND A.UNIDAD NOT IN ('TOTAL')
            AND A.CATEGORIA = '{cat}'"
    );
    if grouping != Grouping::Colombia {
        sql.push_str(&format!(" AND A.UNIDAD IN ({codes})"));
    }
    sql.push_str(" ORDER BY A.SUMA_INVERSION_T DESC;");
    let rows = query_rows(wh, &sql, &INVERSION)?;

    let world_sql = |label: &str| {
        format!(
            "SELECT {label} AS UNIDAD, A.SUMA_INVERSION_T_1, A.SUMA_INVERSION_T, A.{var} AS DIFERENCIA_PORCENTUAL
            FROM DOCUMENTOS_COLOMBIA.INVERSION.ST_PAISES_{s} AS A
            WHERE A.AGRUPACION = 'PAISES'
                AND A.UNIDAD IN ('TOTAL')
                AND A.CATEGORIA = '{cat}';",
            label = sql_str(label)
        )
    };

    if grouping == Grouping::Paises {
        let world = single_row(query_rows(wh, &world_sql(flow.world_label()), &INVERSION)?, flow.world_label());
        let mut top = rows;
        top.truncate(TOP_N);
        let mut total_rows = top.clone();
        total_rows.push(world.clone());
        let total = MetricTable::new(total_rows).with_shares(world.cur);
        return Ok((MetricTable::new(top), Some(total)));
    }

    // Colombia reads the stored world row; groups add up their countries and
    // recompute the variation in SQL.
    let group_sql = if grouping == Grouping::Colombia {
        world_sql("TOTAL")
    } else {
        format!(
            "SELECT 'TOTAL' AS UNIDAD,
                SUM(A.SUMA_INVERSION_T_1) AS SUMA_INVERSION_T_1,
                SUM(A.SUMA_INVERSION_T) AS SUMA_INVERSION_T,
                CASE
                    WHEN SUM(A.SUMA_INVERSION_T_1) = 0 AND SUM(A.SUMA_INVERSION_T) > 0 THEN 100
                    WHEN SUM(A.SUMA_INVERSION_T_1) = 0 AND SUM(A.SUMA_INVERSION_T) = 0 THEN 0
                    WHEN SUM(A.SUMA_INVERSION_T) = 0 AND SUM(A.SUMA_INVERSION_T_1) > 0 THEN -100
                ELSE ((SUM(A.SUMA_INVERSION_T) - SUM(A.SUMA_INVERSION_T_1)) / SUM(A.SUMA_INVERSION_T_1)) * 100
                END AS DIFERENCIA_PORCENTUAL
            FROM DOCUMENTOS_COLOMBIA.INVERSION.ST_PAISES_{s} AS A
            WHERE A.AGRUPACION = 'PAISES'
                AND A.CATEGORIA = '{cat}'
                AND A.UNIDAD IN ({codes});"
        )
    };
    let group_total = single_row(query_rows(wh, &group_sql, &INVERSION)?, "TOTAL");
    let paises = MetricTable::new(top_with_rest(rows, &group_total, TOP_N)).with_shares(group_total.cur);

    if grouping == Grouping::Colombia {
        return Ok((paises, None));
    }
    let world = single_row(query_rows(wh, &world_sql(flow.world_label()), &INVERSION)?, flow.world_label());
    let total = MetricTable::new(vec![group_total, world.clone()]).with_shares(world.cur);
    Ok((paises, Some(total)))
}

/// Grouping dimension of the tourism arrivals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TourismDim {
    Paises,
    Departamentos,
    Ciudades,
    Genero,
    Motivo,
}

impl TourismDim {
    pub fn column(&self) -> &'static str {
        match self {
            TourismDim::Paises => "PAIS_RESIDENCIA",
            TourismDim::Departamentos => "DPTO_HOSPEDAJE",
            TourismDim::Ciudades => "CIUDAD_HOSPEDAJE",
            TourismDim::Genero => "DESCRIPCION_GENERO",
            TourismDim::Motivo => "MOVC_NOMBRE",
        }
    }

    /// Gender and travel reason are published for the closed year only.
    pub fn for_period(p: Period) -> &'static [TourismDim] {
        match p {
            Period::Cerrado => &[
                TourismDim::Paises,
                TourismDim::Departamentos,
                TourismDim::Ciudades,
                TourismDim::Genero,
                TourismDim::Motivo,
            ],
            Period::Corrido => &[TourismDim::Paises, TourismDim::Departamentos, TourismDim::Ciudades],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourismData {
    pub tables: BTreeMap<(Period, TourismDim), MetricTable>,
}

impl TourismData {
    pub fn get(&self, p: Period, dim: TourismDim) -> Option<&MetricTable> {
        self.tables.get(&(p, dim))
    }
}

fn tourism_query(geo: &GeoParams, p: Period, dim: TourismDim) -> String {
    let col = dim.column();
    let mut sql = format!(
        "SELECT A.{col},
            SUM(A.SUMA_TURISMO_T_1) AS SUMA_TURISMO_T_1,
            SUM(A.SUMA_TURISMO_T) AS SUMA_TURISMO_T,
            CASE
                WHEN SUM(A.SUMA_TURISMO_T_1) = 0 AND SUM(A.SUMA_TURISMO_T) > 0 THEN 100
                WHEN SUM(A.SUMA_TURISMO_T_1) = 0 AND SUM(A.SUMA_TURISMO_T) = 0 THEN 0
                WHEN SUM(A.SUMA_TURISMO_T) = 0 AND SUM(A.SUMA_TURISMO_T_1) > 0 THEN -100
            ELSE ((SUM(A.SUMA_TURISMO_T) - SUM(A.SUMA_TURISMO_T_1)) / SUM(A.SUMA_TURISMO_T_1)) * 100
            END AS DIFERENCIA_PORCENTUAL
        FROM DOCUMENTOS_COLOMBIA.TURISMO.ST_PAISES_{s} AS A
        WHERE 1 = 1",
        s = p.suffix()
    );
    match geo.grouping() {
        g if g.has_country_investment() => {
            sql.push_str(&format!(" AND A.PAIS_RESIDENCIA IN ({})", sql_list(&geo.paises_turismo_cod)))
        }
        Grouping::Departamentos => sql.push_str(&format!(" AND A.DPTO_HOSPEDAJE IN ({})", sql_list(&geo.unidad_cod))),
        _ => sql.push_str(" AND 1=1"),
    }
    sql.push_str(&format!(" GROUP BY A.{col} ORDER BY SUM(A.SUMA_TURISMO_T) DESC;"));
    sql
}

pub fn fetch_tourism(wh: &dyn Warehouse, geo: &GeoParams, flags: &Flags) -> Result<TourismData> {
    let mut data = TourismData::default();
    for p in Period::BOTH {
        if !flags.has(FlagKey::Turismo(p)) {
            continue;
        }
        let mut raw: Vec<(TourismDim, Vec<MetricRow>)> = Vec::new();
        for dim in TourismDim::for_period(p) {
            let cols = Columns { label: dim.column(), ..TURISMO };
            raw.push((*dim, query_rows(wh, &tourism_query(geo, p, *dim), &cols)?));
        }

        // Every dimension shares the country total.
        let countries: &[MetricRow] = raw
            .iter()
            .find(|(d, _)| *d == TourismDim::Paises)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[]);
        let total = MetricRow::sum_of("TOTAL", countries);

        for (dim, rows) in raw {
            let rows = if dim == TourismDim::Genero {
                let mut rows = rows;
                rows.push(total.clone());
                rows
            } else {
                top_with_rest(rows, &total, TOP_N)
            };
            data.tables.insert((p, dim), MetricTable::new(rows).with_shares(total.cur));
        }
    }
    Ok(data)
}

/// Business opportunity lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Opportunity {
    Exportacion,
    Inversion,
    Turismo,
}

impl Opportunity {
    pub const ALL: [Opportunity; 3] = [Opportunity::Exportacion, Opportunity::Inversion, Opportunity::Turismo];

    pub fn flag(&self) -> FlagKey {
        match self {
            Opportunity::Exportacion => FlagKey::OportunidadesExportacion,
            Opportunity::Inversion => FlagKey::OportunidadesInversion,
            Opportunity::Turismo => FlagKey::OportunidadesTurismo,
        }
    }
}

fn opportunity_query(geo: &GeoParams, kind: Opportunity) -> String {
    let mut sql = match kind {
        Opportunity::Exportacion => String::from(
            "SELECT DISTINCT A.CADENA, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.OPORTUNIDAD = 'Exportación'
                AND A.CADENA NOT IN ('Turismo')",
        ),
        Opportunity::Inversion => String::from(
            "SELECT DISTINCT A.CADENA, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.OPORTUNIDAD = 'IED'",
        ),
        Opportunity::Turismo => String::from(
            "SELECT DISTINCT LOWER(A.SECTOR) AS SECTOR, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.CADENA IN ('Turismo')",
        ),
    };
    // Export and investment lists are not narrowed for country groups.
    let country_filter = match kind {
        Opportunity::Turismo => geo.grouping().has_country_investment(),
        _ => geo.grouping() == Grouping::Paises,
    };
    if country_filter {
        sql.push_str(&format!(" AND A.COD_PAIS IN ({})", sql_list(&geo.paises_turismo_cod)));
    }
    if geo.grouping() == Grouping::Departamentos {
        sql.push_str(&format!(" AND A.COD_DIVIPOLA_DEPARTAMENTO IN ({})", sql_list(&geo.unidad_cod)));
    }
    sql.push_str(" ORDER BY 1, 2 ASC");
    sql
}

/// Everything one report reads from the warehouse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    pub export: ExportData,
    pub investment: InvestmentData,
    pub tourism: TourismData,
    /// Weekly flights into the department (DEPARTAMENTOS only).
    pub conectividad: Option<Frame>,
    pub oportunidades: BTreeMap<Opportunity, Frame>,
}

pub fn fetch_all(wh: &dyn Warehouse, geo: &GeoParams, flags: &Flags) -> Result<Data> {
    let export = fetch_exports(wh, geo, flags)?;
    debug!("exportaciones: {} tablas de categorías", export.categorias.len());
    let investment = fetch_investment(wh, geo, flags)?;
    let tourism = fetch_tourism(wh, geo, flags)?;

    let conectividad = if geo.grouping() == Grouping::Departamentos && flags.has(FlagKey::Conectividad) {
        Some(wh.query(&format!(
            "SELECT A.AEROLINEA AS \"Aerolínea\",
                A.CIUDAD_ORIGEN AS \"Ciudad Origen\",
                A.CIUDAD_DESTINO AS \"Ciudad Destino\",
                A.FRECUENCIAS AS \"Frecuencias\",
                A.SEMANA AS \"Semana de análisis\"
            FROM DOCUMENTOS_COLOMBIA.TURISMO.CONECTIVIDAD AS A
            WHERE 1 = 1 AND A.COD_DIVIPOLA_DEPARTAMENTO_DESTINO IN ({})",
            sql_list(&geo.unidad_cod)
        ))?)
    } else {
        None
    };

    let mut oportunidades = BTreeMap::new();
    for kind in Opportunity::ALL {
        if flags.has(kind.flag()) {
            oportunidades.insert(kind, wh.query(&opportunity_query(geo, kind))?);
        }
    }

    info!(
        "Datos extraidos para {} {}: {} tablas de inversión, {} de turismo",
        geo.grouping(),
        geo.unit(),
        investment.paises.len() + investment.total.len() + investment.actividades.len(),
        tourism.tables.len()
    );
    Ok(Data {
        export,
        investment,
        tourism,
        conectividad,
        oportunidades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{MemoryWarehouse, Value};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn usd(rows: &[(&str, f64, f64)]) -> Frame {
        let mut f = Frame::new(&["CATEGORIA", "SUMA_USD_T_1", "SUMA_USD_T", "DIFERENCIA_PORCENTUAL"]);
        for (c, a, b) in rows {
            f = f.with_row(vec![(*c).into(), (*a).into(), (*b).into(), percent_change(*a, *b).into()]);
        }
        f
    }

    fn inversion(rows: &[(&str, f64, f64)]) -> Frame {
        let mut f = Frame::new(&["UNIDAD", "SUMA_INVERSION_T_1", "SUMA_INVERSION_T", "DIFERENCIA_PORCENTUAL"]);
        for (c, a, b) in rows {
            f = f.with_row(vec![(*c).into(), (*a).into(), (*b).into(), percent_change(*a, *b).into()]);
        }
        f
    }

    fn pais() -> GeoParams {
        GeoParams {
            grouping: Some(Grouping::Paises),
            unidad: vec!["PER".into()],
            paises_inversion: vec!["PERU".into()],
            paises_turismo_cod: vec!["589".into()],
            umbral: 10000.0,
            ..GeoParams::default()
        }
    }

    fn hub() -> GeoParams {
        GeoParams {
            grouping: Some(Grouping::Hubs),
            unidad: vec!["Andino".into()],
            paises_inversion: vec!["PERU".into(), "ECUADOR".into()],
            paises_turismo_cod: vec!["589".into(), "239".into()],
            umbral: 10000.0,
            ..GeoParams::default()
        }
    }

    #[test]
    fn percent_change_rules() {
        assert_eq!(percent_change(0.0, 5.0), 100.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(4.0, 0.0), -100.0);
        assert_relative_eq!(percent_change(200.0, 250.0), 25.0);
        assert_relative_eq!(percent_change(-10.0, -5.0), 50.0);
    }

    #[test]
    fn participation_rules() {
        assert_eq!(participation(5.0, 0.0), Share::NotApplicable);
        assert_eq!(participation(0.0, 10.0), Share::Pct(0.0));
        assert_eq!(participation(2.5, 10.0), Share::Pct(25.0));
    }

    #[test]
    fn otros_closes_the_gap_to_total() {
        let rows: Vec<MetricRow> = (1..=7)
            .rev()
            .map(|i| MetricRow::new(&format!("C{i}"), i as f64, i as f64 * 2.0, None))
            .collect();
        let total = MetricRow::sum_of("Total", &rows);
        let out = top_with_rest(rows, &total, TOP_N);
        assert_eq!(out.len(), 7);
        assert_eq!(out[5].label, OTROS);
        let shown: f64 = out[..6].iter().map(|r| r.cur).sum();
        assert_relative_eq!(shown, out[6].cur);
        assert_relative_eq!(out[5].prev, 3.0);
    }

    #[test]
    fn no_otros_for_short_tables() {
        let rows = vec![MetricRow::new("A", 1.0, 2.0, None), MetricRow::new("B", 1.0, 1.0, None)];
        let total = MetricRow::new("Total", 10.0, 10.0, Some(0.0));
        let labels: Vec<String> = top_with_rest(rows, &total, TOP_N).into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["A", "B", "Total"]);

        let five: Vec<MetricRow> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|l| MetricRow::new(*l, 2.0, 2.0, None))
            .collect();
        let out = top_with_rest(five, &total, TOP_N);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|r| r.label != OTROS));
        assert_eq!(out[5].label, "Total");
    }

    #[test]
    fn categories_close_on_non_mining_total() {
        let wh = MemoryWarehouse::new()
            .route(&["ST_CATEGORIAS_CERRADO", "'TOTAL'"], usd(&[("Total", 100.0, 120.0)]))
            .route(&["ST_CATEGORIAS_CERRADO", "'TIPOS'"], usd(&[("Mineras", 40.0, 50.0), ("No Mineras", 60.0, 70.0)]))
            .route(
                &["ST_CATEGORIAS_CERRADO", "'SECTORES'"],
                usd(&[
                    ("Agro", 20.0, 25.0),
                    ("Metal", 10.0, 15.0),
                    ("Químicos", 8.0, 9.0),
                    ("Textil", 6.0, 7.0),
                    ("Madera", 4.0, 5.0),
                    ("Otros bienes", 2.0, 3.0),
                ]),
            );
        let flags = Flags::from_pairs(&[
            (FlagKey::ExportTotals(Period::Cerrado), true),
            (FlagKey::ExportNme(Period::Cerrado), true),
        ]);
        let data = fetch_exports(&wh, &pais(), &flags).unwrap();

        let tipos = &data.tipos[&Period::Cerrado];
        assert_eq!(tipos.len(), 3);
        assert_eq!(tipos.last().unwrap().share, Some(Share::Pct(100.0)));

        let sectores = &data.categorias[&(Period::Cerrado, ExportCategory::Sectores)];
        assert_eq!(sectores.len(), 7);
        let otros = sectores.row(OTROS).unwrap();
        assert_relative_eq!(otros.cur, 70.0 - 61.0);
        let total = sectores.last().unwrap();
        assert_eq!(total.label, "Total");
        assert_relative_eq!(total.cur, 70.0);
        assert_eq!(total.share, Some(Share::Pct(100.0)));
        // Tables without rows still carry the total line.
        assert_eq!(data.categorias[&(Period::Cerrado, ExportCategory::Hubs)].len(), 1);
        assert!(data.categorias.get(&(Period::Corrido, ExportCategory::Sectores)).is_none());
    }

    #[test]
    fn missing_totals_make_shares_not_applicable() {
        let wh = MemoryWarehouse::new().route(&["ST_NIT_CORRIDO"], {
            Frame::new(&["CATEGORIA", "RAZON_SOCIAL", "SECTOR_ESTRELLA", "SUMA_USD_T_1", "SUMA_USD_T", "DIFERENCIA_PORCENTUAL"])
                .with_row(vec!["900".into(), "Flores SAS".into(), "Agro".into(), 1.0.into(), 2.0.into(), 100.0.into()])
        });
        let flags = Flags::from_pairs(&[(FlagKey::Empresas(Period::Corrido), true)]);
        let data = fetch_exports(&wh, &pais(), &flags).unwrap();
        let empresas = &data.empresas[&Period::Corrido];
        assert!(empresas.rows.iter().all(|r| r.share == Some(Share::NotApplicable)));
        assert_eq!(empresas.last().unwrap().details, vec![NO_APLICA, NO_APLICA]);
        assert_eq!(empresas.first().unwrap().details, vec!["Flores SAS", "Agro"]);
    }

    #[test]
    fn gated_batteries_issue_no_queries() {
        let wh = MemoryWarehouse::new();
        let data = fetch_all(&wh, &pais(), &Flags::default()).unwrap();
        assert!(wh.queries().is_empty());
        assert!(data.export.tipos.is_empty());
        assert!(data.conectividad.is_none());
    }

    #[test]
    fn conteo_counts_distinct_nits_per_year() {
        let frame = Frame::new(&["NIT_EXPORTADOR", "YEAR"])
            .with_row(vec!["1".into(), Value::Number(2023.0)])
            .with_row(vec!["1".into(), Value::Number(2023.0)])
            .with_row(vec!["2".into(), Value::Number(2023.0)])
            .with_row(vec!["1".into(), Value::Number(2022.0)]);
        let wh = MemoryWarehouse::new().route(&["ST_CONTEO_EMPRESAS_CERRADO"], frame);
        let flags = Flags::from_pairs(&[(FlagKey::Conteo(Period::Cerrado), true)]);
        let data = fetch_exports(&wh, &pais(), &flags).unwrap();
        let conteo = &data.conteo[&Period::Cerrado];
        assert_eq!(conteo.get("2023"), Some(&2));
        assert_eq!(conteo.get("2022"), Some(&1));
        assert!(wh.queries()[0].contains("A.VALOR_USD > 10000"));
    }

    #[test]
    fn transport_modes_share_both_periods() {
        let frame = Frame::new(&["CATEGORIA", "SUMA_PESO_T_1", "SUMA_PESO_T"])
            .with_row(vec!["Marítimo".into(), 75.0.into(), 90.0.into()])
            .with_row(vec!["Aéreo".into(), 25.0.into(), 10.0.into()]);
        let wh = MemoryWarehouse::new().route(&["ST_CATEGORIAS_PESO_CORRIDO", "'MEDIO NO MINERAS'"], frame);
        let flags = Flags::from_pairs(&[(FlagKey::PesosNoMinero(Period::Corrido), true)]);
        let data = fetch_exports(&wh, &pais(), &flags).unwrap();
        let medios = &data.medios_no_minero[&Period::Corrido];
        assert_eq!(medios.first().unwrap().share_prev, Some(Share::Pct(75.0)));
        assert_eq!(medios.first().unwrap().share, Some(Share::Pct(90.0)));
        assert_eq!(medios.last().unwrap().variation, None);
        assert!(wh.queries()[0].contains("ST_CATEGORIAS_PESO_CORRIDO"));
    }

    #[test]
    fn group_investment_sums_countries_and_compares_to_world() {
        let wh = MemoryWarehouse::new()
            .route(&["INVERSION.ST_PAISES_CERRADO", "'IED'", "NOT IN ('TOTAL')"], inversion(&[("PERU", 30.0, 40.0), ("ECUADOR", 10.0, 20.0)]))
            .route(&["INVERSION.ST_PAISES_CERRADO", "'IED'", "SUM(A.SUMA_INVERSION_T)"], inversion(&[("TOTAL", 40.0, 60.0)]))
            .route(&["INVERSION.ST_PAISES_CERRADO", "'IED'", "Total IED del Mundo"], inversion(&[("Total IED del Mundo en Colombia", 400.0, 600.0)]));
        let flags = Flags::from_pairs(&[(FlagKey::Ied(Period::Cerrado), true)]);
        let data = fetch_investment(&wh, &hub(), &flags).unwrap();

        let paises = &data.paises[&(Flow::Ied, Period::Cerrado)];
        let labels: Vec<&str> = paises.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["PERU", "ECUADOR", "TOTAL"]);
        assert_eq!(paises.first().unwrap().share, Some(Share::Pct(40.0 / 60.0 * 100.0)));

        let total = &data.total[&(Flow::Ied, Period::Cerrado)];
        assert_eq!(total.len(), 2);
        assert_eq!(total.first().unwrap().share, Some(Share::Pct(10.0)));
        assert!(!data.paises.contains_key(&(Flow::Ice, Period::Cerrado)));
        assert!(wh.queries()[0].contains("A.UNIDAD IN ('PERU', 'ECUADOR')"));
    }

    #[test]
    fn country_investment_has_no_shares_in_country_table() {
        let wh = MemoryWarehouse::new()
            .route(&["INVERSION.ST_PAISES_CORRIDO", "'ICE'", "NOT IN ('TOTAL')"], inversion(&[("PERU", 3.0, 4.0)]))
            .route(&["INVERSION.ST_PAISES_CORRIDO", "'ICE'", "Total ICE de Colombia"], inversion(&[("Total ICE de Colombia en el Mundo", 30.0, 40.0)]));
        let flags = Flags::from_pairs(&[(FlagKey::Ice(Period::Corrido), true)]);
        let data = fetch_investment(&wh, &pais(), &flags).unwrap();
        let paises = &data.paises[&(Flow::Ice, Period::Corrido)];
        assert_eq!(paises.len(), 1);
        assert_eq!(paises.first().unwrap().share, None);
        let total = &data.total[&(Flow::Ice, Period::Corrido)];
        assert_eq!(total.last().unwrap().label, "Total ICE de Colombia en el Mundo");
        assert_eq!(total.first().unwrap().share, Some(Share::Pct(10.0)));
        assert!(wh.queries()[0].contains("A.DIFERENCIA_PORCENTUAL AS DIFERENCIA_PORCENTUAL"));
    }

    #[test]
    fn colombia_activities_are_unconditional() {
        let wh = MemoryWarehouse::new().route(
            &["ST_ACTIVIDADES_CERRADO"],
            inversion(&[("Industrias manufactureras", 10.0, 30.0), ("Construcción", 10.0, 10.0)]),
        );
        let geo = GeoParams {
            grouping: Some(Grouping::Colombia),
            unidad: vec!["COLOMBIA".into()],
            ..GeoParams::default()
        };
        let data = fetch_investment(&wh, &geo, &Flags::default()).unwrap();
        let cerrado = &data.actividades[&Period::Cerrado];
        assert_eq!(cerrado.last().unwrap().label, "Total");
        assert_relative_eq!(cerrado.last().unwrap().variation.unwrap(), 100.0);
        assert_eq!(cerrado.first().unwrap().share, Some(Share::Pct(75.0)));
        assert!(data.actividades[&Period::Corrido].rows.iter().all(|r| r.share == Some(Share::NotApplicable)));
        assert!(wh.queries()[0].contains("A.DIFERENCIA_PORCENTUAL_T AS DIFERENCIA_PORCENTUAL"));
    }

    #[test]
    fn tourism_dimensions_share_the_country_total() {
        let mut countries = Frame::new(&["PAIS_RESIDENCIA", "SUMA_TURISMO_T_1", "SUMA_TURISMO_T", "DIFERENCIA_PORCENTUAL"]);
        for (i, code) in ["249", "589", "239", "169", "063", "850", "493"].iter().enumerate() {
            countries = countries.with_row(vec![(*code).into(), 10.0.into(), (70.0 - i as f64 * 10.0).into(), 0.0.into()]);
        }
        let genero = Frame::new(&["DESCRIPCION_GENERO", "SUMA_TURISMO_T_1", "SUMA_TURISMO_T", "DIFERENCIA_PORCENTUAL"])
            .with_row(vec!["Femenino".into(), 30.0.into(), 100.0.into(), 0.0.into()])
            .with_row(vec!["Masculino".into(), 40.0.into(), 180.0.into(), 0.0.into()]);
        let geo = GeoParams {
            grouping: Some(Grouping::Colombia),
            unidad: vec!["COLOMBIA".into()],
            ..GeoParams::default()
        };
        let wh = MemoryWarehouse::new()
            .route(&["TURISMO.ST_PAISES_CERRADO", "GROUP BY A.PAIS_RESIDENCIA"], countries)
            .route(&["TURISMO.ST_PAISES_CERRADO", "GROUP BY A.DESCRIPCION_GENERO"], genero);
        let flags = Flags::from_pairs(&[(FlagKey::Turismo(Period::Cerrado), true)]);
        let data = fetch_tourism(&wh, &geo, &flags).unwrap();

        let paises = data.get(Period::Cerrado, TourismDim::Paises).unwrap();
        assert_eq!(paises.len(), 7);
        let total = paises.last().unwrap();
        assert_eq!(total.label, "TOTAL");
        assert_relative_eq!(total.cur, 280.0);
        assert_relative_eq!(paises.row(OTROS).unwrap().cur, 30.0);

        let genero = data.get(Period::Cerrado, TourismDim::Genero).unwrap();
        assert_eq!(genero.len(), 3);
        assert_eq!(genero.first().unwrap().share, Some(Share::Pct(100.0 / 280.0 * 100.0)));
        assert!(data.get(Period::Corrido, TourismDim::Paises).is_none());
        assert!(wh.queries().iter().all(|q| q.contains("AND 1=1")));
        assert_eq!(wh.queries().len(), 5);
    }

    #[test]
    fn opportunity_filters_keep_grouping_asymmetry() {
        let export = opportunity_query(&hub(), Opportunity::Exportacion);
        assert!(!export.contains("COD_PAIS"));
        let turismo = opportunity_query(&hub(), Opportunity::Turismo);
        assert!(turismo.contains("A.COD_PAIS IN ('589', '239')"));
        assert!(turismo.contains("LOWER(A.SECTOR) AS SECTOR"));
        let pais_ied = opportunity_query(&pais(), Opportunity::Inversion);
        assert!(pais_ied.ends_with("A.COD_PAIS IN ('589') ORDER BY 1, 2 ASC"));
    }
}
