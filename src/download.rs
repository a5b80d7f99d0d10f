// Top-level generator: parameters, data, documents, audit trail and the
// base64 payloads handed to the download surface.
use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::params::{self, Grouping, ReportRequest};
use crate::process::{self, ProcessedReport};
use crate::report;
use crate::verify;
use crate::warehouse::{sql_str, Warehouse, CATALOG};
use crate::{excel, word};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{FixedOffset, Utc};
use clap::ValueEnum;
use log::{error, info};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Which files a generation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Docx,
    Xlsx,
    Both,
}

impl Format {
    fn word(&self) -> bool {
        matches!(self, Format::Docx | Format::Both)
    }

    fn excel(&self) -> bool {
        matches!(self, Format::Xlsx | Format::Both)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedReport {
    pub docx_b64: Option<String>,
    pub xlsx_b64: Option<String>,
    pub docx_name: String,
    pub xlsx_name: String,
    pub written: Vec<PathBuf>,
}

/// Processed reports of the current grouping, keyed by the full request.
#[derive(Default)]
pub struct ReportCache {
    grouping: Option<Grouping>,
    entries: HashMap<String, ProcessedReport>,
}

impl ReportCache {
    pub fn get(&mut self, req: &ReportRequest) -> Option<ProcessedReport> {
        if self.grouping != Some(req.grouping) {
            self.entries.clear();
            self.grouping = Some(req.grouping);
            return None;
        }
        self.entries.get(&req.cache_key()).cloned()
    }

    pub fn insert(&mut self, req: &ReportRequest, report: ProcessedReport) {
        self.grouping = Some(req.grouping);
        self.entries.insert(req.cache_key(), report);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static CACHE: Lazy<Mutex<ReportCache>> = Lazy::new(|| Mutex::new(ReportCache::default()));

/// Noun used in audit details.
fn audit_noun(grouping: Grouping) -> &'static str {
    match grouping {
        Grouping::Colombia => "Colombia",
        other => other.noun(),
    }
}

pub fn file_stem(req: &ReportRequest) -> String {
    match (req.grouping, req.entity_name()) {
        (Grouping::Colombia, _) | (_, None) => "Tres Ejes Colombia".to_string(),
        (g, Some(entity)) => format!("Tres Ejes {} - {}", g.as_str(), entity),
    }
}

/// Record an event in the tracking table. Failures are logged only.
pub fn record_event(wh: &dyn Warehouse, config: &Config, tipo: &str, detalle: &str, unidad: &str) {
    let Some(offset) = FixedOffset::east_opt(config.utc_offset_hours * 3600) else {
        error!("Error al registrar evento: desfase horario inválido {}", config.utc_offset_hours);
        return;
    };
    let fecha = Utc::now().with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string();
    let sql = format!(
        "INSERT INTO {CATALOG}.SEGUIMIENTO.SEGUIMIENTO_EVENTOS (TIPO_EVENTO, DETALLE_EVENTO, UNIDAD, FECHA_HORA)
        VALUES ({}, {}, {}, {});",
        sql_str(tipo),
        sql_str(detalle),
        sql_str(unidad),
        sql_str(&fecha)
    );
    if let Err(e) = wh.execute(&sql) {
        error!("Error al registrar evento: {}", e);
    }
}

/// Use the configured threshold when the request carries none.
pub fn with_default_umbral(req: &ReportRequest, config: &Config) -> ReportRequest {
    let mut req = req.clone();
    if req.umbral.is_none() {
        req.umbral = Some(config.umbral.clone());
    }
    req
}

/// Processed report for `req` and whether it was built by this call.
fn processed(wh: &dyn Warehouse, cache: &Mutex<ReportCache>, req: &ReportRequest) -> Result<(ProcessedReport, bool)> {
    if let Some(hit) = cache.lock().unwrap_or_else(|e| e.into_inner()).get(req) {
        info!("Reutilizando datos en caché para {}", req.grouping);
        return Ok((hit, false));
    }
    let geo = params::resolve(wh, req)?;
    info!("5% - Parámetros identificados correctamente.");
    let flags = verify::verify(wh, &geo);
    let report = process::process(wh, geo, flags)?;
    cache.lock().unwrap_or_else(|e| e.into_inner()).insert(req, report.clone());
    Ok((report, true))
}

fn run(
    wh: &dyn Warehouse,
    config: &Config,
    cache: &Mutex<ReportCache>,
    req: &ReportRequest,
    format: Format,
) -> Result<GeneratedReport> {
    let req = with_default_umbral(req, config);
    let (report, fresh) = processed(wh, cache, &req)?;
    info!("50% - Datos extraidos y transformados correctamente.");

    let stem = file_stem(&req);
    let noun = audit_noun(req.grouping);
    let unidad = report.geo.display_name();
    let mut out = GeneratedReport {
        docx_name: format!("{stem}.docx"),
        xlsx_name: format!("{stem}.xlsx"),
        ..GeneratedReport::default()
    };
    std::fs::create_dir_all(&config.output_dir)?;

    if format.word() {
        let doc = report::build_document(&report);
        let bytes = word::render(&doc, &word::Assets::load(config))?;
        info!("75% - Documento creado con exito.");
        let path = config.output_dir.join(&out.docx_name);
        std::fs::write(&path, &bytes)?;
        out.written.push(path);
        out.docx_b64 = Some(STANDARD.encode(&bytes));
    }
    if fresh {
        record_event(wh, config, "Selección", &format!("Selección de {noun}"), &unidad);
    }

    if format.excel() {
        let bytes = excel::render(&report)?;
        let path = config.output_dir.join(&out.xlsx_name);
        std::fs::write(&path, &bytes)?;
        out.written.push(path);
        out.xlsx_b64 = Some(STANDARD.encode(&bytes));
    }

    if out.docx_b64.is_some() {
        record_event(wh, config, "Descarga", &format!("Descarga Word de {noun}"), &unidad);
    }
    if out.xlsx_b64.is_some() {
        record_event(wh, config, "Descarga", &format!("Descarga Excel de {noun}"), &unidad);
    }
    info!("100% - Proceso terminado");
    Ok(out)
}

/// Run the whole pipeline against `cache`. Any failure is reported as a
/// generation error.
pub fn generate_with(
    wh: &dyn Warehouse,
    config: &Config,
    cache: &Mutex<ReportCache>,
    req: &ReportRequest,
    format: Format,
) -> Result<GeneratedReport> {
    run(wh, config, cache, req, format).map_err(|e| match e {
        ReportError::Generation(_) => e,
        other => ReportError::Generation(other.to_string()),
    })
}

/// Run the whole pipeline with the process-wide cache.
pub fn generate(wh: &dyn Warehouse, config: &Config, req: &ReportRequest, format: Format) -> Result<GeneratedReport> {
    generate_with(wh, config, &CACHE, req, format)
}

/// Selector kinds offered by `options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Selector {
    Continentes,
    Tlcs,
    Hubs,
    Regiones,
    Paises,
    Departamentos,
}

pub fn options(wh: &dyn Warehouse, kind: Selector, region: Option<&str>) -> Result<Vec<String>> {
    match kind {
        Selector::Continentes => params::selector_continentes(wh),
        Selector::Tlcs => params::selector_tlcs(wh),
        Selector::Hubs => params::selector_hubs(wh),
        Selector::Regiones => params::selector_regiones(wh),
        Selector::Paises => params::selector_paises(wh, region),
        Selector::Departamentos => params::selector_departamentos(wh),
    }
}
