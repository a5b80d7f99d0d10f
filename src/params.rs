// Report parameters: grouping kind, user filters, the resolved geography
// code lists and the reporting periods stored in `PARAMETROS.PARAMETROS`.
use crate::error::{ReportError, Result};
use crate::util::{parse_i32_safe, year_prefix};
use crate::warehouse::{sql_list, Frame, Warehouse};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PAIS_NO_INCLUIDO: &str = "PAÍS NO INCLUIDO";
pub const DEFAULT_UMBRAL: f64 = 10000.0;

/// Geographic slice a report is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grouping {
    Colombia,
    Continentes,
    Hubs,
    Tlcs,
    Paises,
    Departamentos,
}

impl Grouping {
    pub const ALL: [Grouping; 6] = [
        Grouping::Colombia,
        Grouping::Continentes,
        Grouping::Hubs,
        Grouping::Tlcs,
        Grouping::Paises,
        Grouping::Departamentos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grouping::Colombia => "COLOMBIA",
            Grouping::Continentes => "CONTINENTES",
            Grouping::Hubs => "HUBS",
            Grouping::Tlcs => "TLCS",
            Grouping::Paises => "PAISES",
            Grouping::Departamentos => "DEPARTAMENTOS",
        }
    }

    /// Continents, HUBs and FTAs aggregate several countries.
    pub fn is_group(&self) -> bool {
        matches!(self, Grouping::Continentes | Grouping::Hubs | Grouping::Tlcs)
    }

    /// Investment sections exist for country-based slices only.
    pub fn has_country_investment(&self) -> bool {
        self.is_group() || *self == Grouping::Paises
    }

    /// Column of `PAISES_CORRELATIVA` that names the group.
    pub fn group_column(&self) -> Option<&'static str> {
        match self {
            Grouping::Continentes => Some("CONTINENTE_DANE_DIAN_EXPORTACIONES"),
            Grouping::Hubs => Some("HUB__C_EXPORTACIONES"),
            Grouping::Tlcs => Some("TLCS_EXPORTACIONES"),
            _ => None,
        }
    }

    /// Subject used by the "no registra datos" sentences.
    pub fn subject(&self) -> &'static str {
        match self {
            Grouping::Colombia => "Colombia",
            Grouping::Continentes => "El continente",
            Grouping::Hubs => "El HUB",
            Grouping::Tlcs => "El TLC",
            Grouping::Paises => "El país",
            Grouping::Departamentos => "El departamento",
        }
    }

    /// Noun used in audit event details.
    pub fn noun(&self) -> &'static str {
        match self {
            Grouping::Colombia => "Colombia",
            Grouping::Continentes => "continente",
            Grouping::Hubs => "HUB",
            Grouping::Tlcs => "TLC",
            Grouping::Paises => "país",
            Grouping::Departamentos => "departamento",
        }
    }

    /// Word used in the document title ("TRES EJES PAÍSES: ...").
    pub fn title_word(&self) -> &'static str {
        match self {
            Grouping::Colombia => "COLOMBIA",
            Grouping::Continentes => "CONTINENTES",
            Grouping::Hubs => "HUBS",
            Grouping::Tlcs => "TLCS",
            Grouping::Paises => "PAÍSES",
            Grouping::Departamentos => "DEPARTAMENTOS",
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grouping {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        Grouping::ALL
            .into_iter()
            .find(|g| g.as_str() == upper)
            .ok_or(ReportError::UnknownGrouping(s.to_string()))
    }
}

/// Closed calendar year versus year-to-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Period {
    Cerrado,
    Corrido,
}

impl Period {
    pub const BOTH: [Period; 2] = [Period::Cerrado, Period::Corrido];

    /// Table-name and sheet-name suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Period::Cerrado => "CERRADO",
            Period::Corrido => "CORRIDO",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Period::Cerrado => "cerrado",
            Period::Corrido => "corrido",
        }
    }
}

/// What the user asked for: a grouping plus optional filter lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub grouping: Grouping,
    pub continentes: Option<Vec<String>>,
    pub paises: Option<Vec<String>>,
    pub hubs: Option<Vec<String>>,
    pub tlcs: Option<Vec<String>>,
    pub departamentos: Option<Vec<String>>,
    pub umbral: Option<Vec<f64>>,
}

impl ReportRequest {
    pub fn new(grouping: Grouping) -> Self {
        ReportRequest {
            grouping,
            continentes: None,
            paises: None,
            hubs: None,
            tlcs: None,
            departamentos: None,
            umbral: None,
        }
    }

    /// Request for a single selected unit, placed in the filter list that
    /// matches the grouping.
    pub fn for_unit(grouping: Grouping, unit: Option<&str>) -> Self {
        let mut req = ReportRequest::new(grouping);
        let list = unit.map(|u| vec![u.to_string()]);
        match grouping {
            Grouping::Colombia => {}
            Grouping::Continentes => req.continentes = list,
            Grouping::Hubs => req.hubs = list,
            Grouping::Tlcs => req.tlcs = list,
            Grouping::Paises => req.paises = list,
            Grouping::Departamentos => req.departamentos = list,
        }
        req
    }

    /// Parse a JSON request. Filters must be arrays of strings or null.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let grouping = value
            .get("agrupacion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ReportError::UnknownGrouping(value.get("agrupacion").map(|v| v.to_string()).unwrap_or_default()))?
            .parse::<Grouping>()?;

        fn list(value: &serde_json::Value, key: &str) -> Result<Option<Vec<String>>> {
            match value.get(key) {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .map(|i| i.as_str().map(str::to_string).ok_or(ReportError::InvalidParameters))
                    .collect::<Result<Vec<_>>>()
                    .map(Some),
                Some(_) => Err(ReportError::InvalidParameters),
            }
        }

        let umbral = match value.get("umbral") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .map(|i| i.as_f64().ok_or(ReportError::InvalidParameters))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(_) => return Err(ReportError::InvalidParameters),
        };

        Ok(ReportRequest {
            grouping,
            continentes: list(value, "continentes")?,
            paises: list(value, "paises")?,
            hubs: list(value, "hubs")?,
            tlcs: list(value, "tlcs")?,
            departamentos: list(value, "departamentos")?,
            umbral,
        })
    }

    /// First selected unit across the filter lists, in grouping priority.
    pub fn entity_name(&self) -> Option<&str> {
        [&self.continentes, &self.paises, &self.hubs, &self.tlcs, &self.departamentos]
            .into_iter()
            .flatten()
            .flat_map(|l| l.first())
            .map(String::as_str)
            .next()
    }

    pub fn umbral_value(&self) -> f64 {
        self.umbral
            .as_ref()
            .and_then(|u| u.first().copied())
            .unwrap_or(DEFAULT_UMBRAL)
    }

    /// Stable key for the request cache.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Code lists and labels derived for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoParams {
    pub grouping: Option<Grouping>,
    pub unidad: Vec<String>,
    pub paises_inversion: Vec<String>,
    pub paises_turismo_cod: Vec<String>,
    pub paises_turismo: Vec<String>,
    /// Display names of the selected countries (PAISES only).
    pub nombre_pais: Vec<String>,
    /// Comma-separated country names for the annex (groups only).
    pub paises_anexo: String,
    /// DIAN department codes (DEPARTAMENTOS only).
    pub unidad_cod: Vec<String>,
    pub municipio_turismo_cod: Vec<String>,
    pub municipio_turismo: Vec<String>,
    pub umbral: f64,
}

impl GeoParams {
    pub fn grouping(&self) -> Grouping {
        self.grouping.unwrap_or(Grouping::Colombia)
    }

    /// Value used in every `UNIDAD = ...` filter.
    pub fn unit(&self) -> &str {
        self.unidad.first().map(String::as_str).unwrap_or("")
    }

    /// Name shown in narrative sentences.
    pub fn display_name(&self) -> String {
        match self.grouping() {
            Grouping::Colombia => "Colombia".to_string(),
            Grouping::Paises => self
                .nombre_pais
                .first()
                .cloned()
                .unwrap_or_else(|| self.unit().to_string()),
            _ => self.unit().to_string(),
        }
    }

    /// Tourism figures exclude Venezuelan residents whenever Venezuela
    /// (code 850) is part of the slice; national and department reports
    /// always include it.
    pub fn includes_venezuela(&self) -> bool {
        matches!(self.grouping(), Grouping::Colombia | Grouping::Departamentos)
            || self.paises_turismo_cod.iter().any(|c| c == "850")
    }
}

/// Resolve the code lists for `req`.
pub fn resolve(wh: &dyn Warehouse, req: &ReportRequest) -> Result<GeoParams> {
    let grouping = req.grouping;
    let umbral = req.umbral_value();

    if grouping == Grouping::Colombia {
        return Ok(GeoParams {
            grouping: Some(grouping),
            unidad: vec!["COLOMBIA".to_string()],
            umbral,
            ..GeoParams::default()
        });
    }

    if grouping == Grouping::Departamentos {
        return resolve_departamentos(wh, req, umbral);
    }

    let data = wh.query(&country_query(req))?;
    let mut geo = GeoParams {
        grouping: Some(grouping),
        umbral,
        ..GeoParams::default()
    };

    if grouping == Grouping::Paises && data.is_empty() {
        let sentinel = vec![PAIS_NO_INCLUIDO.to_string()];
        geo.unidad = sentinel.clone();
        geo.paises_inversion = sentinel.clone();
        geo.paises_turismo_cod = sentinel.clone();
        geo.paises_turismo = sentinel.clone();
        geo.nombre_pais = sentinel;
        info!("País sin correlativa, se usa '{}'", PAIS_NO_INCLUIDO);
        return Ok(geo);
    }

    geo.paises_inversion = data.unique("PAIS_INVERSION_BANREP")?;
    geo.paises_turismo_cod = data.unique("PAIS_CODIGO_TURISMO")?;
    geo.paises_turismo = data.unique("NOMBRE_PAIS_CODIGO_TURISMO")?;

    if let Some(column) = grouping.group_column() {
        geo.unidad = data.unique(column)?;
        geo.paises_anexo = data.unique("COUNTRY_OR_AREA_UNSD")?.join(", ");
    } else {
        geo.unidad = data.unique("PAIS_LLAVE_EXPORTACIONES")?;
        geo.nombre_pais = data.unique("COUNTRY_OR_AREA_UNSD")?;
    }

    if geo.unidad.is_empty() {
        if let Some(name) = req.entity_name() {
            geo.unidad = vec![name.to_string()];
        }
    }
    Ok(geo)
}

fn country_query(req: &ReportRequest) -> String {
    let mut query = String::from(
        "SELECT A.PAIS_LLAVE_EXPORTACIONES,
            A.CONTINENTE_DANE_DIAN_EXPORTACIONES,
            A.OFICINA_COMERCIAL_EXPORTACIONES,
            A.HUB__C_EXPORTACIONES,
            A.TIPO_ACUERDO_EXPORTACIONES,
            A.TLCS_EXPORTACIONES,
            A.PAIS_INVERSION_BANREP,
            A.PAIS_CODIGO_TURISMO,
            A.NOMBRE_PAIS_CODIGO_TURISMO,
            A.COUNTRY_OR_AREA_UNSD
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.PAIS_LLAVE_EXPORTACIONES IS NOT NULL",
    );
    let filters = [
        ("A.CONTINENTE_DANE_DIAN_EXPORTACIONES", &req.continentes),
        ("A.COUNTRY_OR_AREA_UNSD", &req.paises),
        ("A.HUB__C_EXPORTACIONES", &req.hubs),
        ("A.TLCS_EXPORTACIONES", &req.tlcs),
    ];
    for (column, values) in filters {
        if let Some(values) = values.as_ref().filter(|v| !v.is_empty()) {
            query.push_str(&format!(" AND {} IN ({})", column, sql_list(values)));
        }
    }
    query
}

fn resolve_departamentos(wh: &dyn Warehouse, req: &ReportRequest, umbral: f64) -> Result<GeoParams> {
    let selected = req.departamentos.clone().unwrap_or_default();
    let data = wh.query(&format!(
        "SELECT A.COD_DIAN_DEPARTAMENTO,
            A.DEPARTAMENTO_DIAN
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.DIAN_DEPARTAMENTOS AS A
        WHERE A.DEPARTAMENTO_DIAN IN ({})",
        sql_list(&selected)
    ))?;
    let mut unidad = data.unique("DEPARTAMENTO_DIAN")?;
    let unidad_cod = data.unique("COD_DIAN_DEPARTAMENTO")?;
    if unidad.is_empty() {
        unidad = selected;
    }

    let municipios = wh.query(&format!(
        "SELECT A.COD_DANE_DEPARTAMENTO,
            A.DEPARTAMENTO_DANE,
            A.COD_DANE_MUNICIPIO,
            A.MUNICIPIO_DANE
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.DIVIPOLA_DEPARTAMENTOS_MUNICIPIOS AS A
        WHERE A.COD_DANE_DEPARTAMENTO IN ({})",
        sql_list(&unidad_cod)
    ))?;

    Ok(GeoParams {
        grouping: Some(Grouping::Departamentos),
        unidad,
        unidad_cod,
        municipio_turismo_cod: municipios.unique("COD_DANE_MUNICIPIO")?,
        municipio_turismo: municipios.unique("MUNICIPIO_DANE")?,
        umbral,
        ..GeoParams::default()
    })
}

/// Previous and current period labels, e.g. `("2022", "2023")`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodPair {
    pub t_1: String,
    pub t: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportPeriods {
    pub cerrado: PeriodPair,
    pub corrido: PeriodPair,
    /// Last month of the year-to-date window, as text ("marzo").
    pub mes_t: String,
    pub t_1_year: String,
    pub t_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvestmentPeriods {
    pub cerrado: PeriodPair,
    /// Quarters in `YYYY-Q` form.
    pub corrido: PeriodPair,
    pub t_1_trimester_name: String,
    pub t_trimester_name: String,
    pub t_1_year: String,
    pub t_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TourismPeriods {
    pub cerrado: PeriodPair,
    pub corrido: PeriodPair,
    pub month: i32,
    pub month_abbr: String,
    pub month_full: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Periods {
    pub export: ExportPeriods,
    pub investment: InvestmentPeriods,
    pub tourism: TourismPeriods,
}

/// Values printed on the cover and in the companies section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentParams {
    pub fecha_actualizacion: String,
    pub anio_cerrado: String,
    pub anio_corrido_texto: String,
}

const MESES_ABREVIADOS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

const MESES: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre", "Octubre",
    "Noviembre", "Diciembre",
];

/// Spanish ordinal used for a `YYYY-Q` quarter ("2024-2" gives "segundo").
pub fn trimester_name(year_quarter: &str) -> &'static str {
    match year_quarter.rsplit('-').next().map(str::trim) {
        Some("1") => "primer",
        Some("2") => "segundo",
        Some("3") => "tercer",
        Some("4") => "cuarto",
        _ => "",
    }
}

fn quarter_year(year_quarter: &str) -> String {
    year_quarter.split('-').next().unwrap_or("").trim().to_string()
}

/// `PARAMETRO -> VALOR` rows of one axis.
fn parameter_rows(wh: &dyn Warehouse, eje_filter: &str) -> Result<Vec<(String, String)>> {
    let data: Frame = wh.query(&format!(
        "SELECT B.PARAMETRO, B.VALOR
        FROM DOCUMENTOS_COLOMBIA.PARAMETROS.PARAMETROS AS B
        WHERE B.EJE IN ({});",
        eje_filter
    ))?;
    data.lookup("PARAMETRO", "VALOR")
}

fn pick(rows: &[(String, String)], name: &str) -> String {
    rows.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

pub fn export_periods(wh: &dyn Warehouse) -> Result<ExportPeriods> {
    let rows = parameter_rows(wh, "'Exportaciones'")?;
    let corrido = PeriodPair {
        t_1: pick(&rows, "Año corrido (T-1)"),
        t: pick(&rows, "Año corrido (T)"),
    };
    Ok(ExportPeriods {
        cerrado: PeriodPair {
            t_1: pick(&rows, "Año cerrado (T-1)"),
            t: pick(&rows, "Año cerrado (T)"),
        },
        mes_t: pick(&rows, "Mes corrido texto (T)"),
        t_1_year: year_prefix(&corrido.t_1),
        t_year: year_prefix(&corrido.t),
        corrido,
    })
}

pub fn investment_periods(wh: &dyn Warehouse) -> Result<InvestmentPeriods> {
    let rows = parameter_rows(wh, "'Inversión'")?;
    let corrido = PeriodPair {
        t_1: pick(&rows, "Año corrido (T-1)"),
        t: pick(&rows, "Año corrido (T)"),
    };
    Ok(InvestmentPeriods {
        cerrado: PeriodPair {
            t_1: pick(&rows, "Año cerrado (T-1)"),
            t: pick(&rows, "Año cerrado (T)"),
        },
        t_1_trimester_name: trimester_name(&corrido.t_1).to_string(),
        t_trimester_name: trimester_name(&corrido.t).to_string(),
        t_1_year: quarter_year(&corrido.t_1),
        t_year: quarter_year(&corrido.t),
        corrido,
    })
}

pub fn tourism_periods(wh: &dyn Warehouse) -> Result<TourismPeriods> {
    let rows = parameter_rows(wh, "'Turismo'")?;
    let raw = pick(&rows, "Mes corrido");
    let month = parse_i32_safe(Some(&raw))
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ReportError::Warehouse(format!("parámetro 'Mes corrido' no válido: '{raw}'")))?;
    let idx = (month - 1) as usize;
    Ok(TourismPeriods {
        cerrado: PeriodPair {
            t_1: pick(&rows, "Año cerrado (T-1)"),
            t: pick(&rows, "Año cerrado (T)"),
        },
        corrido: PeriodPair {
            t_1: pick(&rows, "Año corrido (T-1)"),
            t: pick(&rows, "Año corrido (T)"),
        },
        month,
        month_abbr: MESES_ABREVIADOS[idx].to_string(),
        month_full: MESES[idx].to_string(),
    })
}

pub fn load_periods(wh: &dyn Warehouse) -> Result<Periods> {
    Ok(Periods {
        export: export_periods(wh)?,
        investment: investment_periods(wh)?,
        tourism: tourism_periods(wh)?,
    })
}

pub fn document_params(wh: &dyn Warehouse) -> Result<DocumentParams> {
    let rows = parameter_rows(wh, "'Transversal', 'Exportaciones'")?;
    Ok(DocumentParams {
        fecha_actualizacion: pick(&rows, "Fecha de actualización"),
        anio_cerrado: pick(&rows, "Año cerrado (T)"),
        anio_corrido_texto: pick(&rows, "Año corrido texto (T)"),
    })
}

fn sorted_distinct(wh: &dyn Warehouse, sql: &str, column: &str) -> Result<Vec<String>> {
    let mut options = wh.query(sql)?.unique(column)?;
    options.sort();
    Ok(options)
}

pub fn selector_continentes(wh: &dyn Warehouse) -> Result<Vec<String>> {
    sorted_distinct(
        wh,
        "SELECT DISTINCT A.CONTINENTE_DANE_DIAN_EXPORTACIONES
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.CONTINENTE_DANE_DIAN_EXPORTACIONES NOT IN ('NO ENCONTRADO EN BASE DE EXPORTACIONES')
            AND A.CONTINENTE_DANE_DIAN_EXPORTACIONES IS NOT NULL
            AND A.CONTINENTE_DANE_DIAN_EXPORTACIONES NOT IN ('No Declarados')
        ORDER BY 1 ASC;",
        "CONTINENTE_DANE_DIAN_EXPORTACIONES",
    )
}

pub fn selector_tlcs(wh: &dyn Warehouse) -> Result<Vec<String>> {
    sorted_distinct(
        wh,
        "SELECT DISTINCT A.TLCS_EXPORTACIONES
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.TLCS_EXPORTACIONES IS NOT NULL
            AND A.TLCS_EXPORTACIONES NOT IN ('No Declarados', 'NO ENCONTRADO EN BASE DE EXPORTACIONES')
        ORDER BY 1 ASC;",
        "TLCS_EXPORTACIONES",
    )
}

pub fn selector_hubs(wh: &dyn Warehouse) -> Result<Vec<String>> {
    sorted_distinct(
        wh,
        "SELECT DISTINCT A.HUB__C_EXPORTACIONES
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.HUB__C_EXPORTACIONES NOT IN ('NO ENCONTRADO EN BASE DE EXPORTACIONES', 'Colombia')
            AND A.HUB__C_EXPORTACIONES IS NOT NULL
        ORDER BY 1 ASC;",
        "HUB__C_EXPORTACIONES",
    )
}

/// UNSD regions used to narrow the country selector.
pub fn selector_regiones(wh: &dyn Warehouse) -> Result<Vec<String>> {
    sorted_distinct(
        wh,
        "SELECT DISTINCT A.REGION_NAME_UNSD
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.REGION_NAME_UNSD IS NOT NULL
            AND A.REGION_NAME_UNSD NOT IN ('Antártida')
        ORDER BY 1 ASC;",
        "REGION_NAME_UNSD",
    )
}

pub fn selector_paises(wh: &dyn Warehouse, region: Option<&str>) -> Result<Vec<String>> {
    let mut sql = String::from(
        "SELECT DISTINCT A.COUNTRY_OR_AREA_UNSD
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.PAISES_CORRELATIVA AS A
        WHERE A.COUNTRY_OR_AREA_UNSD IS NOT NULL",
    );
    if let Some(region) = region {
        sql.push_str(&format!(" AND A.REGION_NAME_UNSD IN ({})", sql_list(&[region])));
    }
    sorted_distinct(wh, &sql, "COUNTRY_OR_AREA_UNSD")
}

pub fn selector_departamentos(wh: &dyn Warehouse) -> Result<Vec<String>> {
    sorted_distinct(
        wh,
        "SELECT DISTINCT A.DEPARTAMENTO_DIAN
        FROM DOCUMENTOS_COLOMBIA.GEOGRAFIA.DIAN_DEPARTAMENTOS AS A
        WHERE A.DEPARTAMENTO_DIAN NOT IN ('Desconocido', 'Sin especificar')
        ORDER BY 1 ASC;",
        "DEPARTAMENTO_DIAN",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{MemoryWarehouse, Value};
    use serde_json::json;

    fn correlativa() -> Frame {
        let cols = [
            "PAIS_LLAVE_EXPORTACIONES",
            "CONTINENTE_DANE_DIAN_EXPORTACIONES",
            "HUB__C_EXPORTACIONES",
            "TLCS_EXPORTACIONES",
            "PAIS_INVERSION_BANREP",
            "PAIS_CODIGO_TURISMO",
            "NOMBRE_PAIS_CODIGO_TURISMO",
            "COUNTRY_OR_AREA_UNSD",
        ];
        Frame::new(&cols)
            .with_row(vec![
                "PER".into(), "América del Sur".into(), "Andino".into(), "CAN".into(),
                "PERU".into(), "589".into(), "PERÚ".into(), "Perú".into(),
            ])
            .with_row(vec![
                "VEN".into(), "América del Sur".into(), "Andino".into(), Value::Null,
                "VENEZUELA".into(), "850".into(), "VENEZUELA".into(), "Venezuela".into(),
            ])
    }

    #[test]
    fn grouping_parses_case_insensitively() {
        assert_eq!("paises".parse::<Grouping>().unwrap(), Grouping::Paises);
        assert!(matches!("MUNDO".parse::<Grouping>(), Err(ReportError::UnknownGrouping(_))));
    }

    #[test]
    fn json_filters_must_be_lists_or_null() {
        let ok = ReportRequest::from_json(&json!({"agrupacion": "HUBS", "hubs": ["Andino"], "paises": null})).unwrap();
        assert_eq!(ok.hubs, Some(vec!["Andino".to_string()]));
        assert_eq!(ok.paises, None);
        let bad = ReportRequest::from_json(&json!({"agrupacion": "HUBS", "hubs": "Andino"}));
        assert!(matches!(bad, Err(ReportError::InvalidParameters)));
        let bad_umbral = ReportRequest::from_json(&json!({"agrupacion": "COLOMBIA", "umbral": 10000}));
        assert!(matches!(bad_umbral, Err(ReportError::InvalidParameters)));
        let unknown = ReportRequest::from_json(&json!({"agrupacion": "MUNDO"}));
        assert!(matches!(unknown, Err(ReportError::UnknownGrouping(_))));
    }

    #[test]
    fn colombia_needs_no_queries() {
        let wh = MemoryWarehouse::new();
        let geo = resolve(&wh, &ReportRequest::new(Grouping::Colombia)).unwrap();
        assert_eq!(geo.unidad, vec!["COLOMBIA"]);
        assert_eq!(geo.umbral, DEFAULT_UMBRAL);
        assert!(wh.queries().is_empty());
        assert_eq!(geo.display_name(), "Colombia");
    }

    #[test]
    fn group_collects_codes_and_annex() {
        let wh = MemoryWarehouse::new().route(&["PAISES_CORRELATIVA"], correlativa());
        let req = ReportRequest::for_unit(Grouping::Continentes, Some("América del Sur"));
        let geo = resolve(&wh, &req).unwrap();
        assert_eq!(geo.unidad, vec!["América del Sur"]);
        assert_eq!(geo.paises_turismo_cod, vec!["589", "850"]);
        assert_eq!(geo.paises_anexo, "Perú, Venezuela");
        assert!(geo.includes_venezuela());
        assert!(wh.queries()[0].contains("CONTINENTE_DANE_DIAN_EXPORTACIONES IN ('América del Sur')"));
    }

    #[test]
    fn unknown_country_uses_sentinel() {
        let wh = MemoryWarehouse::new();
        let req = ReportRequest::for_unit(Grouping::Paises, Some("Atlántida"));
        let geo = resolve(&wh, &req).unwrap();
        for list in [&geo.unidad, &geo.paises_inversion, &geo.paises_turismo_cod, &geo.paises_turismo, &geo.nombre_pais] {
            assert_eq!(list, &vec![PAIS_NO_INCLUIDO.to_string()]);
        }
    }

    #[test]
    fn departments_resolve_municipalities() {
        let wh = MemoryWarehouse::new()
            .route(
                &["DIAN_DEPARTAMENTOS"],
                Frame::new(&["COD_DIAN_DEPARTAMENTO", "DEPARTAMENTO_DIAN"]).with_row(vec![Value::Number(5.0), "Antioquia".into()]),
            )
            .route(
                &["DIVIPOLA_DEPARTAMENTOS_MUNICIPIOS"],
                Frame::new(&["COD_DANE_MUNICIPIO", "MUNICIPIO_DANE"])
                    .with_row(vec!["05001".into(), "Medellín".into()])
                    .with_row(vec!["05088".into(), "Bello".into()]),
            );
        let geo = resolve(&wh, &ReportRequest::for_unit(Grouping::Departamentos, Some("Antioquia"))).unwrap();
        assert_eq!(geo.unidad_cod, vec!["5"]);
        assert_eq!(geo.municipio_turismo, vec!["Medellín", "Bello"]);
        assert!(wh.queries()[1].contains("COD_DANE_DEPARTAMENTO IN ('5')"));
    }

    #[test]
    fn periods_from_parameter_table() {
        let params = Frame::new(&["PARAMETRO", "VALOR"])
            .with_row(vec!["Año cerrado (T-1)".into(), "2022".into()])
            .with_row(vec!["Año cerrado (T)".into(), "2023".into()])
            .with_row(vec!["Año corrido (T-1)".into(), "2024-1".into()])
            .with_row(vec!["Año corrido (T)".into(), "2025-3".into()])
            .with_row(vec!["Mes corrido".into(), "4".into()]);
        let wh = MemoryWarehouse::new().route(&["PARAMETROS.PARAMETROS"], params);
        let inv = investment_periods(&wh).unwrap();
        assert_eq!(inv.t_trimester_name, "tercer");
        assert_eq!(inv.t_1_year, "2024");
        let tur = tourism_periods(&wh).unwrap();
        assert_eq!((tur.month_abbr.as_str(), tur.month_full.as_str()), ("Abr", "Abril"));
    }

    #[test]
    fn invalid_month_is_reported() {
        let wh = MemoryWarehouse::new();
        assert!(tourism_periods(&wh).is_err());
    }

    #[test]
    fn entity_name_follows_filter_priority() {
        let mut req = ReportRequest::new(Grouping::Tlcs);
        req.tlcs = Some(vec!["CAN".into()]);
        assert_eq!(req.entity_name(), Some("CAN"));
        assert_eq!(ReportRequest::new(Grouping::Colombia).entity_name(), None);
    }
}
