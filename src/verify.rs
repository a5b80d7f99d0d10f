// Presence verification: one probe query per data category decides which
// report sections are rendered.
//
// A probe that fails is indistinguishable from one that returns no rows.
// Both read as "SIN DATOS" and the section falls back to its "no registra
// datos" sentence.
use crate::params::{GeoParams, Grouping, Period};
use crate::warehouse::{sql_list, Warehouse};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FlagKey {
    ExportTotals(Period),
    ExportNme(Period),
    Conteo(Period),
    Empresas(Period),
    Ied(Period),
    Ice(Period),
    Turismo(Period),
    Conectividad,
    OportunidadesExportacion,
    OportunidadesInversion,
    OportunidadesTurismo,
    PesosMinero(Period),
    PesosNoMinero(Period),
}

impl FlagKey {
    pub fn all() -> Vec<FlagKey> {
        let mut keys = Vec::new();
        for p in Period::BOTH {
            keys.extend([FlagKey::ExportTotals(p), FlagKey::ExportNme(p), FlagKey::Conteo(p), FlagKey::Empresas(p)]);
        }
        for p in Period::BOTH {
            keys.extend([FlagKey::Ied(p), FlagKey::Ice(p)]);
        }
        keys.extend(Period::BOTH.map(FlagKey::Turismo));
        keys.extend([
            FlagKey::Conectividad,
            FlagKey::OportunidadesExportacion,
            FlagKey::OportunidadesInversion,
            FlagKey::OportunidadesTurismo,
        ]);
        for p in Period::BOTH {
            keys.extend([FlagKey::PesosMinero(p), FlagKey::PesosNoMinero(p)]);
        }
        keys
    }

    /// Machine name, e.g. `exportaciones_totales_cerrado`.
    pub fn name(&self) -> String {
        match self {
            FlagKey::ExportTotals(p) => format!("exportaciones_totales_{}", p.key()),
            FlagKey::ExportNme(p) => format!("exportaciones_nme_{}", p.key()),
            FlagKey::Conteo(p) => format!("exportaciones_conteo_{}", p.key()),
            FlagKey::Empresas(p) => format!("exportaciones_empresas_{}", p.key()),
            FlagKey::Ied(p) => format!("ied_{}", p.key()),
            FlagKey::Ice(p) => format!("ice_{}", p.key()),
            FlagKey::Turismo(p) => format!("turismo_{}", p.key()),
            FlagKey::Conectividad => "conectividad".to_string(),
            FlagKey::OportunidadesExportacion => "oportunidades_exportacion".to_string(),
            FlagKey::OportunidadesInversion => "oportunidades_inversion".to_string(),
            FlagKey::OportunidadesTurismo => "oportunidades_turismo".to_string(),
            FlagKey::PesosMinero(p) => format!("pesos_minero_{}", p.key()),
            FlagKey::PesosNoMinero(p) => format!("pesos_no_minero_{}", p.key()),
        }
    }

    /// Human marker, e.g. "CON DATOS DE EXPORTACIONES TOTALES CERRADO".
    pub fn label(&self, present: bool) -> String {
        let prefix = if present { "CON" } else { "SIN" };
        let body = match self {
            FlagKey::ExportTotals(p) => format!("DATOS DE EXPORTACIONES TOTALES {}", p.suffix()),
            FlagKey::ExportNme(p) => format!("DATOS DE EXPORTACIONES NME {}", p.suffix()),
            FlagKey::Conteo(p) => format!("DATOS DE CONTEO {}", p.suffix()),
            FlagKey::Empresas(p) => format!("DATOS DE EMPRESAS {}", p.suffix()),
            FlagKey::Ied(p) => format!("DATOS DE IED {}", p.suffix()),
            FlagKey::Ice(p) => format!("DATOS DE ICE {}", p.suffix()),
            FlagKey::Turismo(p) => format!("DATOS DE TURISMO {}", p.suffix()),
            FlagKey::Conectividad => "DATOS DE CONECTIVIDAD".to_string(),
            FlagKey::OportunidadesExportacion
            | FlagKey::OportunidadesInversion
            | FlagKey::OportunidadesTurismo => "OPORTUNIDADES".to_string(),
            FlagKey::PesosMinero(p) | FlagKey::PesosNoMinero(p) => format!("DATOS {}", p.suffix()),
        };
        format!("{} {}", prefix, body)
    }
}

/// Presence map. Keys that were never probed read as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    map: BTreeMap<FlagKey, bool>,
}

impl Flags {
    pub fn set(&mut self, key: FlagKey, present: bool) {
        self.map.insert(key, present);
    }

    pub fn has(&self, key: FlagKey) -> bool {
        self.map.get(&key).copied().unwrap_or(false)
    }

    pub fn any(&self, keys: &[FlagKey]) -> bool {
        keys.iter().any(|k| self.has(*k))
    }

    pub fn is_probed(&self, key: FlagKey) -> bool {
        self.map.contains_key(&key)
    }

    /// `(name, label)` pairs of every probed key, for display.
    pub fn labels(&self) -> Vec<(String, String)> {
        self.map.iter().map(|(k, v)| (k.name(), k.label(*v))).collect()
    }

    /// The national aggregate always has data except connectivity.
    pub fn colombia() -> Flags {
        let mut flags = Flags::default();
        for key in FlagKey::all() {
            flags.set(key, key != FlagKey::Conectividad);
        }
        flags
    }

    /// Build a map from explicit pairs; handy for tests and previews.
    pub fn from_pairs(pairs: &[(FlagKey, bool)]) -> Flags {
        let mut flags = Flags::default();
        for (k, v) in pairs {
            flags.set(*k, *v);
        }
        flags
    }
}

fn probe(wh: &dyn Warehouse, key: FlagKey, sql: &str) -> bool {
    match wh.query(sql) {
        Ok(frame) => !frame.is_empty(),
        Err(e) => {
            debug!("{}: {}", key.label(false), e);
            false
        }
    }
}

/// Filter restricting a query to the slice's tourism codes (countries) or
/// department codes.
fn slice_filter(geo: &GeoParams, country_col: &str, dept_col: &str) -> String {
    match geo.grouping() {
        g if g.has_country_investment() => format!(" AND {} IN ({})", country_col, sql_list(&geo.paises_turismo_cod)),
        Grouping::Departamentos => format!(" AND {} IN ({})", dept_col, sql_list(&geo.unidad_cod)),
        _ => String::new(),
    }
}

/// Probe every applicable category for `geo`.
pub fn verify(wh: &dyn Warehouse, geo: &GeoParams) -> Flags {
    let grouping = geo.grouping();
    if grouping == Grouping::Colombia {
        return Flags::colombia();
    }

    let agr = grouping.as_str();
    let unidad = crate::warehouse::sql_str(geo.unit());
    let mut flags = Flags::default();

    for p in Period::BOTH {
        let s = p.suffix();
        let totals = format!(
            "SELECT DISTINCT A.UNIDAD
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_{s} AS A
            WHERE A.AGRUPACION = '{agr}'
                AND A.UNIDAD IN ({unidad})
                AND A.TABLA = 'TOTAL';"
        );
        flags.set(FlagKey::ExportTotals(p), probe(wh, FlagKey::ExportTotals(p), &totals));

        let nme = format!(
            "SELECT DISTINCT A.UNIDAD
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_{s} AS A
            WHERE A.AGRUPACION = '{agr}'
                AND A.UNIDAD IN ({unidad})
                AND A.TABLA = 'TIPOS'
                AND A.CATEGORIA = 'No Mineras';"
        );
        flags.set(FlagKey::ExportNme(p), probe(wh, FlagKey::ExportNme(p), &nme));

        let conteo = format!(
            "SELECT A.NIT_EXPORTADOR, A.YEAR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CONTEO_EMPRESAS_{s} AS A
            WHERE A.AGRUPACION = '{agr}'
                AND A.UNIDAD = {unidad}
                AND A.VALOR_USD > {umbral}
            ORDER BY A.YEAR ASC;",
            umbral = geo.umbral
        );
        flags.set(FlagKey::Conteo(p), probe(wh, FlagKey::Conteo(p), &conteo));

        let empresas = format!(
            "SELECT A.CATEGORIA, A.RAZON_SOCIAL, A.SECTOR_ESTRELLA, A.SUMA_USD_T_1, A.SUMA_USD_T, A.DIFERENCIA_PORCENTUAL
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_NIT_{s} AS A
            WHERE A.AGRUPACION = '{agr}'
                AND A.UNIDAD = {unidad}
            ORDER BY SUMA_USD_T DESC LIMIT 5;"
        );
        flags.set(FlagKey::Empresas(p), probe(wh, FlagKey::Empresas(p), &empresas));
    }

    if grouping.has_country_investment() {
        let codes = sql_list(&geo.paises_inversion);
        for p in Period::BOTH {
            for (cat, key) in [("IED", FlagKey::Ied(p)), ("ICE", FlagKey::Ice(p))] {
                let sql = format!(
                    "SELECT DISTINCT A.UNIDAD
                    FROM DOCUMENTOS_COLOMBIA.INVERSION.ST_PAISES_{s} AS A
                    WHERE A.AGRUPACION = 'PAISES'
                        AND A.UNIDAD NOT IN ('TOTAL')
                        AND A.CATEGORIA = '{cat}'
                        AND A.UNIDAD IN ({codes})",
                    s = p.suffix()
                );
                flags.set(key, probe(wh, key, &sql));
            }
        }
    }

    for p in Period::BOTH {
        let sql = format!(
            "SELECT A.PAIS_RESIDENCIA
            FROM DOCUMENTOS_COLOMBIA.TURISMO.ST_PAISES_{s} AS A
            WHERE 1=1{filter}",
            s = p.suffix(),
            filter = slice_filter(geo, "A.PAIS_RESIDENCIA", "A.DPTO_HOSPEDAJE")
        );
        flags.set(FlagKey::Turismo(p), probe(wh, FlagKey::Turismo(p), &sql));
    }

    if grouping == Grouping::Departamentos {
        let sql = format!(
            "SELECT A.AEROLINEA, A.CIUDAD_ORIGEN, A.CIUDAD_DESTINO, A.FRECUENCIAS, A.SEMANA
            FROM DOCUMENTOS_COLOMBIA.TURISMO.CONECTIVIDAD AS A
            WHERE 1 = 1 AND A.COD_DIVIPOLA_DEPARTAMENTO_DESTINO IN ({})",
            sql_list(&geo.unidad_cod)
        );
        flags.set(FlagKey::Conectividad, probe(wh, FlagKey::Conectividad, &sql));
    }

    let opp_filter = slice_filter(geo, "A.COD_PAIS", "A.COD_DIVIPOLA_DEPARTAMENTO");
    let opportunities = [
        (
            FlagKey::OportunidadesExportacion,
            "SELECT DISTINCT A.CADENA, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.OPORTUNIDAD = 'Exportación'
                AND A.CADENA NOT IN ('Turismo')",
        ),
        (
            FlagKey::OportunidadesInversion,
            "SELECT DISTINCT A.CADENA, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.OPORTUNIDAD = 'IED'",
        ),
        (
            FlagKey::OportunidadesTurismo,
            "SELECT DISTINCT A.SECTOR, LOWER(A.SUBSECTOR) AS SUBSECTOR
            FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.OPORTUNIDADES AS A
            WHERE A.CADENA IN ('Turismo')",
        ),
    ];
    for (key, base) in opportunities {
        let sql = format!("{base}{opp_filter} ORDER BY 1, 2 ASC");
        flags.set(key, probe(wh, key, &sql));
    }

    for p in Period::BOTH {
        for (tabla, key) in [("MEDIO MINERAS", FlagKey::PesosMinero(p)), ("MEDIO NO MINERAS", FlagKey::PesosNoMinero(p))] {
            let sql = format!(
                "SELECT A.CATEGORIA, A.SUMA_PESO_T_1, A.SUMA_PESO_T, A.DIFERENCIA_PORCENTUAL
                FROM DOCUMENTOS_COLOMBIA.EXPORTACIONES.ST_CATEGORIAS_PESO_{s} AS A
                WHERE A.TABLA = '{tabla}'
                    AND A.AGRUPACION = '{agr}'
                    AND A.UNIDAD IN ({unidad});",
                s = p.suffix()
            );
            flags.set(key, probe(wh, key, &sql));
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{Frame, MemoryWarehouse};

    fn one_row() -> Frame {
        Frame::new(&["UNIDAD"]).with_row(vec!["X".into()])
    }

    fn pais() -> GeoParams {
        GeoParams {
            grouping: Some(Grouping::Paises),
            unidad: vec!["PER".into()],
            paises_inversion: vec!["PERU".into()],
            paises_turismo_cod: vec!["589".into()],
            nombre_pais: vec!["Perú".into()],
            umbral: 10000.0,
            ..GeoParams::default()
        }
    }

    #[test]
    fn labels_match_markers() {
        assert_eq!(
            FlagKey::ExportTotals(Period::Cerrado).label(true),
            "CON DATOS DE EXPORTACIONES TOTALES CERRADO"
        );
        assert_eq!(FlagKey::PesosNoMinero(Period::Corrido).label(false), "SIN DATOS CORRIDO");
        assert_eq!(FlagKey::OportunidadesTurismo.label(true), "CON OPORTUNIDADES");
        assert_eq!(FlagKey::Conteo(Period::Corrido).name(), "exportaciones_conteo_corrido");
    }

    #[test]
    fn colombia_is_hardcoded() {
        let wh = MemoryWarehouse::new();
        let geo = GeoParams {
            grouping: Some(Grouping::Colombia),
            unidad: vec!["COLOMBIA".into()],
            ..GeoParams::default()
        };
        let flags = verify(&wh, &geo);
        assert!(wh.queries().is_empty());
        assert!(!flags.has(FlagKey::Conectividad));
        assert!(FlagKey::all()
            .into_iter()
            .filter(|k| *k != FlagKey::Conectividad)
            .all(|k| flags.has(k)));
        assert_eq!(FlagKey::all().len(), 22);
    }

    #[test]
    fn failures_and_empty_results_both_read_as_absent() {
        let wh = MemoryWarehouse::new()
            .route(&["ST_CATEGORIAS_CERRADO", "'TOTAL'"], one_row())
            .route(&["INVERSION.ST_PAISES_CERRADO", "'IED'"], one_row())
            .fail_on("TURISMO.ST_PAISES_CERRADO");
        let flags = verify(&wh, &pais());
        assert!(flags.has(FlagKey::ExportTotals(Period::Cerrado)));
        assert!(!flags.has(FlagKey::ExportTotals(Period::Corrido)));
        assert!(flags.has(FlagKey::Ied(Period::Cerrado)));
        assert!(!flags.has(FlagKey::Ice(Period::Cerrado)));
        assert!(flags.is_probed(FlagKey::Turismo(Period::Cerrado)));
        assert!(!flags.has(FlagKey::Turismo(Period::Cerrado)));
        assert!(!flags.is_probed(FlagKey::Conectividad));
    }

    #[test]
    fn departments_skip_investment_and_probe_connectivity() {
        let geo = GeoParams {
            grouping: Some(Grouping::Departamentos),
            unidad: vec!["Antioquia".into()],
            unidad_cod: vec!["5".into()],
            umbral: 10000.0,
            ..GeoParams::default()
        };
        let wh = MemoryWarehouse::new().route(&["CONECTIVIDAD"], one_row());
        let flags = verify(&wh, &geo);
        assert!(flags.has(FlagKey::Conectividad));
        assert!(!flags.is_probed(FlagKey::Ied(Period::Cerrado)));
        let queries = wh.queries();
        assert!(queries.iter().any(|q| q.contains("A.DPTO_HOSPEDAJE IN ('5')")));
        assert!(queries.iter().any(|q| q.contains("A.COD_DIVIPOLA_DEPARTAMENTO IN ('5')")));
    }

    #[test]
    fn opportunities_filter_countries_by_tourism_code() {
        let wh = MemoryWarehouse::new().route(&["OPORTUNIDADES", "'IED'"], one_row());
        let flags = verify(&wh, &pais());
        assert!(flags.has(FlagKey::OportunidadesInversion));
        assert!(!flags.has(FlagKey::OportunidadesExportacion));
        assert!(wh.queries().iter().any(|q| q.contains("A.COD_PAIS IN ('589') ORDER BY 1, 2 ASC")));
    }
}
