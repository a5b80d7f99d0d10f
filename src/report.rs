// Document outline: the ordered blocks of one Tres Ejes report, chosen per
// grouping and per presence flag. Rendering to .docx lives in `word`.
use crate::fetch::{ExportCategory, Flow, TourismDim};
use crate::params::{Grouping, Period};
use crate::process::{ProcessedReport, TableKey};
use crate::types::Table;
use crate::util::capitalize;
use crate::verify::FlagKey;

pub const FUENTE_EXPORTACIONES: &str = "DANE-DIAN. Cálculos: ProColombia.";
pub const FUENTE_INVERSION: &str = "Banco de la República. Cálculos: ProColombia.";
pub const FUENTE_CONECTIVIDAD: &str = "OAG. Cálculos: ProColombia.";
const FUENTE_TURISMO_VENEZUELA: &str = "Migración Colombia: ProColombia. Nota: Los datos excluyen el registro de residentes venezolanos reportado por Migración Colombia (sin incluir la estimación del MinCIT). Tampoco se incluyen las cifras de colombianos residentes en el exterior ni de cruceristas.";
const FUENTE_TURISMO: &str = "Migración Colombia: ProColombia. Nota: Los datos no incluyen las cifras de colombianos residentes en el exterior ni de cruceristas.";

pub const DISCLAIMER: &str = "La información contenida en este documento es de orientación y guía general. En ningún caso, ProColombia, ni sus empleados, son responsables ante usted o cualquier otra persona por las decisiones o acciones que pueda tomar en relación con la información proporcionada, por lo cual debe tomarse como de carácter referencial únicamente.";

pub const FOOTER_TEXT: &str = "Calle 28 # 13ª - 15, Edificio CCI Pisos 35 - 36 | Bogotá, Colombia T: +57 (1) 560 0100 | info@procolombia.co | www.procolombia.co";

const PUNTOS_LLEGADA: [&str; 5] = [
    "Colombia cuenta con una ubicación privilegiada, situada en el punto focal de la actividad marítima por su cercanía al Canal de Panamá y en el cruce de las principales vías de comunicación del comercio mundial. Es punto de conexión estratégico entre Norte y Sur América, y entre la Costa Este de EE.UU y Asia, es una oportunidad como Plataforma de Intercambio Comercial Andino.",
    "En los puertos y aeropuertos nacionales, se enlazan las más importantes navieras y aerolíneas del mundo, siendo punto estratégico en la conectividad global.  Colombia se conecta con más de 450 aeropuertos del mundo. El Aeropuerto Internacional el Dorado localizado en la ciudad de Bogotá, se ubica como el de mayor importancia en el país. En 2017 por los aeropuertos colombianos se movilizaron más de un millón de toneladas de carga internacional.",
    "Además, Colombia se conecta con más de 600 puertos a nivel mundial. En el 2017, Colombia movilizó por sus zonas portuarias más de 205 millones de toneladas de carga.",
    "Más de 4.314 rutas de exportación en servicio regular directas y con conexión prestadas por 32 empresas de transporte marítimo con destino a más de 661 puertos en el mundo. ",
    "Más de 2.045 aéreas prestadas por 29 aerolíneas con cupos en aviones cargueros o aviones de pasajeros con cupo para carga con destino a más de 457 ciudad en el mundo.",
];

/// Blank lines pushed before the disclaimer to centre it on its page.
const DISCLAIMER_SPACING: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Run {
        Run { text: text.into(), bold: false }
    }

    pub fn bold(text: impl Into<String>) -> Run {
        Run { text: text.into(), bold: true }
    }
}

/// Detail tables highlight their closing total row; summaries do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    Detail,
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    /// Levels 1 to 3 map to the document's Heading styles.
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<Run>, align: Align },
    Bullet(String),
    Table { table: Table, style: TableStyle, font_size: usize, source: String },
    TableOfContents,
    PageBreak,
    Spacer(usize),
    Disclaimer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.blocks.iter().any(|b| match b {
            Block::Paragraph { runs, .. } => runs.iter().any(|r| r.text.contains(needle)),
            Block::Bullet(t) | Block::Title(t) | Block::Disclaimer(t) => t.contains(needle),
            Block::Heading { text, .. } => text.contains(needle),
            _ => false,
        })
    }

    pub fn tables(&self) -> usize {
        self.blocks.iter().filter(|b| matches!(b, Block::Table { .. })).count()
    }
}

/// Document title, e.g. "TRES EJES PAÍSES: PERÚ".
pub fn title(report: &ProcessedReport) -> String {
    let grouping = report.geo.grouping();
    match grouping {
        Grouping::Colombia => "TRES EJES COLOMBIA".to_string(),
        _ => format!("TRES EJES {}: {}", grouping.title_word(), report.geo.display_name().to_uppercase()),
    }
}

pub fn tourism_source(report: &ProcessedReport) -> &'static str {
    if report.geo.includes_venezuela() {
        FUENTE_TURISMO_VENEZUELA
    } else {
        FUENTE_TURISMO
    }
}

struct Builder<'a> {
    report: &'a ProcessedReport,
    grouping: Grouping,
    blocks: Vec<Block>,
}

impl<'a> Builder<'a> {
    fn has(&self, key: FlagKey) -> bool {
        self.report.flags.has(key)
    }

    fn either(&self, key: fn(Period) -> FlagKey) -> bool {
        Period::BOTH.iter().any(|&p| self.has(key(p)))
    }

    fn heading(&mut self, level: u8, text: &str) {
        self.blocks.push(Block::Heading { level, text: text.to_string() });
    }

    fn paragraph(&mut self, runs: Vec<Run>, align: Align) {
        self.blocks.push(Block::Paragraph { runs, align });
    }

    fn text(&mut self, text: impl Into<String>) {
        self.paragraph(vec![Run::plain(text)], Align::Left);
    }

    fn bullets<I: IntoIterator<Item = String>>(&mut self, items: I) {
        self.blocks.extend(items.into_iter().map(Block::Bullet));
    }

    fn page_break(&mut self) {
        self.blocks.push(Block::PageBreak);
    }

    fn table_sized(&mut self, key: TableKey, style: TableStyle, font_size: usize, source: &str) {
        if let Some(t) = self.report.table(key).filter(|t| !t.table.is_empty()) {
            self.blocks.push(Block::Table {
                table: t.word(),
                style,
                font_size,
                source: source.to_string(),
            });
        }
    }

    fn table(&mut self, key: TableKey, source: &str) {
        self.table_sized(key, TableStyle::Detail, 10, source);
    }

    /// The closed-year table followed by the year-to-date one.
    fn both(&mut self, key: fn(Period) -> TableKey, source: &str) {
        for p in Period::BOTH {
            self.table(key(p), source);
        }
    }

    fn cover(&mut self) {
        self.blocks.push(Block::Title(title(self.report)));
        self.blocks.push(Block::Title(format!(
            "ÚLTIMA ACTUALIZACIÓN: {}",
            self.report.document.fecha_actualizacion.to_uppercase()
        )));
        self.blocks.push(Block::TableOfContents);
        self.page_break();
    }

    fn summary(&mut self) {
        let report = self.report;
        let n = &report.narrative;
        let exports = self.either(FlagKey::ExportTotals);
        let investment = self.grouping != Grouping::Departamentos && (self.either(FlagKey::Ied) || self.either(FlagKey::Ice));
        let tourism = self.either(FlagKey::Turismo);
        if !(exports || tourism || self.either(FlagKey::Ied) || self.either(FlagKey::Ice)) {
            return;
        }
        self.heading(1, "Resumen");

        if exports {
            self.heading(3, "Exportaciones");
            self.table_sized(TableKey::ResumenExportaciones, TableStyle::Summary, 10, FUENTE_EXPORTACIONES);
            let cerrado = self.has(FlagKey::ExportTotals(Period::Cerrado));
            let corrido = self.has(FlagKey::ExportTotals(Period::Corrido));
            let joined = |t: &crate::process::PeriodText| format!("{} {}", t.cerrado, t.corrido);
            let mut items = match (cerrado, corrido) {
                (true, true) => vec![joined(&n.exportaciones), joined(&n.no_minero)],
                (true, false) => vec![n.exportaciones.cerrado.clone(), n.no_minero.cerrado.clone()],
                _ => vec![n.exportaciones.corrido.clone(), n.no_minero.corrido.clone()],
            };
            items.push(joined(&n.empresas));
            self.bullets(items);
        }

        if investment {
            self.heading(3, "Inversión");
            self.table_sized(TableKey::ResumenInversion, TableStyle::Summary, 10, FUENTE_INVERSION);
            let mut items = Vec::new();
            for (flow, text) in [(Flow::Ied, &n.ied), (Flow::Ice, &n.ice)] {
                let sentences: Vec<&str> = Period::BOTH
                    .iter()
                    .filter(|&&p| self.has(flow.flag(p)))
                    .map(|&p| text.get(p))
                    .collect();
                if !sentences.is_empty() {
                    items.push(sentences.join(" "));
                }
            }
            self.bullets(items);
        }

        if tourism {
            if self.grouping.is_group() {
                self.page_break();
            }
            self.heading(3, "Turismo");
            let source = tourism_source(report);
            self.table_sized(TableKey::ResumenTurismo, TableStyle::Summary, 10, source);
            let items: Vec<String> = Period::BOTH
                .iter()
                .filter(|&&p| self.has(FlagKey::Turismo(p)))
                .map(|&p| n.turismo.get(p).to_string())
                .collect();
            self.bullets(items);
        }
        self.page_break();
    }

    fn opportunities(&mut self, chains: &[(String, String)]) {
        for (cadena, description) in chains {
            self.paragraph(
                vec![Run::bold(format!("{cadena}: ")), Run::plain(description.clone())],
                Align::Justify,
            );
        }
    }

    fn exports(&mut self) {
        let subject = self.grouping.subject();
        self.heading(1, "Exportaciones");
        if !self.either(FlagKey::ExportTotals) {
            self.text(format!("{subject} no registra datos de exportaciones."));
            return;
        }
        self.heading(2, "Tipo de exportación");
        self.both(TableKey::Tipos, FUENTE_EXPORTACIONES);

        if self.either(FlagKey::ExportNme) {
            self.heading(1, "Exportaciones no minero-energéticas");
            let mut sections = Vec::new();
            if self.grouping != Grouping::Paises {
                sections.push(("Destinos", ExportCategory::Pais));
            }
            if self.grouping != Grouping::Departamentos {
                sections.push(("Departamento de origen", ExportCategory::Departamentos));
            }
            sections.push(("Sector", ExportCategory::Sectores));
            sections.push(("Subsector", ExportCategory::Subsectores));
            for (heading, cat) in sections {
                self.heading(2, heading);
                for p in Period::BOTH {
                    self.table(TableKey::Categoria(p, cat), FUENTE_EXPORTACIONES);
                }
            }

            if self.either(FlagKey::Conteo) {
                self.heading(2, "Empresas");
                let report = self.report;
                let doc = &report.document;
                let lines = [
                    (Period::Cerrado, format!("Número de empresas exportadoras en {}: ", doc.anio_cerrado)),
                    (Period::Corrido, format!("Número de empresas exportadoras a {}: ", doc.anio_corrido_texto)),
                ];
                for (p, label) in lines {
                    let n = self.report.conteo.get(&p).copied().unwrap_or(0);
                    self.paragraph(vec![Run::plain(label), Run::bold(format!("{n} empresas"))], Align::Left);
                }
            }

            if self.either(FlagKey::Empresas) {
                self.heading(2, "Información de Empresas");
                for p in Period::BOTH {
                    self.table_sized(TableKey::Empresas(p), TableStyle::Detail, 9, FUENTE_EXPORTACIONES);
                }
            }

            if self.has(FlagKey::OportunidadesExportacion) {
                self.heading(2, "Oportunidades de exportación identificadas");
                let chains = self.report.oportunidades_exportacion.clone();
                self.opportunities(&chains);
            }
        }
        self.page_break();
    }

    fn investment(&mut self) {
        if self.grouping == Grouping::Departamentos {
            if self.has(FlagKey::OportunidadesInversion) {
                self.heading(1, "Inversión");
                self.heading(2, "Oportunidades de inversión identificadas");
                let chains = self.report.oportunidades_inversion.clone();
                self.opportunities(&chains);
            }
            return;
        }

        let subject = self.grouping.subject();
        self.heading(1, "Inversión");
        if !(self.either(FlagKey::Ied) || self.either(FlagKey::Ice)) {
            self.text(format!("{subject} no registra datos de inversión."));
            return;
        }
        for flow in Flow::BOTH {
            if !Period::BOTH.iter().any(|&p| self.has(flow.flag(p))) {
                continue;
            }
            let code = flow.code();
            self.heading(2, code);
            match self.grouping {
                Grouping::Colombia => {
                    self.heading(2, &format!("{code} - Países"));
                    for p in Period::BOTH {
                        self.table(TableKey::InversionPaises(flow, p), FUENTE_INVERSION);
                    }
                    if flow == Flow::Ied {
                        self.heading(2, "IED - Actividades");
                        self.both(TableKey::IedActividades, FUENTE_INVERSION);
                    }
                }
                Grouping::Paises => {
                    for p in Period::BOTH {
                        self.table(TableKey::InversionTotal(flow, p), FUENTE_INVERSION);
                    }
                }
                _ => {
                    for p in Period::BOTH {
                        self.table(TableKey::InversionTotal(flow, p), FUENTE_INVERSION);
                    }
                    self.heading(2, &format!("{code} - Países"));
                    for p in Period::BOTH {
                        self.table(TableKey::InversionPaises(flow, p), FUENTE_INVERSION);
                    }
                }
            }
        }
        if self.has(FlagKey::OportunidadesInversion) {
            self.heading(2, "Oportunidades de inversión identificadas");
            let chains = self.report.oportunidades_inversion.clone();
            self.opportunities(&chains);
        }
        self.page_break();
    }

    fn tourism(&mut self) {
        let subject = self.grouping.subject();
        self.heading(1, "Turismo");
        if !self.either(FlagKey::Turismo) {
            self.text(format!("{subject} no registra datos de turismo."));
            return;
        }
        let source = tourism_source(self.report);
        let mut sections = Vec::new();
        if self.grouping != Grouping::Paises {
            sections.push(("Países", TourismDim::Paises));
        }
        if self.grouping != Grouping::Departamentos {
            sections.push(("Departamentos", TourismDim::Departamentos));
        }
        sections.push(("Municipios", TourismDim::Ciudades));
        for (heading, dim) in sections {
            self.heading(2, heading);
            for p in Period::BOTH {
                self.table(TableKey::Turismo(p, dim), source);
            }
        }
        if self.has(FlagKey::Turismo(Period::Cerrado)) {
            for (heading, dim) in [("Género", TourismDim::Genero), ("Motivos", TourismDim::Motivo)] {
                self.heading(2, heading);
                self.table(TableKey::Turismo(Period::Cerrado, dim), source);
            }
        }
        if self.grouping != Grouping::Paises && self.has(FlagKey::OportunidadesTurismo) {
            self.heading(2, "Productos vacacionales que se promocionan");
            let r = self.report;
            self.paragraph(
                vec![Run::bold("Principales: "), Run::plain(r.turismo_principal.clone())],
                Align::Justify,
            );
            self.paragraph(vec![Run::bold("Nichos: "), Run::plain(r.turismo_nichos.clone())], Align::Justify);
        }
        self.page_break();
    }

    fn connectivity(&mut self) {
        if self.grouping != Grouping::Departamentos || !self.has(FlagKey::Conectividad) {
            return;
        }
        self.heading(1, "Conectividad");
        self.table_sized(TableKey::Conectividad, TableStyle::Summary, 10, FUENTE_CONECTIVIDAD);
        self.page_break();
    }

    fn logistics(&mut self) {
        if !self.either(FlagKey::ExportTotals) {
            return;
        }
        self.heading(1, "Logística");
        self.heading(2, "Pesos");
        self.both(TableKey::TiposPeso, FUENTE_EXPORTACIONES);
        if self.either(FlagKey::PesosMinero) {
            self.heading(2, "Pesos por medio de transporte: exportaciones mineras");
            self.both(TableKey::MediosMinero, FUENTE_EXPORTACIONES);
        }
        if self.either(FlagKey::PesosNoMinero) {
            self.heading(2, "Pesos por medio de transporte: exportaciones no mineras");
            self.both(TableKey::MediosNoMinero, FUENTE_EXPORTACIONES);
        }
        if self.grouping == Grouping::Colombia {
            self.heading(2, "Principales puntos de llegada:");
            self.bullets(PUNTOS_LLEGADA.iter().map(|s| s.to_string()));
        } else if self.grouping.is_group() {
            self.page_break();
        }
    }

    fn annex(&mut self) {
        let noun = match self.grouping {
            Grouping::Continentes => "continente de",
            Grouping::Hubs => "HUB",
            Grouping::Tlcs => "TLC",
            _ => return,
        };
        self.heading(1, "Anexo: Países considerados");
        let titulo = capitalize(&self.report.geo.display_name());
        self.paragraph(
            vec![Run::plain(format!(
                "El presente documento muestra los datos agregados para los Tres Ejes de negocio de ProColombia para el {noun} {titulo}. Se incluye información de los siguientes países:"
            ))],
            Align::Justify,
        );
        let paises = format!("{}.", self.report.geo.paises_anexo);
        self.paragraph(vec![Run::plain(paises)], Align::Justify);
    }

    fn disclaimer(&mut self) {
        self.page_break();
        self.blocks.push(Block::Spacer(DISCLAIMER_SPACING));
        self.blocks.push(Block::Disclaimer(DISCLAIMER.to_string()));
    }
}

/// Lay out the full document for a processed report.
pub fn build_document(report: &ProcessedReport) -> Document {
    let mut b = Builder {
        report,
        grouping: report.geo.grouping(),
        blocks: Vec::new(),
    };
    b.cover();
    b.summary();
    b.exports();
    b.investment();
    b.tourism();
    b.connectivity();
    b.logistics();
    b.annex();
    b.disclaimer();
    Document { blocks: b.blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Data, MetricRow, MetricTable};
    use crate::params::{DocumentParams, GeoParams, Periods};
    use crate::process::{build, Lookups};
    use crate::verify::Flags;
    use crate::warehouse::Frame;

    fn geo(grouping: Grouping, unit: &str) -> GeoParams {
        GeoParams {
            grouping: Some(grouping),
            unidad: vec![unit.to_string()],
            paises_anexo: "Argentina, Brasil".into(),
            umbral: 10000.0,
            ..GeoParams::default()
        }
    }

    fn report(data: &Data, geo: GeoParams, flags: Flags) -> ProcessedReport {
        let document = DocumentParams {
            fecha_actualizacion: "marzo de 2025".into(),
            anio_cerrado: "2024".into(),
            anio_corrido_texto: "febrero de 2025".into(),
        };
        build(data, &Lookups::default(), geo, flags, Periods::default(), document).unwrap()
    }

    fn only(keys: &[FlagKey]) -> Flags {
        let pairs: Vec<(FlagKey, bool)> = FlagKey::all().into_iter().map(|k| (k, keys.contains(&k))).collect();
        Flags::from_pairs(&pairs)
    }

    fn tipos() -> MetricTable {
        MetricTable::new(vec![
            MetricRow::new("No Mineras", 4.0e6, 6.0e6, Some(50.0)),
            MetricRow::new("Mineras", 6.0e6, 9.0e6, Some(50.0)),
            MetricRow::new("Total", 1.0e7, 1.5e7, Some(50.0)),
        ])
        .with_shares(1.5e7)
    }

    #[test]
    fn empty_group_falls_back_to_sentences() {
        let doc = build_document(&report(&Data::default(), geo(Grouping::Continentes, "Europa"), only(&[])));
        assert_eq!(
            doc.headings(),
            vec!["Exportaciones", "Inversión", "Turismo", "Anexo: Países considerados"]
        );
        assert!(doc.contains_text("El continente no registra datos de exportaciones."));
        assert!(doc.contains_text("El continente no registra datos de turismo."));
        assert!(doc.contains_text("para el continente de Europa."));
        assert!(doc.contains_text("Argentina, Brasil."));
        assert_eq!(doc.tables(), 0);
        assert_eq!(doc.blocks[0], Block::Title("TRES EJES CONTINENTES: EUROPA".into()));
        assert_eq!(doc.blocks.last(), Some(&Block::Disclaimer(DISCLAIMER.to_string())));
    }

    #[test]
    fn colombia_lists_arrival_points_without_annex() {
        let mut data = Data::default();
        for p in Period::BOTH {
            data.export.tipos.insert(p, tipos());
        }
        let doc = build_document(&report(&data, geo(Grouping::Colombia, "COLOMBIA"), Flags::colombia()));
        let headings = doc.headings();
        assert_eq!(headings[0], "Resumen");
        assert!(headings.contains(&"IED - Actividades"));
        assert!(headings.contains(&"Principales puntos de llegada:"));
        assert!(!headings.contains(&"Anexo: Países considerados"));
        assert!(!headings.contains(&"Conectividad"));
        assert!(doc.contains_text("Número de empresas exportadoras en 2024: "));
        assert_eq!(doc.blocks[0], Block::Title("TRES EJES COLOMBIA".into()));
        // Two TIPOS tables plus the three summaries.
        assert_eq!(doc.tables(), 5);
    }

    #[test]
    fn summary_bullets_join_both_periods() {
        let mut data = Data::default();
        for p in Period::BOTH {
            data.export.tipos.insert(p, tipos());
        }
        let flags = only(&[FlagKey::ExportTotals(Period::Cerrado), FlagKey::ExportTotals(Period::Corrido)]);
        let doc = build_document(&report(&data, geo(Grouping::Hubs, "Andino"), flags));
        let bullets: Vec<&String> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Bullet(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(bullets.len(), 3);
        assert!(bullets[0].starts_with("En , Colombia exportó a Andino USD 15,0 millones"));
        assert!(bullets[0].contains(" Entre enero y "));
    }

    #[test]
    fn department_report_shapes() {
        let mut data = Data::default();
        data.conectividad = Some(
            Frame::new(&["Aerolínea", "Ciudad Origen", "Ciudad Destino", "Frecuencias", "Semana de análisis"])
                .with_row(vec!["Avianca".into(), "Miami".into(), "Medellín".into(), 14.0.into(), "2025-03-03".into()]),
        );
        let flags = only(&[FlagKey::Conectividad, FlagKey::OportunidadesInversion]);
        let doc = build_document(&report(&data, geo(Grouping::Departamentos, "Antioquia"), flags));
        let headings = doc.headings();
        assert!(headings.contains(&"Conectividad"));
        assert!(headings.contains(&"Oportunidades de inversión identificadas"));
        assert!(!doc.contains_text("no registra datos de inversión"));
        assert!(doc.contains_text("El departamento no registra datos de exportaciones."));
        assert!(doc.blocks.iter().any(|b| matches!(
            b,
            Block::Table { style: TableStyle::Summary, source, .. } if source == FUENTE_CONECTIVIDAD
        )));
    }

    #[test]
    fn country_report_skips_destinations_and_products() {
        let mut data = Data::default();
        data.export.tipos.insert(Period::Cerrado, tipos());
        let flags = only(&[
            FlagKey::ExportTotals(Period::Cerrado),
            FlagKey::ExportNme(Period::Cerrado),
            FlagKey::Turismo(Period::Cerrado),
            FlagKey::OportunidadesTurismo,
        ]);
        let mut g = geo(Grouping::Paises, "PER");
        g.nombre_pais = vec!["Perú".into()];
        g.paises_turismo_cod = vec!["589".into()];
        let doc = build_document(&report(&data, g, flags));
        let headings = doc.headings();
        assert!(!headings.contains(&"Destinos"));
        assert!(headings.contains(&"Departamento de origen"));
        assert!(!headings.contains(&"Países"));
        assert!(!headings.contains(&"Productos vacacionales que se promocionan"));
        assert!(headings.contains(&"Género"));
        assert!(doc.contains_text("El país no registra datos de inversión."));
    }

    #[test]
    fn investment_lists_only_flows_with_data() {
        let doc = build_document(&report(
            &Data::default(),
            geo(Grouping::Hubs, "Andino"),
            only(&[FlagKey::Ice(Period::Cerrado)]),
        ));
        let headings = doc.headings();
        assert!(headings.contains(&"ICE"));
        assert!(headings.contains(&"ICE - Países"));
        assert!(!headings.contains(&"IED"));
        assert!(!headings.contains(&"IED - Países"));
        assert!(!doc.contains_text("no registra datos de inversión"));
    }

    #[test]
    fn venezuela_changes_the_tourism_source() {
        let mut g = geo(Grouping::Hubs, "Andino");
        g.paises_turismo_cod = vec!["850".into()];
        let r = report(&Data::default(), g, only(&[]));
        assert_eq!(tourism_source(&r), FUENTE_TURISMO_VENEZUELA);
        let r = report(&Data::default(), geo(Grouping::Hubs, "Caribe"), only(&[]));
        assert_eq!(tourism_source(&r), FUENTE_TURISMO);
    }
}
