use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::PathBuf;
use std::sync::Mutex;
use tres_ejes::config::Config;
use tres_ejes::download::{generate_with, Format, ReportCache};
use tres_ejes::error::ReportError;
use tres_ejes::params::{resolve, Grouping, ReportRequest};
use tres_ejes::process::process;
use tres_ejes::report::build_document;
use tres_ejes::verify::verify;
use tres_ejes::warehouse::{Frame, MemoryWarehouse};

fn parameters() -> Frame {
    Frame::new(&["PARAMETRO", "VALOR"])
        .with_row(vec!["Año cerrado (T-1)".into(), "2022".into()])
        .with_row(vec!["Año cerrado (T)".into(), "2023".into()])
        .with_row(vec!["Año corrido (T-1)".into(), "2023-2".into()])
        .with_row(vec!["Año corrido (T)".into(), "2024-2".into()])
        .with_row(vec!["Mes corrido".into(), "6".into()])
        .with_row(vec!["Mes corrido texto (T)".into(), "junio".into()])
        .with_row(vec!["Fecha de actualización".into(), "15 de agosto de 2024".into()])
}

fn usd(rows: &[(&str, f64, f64)]) -> Frame {
    let mut f = Frame::new(&["CATEGORIA", "SUMA_USD_T_1", "SUMA_USD_T", "DIFERENCIA_PORCENTUAL"]);
    for (c, a, b) in rows {
        f = f.with_row(vec![(*c).into(), (*a).into(), (*b).into(), ((b - a) / a * 100.0).into()]);
    }
    f
}

fn warehouse() -> MemoryWarehouse {
    MemoryWarehouse::new().route(&["PARAMETROS.PARAMETROS"], parameters())
}

/// Parameters plus the export totals and mining split of both periods.
fn warehouse_with_exports() -> MemoryWarehouse {
    let mut wh = warehouse();
    for table in ["ST_CATEGORIAS_CERRADO", "ST_CATEGORIAS_CORRIDO"] {
        wh = wh
            .route(&[table, "'TOTAL'"], usd(&[("Total", 100.0, 120.0)]))
            .route(&[table, "'TIPOS'"], usd(&[("Mineras", 40.0, 50.0), ("No Mineras", 60.0, 70.0)]));
    }
    wh
}

fn config(name: &str) -> Config {
    let dir: PathBuf = std::env::temp_dir().join(format!("tres_ejes_{name}_{}", std::process::id()));
    Config { output_dir: dir, ..Config::default() }
}

#[test]
fn colombia_report_has_every_section() {
    let wh = warehouse_with_exports();
    let req = ReportRequest::new(Grouping::Colombia);
    let geo = resolve(&wh, &req).unwrap();
    let flags = verify(&wh, &geo);
    let report = process(&wh, geo, flags).unwrap();
    let doc = build_document(&report);

    assert!(!doc.contains_text("no registra datos"));
    let headings = doc.headings();
    for section in ["Exportaciones", "Inversión", "Turismo", "Logística"] {
        assert!(headings.contains(&section), "missing {section}");
    }
    assert!(doc.tables() > 0);
}

#[test]
fn unknown_country_falls_back_to_no_data_paragraphs() {
    let wh = warehouse();
    let req = ReportRequest::for_unit(Grouping::Paises, Some("Atlantis"));
    let geo = resolve(&wh, &req).unwrap();
    let flags = verify(&wh, &geo);
    let report = process(&wh, geo, flags).unwrap();
    let doc = build_document(&report);

    assert!(doc.contains_text("El país no registra datos de exportaciones."));
    assert!(doc.contains_text("El país no registra datos de turismo."));
}

#[test]
fn generation_writes_files_and_audit_events() {
    let wh = warehouse();
    let config = config("both");
    let cache = Mutex::new(ReportCache::default());
    let req = ReportRequest::new(Grouping::Colombia);

    let out = generate_with(&wh, &config, &cache, &req, Format::Both).unwrap();
    assert_eq!(out.docx_name, "Tres Ejes Colombia.docx");
    assert_eq!(out.xlsx_name, "Tres Ejes Colombia.xlsx");
    let docx = STANDARD.decode(out.docx_b64.unwrap()).unwrap();
    assert_eq!(&docx[..2], b"PK");
    assert!(out.xlsx_b64.is_some());
    assert!(out.written.iter().all(|p| p.exists()));

    let events = wh.executed();
    assert_eq!(events.len(), 3);
    assert!(events[0].contains("'Selección de Colombia'"));
    assert!(events[1].contains("'Descarga Word de Colombia'"));
    assert!(events[2].contains("'Descarga Excel de Colombia'"));

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn repeated_request_is_served_from_cache() {
    let wh = warehouse();
    let config = config("cache");
    let cache = Mutex::new(ReportCache::default());
    let req = ReportRequest::new(Grouping::Colombia);

    generate_with(&wh, &config, &cache, &req, Format::Xlsx).unwrap();
    let issued = wh.queries().len();
    let recorded = wh.executed().len();
    generate_with(&wh, &config, &cache, &req, Format::Xlsx).unwrap();
    assert_eq!(wh.queries().len(), issued);

    let events = wh.executed();
    assert_eq!(events.len(), recorded + 1);
    assert!(events[recorded].contains("'Descarga Excel de Colombia'"));
    assert_eq!(events.iter().filter(|e| e.contains("'Selección de Colombia'")).count(), 1);

    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn missing_parameters_surface_as_generation_error() {
    let wh = MemoryWarehouse::new();
    let config = config("error");
    let cache = Mutex::new(ReportCache::default());

    let err = generate_with(&wh, &config, &cache, &ReportRequest::new(Grouping::Colombia), Format::Docx).unwrap_err();
    assert!(matches!(err, ReportError::Generation(_)));
    assert!(err.to_string().starts_with("Se produjo un error durante la generación del documento"));
    assert!(wh.executed().is_empty());
}
