// Entry point and command-line flow.
//
// - `options` lists the values offered for each selector.
// - `flags` resolves a slice and prints which data categories it has.
// - `preview` prints the processed tables, optionally exporting them.
// - `generate` writes the Word and Excel files and records the audit events.
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tres_ejes::config::Config;
use tres_ejes::download::{self, Format, Selector};
use tres_ejes::duck::DuckWarehouse;
use tres_ejes::output;
use tres_ejes::params::{self, Grouping, ReportRequest};
use tres_ejes::process;
use tres_ejes::types::{FlagRow, OptionRow};
use tres_ejes::verify;

#[derive(Parser)]
#[command(name = "tres_ejes", about = "Documentos Tres Ejes: exportaciones, inversión y turismo")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Slice {
    #[arg(long, default_value = "COLOMBIA")]
    agrupacion: Grouping,
    /// Continent, HUB, FTA, country or department to report on.
    #[arg(long)]
    unidad: Option<String>,
    /// Export threshold (USD FOB) for the company count.
    #[arg(long)]
    umbral: Option<f64>,
}

impl Slice {
    fn request(&self) -> ReportRequest {
        let mut req = ReportRequest::for_unit(self.agrupacion, self.unidad.as_deref());
        req.umbral = self.umbral.map(|u| vec![u]);
        req
    }
}

#[derive(Subcommand)]
enum Command {
    /// List selector values.
    Options {
        #[arg(value_enum)]
        kind: Selector,
        /// UNSD region narrowing the country list.
        #[arg(long)]
        region: Option<String>,
    },
    /// Print the data-presence map of a slice.
    Flags {
        #[command(flatten)]
        slice: Slice,
    },
    /// Print the processed tables of a slice.
    Preview {
        #[command(flatten)]
        slice: Slice,
        #[arg(long, default_value_t = 10)]
        rows: usize,
        /// Also write every table as CSV into this directory.
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Build the report files.
    Generate {
        #[command(flatten)]
        slice: Slice,
        #[arg(long, value_enum, default_value = "both")]
        format: Format,
    },
}

fn handle_options(wh: &DuckWarehouse, kind: Selector, region: Option<&str>) -> anyhow::Result<()> {
    let rows: Vec<OptionRow> = download::options(wh, kind, region)?
        .into_iter()
        .map(|opcion| OptionRow { opcion })
        .collect();
    output::preview_rows(&rows, usize::MAX);
    Ok(())
}

fn handle_flags(wh: &DuckWarehouse, config: &Config, slice: &Slice) -> anyhow::Result<()> {
    let req = download::with_default_umbral(&slice.request(), config);
    let geo = params::resolve(wh, &req)?;
    let flags = verify::verify(wh, &geo);
    let rows: Vec<FlagRow> = flags
        .labels()
        .into_iter()
        .map(|(clave, estado)| FlagRow { clave, estado })
        .collect();
    println!("Marcadores de {}\n", geo.display_name());
    output::preview_rows(&rows, usize::MAX);
    Ok(())
}

fn handle_preview(
    wh: &DuckWarehouse,
    config: &Config,
    slice: &Slice,
    rows: usize,
    csv_dir: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let req = download::with_default_umbral(&slice.request(), config);
    let geo = params::resolve(wh, &req)?;
    let flags = verify::verify(wh, &geo);
    let report = process::process(wh, geo, flags)?;

    if let Some(dir) = csv_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    for (name, table) in output::named_tables(&report) {
        output::preview_grid(&name, &table, rows);
        if let Some(dir) = csv_dir {
            let path = dir.join(format!("{name}.csv"));
            if let Err(e) = output::write_csv(&path, &table) {
                eprintln!("Write error: {}", e);
            }
        }
    }
    if let Some(dir) = csv_dir {
        output::write_json(&dir.join("narrativa.json"), &report.narrative)?;
        println!("(Tablas exportadas a {})\n", dir.display());
    }
    Ok(())
}

fn handle_generate(wh: &DuckWarehouse, config: &Config, slice: &Slice, format: Format) -> anyhow::Result<()> {
    let generated = download::generate(wh, config, &slice.request(), format)?;
    for path in &generated.written {
        println!("Archivo generado: {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let wh = DuckWarehouse::open(&config).context("opening warehouse")?;

    match &cli.command {
        Command::Options { kind, region } => handle_options(&wh, *kind, region.as_deref()),
        Command::Flags { slice } => handle_flags(&wh, &config, slice),
        Command::Preview { slice, rows, csv_dir } => handle_preview(&wh, &config, slice, *rows, csv_dir.as_ref()),
        Command::Generate { slice, format } => handle_generate(&wh, &config, slice, *format),
    }
}
