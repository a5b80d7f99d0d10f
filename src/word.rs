// .docx rendering of a document outline.
use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::report::{Align, Block, Document, Run as TextRun, TableStyle, FOOTER_TEXT};
use crate::types::Table as GridTable;
use docx_rs::{
    AbstractNumbering, AlignmentType, BorderType, BreakType, Docx, Footer, Header, IndentLevel, Level, LevelJc,
    LevelText, NumberFormat, NumberingId, Numbering, PageMargin, PageNum, Paragraph, Pic, Run, RunFonts, Shading,
    SpecialIndentType, Start, Style, StyleType, Table, TableCell, TableCellBorder, TableCellBorderPosition,
    TableOfContents, TableRow,
};
use log::{debug, warn};
use std::io::Cursor;
use std::path::Path;

const FONT: &str = "Century Gothic";
const HEADING_COLOR: &str = "002060";
const HEADER_FILL: &str = "215E99";
const TOTAL_FILL: &str = "DAE9F7";
const BULLET_NUMBERING: usize = 1;
const EMU_PER_INCH: f64 = 914_400.0;

/// Logos placed in the page header and footer.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub header: Option<Vec<u8>>,
    pub footer: Option<Vec<u8>>,
}

impl Assets {
    /// Read the configured logos. A missing file only loses the image.
    pub fn load(config: &Config) -> Assets {
        Assets {
            header: read_image(config.header_image.as_deref()),
            footer: read_image(config.footer_image.as_deref()),
        }
    }
}

fn read_image(path: Option<&Path>) -> Option<Vec<u8>> {
    let path = path?;
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("No se pudo leer la imagen {}: {}", path.display(), e);
            None
        }
    }
}

fn fonts() -> RunFonts {
    RunFonts::new().ascii(FONT).hi_ansi(FONT).cs(FONT).east_asia(FONT)
}

fn run(text: &str) -> Run {
    Run::new().add_text(text).fonts(fonts())
}

/// Sizes are given in points; docx counts half-points.
fn half_points(pt: usize) -> usize {
    pt * 2
}

fn heading_style(id: &str, name: &str, pt: usize) -> Style {
    Style::new(id, StyleType::Paragraph)
        .name(name)
        .based_on("Normal")
        .next("Normal")
        .size(half_points(pt))
        .color(HEADING_COLOR)
        .bold()
        .fonts(fonts())
}

fn styles(docx: Docx) -> Docx {
    docx.default_fonts(fonts())
        .default_size(half_points(11))
        .add_style(heading_style("Title", "Title", 16))
        .add_style(heading_style("Heading1", "Heading 1", 14))
        .add_style(heading_style("Heading2", "Heading 2", 12))
        .add_style(heading_style("Heading3", "Heading 3", 12))
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )
                .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
}

/// Image run scaled to `width_in` inches, keeping the aspect ratio.
fn image_run(bytes: &[u8], width_in: f64) -> Run {
    let pic = Pic::new(bytes);
    let (w, h) = pic.size;
    let width = (width_in * EMU_PER_INCH) as u32;
    let height = if w == 0 { width } else { (h as f64 * width as f64 / w as f64) as u32 };
    Run::new().add_image(pic.size(width, height))
}

fn header_footer(mut docx: Docx, assets: &Assets) -> Docx {
    if let Some(bytes) = &assets.header {
        docx = docx.header(Header::new().add_paragraph(Paragraph::new().add_run(image_run(bytes, 2.5))));
    }

    let text = Paragraph::new().add_run(run(FOOTER_TEXT).size(half_points(8)));
    let page = Paragraph::new().align(AlignmentType::Center).add_page_num(PageNum::new());
    let logo = match &assets.footer {
        Some(bytes) => Paragraph::new().align(AlignmentType::Right).add_run(image_run(bytes, 2.0)),
        None => Paragraph::new(),
    };
    let row = TableRow::new(vec![
        TableCell::new().add_paragraph(text),
        TableCell::new().add_paragraph(page),
        TableCell::new().add_paragraph(logo),
    ]);
    docx.footer(Footer::new().add_table(Table::new(vec![row])))
}

fn bordered(cell: TableCell) -> TableCell {
    [
        TableCellBorderPosition::Top,
        TableCellBorderPosition::Bottom,
        TableCellBorderPosition::Left,
        TableCellBorderPosition::Right,
    ]
    .into_iter()
    .fold(cell, |cell, pos| {
        cell.set_border(TableCellBorder::new(pos).border_type(BorderType::Single).size(8).color("000000"))
    })
}

fn grid_cell(text: &str, pt: usize, bold: bool, white: bool, fill: Option<&str>) -> TableCell {
    let mut r = run(text).size(half_points(pt));
    if bold {
        r = r.bold();
    }
    if white {
        r = r.color("FFFFFF");
    }
    let mut cell = TableCell::new().add_paragraph(Paragraph::new().align(AlignmentType::Center).add_run(r));
    if let Some(fill) = fill {
        cell = cell.shading(Shading::new().fill(fill));
    }
    bordered(cell)
}

fn table(docx: Docx, grid: &GridTable, style: TableStyle, pt: usize, source: &str) -> Docx {
    let mut rows = vec![TableRow::new(
        grid.headers()
            .into_iter()
            .map(|h| grid_cell(h, pt, true, true, Some(HEADER_FILL)))
            .collect(),
    )];
    let last = grid.len().saturating_sub(1);
    for (i, row) in grid.rows.iter().enumerate() {
        let highlight = style == TableStyle::Detail && i == last;
        let fill = if highlight { Some(TOTAL_FILL) } else { None };
        rows.push(TableRow::new(
            row.iter()
                .map(|c| grid_cell(&c.to_string(), pt, highlight, false, fill))
                .collect(),
        ));
    }
    let fuente = Paragraph::new()
        .indent(Some(425), None, None, None)
        .add_run(run(&format!("Fuente: {source}")).size(half_points(9)));
    docx.add_table(Table::new(rows)).add_paragraph(fuente)
}

fn alignment(align: Align) -> AlignmentType {
    match align {
        Align::Left => AlignmentType::Left,
        Align::Center => AlignmentType::Center,
        Align::Justify => AlignmentType::Both,
    }
}

fn paragraph(runs: &[TextRun], align: Align) -> Paragraph {
    runs.iter().fold(Paragraph::new().align(alignment(align)), |p, r| {
        let mut docx_run = run(&r.text);
        if r.bold {
            docx_run = docx_run.bold();
        }
        p.add_run(docx_run)
    })
}

fn block(docx: Docx, b: &Block) -> Docx {
    match b {
        Block::Title(text) => docx.add_paragraph(
            Paragraph::new()
                .style("Title")
                .align(AlignmentType::Center)
                .add_run(run(text)),
        ),
        Block::Heading { level, text } => {
            let style = format!("Heading{}", (*level).clamp(1, 3));
            docx.add_paragraph(Paragraph::new().style(&style).add_run(run(text)))
        }
        Block::Paragraph { runs, align } => docx.add_paragraph(paragraph(runs, *align)),
        Block::Bullet(text) => docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Both)
                .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
                .add_run(run(text)),
        ),
        Block::Table { table: grid, style, font_size, source } => table(docx, grid, *style, *font_size, source),
        Block::TableOfContents => docx
            .add_paragraph(
                Paragraph::new().add_run(
                    run("Tabla de Contenidos")
                        .bold()
                        .underline("single")
                        .size(half_points(11))
                        .color(HEADING_COLOR),
                ),
            )
            .add_table_of_contents(TableOfContents::new().heading_styles_range(1, 3)),
        Block::PageBreak => docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page))),
        Block::Spacer(lines) => (0..*lines).fold(docx, |d, _| {
            d.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::TextWrapping)))
        }),
        Block::Disclaimer(text) => docx.add_paragraph(
            Paragraph::new().align(AlignmentType::Center).add_run(
                run(text).bold().size(half_points(12)).color(HEADING_COLOR),
            ),
        ),
    }
}

/// Pack `doc` into .docx bytes.
pub fn render(doc: &Document, assets: &Assets) -> Result<Vec<u8>> {
    let mut docx = styles(Docx::new()).page_margin(PageMargin::new().top(816).bottom(1417).left(1134).right(1134));
    docx = header_footer(docx, assets);
    docx = doc.blocks.iter().fold(docx, block);

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    let bytes = buf.into_inner();
    debug!("docx: {} bytes, {} bloques", bytes.len(), doc.blocks.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Column};

    fn sample() -> Document {
        let mut grid = GridTable::new(vec![Column::label("Sector"), Column::amount("2023 (USD FOB)")]);
        grid.push(vec![Cell::text("Agroalimentos"), Cell::text("1.234")]);
        grid.push(vec![Cell::text("Total"), Cell::text("1.234")]);
        Document {
            blocks: vec![
                Block::Title("TRES EJES COLOMBIA".into()),
                Block::TableOfContents,
                Block::PageBreak,
                Block::Heading { level: 1, text: "Exportaciones".into() },
                Block::Paragraph {
                    runs: vec![TextRun::plain("Número de empresas exportadoras en 2024: "), TextRun::bold("12 empresas")],
                    align: Align::Left,
                },
                Block::Bullet("En 2023, Colombia exportó al Mundo USD 1,5 millones.".into()),
                Block::Table {
                    table: grid,
                    style: TableStyle::Detail,
                    font_size: 10,
                    source: "DANE-DIAN. Cálculos: ProColombia.".into(),
                },
                Block::Spacer(2),
                Block::Disclaimer("Referencial.".into()),
            ],
        }
    }

    #[test]
    fn renders_a_zip_package() {
        let bytes = render(&sample(), &Assets::default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn missing_logo_is_skipped() {
        let config = Config {
            header_image: Some("no/existe.png".into()),
            ..Config::default()
        };
        let assets = Assets::load(&config);
        assert!(assets.header.is_none());
        assert!(assets.footer.is_none());
    }
}
