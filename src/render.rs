use crate::error::{Error, Result};
use crate::geometry::SetIndexGrid;
use crate::palette::Palette;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, FontTransform};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest grid (in cells) that still gets per-cell set labels.
pub const ANNOTATE_LIMIT: usize = 1000;

/// What `render` actually did, so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOutcome {
    pub annotated: bool,
    pub annotation_skipped: bool,
    pub saved_to: Option<PathBuf>,
}

/// Draws the grid to `destination` as SVG, or to stdout when there is none.
pub fn render(
    grid: &SetIndexGrid,
    sets_count: u64,
    annotate: bool,
    title: &str,
    destination: Option<&Path>,
) -> Result<RenderOutcome> {
    let palette = Palette::new(sets_count);
    let annotated = should_annotate(grid, annotate);
    let mut outcome = RenderOutcome { annotated, annotation_skipped: annotate && !annotated, saved_to: None };

    match destination {
        Some(path) => {
            if path.extension().and_then(|ext| ext.to_str()) != Some("svg") {
                tracing::warn!(path = %path.display(), "Output is written as SVG regardless of extension");
            }
            render_svg(grid, &palette, annotated, title, path)?;
            println!("Saved visualization to {}", path.display());
            outcome.saved_to = Some(path.to_path_buf());
        }
        None => {
            let stdout = std::io::stdout();
            render_terminal(grid, &palette, annotated, title, stdout.lock())
                .map_err(|e| Error::io("<stdout>", e))?;
        }
    }
    Ok(outcome)
}

pub fn should_annotate(grid: &SetIndexGrid, requested: bool) -> bool {
    if !requested {
        return false;
    }
    if grid.len() > ANNOTATE_LIMIT {
        tracing::warn!("Grid too large to annotate (N*M > {ANNOTATE_LIMIT}). Skipping annotations.");
        return false;
    }
    true
}

const MAX_PLOT_PX: u32 = 960;
const MAX_CELL_PX: u32 = 32;
const MIN_CELL_PX: u32 = 2;
const MIN_LABEL_PX: u32 = 14;
const MAX_LEGEND_PX: u32 = 960;
const MAX_FONT_PX: f64 = 10.0;
const MARGIN_LEFT: u32 = 70;
const MARGIN_TOP: u32 = 50;
const MARGIN_BOTTOM: u32 = 60;
const LEGEND_GAP: u32 = 24;
const LEGEND_BAR: u32 = 20;
const LEGEND_TEXT: u32 = 80;

/// Pixel placement of every piece of the set-map figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub sets_count: u64,
    pub cell: u32,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize, sets_count: u64) -> Self {
        let longest = rows.max(cols).max(1) as u32;
        let cell = (MAX_PLOT_PX / longest).clamp(MIN_CELL_PX, MAX_CELL_PX);
        GridLayout { rows: rows as u32, cols: cols as u32, sets_count, cell }
    }

    pub fn plot_width(&self) -> u32 {
        self.cols * self.cell
    }

    pub fn plot_height(&self) -> u32 {
        self.rows * self.cell
    }

    pub fn size(&self) -> (u32, u32) {
        let width = MARGIN_LEFT + self.plot_width() + LEGEND_GAP + LEGEND_BAR + LEGEND_TEXT;
        let height = MARGIN_TOP + self.legend_height() + MARGIN_BOTTOM;
        (width, height)
    }

    /// Top-left and bottom-right corners of cell `(row, col)`; row 0 is at the top.
    pub fn cell_rect(&self, row: usize, col: usize) -> [(i32, i32); 2] {
        let x0 = (MARGIN_LEFT + col as u32 * self.cell) as i32;
        let y0 = (MARGIN_TOP + row as u32 * self.cell) as i32;
        [(x0, y0), (x0 + self.cell as i32, y0 + self.cell as i32)]
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (i32, i32) {
        let [(x0, y0), _] = self.cell_rect(row, col);
        let half = (self.cell / 2) as i32;
        (x0 + half, y0 + half)
    }

    /// Row and column labels shrink with the cells so every index fits.
    pub fn tick_font_size(&self) -> f64 {
        fit_font(self.cell as f64)
    }

    fn legend_left(&self) -> i32 {
        (MARGIN_LEFT + self.plot_width() + LEGEND_GAP) as i32
    }

    /// At least as tall as the grid, and tall enough for a readable label per
    /// set until the bar hits `MAX_LEGEND_PX`.
    pub fn legend_height(&self) -> u32 {
        let wanted = self.sets_count.saturating_mul(MIN_LABEL_PX as u64).min(MAX_LEGEND_PX as u64) as u32;
        self.plot_height().max(120).max(wanted)
    }

    /// Vertical band for `set`; set 0 sits at the bottom of the legend.
    pub fn legend_band(&self, set: u64) -> [(i32, i32); 2] {
        let height = self.legend_height() as f64;
        let band = height / self.sets_count.max(1) as f64;
        let bottom = MARGIN_TOP as f64 + height;
        let y1 = (bottom - set as f64 * band).round() as i32;
        let y0 = (bottom - (set + 1) as f64 * band).round() as i32;
        let x0 = self.legend_left();
        [(x0, y0), (x0 + LEGEND_BAR as i32, y1)]
    }

    pub fn legend_font_size(&self) -> f64 {
        fit_font(self.legend_height() as f64 / self.sets_count.max(1) as f64)
    }
}

fn fit_font(space_px: f64) -> f64 {
    (space_px * 0.8).clamp(1.0, MAX_FONT_PX)
}

fn font(size: f64) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
}

fn render_svg(grid: &SetIndexGrid, palette: &Palette, annotated: bool, title: &str, path: &Path) -> Result<()> {
    let layout = GridLayout::new(grid.rows(), grid.cols(), palette.sets_count());
    let (width, height) = layout.size();
    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(Error::chart)?;

    let centered = Pos::new(HPos::Center, VPos::Center);

    root.draw(&Text::new(
        title.to_string(),
        ((MARGIN_LEFT + layout.plot_width() / 2) as i32, (MARGIN_TOP / 2) as i32),
        font(16.0).color(&BLACK).pos(centered),
    ))
    .map_err(Error::chart)?;

    for (row, col, set) in grid.iter() {
        root.draw(&Rectangle::new(layout.cell_rect(row, col), palette.color(set).filled()))
            .map_err(Error::chart)?;
    }

    // cell grid
    let left = MARGIN_LEFT as i32;
    let top = MARGIN_TOP as i32;
    let right = left + layout.plot_width() as i32;
    let bottom = top + layout.plot_height() as i32;
    let line_style = BLACK.stroke_width(1);
    for col in 0..=grid.cols() {
        let x = left + (col as u32 * layout.cell) as i32;
        root.draw(&PathElement::new(vec![(x, top), (x, bottom)], line_style))
            .map_err(Error::chart)?;
    }
    for row in 0..=grid.rows() {
        let y = top + (row as u32 * layout.cell) as i32;
        root.draw(&PathElement::new(vec![(left, y), (right, y)], line_style))
            .map_err(Error::chart)?;
    }

    if annotated {
        let label_style = font(8.0).color(&WHITE).pos(centered);
        for (row, col, set) in grid.iter() {
            root.draw(&Text::new(set.to_string(), layout.cell_center(row, col), label_style.clone()))
                .map_err(Error::chart)?;
        }
    }

    let tick_style = font(layout.tick_font_size()).color(&BLACK);
    for col in 0..grid.cols() {
        let (x, _) = layout.cell_center(0, col);
        root.draw(&Text::new(
            col.to_string(),
            (x, bottom + 4),
            tick_style.pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(Error::chart)?;
    }
    for row in 0..grid.rows() {
        let (_, y) = layout.cell_center(row, 0);
        root.draw(&Text::new(
            row.to_string(),
            (left - 6, y),
            tick_style.pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(Error::chart)?;
    }

    let desc_style = font(12.0).color(&BLACK);
    root.draw(&Text::new(
        "Column",
        ((left + right) / 2, bottom + 36),
        desc_style.pos(centered),
    ))
    .map_err(Error::chart)?;
    root.draw(&Text::new(
        "Row",
        (18, (top + bottom) / 2),
        font(12.0).transform(FontTransform::Rotate270).color(&BLACK).pos(centered),
    ))
    .map_err(Error::chart)?;

    draw_legend(&root, &layout, palette)?;

    root.present().map_err(Error::chart)?;
    tracing::debug!(path = %path.display(), width, height, "Wrote set-map SVG");
    Ok(())
}

fn draw_legend(root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>, layout: &GridLayout, palette: &Palette) -> Result<()> {
    let label_style = font(layout.legend_font_size()).color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center));

    for set in 0..palette.sets_count() {
        let band = layout.legend_band(set);
        root.draw(&Rectangle::new(band, palette.color(set).filled()))
            .map_err(Error::chart)?;
        let [(_, y0), (x1, y1)] = band;
        root.draw(&Text::new(set.to_string(), (x1 + 6, (y0 + y1) / 2), label_style.clone()))
            .map_err(Error::chart)?;
    }

    let [(x0, _), (x1, _)] = layout.legend_band(0);
    let legend_top = MARGIN_TOP as i32;
    let legend_bottom = legend_top + layout.legend_height() as i32;
    root.draw(&Rectangle::new([(x0, legend_top), (x1, legend_bottom)], BLACK.stroke_width(1)))
        .map_err(Error::chart)?;
    root.draw(&Text::new(
        "Cache set",
        (x1 + LEGEND_TEXT as i32 - 12, (legend_top + legend_bottom) / 2),
        font(12.0).transform(FontTransform::Rotate90).color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center)),
    ))
    .map_err(Error::chart)?;
    Ok(())
}

fn digits(value: usize) -> usize {
    value.to_string().len()
}

/// Colour-block rendering of the grid for a 24-bit colour terminal.
pub fn render_terminal<W: Write>(
    grid: &SetIndexGrid,
    palette: &Palette,
    annotated: bool,
    title: &str,
    mut out: W,
) -> std::io::Result<()> {
    let last_set = palette.sets_count().saturating_sub(1) as usize;
    let mut width = 2.max(digits(grid.cols().saturating_sub(1)) + 1);
    if annotated {
        width = width.max(digits(last_set) + 1);
    }
    let row_label = digits(grid.rows().saturating_sub(1));

    writeln!(out, "{title}")?;
    write!(out, "{:row_label$} ", "")?;
    for col in 0..grid.cols() {
        write!(out, "{col:>width$}")?;
    }
    writeln!(out)?;

    for row in 0..grid.rows() {
        write!(out, "{row:>row_label$} ")?;
        for &set in grid.row(row) {
            let RGBColor(r, g, b) = palette.color(set);
            if annotated {
                write!(out, "\x1b[48;2;{r};{g};{b}m\x1b[97m{set:^width$}\x1b[0m")?;
            } else {
                write!(out, "\x1b[48;2;{r};{g};{b}m{:width$}\x1b[0m", "")?;
            }
        }
        writeln!(out)?;
    }

    write!(out, "Cache set:")?;
    for set in 0..palette.sets_count() {
        let RGBColor(r, g, b) = palette.color(set);
        write!(out, " \x1b[48;2;{r};{g};{b}m\x1b[97m {set} \x1b[0m")?;
    }
    writeln!(out)?;
    Ok(())
}
