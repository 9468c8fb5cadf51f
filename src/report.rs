use crate::error::{Error, Result};
use crate::trace::{FrequencyTable, FrequencyTables};
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FrequencyRow {
    pub size: u64,
    pub frequency: u64,
}

/// Writes `size,frequency` rows, most frequent first, with no header.
pub fn write_table<W: Write>(table: &FrequencyTable, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    for (size, frequency) in table.by_frequency() {
        writer.serialize(FrequencyRow { size, frequency })?;
    }
    writer.flush().map_err(|e| Error::Csv(e.into()))?;
    Ok(())
}

pub fn report(table: &FrequencyTable, destination: &Path) -> Result<()> {
    let file = fs::File::create(destination).map_err(|e| Error::io(destination, e))?;
    write_table(table, file)?;
    tracing::debug!(path = %destination.display(), rows = table.len(), "Wrote frequency table");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Written(PathBuf),
    /// Nothing to plot.
    Skipped,
}

const CHART_SIZE: (u32, u32) = (1200, 600);

/// Line plot of frequency against size, sizes ascending.
pub fn chart(table: &FrequencyTable, title: &str, destination: &Path) -> Result<ChartOutcome> {
    if table.is_empty() {
        println!("No data for {title}");
        return Ok(ChartOutcome::Skipped);
    }

    // sizes can reach u64::MAX
    let points: Vec<(f64, u64)> = table.by_size().into_iter().map(|(size, freq)| (size as f64, freq)).collect();
    let min_size = points.first().map_or(0.0, |p| p.0);
    let max_size = points.last().map_or(0.0, |p| p.0);
    // widen a single-point axis
    let max_size = if max_size > min_size { max_size } else { min_size + (min_size * 0.05).max(1.0) };
    let max_freq = points.iter().map(|p| p.1).max().unwrap_or(0);

    let root = SVGBackend::new(destination, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(Error::chart)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, FontDesc::new(FontFamily::SansSerif, 24.0, FontStyle::Normal))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(min_size..max_size, 0u64..max_freq.saturating_add(max_freq / 20 + 1))
        .map_err(Error::chart)?;

    chart
        .configure_mesh()
        .x_desc("Block Size (bytes)")
        .y_desc("Frequency")
        .x_label_formatter(&|size| format!("{size:.0}"))
        .bold_line_style(BLACK.mix(0.2).stroke_width(1))
        .light_line_style(BLACK.mix(0.05).stroke_width(1))
        .draw()
        .map_err(Error::chart)?;

    chart
        .draw_series(LineSeries::new(points, BLUE.mix(0.7).stroke_width(2)))
        .map_err(Error::chart)?;

    root.present().map_err(Error::chart)?;
    tracing::debug!(path = %destination.display(), "Wrote frequency chart");
    Ok(ChartOutcome::Written(destination.to_path_buf()))
}

/// One output family: file stem plus chart title.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub stem: &'static str,
    pub title: &'static str,
}

pub const CATEGORIES: [Category; 4] = [
    Category { stem: "alloc_freq", title: "Allocation Frequency" },
    Category { stem: "realloc_freq", title: "Reallocation Frequency" },
    Category { stem: "combined_alloc_realloc_freq", title: "Combined Alloc/Realloc Frequency" },
    Category { stem: "free_freq", title: "Free Frequency" },
];

impl FrequencyTables {
    /// Tables in [`CATEGORIES`] order.
    pub fn categories(&self) -> [(&Category, &FrequencyTable); 4] {
        [
            (&CATEGORIES[0], &self.alloc),
            (&CATEGORIES[1], &self.realloc),
            (&CATEGORIES[2], &self.combined),
            (&CATEGORIES[3], &self.free),
        ]
    }
}

/// Writes all four tables and charts under `output_dir`, creating it if needed.
pub fn write_summary(tables: &FrequencyTables, output_dir: &Path) -> Result<Vec<ChartOutcome>> {
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    for (category, table) in tables.categories() {
        report(table, &output_dir.join(format!("{}.csv", category.stem)))?;
    }

    tables
        .categories()
        .into_iter()
        .map(|(category, table)| chart(table, category.title, &output_dir.join(format!("{}.svg", category.stem))))
        .collect()
}
