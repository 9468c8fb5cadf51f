//! Cache-lab diagnostics: where matrix elements land in a direct-mapped
//! cache, and which block sizes a set of malloc traces asks for.

use crate::cli::{SetMapCli, TraceFreqCli};
use crate::error::Result;
use crate::geometry::MatrixGeometry;
use crate::render::RenderOutcome;
use crate::report::ChartOutcome;

pub mod cli;
pub mod error;
/// Matrix geometry and the set-index computation
pub mod geometry;
pub mod palette;
/// SVG and terminal rendering of set-index grids
pub mod render;
/// CSV tables and line charts of frequency tables
pub mod report;
/// Trace parsing and frequency aggregation
pub mod trace;
pub mod utils;

pub fn run_set_map(cli: SetMapCli) -> Result<RenderOutcome> {
    let geometry = MatrixGeometry::new(
        cli.rows as usize,
        cli.cols as usize,
        cli.int_size,
        cli.cache_size,
        cli.block_size,
    )?;
    let (grid, sets_count) = geometry::compute(&geometry)?;
    let title = cli.title.unwrap_or_else(|| geometry.default_title(sets_count));

    render::render(&grid, sets_count, cli.annotate, &title, cli.out.as_deref())
}

pub fn run_trace_freq(cli: TraceFreqCli) -> Result<Vec<ChartOutcome>> {
    let paths = if cli.traces.is_empty() {
        trace::default_trace_paths()
    } else {
        cli.traces
    };

    let (tables, stats) = trace::ingest(&paths)?;
    tracing::info!(
        files = stats.files_read,
        unreadable = stats.files_skipped,
        records = stats.records,
        alloc_sizes = tables.alloc.len(),
        free_sizes = tables.free.len(),
        "Aggregated traces"
    );

    report::write_summary(&tables, &cli.output_dir)
}
