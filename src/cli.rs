use crate::geometry::MatrixGeometry;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "set-map",
    version = "0.1",
    about = "Visualize mapping of N x M int matrix elements to cache sets"
)]
pub struct SetMapCli {
    /// Number of rows (first index)
    #[arg(short = 'N', long = "rows", value_parser = clap::value_parser!(u32).range(1..))]
    pub rows: u32,

    /// Number of columns (second index)
    #[arg(short = 'M', long = "cols", value_parser = clap::value_parser!(u32).range(1..))]
    pub cols: u32,

    /// Size of int in bytes
    #[arg(long, default_value_t = MatrixGeometry::DEFAULT_INT_SIZE)]
    pub int_size: u64,

    /// Total cache size in bytes
    #[arg(long, default_value_t = MatrixGeometry::DEFAULT_CACHE_SIZE)]
    pub cache_size: u64,

    /// Cache block size in bytes
    #[arg(long, default_value_t = MatrixGeometry::DEFAULT_BLOCK_SIZE)]
    pub block_size: u64,

    /// Annotate each cell with its cache set number (skipped if grid is large)
    #[arg(long)]
    pub annotate: bool,

    /// Output SVG file. If not provided, the grid is drawn in the terminal
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Optional plot title
    #[arg(long)]
    pub title: Option<String>,

    /// Output debug information
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable even more information
    #[arg(short = 'd', long)]
    pub debug: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "trace-freq",
    version = "0.1",
    about = "Summarize allocation and free size frequencies of malloc traces"
)]
pub struct TraceFreqCli {
    /// Trace files (.rep, optionally .zst compressed). Defaults to the bundled workload list
    pub traces: Vec<PathBuf>,

    /// Directory for the CSV tables and charts
    #[arg(short, long, default_value = "trace-summary")]
    pub output_dir: PathBuf,

    /// Output per-line skip information
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable even more information
    #[arg(short = 'd', long)]
    pub debug: bool,
}
