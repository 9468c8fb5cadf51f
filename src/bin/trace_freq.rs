use cachelab_viz::cli::TraceFreqCli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = TraceFreqCli::parse();
    cachelab_viz::utils::init_logging(cli.verbose, cli.debug);

    match cachelab_viz::run_trace_freq(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
