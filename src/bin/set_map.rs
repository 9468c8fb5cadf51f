use cachelab_viz::cli::SetMapCli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = SetMapCli::parse();
    cachelab_viz::utils::init_logging(cli.verbose, cli.debug);

    match cachelab_viz::run_set_map(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
