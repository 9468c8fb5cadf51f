use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

pub fn calculate_sets_count(cache_size: u64, block_size: u64) -> Result<u64> {
    if block_size == 0 {
        return Err(Error::geometry("block size cannot be zero"));
    }
    if cache_size % block_size != 0 {
        return Err(Error::geometry(format!(
            "cache size {cache_size} is not a multiple of block size {block_size}"
        )));
    }
    let sets = cache_size / block_size;
    if sets == 0 {
        return Err(Error::geometry("cache must hold at least one block"));
    }
    Ok(sets)
}

/// Direct-mapped placement: the set an element at `linear_idx` lands in.
pub fn calculate_set_index(linear_idx: u64, int_size: u64, block_size: u64, sets_count: u64) -> u64 {
    let byte_offset = linear_idx * int_size;
    let block_idx = byte_offset / block_size;
    block_idx % sets_count
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, debug: bool) {
    let default_level = if debug {
        "trace"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Short benchmark name for a trace path, e.g. `amptjp` for
/// `./traces/amptjp.rep.zst`.
pub fn trace_name(path: &Path) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?:^|[/\\])([^/\\]+?)(?:\.rep)?(?:\.zst)?$").expect("trace name pattern is valid")
    });
    let search_string = path.to_string_lossy();
    re.captures(&search_string)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| search_string.into_owned())
}
