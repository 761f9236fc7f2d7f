use chartcache_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    match Cli::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("chartcache error: {:#}", err);
            std::process::exit(1);
        }
    }
}
