//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lyricbook_core` linkage and report which backend this host gets.
//! - Keep output deterministic for quick local sanity checks.

use lyricbook_core::{open_record_store, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("lyricbook_core ping={}", lyricbook_core::ping());
    println!("lyricbook_core version={}", lyricbook_core::core_version());
    println!("lyricbook_core probe={}", lyricbook_core::probe_backend());

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("lyricbook_core config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("lyricbook_core backend={}", config.backend_kind());

    match open_record_store(&config).and_then(|mut store| store.load()) {
        Ok(records) => {
            println!("lyricbook_core records={}", records.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("lyricbook_core load error [{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}
