//! `cobbler doctor` — environment pre-flight (SPEC_FULL.md A.5).

use cobbler_config::Config;

use crate::error::CobblerError;

pub fn run(config: &Config) -> Result<(), CobblerError> {
    let results = crate::doctor::run_checks(config);
    for result in &results {
        let mark = if result.ok { "ok" } else { "FAIL" };
        println!("[{mark}] {}: {}", result.name, result.detail);
    }
    if crate::doctor::all_ok(&results) {
        Ok(())
    } else {
        Err(CobblerError::Environment {
            tool: "one or more doctor checks failed; see output above".to_string(),
        })
    }
}
